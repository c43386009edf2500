//! Coordinate stepping over multi-dimensional index spaces.
//!
//! All variants carry from dimension 0 upward, matching the column-major
//! storage of [MultiArray](crate::container::MultiArray): dimension 0 is the
//! fastest varying. Starting at the origin and stepping `Π sizes` times
//! returns to the origin, visiting every coordinate vector exactly once.

/// Advances `coordinates` to the next element.
pub fn next_coord(coordinates: &mut [usize], sizes: &[usize]) {
    for (c, s) in coordinates.iter_mut().zip(sizes) {
        *c += 1;
        if *c < *s {
            break;
        }
        *c = 0;
    }
}

/// Advances `coordinates` while treating the dimension range
/// `skip_first..skip_last` as if it had size 1.
pub fn next_coord_with_skip(
    coordinates: &mut [usize],
    sizes: &[usize],
    skip_first: usize,
    skip_last: usize,
) {
    let mut j = 0;
    while j < coordinates.len() {
        if j == skip_first {
            j = skip_last;
            continue;
        }
        coordinates[j] += 1;
        if coordinates[j] < sizes[j] {
            break;
        }
        coordinates[j] = 0;
        j += 1;
    }
}

/// Advances `coordinates` while maintaining, across the carry, how many of
/// the coordinates in `skip_first..skip_last` are outside their size-1
/// range (value greater than zero).
pub fn next_coord_with_skip_count(
    coordinates: &mut [usize],
    sizes: &[usize],
    skip_first: usize,
    skip_last: usize,
    out_of_range: &mut usize,
) {
    for j in 0..coordinates.len() {
        coordinates[j] += 1;
        if coordinates[j] < sizes[j] {
            if j >= skip_first && j < skip_last && coordinates[j] == 1 {
                *out_of_range += 1;
            }
            break;
        }
        if j >= skip_first && j < skip_last {
            *out_of_range -= 1;
        }
        coordinates[j] = 0;
    }
}

/// Advances `coordinates` while maintaining how many coordinates are at or
/// above their per-dimension limit in `limits`.
pub fn next_coord_with_limits(
    coordinates: &mut [usize],
    sizes: &[usize],
    limits: &[usize],
    out_of_range: &mut usize,
) {
    for j in 0..coordinates.len() {
        coordinates[j] += 1;
        if coordinates[j] == limits[j] {
            *out_of_range += 1;
        }
        if coordinates[j] < sizes[j] {
            break;
        }
        if coordinates[j] >= limits[j] {
            *out_of_range -= 1;
        }
        coordinates[j] = 0;
    }
}
