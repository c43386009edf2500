//! Iteration over the neighbouring cells of a hyperbox.
use super::HyperBox;
use fixedbitset::FixedBitSet;

/// Iterator over the hyperboxes on the surface at Chebyshev distance
/// `level` around a centre box, clipped to `[0, limitᵢ)` on each axis. The
/// centre itself is never visited; `level == 0` yields nothing.
///
/// The walk goes edge by edge: for every dimension first the lower then the
/// upper edge of the surface, shrinking the remaining ranges after each
/// edge so no box is visited twice. Edges that fall entirely outside the
/// clipped domain are skipped.
#[derive(Debug)]
pub struct Neighbours {
    coords: Vec<i64>,
    // flattened [min₀, max₀, min₁, max₁, …], both ends inclusive
    limits: Vec<i64>,
    skip: FixedBitSet,
    edge: usize,
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Running,
    Done,
}

/// Starts a neighbour walk around `centre`.
pub fn neighbours(centre: &HyperBox, limits: &[i64], level: i64) -> Neighbours {
    let dimension_count = centre.len();
    let mut iter = Neighbours {
        coords: vec![0; dimension_count],
        limits: vec![0; dimension_count * 2],
        skip: FixedBitSet::with_capacity(dimension_count * 2),
        edge: 0,
        state: State::Fresh,
    };

    if level == 0 || dimension_count == 0 {
        iter.state = State::Done;
        return iter;
    }

    for dimension in (0..dimension_count).rev() {
        let low_edge = dimension << 1;
        let high_edge = low_edge + 1;
        iter.limits[low_edge] = centre[dimension] - level;
        iter.limits[high_edge] = centre[dimension] + level;

        if iter.limits[low_edge] < 0 {
            iter.skip.insert(low_edge);
            iter.limits[low_edge] = 0;
        }
        if iter.limits[high_edge] >= limits[dimension] {
            iter.skip.insert(high_edge);
            iter.limits[high_edge] = limits[dimension] - 1;
        }

        iter.coords[dimension] = iter.limits[low_edge];
    }

    if iter.skip.contains(0) && !iter.find() {
        iter.state = State::Done;
    }
    iter
}

impl Neighbours {
    /// Moves to the next box on the current edge, carrying across the
    /// unpinned dimensions; falls through to the next edge on overflow.
    fn advance(&mut self) -> bool {
        let pinned = self.edge >> 1;
        let mut dimension = self.coords.len() as isize - 1;
        while dimension >= 0 {
            let d = dimension as usize;
            if d != pinned {
                self.coords[d] += 1;
                if self.coords[d] <= self.limits[(d << 1) + 1] {
                    break;
                }
                self.coords[d] = self.limits[d << 1];
            }
            dimension -= 1;
        }
        !(dimension < 0 && !self.find())
    }

    /// Steps to the next edge whose boxes are inside the clipped domain,
    /// removing the finished edge from the remaining ranges.
    fn find(&mut self) -> bool {
        if !self.skip.contains(self.edge) {
            self.limits[self.edge] += if self.edge & 1 == 1 { -1 } else { 1 };
        }
        self.coords[self.edge >> 1] = self.limits[self.edge & !1];

        loop {
            self.edge += 1;
            if self.edge >= self.limits.len() {
                return false;
            }
            if !self.skip.contains(self.edge) {
                self.coords[self.edge >> 1] = self.limits[self.edge];
                return true;
            }
            self.coords[self.edge >> 1] = self.limits[self.edge & !1];
        }
    }
}

impl Iterator for Neighbours {
    type Item = HyperBox;

    fn next(&mut self) -> Option<HyperBox> {
        match self.state {
            State::Done => None,
            State::Fresh => {
                self.state = State::Running;
                Some(HyperBox(self.coords.clone()))
            }
            State::Running => {
                if self.advance() {
                    Some(HyperBox(self.coords.clone()))
                } else {
                    self.state = State::Done;
                    None
                }
            }
        }
    }
}
