use multiobjective_ga::container::coords::{
    next_coord, next_coord_with_limits, next_coord_with_skip, next_coord_with_skip_count,
};
use multiobjective_ga::container::{AlignedVec, MultiArray};
use multiobjective_ga::errors::CoreError;
use std::collections::HashSet;

#[test]
fn multi_array_column_major_index() {
    let array: MultiArray<i32> = MultiArray::new(&[3, 4, 2]);
    assert_eq!(array.len(), 24);
    assert_eq!(array.index_of(&[0, 0, 0]).unwrap(), 0);
    assert_eq!(array.index_of(&[1, 0, 0]).unwrap(), 1);
    assert_eq!(array.index_of(&[0, 1, 0]).unwrap(), 3);
    assert_eq!(array.index_of(&[0, 0, 1]).unwrap(), 12);
    assert_eq!(array.index_of(&[2, 3, 1]).unwrap(), 23);
}

#[test]
fn multi_array_coordinates_invert_index() {
    let array: MultiArray<i32> = MultiArray::new(&[3, 4, 2]);
    for index in 0..array.len() {
        let coordinates = array.coordinates_of(index).unwrap();
        assert_eq!(array.index_of(&coordinates).unwrap(), index);
    }
}

#[test]
fn multi_array_rejects_bad_coordinates() {
    let array: MultiArray<i32> = MultiArray::new(&[3, 4]);
    assert_eq!(
        array.index_of(&[3, 0]).unwrap_err(),
        CoreError::InvalidArgument("coordinate out of range")
    );
    assert!(matches!(
        array.index_of(&[0, 0, 0]).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
    assert!(matches!(
        array.coordinates_of(12).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
    assert!(matches!(
        array.dimension_size(2).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
}

#[test]
fn multi_array_resize_keeps_intersection() {
    let mut array: MultiArray<i32> = MultiArray::new(&[2, 3]);
    for index in 0..array.len() {
        array[index] = index as i32 + 1;
    }
    array.set_dimension_size(1, 2).unwrap();
    assert_eq!(array.dimension_sizes(), &[2, 2]);
    assert_eq!(*array.get(&[0, 0]).unwrap(), 1);
    assert_eq!(*array.get(&[1, 1]).unwrap(), 4);

    array.set_dimension_size(1, 4).unwrap();
    assert_eq!(*array.get(&[1, 1]).unwrap(), 4);
    assert_eq!(*array.get(&[0, 3]).unwrap(), 0);
}

#[test]
fn multi_array_add_dimensions_keeps_values_at_zero_plane() {
    let mut array: MultiArray<i32> = MultiArray::new(&[2, 2]);
    for index in 0..array.len() {
        array[index] = index as i32 + 1;
    }
    array.add_dimensions(1, &[3]).unwrap();
    assert_eq!(array.dimension_sizes(), &[2, 3, 2]);
    assert_eq!(*array.get(&[0, 0, 0]).unwrap(), 1);
    assert_eq!(*array.get(&[1, 0, 1]).unwrap(), 4);
    assert_eq!(*array.get(&[1, 2, 1]).unwrap(), 0);
}

#[test]
fn multi_array_remove_trailing_dimensions_keeps_zero_tail() {
    let mut array: MultiArray<i32> = MultiArray::new(&[2, 2, 3]);
    for index in 0..array.len() {
        array[index] = index as i32;
    }
    let expected: Vec<i32> = (0..4)
        .map(|index| *array.get(&array.coordinates_of(index).unwrap()).unwrap())
        .collect();

    array.remove_trailing_dimensions(1).unwrap();
    assert_eq!(array.dimension_sizes(), &[2, 2]);
    // the surviving elements are exactly those whose removed coordinate was 0
    let survivors: Vec<i32> = (0..array.len()).map(|index| array[index]).collect();
    assert_eq!(survivors, expected);

    assert!(matches!(
        array.remove_trailing_dimensions(3).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
}

#[test]
fn coordinate_carry_is_total() {
    let sizes = [3usize, 2, 4];
    let total: usize = sizes.iter().product();
    let mut coordinates = vec![0usize; sizes.len()];
    let mut seen = HashSet::new();
    for _ in 0..total {
        assert!(seen.insert(coordinates.clone()), "coordinate visited twice");
        next_coord(&mut coordinates, &sizes);
    }
    assert_eq!(coordinates, vec![0, 0, 0]);
    assert_eq!(seen.len(), total);
}

#[test]
fn coordinate_carry_with_skip_range() {
    let sizes = [2usize, 3, 2];
    let mut coordinates = vec![0usize; 3];
    let mut seen = HashSet::new();
    // dimension 1 pinned: only 2 * 2 coordinates are visited
    for _ in 0..4 {
        assert!(seen.insert(coordinates.clone()));
        next_coord_with_skip(&mut coordinates, &sizes, 1, 2);
    }
    assert_eq!(coordinates, vec![0, 0, 0]);
    assert!(seen.iter().all(|coordinates| coordinates[1] == 0));
}

#[test]
fn coordinate_carry_tracks_out_of_range() {
    let sizes = [3usize, 2];
    let mut coordinates = vec![0usize; 2];
    let mut out_of_range = 0usize;
    for _ in 0..6 {
        next_coord_with_skip_count(&mut coordinates, &sizes, 0, 1, &mut out_of_range);
        let expected = usize::from(coordinates[0] > 0);
        assert_eq!(out_of_range, expected, "at {:?}", coordinates);
    }
}

#[test]
fn coordinate_carry_with_limits() {
    let sizes = [3usize, 3];
    let limits = [2usize, 2];
    let mut coordinates = vec![0usize; 2];
    let mut out_of_range = 0usize;
    for _ in 0..9 {
        next_coord_with_limits(&mut coordinates, &sizes, &limits, &mut out_of_range);
        let expected = coordinates
            .iter()
            .zip(&limits)
            .filter(|(c, l)| *c >= *l)
            .count();
        assert_eq!(out_of_range, expected, "at {:?}", coordinates);
    }
}

#[test]
fn aligned_vec_aligns_every_element() {
    let vec: AlignedVec<u8> = AlignedVec::new(5, 64).unwrap();
    for index in 0..vec.len() {
        assert_eq!(&vec[index] as *const u8 as usize % 64, 0);
    }
}

#[test]
fn aligned_vec_rejects_bad_alignment() {
    assert!(matches!(
        AlignedVec::<u64>::new(2, 3).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
    assert!(matches!(
        AlignedVec::<u64>::new(2, 4).unwrap_err(),
        CoreError::InvalidArgument(_)
    ));
}

#[test]
fn aligned_vec_drops_in_reverse_order() {
    use std::sync::{Arc, Mutex};

    struct Recorder(usize, Arc<Mutex<Vec<usize>>>);

    impl Drop for Recorder {
        fn drop(&mut self) {
            self.1.lock().unwrap().push(self.0);
        }
    }

    let order = Arc::new(Mutex::new(Vec::new()));
    let vec = AlignedVec::from_fn(4, 64, |index| Recorder(index, Arc::clone(&order))).unwrap();
    drop(vec);
    assert_eq!(*order.lock().unwrap(), vec![3, 2, 1, 0]);
}
