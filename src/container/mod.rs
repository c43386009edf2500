//! Value containers: aligned sequences, multi-dimensional arrays and the
//! coordinate iterators that walk them.
pub mod aligned;
pub mod coords;
pub mod multi_array;

pub use aligned::AlignedVec;
pub use multi_array::MultiArray;
