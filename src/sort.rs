//! External merge sorting for relations larger than memory.
//!
//! [`ExternalMergeSorter`] consumes a stream of fixed-width records in
//! three strictly ordered phases: records are written into bounded,
//! individually sorted run files; `begin_read` opens every run and
//! builds a tournament [loser tree](loser_tree) over their front
//! records; `read` then yields the globally sorted stream one record
//! at a time, with O(log k) comparisons per record for k runs.
//!
//! The sorter owns its run files exclusively. Each run is deleted the
//! moment its last record is consumed, and dropping the sorter deletes
//! whatever remains.

mod error;
mod external;
mod loser_tree;

pub use error::SortError;
pub use external::ExternalMergeSorter;
