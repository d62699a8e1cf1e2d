//! Dataset records and JSONL persistence.

pub mod sample;
pub mod store;

pub use sample::{Sample, NO_ANSWER};
pub use store::{output_path, Dataset, DatasetError, DatasetResult};
