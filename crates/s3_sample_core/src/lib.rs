//! Shared s3-sample pipeline domain primitives.
//!
//! This crate owns the run contract, dataset generation, CSV export and object
//! key naming. It excludes AWS SDK and Lambda runtime concerns, which live in
//! `s3_sample_pipeline`.

pub mod contract;
pub mod dataset;
pub mod export;
pub mod storage_keys;
