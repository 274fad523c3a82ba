//! Runtime for the s3-sample pipeline: capability adapters, the `load_s3` task
//! graph, and the CLI/Lambda entry points.
//!
//! Domain logic (validation, generation, CSV, key naming) lives in
//! `s3_sample_core`; AWS SDK clients are constructed only in the binaries and
//! injected through the [`adapters`] traits.

pub mod adapters;
pub mod cli;
pub mod handlers;
pub mod logging;
