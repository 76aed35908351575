//! Helpers for turning pipeline output into downstream-ready datasets.
//!
//! The pipeline itself stops at [`ChunkRecord`]s: text plus a metadata map,
//! handed to an external embedding-and-storage stage. No file or network
//! format is defined here.

pub mod records;

pub use records::{ChunkRecord, outcome_to_records};
