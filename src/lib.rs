//! Structure-aware chunking and near-duplicate removal for embedding
//! pipelines.
//!
//! ```text
//! Cleaned text ──► boundaries::detect ─────────┐
//!              └─► segmenter (unicode / regex) ┤
//!                                              ▼
//!                                  assembly::ChunkAssembler
//!                                              │
//!                                              ▼
//!                              dedup::deduplicate ◄── embeddings provider
//!                                              │
//!                                              ▼
//!                     service::ChunkingService ──► ingestion::ChunkRecord
//!                                              └─► downstream embedding & vector store
//! ```
//!
//! The crate prepares raw document text for embedding-based semantic search:
//! a single forward pass folds sentences into size-bounded, overlap-linked
//! chunks that respect section boundaries, and a greedy similarity pass
//! collapses near-identical chunks before anything is vectorized and stored.
//! Tokenization and embedding are consumed as narrow capability traits so
//! deterministic fakes can stand in for real model stacks.

pub mod chunking;
pub mod ingestion;
pub mod progress;
pub mod types;

pub use chunking::assembly;
pub use chunking::boundaries;
pub use chunking::config;
pub use chunking::dedup;
pub use chunking::embeddings;
pub use chunking::segmenter;
pub use chunking::service;
pub use chunking::tokenizer;
pub use chunking::types as chunk_types;
