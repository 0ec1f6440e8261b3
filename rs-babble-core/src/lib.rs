//! Per-group, self-learning text generation.
//!
//! This crate learns short messages per group and answers with text
//! synthesized by an order-2 word Markov chain, including:
//! - Deduplicated, capacity-bounded corpora with pluggable persistence
//! - URL-preserving tokenization
//! - Chain construction and randomized walks with dead-end recovery
//! - A caller-facing `Engine` returning text or well-defined sentinels
//!
//! Randomness is always injected by the caller, so a seeded generator
//! reproduces the same replies.

/// Caller-facing facade: `ingest` and `generate_reply`.
pub mod engine;

/// Per-group corpora and their persistence backends.
pub mod corpus;

/// Tokenizer, chain and generator.
pub mod model;

/// Error types for persistence and corpus operations.
pub mod error;

/// File helpers (line reading, group file naming).
pub mod io;

pub use corpus::{CorpusBackend, CorpusStore, JsonFileBackend, MemoryBackend};
pub use engine::{Engine, ReplyOptions};
pub use error::{BackendError, StoreError};
pub use model::generator::Reply;
