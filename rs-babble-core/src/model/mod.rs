//! Word-level order-2 Markov text generation.
//!
//! - Corpus tokenization with URL protection (`tokenizer`)
//! - Transition table construction (`Chain`)
//! - Randomized walk with dead-end recovery and output cleaning (`generator`)

/// Turns joined corpus text into tokens, keeping URLs whole.
pub mod tokenizer;

/// Order-2 transition table built from a token sequence.
///
/// Rebuilt from a corpus snapshot, never persisted.
pub mod chain;

/// Chain walk, output normalization and reply sentinels.
pub mod generator;

/// One chain key and the successors observed after it.
/// This module is not exposed publicly.
mod state;
