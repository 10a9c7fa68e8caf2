//! Statistical n-gram language modelling for grammar and spelling analysis.
//!
//! This crate provides the probabilistic core shared by text checkers:
//! - Word-level n-gram models (orders 1 to 4) with discounted back-off smoothing
//! - Fixed-weight interpolated probabilities, sentence scoring and perplexity
//! - Edit-distance candidate generation ranked by contextual probability
//! - A character-level companion model for spelling plausibility
//! - A registry for sharing trained models across concurrent readers
//!
//! Only the high-level API is exposed publicly. Low-level components
//! are kept internal to ensure consistency and prevent misuse.

/// Core n-gram models, smoothing and candidate ranking logic.
///
/// This module exposes the word model, character model and hybrid scorer
/// while keeping internal count tables private.
pub mod model;

/// Word tokenization and sentence splitting.
///
/// Used by the training paths and usable by callers preparing token
/// sequences for scoring.
pub mod tokenizer;

/// Shared model registry with atomic swap-on-retrain semantics.
pub mod registry;

/// I/O utilities (corpus loading, snapshot path helpers).
///
/// Not exposed
pub(crate) mod io;
