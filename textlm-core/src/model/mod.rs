//! Top-level module for the n-gram modelling system.
//!
//! This module provides the statistical core behind fluency scoring and
//! spelling correction, including:
//! - A word-level model with smoothing and back-off (`LanguageModel`)
//! - A character-level companion model (`CharNgramModel`)
//! - Edit-distance candidate generation (`edits`)
//! - A weighted hybrid scorer (`HybridScorer`)

/// Word-level n-gram model (orders 1 to 4).
///
/// Handles corpus training, discounted back-off and interpolated
/// probabilities, sentence scoring, perplexity, candidate ranking,
/// model merging and snapshot persistence.
pub mod language_model;

/// Character-level n-gram companion model (orders up to 5).
///
/// Scores spelling plausibility of single words independent of any
/// sentence context.
pub mod char_model;

/// Edit-distance machinery: neighbor generation and string distances.
pub mod edits;

/// Weighted hybrid scorer combining the word model, the character
/// model and an edit-distance penalty to rank correction candidates.
pub mod hybrid;

/// Internal transition-count table shared by both models.
///
/// Tracks follower counts for a fixed context. This module is not
/// exposed publicly.
mod counts;
