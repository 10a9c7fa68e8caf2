use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use super::counts::TransitionCounts;
use super::edits::edit_neighbors;
use crate::io::{build_snapshot_path, read_lines};
use crate::tokenizer;

/// Highest n-gram order the model tracks.
pub const MAX_ORDER: usize = 4;

/// Absolute discount applied at every order above unigram.
const DISCOUNT: f64 = 0.75;

/// Lower bound on every probability handed to callers; keeps logarithms
/// finite downstream.
pub const PROB_FLOOR: f64 = 1e-10;

/// Fixed interpolation weights, highest order first.
///
/// Tunable constants, not load-bearing behavior: higher orders dominate
/// when data exists, and the weights of each row sum to 1.
const BIGRAM_WEIGHTS: [f64; 2] = [0.7, 0.3];
const TRIGRAM_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];
const FOURGRAM_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Word-level n-gram language model with discounted back-off smoothing.
///
/// The model accumulates unigram through 4-gram counts plus the
/// continuation counts needed for smoothing, and answers probability,
/// perplexity and correction-candidate queries against them.
///
/// # Responsibilities
/// - Accumulate count tables from tokenized corpora (training is
///   additive; repeated calls keep growing the same tables)
/// - Compute smoothed probabilities, either by recursive discounted
///   back-off (`probability`) or fixed-weight interpolation
///   (`interpolated_probability`)
/// - Score token sequences (`sentence_log_probability`, `perplexity`)
/// - Generate and rank correction candidates (`candidates`)
/// - Merge with partial models built on other threads
/// - Persist to and reload from a compact binary snapshot
///
/// # Invariants
/// - For any context, the stored total equals the sum of its follower
///   counts
/// - `continuation count(word)` equals the number of distinct contexts
///   whose table contains `word`
/// - Counts never decrease; there is no eviction
/// - Queries never panic and never return a probability outside
///   `(0, 1]`, trained or not
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LanguageModel {
	/// Word → occurrence count.
	unigram_counts: HashMap<String, u64>,
	/// Sum of all unigram counts.
	total_words: u64,

	/// Previous word → follower counts.
	bigram_counts: HashMap<String, TransitionCounts<String>>,
	/// (word₋₂, word₋₁) → follower counts.
	trigram_counts: HashMap<(String, String), TransitionCounts<String>>,
	/// (word₋₃, word₋₂, word₋₁) → follower counts.
	fourgram_counts: HashMap<(String, String, String), TransitionCounts<String>>,

	/// Word → number of distinct bigram contexts it ends.
	bigram_continuation: HashMap<String, u64>,
	/// Word → number of distinct trigram contexts it ends.
	trigram_continuation: HashMap<String, u64>,
	/// Word → number of distinct 4-gram contexts it ends.
	fourgram_continuation: HashMap<String, u64>,

	/// All words observed during training.
	vocabulary: HashSet<String>,

	/// Whether any training call has completed.
	trained: bool,
}

impl LanguageModel {
	/// Returns an empty, untrained model.
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads a model from a corpus file, using a cached snapshot when
	/// one exists.
	///
	/// # Parameters
	/// - `filepath`: Path to a plain-text corpus, one or more sentences
	///   per line.
	///
	/// # Behavior
	/// - If a `.bin` snapshot exists next to the corpus, it is loaded
	///   directly and no training happens.
	/// - Otherwise the corpus lines are split into chunks (CPU cores ×
	///   factor), each chunk trains a partial model on its own thread,
	///   the partials are merged, and the result is serialized to the
	///   snapshot path for future fast loading.
	///
	/// # Errors
	/// Returns an error if the corpus cannot be read or the snapshot
	/// cannot be written or decoded.
	pub fn from_corpus_file<P: AsRef<Path>>(filepath: P) -> Result<Self, Box<dyn std::error::Error>> {
		let snapshot_path = build_snapshot_path(&filepath, "bin")?;
		if snapshot_path.exists() {
			return Self::load(&snapshot_path);
		}

		let model = Self::train_corpus_parallel(&filepath)?;

		let bytes = postcard::to_stdvec(&model)?;
		std::fs::write(snapshot_path, bytes)?;

		Ok(model)
	}

	/// Reads a corpus file, trains partial models in parallel and merges
	/// them into a single model.
	///
	/// # Notes
	/// - Uses MPSC channels to collect partial models from threads.
	/// - Each thread trains on its chunk with `train_from_text` per line.
	fn train_corpus_parallel<P: AsRef<Path>>(filepath: P) -> Result<Self, Box<dyn std::error::Error>> {
		let lines = read_lines(&filepath)?;
		if lines.is_empty() {
			return Ok(Self::new());
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = ((lines.len() + chunks - 1) / chunks).max(1);

		let (tx, rx) = mpsc::channel();
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			thread::spawn(move || {
				let mut partial_model = LanguageModel::new();
				for line in chunk {
					partial_model.train_from_text(&line);
				}
				tx.send(partial_model).expect("Failed to send from thread");
			});
		}
		drop(tx);

		let mut final_model = LanguageModel::new();
		for partial_model in rx.iter() {
			final_model.merge(&partial_model);
		}

		log::info!(
			"Trained on {} words, {} unique words",
			final_model.total_words,
			final_model.vocabulary.len()
		);

		Ok(final_model)
	}

	/// Trains the model on a corpus of tokenized sentences.
	///
	/// # Parameters
	/// - `corpus`: Sentences, each a list of word tokens.
	///
	/// # Behavior
	/// - Tokens are lowercased; tokens that are neither alphabetic nor
	///   contractions are skipped.
	/// - Counts accumulate; training repeatedly with different corpora
	///   grows the same tables and never resets them.
	pub fn train<S: AsRef<str>>(&mut self, corpus: &[Vec<S>]) {
		for sentence in corpus {
			let words: Vec<String> = sentence
				.iter()
				.map(|w| w.as_ref().to_lowercase())
				.filter(|w| is_trainable_word(w))
				.collect();

			for (i, word) in words.iter().enumerate() {
				*self.unigram_counts.entry(word.clone()).or_insert(0) += 1;
				self.vocabulary.insert(word.clone());
				self.total_words += 1;

				if i >= 1 {
					let context = words[i - 1].clone();
					let new_follower = self
						.bigram_counts
						.entry(context)
						.or_insert_with(TransitionCounts::new)
						.record(word.clone());
					if new_follower {
						*self.bigram_continuation.entry(word.clone()).or_insert(0) += 1;
					}
				}

				if i >= 2 {
					let context = (words[i - 2].clone(), words[i - 1].clone());
					let new_follower = self
						.trigram_counts
						.entry(context)
						.or_insert_with(TransitionCounts::new)
						.record(word.clone());
					if new_follower {
						*self.trigram_continuation.entry(word.clone()).or_insert(0) += 1;
					}
				}

				if i >= 3 {
					let context = (words[i - 3].clone(), words[i - 2].clone(), words[i - 1].clone());
					let new_follower = self
						.fourgram_counts
						.entry(context)
						.or_insert_with(TransitionCounts::new)
						.record(word.clone());
					if new_follower {
						*self.fourgram_continuation.entry(word.clone()).or_insert(0) += 1;
					}
				}
			}
		}

		self.trained = true;
	}

	/// Trains from raw text: splits into sentences, tokenizes, trains.
	pub fn train_from_text(&mut self, text: &str) {
		let corpus: Vec<Vec<String>> = tokenizer::split_sentences(text)
			.iter()
			.map(|sentence| tokenizer::tokenize(sentence))
			.collect();
		self.train(&corpus);
	}

	/// Calculates `P(word | context)` by recursive discounted back-off.
	///
	/// # Parameters
	/// - `word`: Target word.
	/// - `context`: Preceding words, most recent last. May be empty.
	/// - `order`: Requested n-gram order, clamped to `1..=4`. When the
	///   context is shorter than `order - 1`, the highest order the
	///   context supports is used instead.
	///
	/// # Returns
	/// A probability strictly inside `(0, 1]`. Unknown words and unknown
	/// contexts degrade to smoothed lower-order estimates, never to
	/// zero, and an untrained model answers a small epsilon.
	///
	/// # Behavior
	/// At each order above unigram, the count mass for the context is
	/// discounted by a constant and the reserved mass is given to the
	/// recursively computed lower-order probability. A context that was
	/// never observed backs off outright, without reserving any weight
	/// at its order.
	pub fn probability<S: AsRef<str>>(&self, word: &str, context: &[S], order: usize) -> f64 {
		let word = word.to_lowercase();
		let context = normalized_context(context, order);

		self.backoff_probability(&word, &context, context.len() + 1)
			.clamp(PROB_FLOOR, 1.0)
	}

	/// Recursive back-off step at order `n` (`context.len() == n - 1`).
	fn backoff_probability(&self, word: &str, context: &[String], n: usize) -> f64 {
		if n <= 1 {
			return self.unigram_probability(word);
		}

		let counts = self.context_counts(context, n);
		match counts {
			Some(counts) if counts.total() > 0 => {
				let context_total = counts.total() as f64;
				let word_count = counts.count(&word.to_owned()) as f64;

				let discounted = (word_count - DISCOUNT).max(0.0) / context_total;
				let lambda = (DISCOUNT * counts.unique_followers() as f64) / context_total;
				let lower = self.backoff_probability(word, &context[1..], n - 1);

				discounted + lambda * lower
			}
			// Unobserved context: pure back-off, no interpolation weight
			// from this order.
			_ => self.backoff_probability(word, &context[1..], n - 1),
		}
	}

	/// Calculates `P(word | context)` as a fixed-weight blend of every
	/// order up to `order`.
	///
	/// Each order is evaluated against its own count table; the blend
	/// weights are `0.7/0.3` (bigram), `0.5/0.3/0.2` (trigram) and
	/// `0.4/0.3/0.2/0.1` (4-gram), highest order first. A context
	/// shorter than the requested order silently drops to the highest
	/// order it supports.
	pub fn interpolated_probability<S: AsRef<str>>(&self, word: &str, context: &[S], order: usize) -> f64 {
		let word = word.to_lowercase();
		let context = normalized_context(context, order);

		let p_unigram = self.unigram_probability(&word);
		if context.is_empty() {
			return p_unigram.clamp(PROB_FLOOR, 1.0);
		}

		let len = context.len();
		let p_bigram = self.backoff_probability(&word, &context[len - 1..], 2);
		if len < 2 {
			return (BIGRAM_WEIGHTS[0] * p_bigram + BIGRAM_WEIGHTS[1] * p_unigram)
				.clamp(PROB_FLOOR, 1.0);
		}

		let p_trigram = self.backoff_probability(&word, &context[len - 2..], 3);
		if len < 3 {
			return (TRIGRAM_WEIGHTS[0] * p_trigram
				+ TRIGRAM_WEIGHTS[1] * p_bigram
				+ TRIGRAM_WEIGHTS[2] * p_unigram)
				.clamp(PROB_FLOOR, 1.0);
		}

		let p_fourgram = self.backoff_probability(&word, &context[len - 3..], 4);
		(FOURGRAM_WEIGHTS[0] * p_fourgram
			+ FOURGRAM_WEIGHTS[1] * p_trigram
			+ FOURGRAM_WEIGHTS[2] * p_bigram
			+ FOURGRAM_WEIGHTS[3] * p_unigram)
			.clamp(PROB_FLOOR, 1.0)
	}

	/// Calculates the log-probability of a token sequence.
	///
	/// Each token is scored with the interpolated probability of the up
	/// to `order - 1` preceding tokens (fewer at the start). Every
	/// per-token probability is floored before the logarithm, so the
	/// result is always finite.
	///
	/// Returns `0.0` for an empty sequence.
	pub fn sentence_log_probability<S: AsRef<str>>(&self, tokens: &[S], order: usize) -> f64 {
		if tokens.is_empty() {
			return 0.0;
		}

		let words: Vec<String> = tokens.iter().map(|t| t.as_ref().to_lowercase()).collect();
		let window = effective_order(order).saturating_sub(1);

		let mut log_prob = 0.0;
		for (i, word) in words.iter().enumerate() {
			let start = i - i.min(window);
			let prob = self.interpolated_probability(word, &words[start..i], order);
			log_prob += prob.max(PROB_FLOOR).ln();
		}

		log_prob
	}

	/// Calculates the perplexity of a token sequence.
	///
	/// Lower values mean the sequence is statistically typical of the
	/// training corpus. Returns `+∞` for an empty sequence; this is a
	/// defined sentinel, not an error.
	pub fn perplexity<S: AsRef<str>>(&self, tokens: &[S], order: usize) -> f64 {
		if tokens.is_empty() {
			return f64::INFINITY;
		}

		let log_prob = self.sentence_log_probability(tokens, order);
		(-log_prob / tokens.len() as f64).exp()
	}

	/// Proposes correction candidates for a word, ranked by contextual
	/// probability.
	///
	/// The candidate pool is the word itself plus every edit-distance-1
	/// and edit-distance-2 neighbor found in the vocabulary. Candidates
	/// are scored with `interpolated_probability`, sorted descending and
	/// truncated to `max_candidates`.
	///
	/// # Notes
	/// - An untrained model or empty vocabulary yields an empty list.
	/// - The ranking makes no correctness judgment; callers decide
	///   whether the best candidate beats the original by enough to be
	///   worth surfacing (see `is_word_likely`).
	pub fn candidates<S: AsRef<str>>(
		&self,
		word: &str,
		context: &[S],
		max_candidates: usize,
		order: usize,
	) -> Vec<(String, f64)> {
		if !self.trained || self.vocabulary.is_empty() {
			return Vec::new();
		}

		let word = word.to_lowercase();

		let mut pool: HashSet<String> = HashSet::new();
		pool.insert(word.clone());

		for distance in 1..=2 {
			for edit in edit_neighbors(&word, distance) {
				if self.vocabulary.contains(&edit) {
					pool.insert(edit);
				}
			}
		}

		let mut scored: Vec<(String, f64)> = pool
			.into_iter()
			.map(|candidate| {
				let prob = self.interpolated_probability(&candidate, context, order);
				(candidate, prob)
			})
			.collect();

		scored.sort_by(|a, b| b.1.total_cmp(&a.1));
		scored.truncate(max_candidates);
		scored
	}

	/// Checks whether a word is plausible in its context.
	///
	/// The word passes when its probability reaches `threshold` times
	/// the best candidate's probability. This is the caller-side
	/// minimum-improvement gate over `candidates`: a word is only
	/// suspicious when some rival beats it by a clear margin.
	pub fn is_word_likely<S: AsRef<str>>(
		&self,
		word: &str,
		context: &[S],
		threshold: f64,
		order: usize,
	) -> bool {
		let candidates = self.candidates(word, context, 3, order);
		if candidates.is_empty() {
			return true;
		}

		let word_prob = self.interpolated_probability(word, context, order);
		let best_prob = candidates[0].1;

		word_prob >= threshold * best_prob
	}

	/// Checks if a word was observed during training.
	pub fn in_vocabulary(&self, word: &str) -> bool {
		self.vocabulary.contains(&word.to_lowercase())
	}

	/// Whether any training call has completed.
	pub fn is_trained(&self) -> bool {
		self.trained
	}

	/// Number of distinct words observed during training.
	pub fn vocabulary_size(&self) -> usize {
		self.vocabulary.len()
	}

	/// Total number of word tokens observed during training.
	pub fn total_words(&self) -> u64 {
		self.total_words
	}

	/// Iterates over the trained vocabulary.
	///
	/// Used to feed the character-level companion model.
	pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
		self.vocabulary.iter().map(String::as_str)
	}

	/// Number of distinct contexts of the given order that `word` ends.
	///
	/// `order` selects the table (2, 3 or 4); other orders answer zero.
	pub fn continuation_count(&self, word: &str, order: usize) -> u64 {
		let word = word.to_lowercase();
		let table = match order {
			2 => &self.bigram_continuation,
			3 => &self.trigram_continuation,
			4 => &self.fourgram_continuation,
			_ => return 0,
		};
		table.get(&word).copied().unwrap_or(0)
	}

	/// Merges another model into this one.
	///
	/// # Behavior
	/// - All count tables and totals are summed; vocabularies are
	///   unioned.
	/// - Continuation counts are rebuilt from the merged tables, since
	///   a (context, word) pair present in both halves must still count
	///   as one distinct context.
	///
	/// # Notes
	/// Intended for combining partial models from parallel training;
	/// merging is count-equivalent to training on the concatenated
	/// corpora.
	pub fn merge(&mut self, other: &Self) {
		for (word, count) in &other.unigram_counts {
			*self.unigram_counts.entry(word.clone()).or_insert(0) += *count;
		}
		self.total_words += other.total_words;

		for (context, counts) in &other.bigram_counts {
			self.bigram_counts
				.entry(context.clone())
				.or_insert_with(TransitionCounts::new)
				.merge(counts);
		}
		for (context, counts) in &other.trigram_counts {
			self.trigram_counts
				.entry(context.clone())
				.or_insert_with(TransitionCounts::new)
				.merge(counts);
		}
		for (context, counts) in &other.fourgram_counts {
			self.fourgram_counts
				.entry(context.clone())
				.or_insert_with(TransitionCounts::new)
				.merge(counts);
		}

		self.vocabulary.extend(other.vocabulary.iter().cloned());
		self.trained |= other.trained;

		self.rebuild_continuations();
	}

	/// Serializes the model to a compact binary snapshot.
	///
	/// # Errors
	/// Returns an error if encoding or writing fails.
	pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<(), Box<dyn std::error::Error>> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(filepath, bytes)?;
		Ok(())
	}

	/// Loads a model from a snapshot written by `save`.
	///
	/// The reloaded model answers every query identically to the one
	/// that was saved.
	///
	/// # Errors
	/// Returns an error if the file is missing or cannot be decoded; no
	/// half-loaded model is ever produced.
	pub fn load<P: AsRef<Path>>(filepath: P) -> Result<Self, Box<dyn std::error::Error>> {
		let bytes = std::fs::read(filepath)?;
		let model = postcard::from_bytes(&bytes)?;
		Ok(model)
	}

	/// Unigram probability, the base of every back-off chain.
	///
	/// `count / total_words` for observed words, a vocabulary-smoothed
	/// estimate for unseen ones, and an epsilon when nothing was ever
	/// trained.
	fn unigram_probability(&self, word: &str) -> f64 {
		if self.total_words == 0 {
			return PROB_FLOOR;
		}

		let count = self.unigram_counts.get(word).copied().unwrap_or(0);
		if count == 0 {
			return 1.0 / (self.total_words + self.vocabulary.len() as u64) as f64;
		}

		count as f64 / self.total_words as f64
	}

	/// Looks up the follower table for a context at order `n`.
	///
	/// `context` must hold exactly `n - 1` words, most recent last.
	fn context_counts(&self, context: &[String], n: usize) -> Option<&TransitionCounts<String>> {
		match n {
			2 => self.bigram_counts.get(&context[0]),
			3 => self
				.trigram_counts
				.get(&(context[0].clone(), context[1].clone())),
			4 => self
				.fourgram_counts
				.get(&(context[0].clone(), context[1].clone(), context[2].clone())),
			_ => None,
		}
	}

	/// Recomputes every continuation table from the merged count tables.
	fn rebuild_continuations(&mut self) {
		self.bigram_continuation.clear();
		for counts in self.bigram_counts.values() {
			for word in counts.followers() {
				*self.bigram_continuation.entry(word.clone()).or_insert(0) += 1;
			}
		}

		self.trigram_continuation.clear();
		for counts in self.trigram_counts.values() {
			for word in counts.followers() {
				*self.trigram_continuation.entry(word.clone()).or_insert(0) += 1;
			}
		}

		self.fourgram_continuation.clear();
		for counts in self.fourgram_counts.values() {
			for word in counts.followers() {
				*self.fourgram_continuation.entry(word.clone()).or_insert(0) += 1;
			}
		}
	}
}

/// Clamps the requested order to what the model and context support,
/// answering the `order - 1` most recent context words, lowercased.
fn normalized_context<S: AsRef<str>>(context: &[S], order: usize) -> Vec<String> {
	let window = effective_order(order).saturating_sub(1).min(context.len());
	context[context.len() - window..]
		.iter()
		.map(|w| w.as_ref().to_lowercase())
		.collect()
}

/// Clamps an order to the supported `1..=MAX_ORDER` range.
fn effective_order(order: usize) -> usize {
	order.clamp(1, MAX_ORDER)
}

/// Words worth counting: purely alphabetic tokens and contractions.
fn is_trainable_word(word: &str) -> bool {
	!word.is_empty() && (word.chars().all(char::is_alphabetic) || word.contains('\''))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn trained_model() -> LanguageModel {
		let mut model = LanguageModel::new();
		model.train(&[
			vec!["the", "cat", "sat", "on", "the", "mat"],
			vec!["the", "dog", "sat", "on", "the", "rug"],
			vec!["the", "cat", "ran", "through", "the", "garden"],
		]);
		model
	}

	#[test]
	fn probability_stays_in_unit_interval() {
		let model = trained_model();
		let contexts: [&[&str]; 3] = [&[], &["the"], &["the", "cat"]];

		for order in 1..=4 {
			for context in contexts {
				for word in ["sat", "cat", "zebra", ""] {
					let p = model.probability(word, context, order);
					assert!(p > 0.0 && p <= 1.0, "p={} word={:?} order={}", p, word, order);
				}
			}
		}
	}

	#[test]
	fn observed_trigram_beats_bare_unigram() {
		let mut model = LanguageModel::new();
		model.train(&[vec!["the", "cat", "sat"]]);

		let contextual = model.probability("sat", &["the", "cat"], 3);
		let bare = model.probability("sat", &[] as &[&str], 1);
		assert!(contextual > bare, "contextual={} bare={}", contextual, bare);
	}

	#[test]
	fn unseen_context_backs_off_instead_of_zeroing() {
		let model = trained_model();
		let p = model.probability("sat", &["purple", "elephant"], 3);
		assert!(p > 0.0);
		// Pure back-off means an unobserved context collapses to the
		// unigram estimate untouched.
		assert!((p - model.probability("sat", &[] as &[&str], 1)).abs() < 1e-12);
	}

	#[test]
	fn untrained_model_answers_epsilon_not_panic() {
		let model = LanguageModel::new();
		assert_eq!(model.probability("hello", &["a", "b"], 3), PROB_FLOOR);
		assert!(!model.is_trained());
	}

	#[test]
	fn probability_is_pure_given_fixed_state() {
		let model = trained_model();
		let a = model.probability("sat", &["the", "cat"], 3);
		let b = model.probability("sat", &["the", "cat"], 3);
		assert_eq!(a.to_bits(), b.to_bits());
	}

	#[test]
	fn order_falls_back_to_what_context_supports() {
		let model = trained_model();
		let with_one_word = model.probability("sat", &["cat"], 3);
		let bigram = model.probability("sat", &["cat"], 2);
		assert_eq!(with_one_word.to_bits(), bigram.to_bits());
	}

	#[test]
	fn interpolated_blends_toward_unigram_without_context() {
		let model = trained_model();
		let p = model.interpolated_probability("the", &[] as &[&str], 3);
		let unigram = model.probability("the", &[] as &[&str], 1);
		assert!((p - unigram).abs() < 1e-12);
	}

	#[test]
	fn interpolated_stays_in_unit_interval() {
		let model = trained_model();
		for order in 1..=4 {
			let p = model.interpolated_probability("sat", &["the", "cat"], order);
			assert!(p > 0.0 && p <= 1.0);
		}
	}

	#[test]
	fn training_is_additive_and_batch_order_insensitive() {
		let batch_a = vec![vec!["the", "cat", "sat", "on", "the", "mat"]];
		let batch_b = vec![vec!["the", "dog", "ran", "through", "the", "garden"]];

		let mut split_ab = LanguageModel::new();
		split_ab.train(&batch_a);
		split_ab.train(&batch_b);

		let mut split_ba = LanguageModel::new();
		split_ba.train(&batch_b);
		split_ba.train(&batch_a);

		let mut joined = LanguageModel::new();
		let mut all = batch_a.clone();
		all.extend(batch_b.clone());
		joined.train(&all);

		for model in [&split_ab, &split_ba] {
			assert_eq!(model.total_words(), joined.total_words());
			assert_eq!(model.vocabulary_size(), joined.vocabulary_size());
			let p_split = model.probability("sat", &["the", "cat"], 3);
			let p_joined = joined.probability("sat", &["the", "cat"], 3);
			assert_eq!(p_split.to_bits(), p_joined.to_bits());
		}
	}

	#[test]
	fn merge_is_count_equivalent_to_joint_training() {
		let mut left = LanguageModel::new();
		left.train(&[vec!["the", "cat", "sat", "on", "the", "mat"]]);

		let mut right = LanguageModel::new();
		right.train(&[vec!["the", "cat", "sat", "by", "the", "door"]]);

		let mut joined = LanguageModel::new();
		joined.train(&[
			vec!["the", "cat", "sat", "on", "the", "mat"],
			vec!["the", "cat", "sat", "by", "the", "door"],
		]);

		left.merge(&right);

		assert_eq!(left.total_words(), joined.total_words());
		assert_eq!(
			left.probability("sat", &["the", "cat"], 3).to_bits(),
			joined.probability("sat", &["the", "cat"], 3).to_bits()
		);
		// "sat" follows the distinct context "cat" in both halves; the
		// merged continuation count must not double it.
		assert_eq!(left.continuation_count("sat", 2), joined.continuation_count("sat", 2));
	}

	#[test]
	fn continuation_counts_track_distinct_contexts() {
		let mut model = LanguageModel::new();
		model.train(&[
			vec!["the", "cat", "sat"],
			vec!["a", "dog", "sat"],
			vec!["the", "cat", "sat"],
		]);

		// "sat" ends two distinct bigram contexts (after "cat", after
		// "dog") even though it occurs three times.
		assert_eq!(model.continuation_count("sat", 2), 2);
		assert_eq!(model.continuation_count("sat", 3), 2);
		assert_eq!(model.continuation_count("sat", 1), 0);
	}

	#[test]
	fn sentence_scoring_has_defined_empty_sentinels() {
		let model = trained_model();
		assert_eq!(model.sentence_log_probability(&[] as &[&str], 3), 0.0);
		assert_eq!(model.perplexity(&[] as &[&str], 3), f64::INFINITY);
	}

	#[test]
	fn perplexity_of_trained_sequence_is_at_least_one() {
		let model = trained_model();
		let seen = model.perplexity(&["the", "cat", "sat"], 3);
		assert!(seen >= 1.0 && seen.is_finite());

		let unseen = model.perplexity(&["zebra", "quantum", "flux"], 3);
		assert!(unseen >= seen);
	}

	#[test]
	fn untrained_perplexity_is_finite_for_non_empty_input() {
		let model = LanguageModel::new();
		let p = model.perplexity(&["hello", "world"], 3);
		assert!(p.is_finite() && p > 0.0);
	}

	#[test]
	fn candidates_respect_limit_and_vocabulary() {
		let model = trained_model();
		let candidates = model.candidates("cat", &["the"], 3, 2);

		assert!(candidates.len() <= 3);
		for (candidate, prob) in &candidates {
			assert!(*prob > 0.0);
			assert!(candidate == "cat" || model.in_vocabulary(candidate));
		}
	}

	#[test]
	fn transposition_typo_is_recovered() {
		let mut model = LanguageModel::new();
		model.train(&[vec!["hello", "world"], vec!["hello", "world", "again"]]);

		let candidates = model.candidates("wrold", &["hello"], 3, 2);
		let words: Vec<&str> = candidates.iter().map(|(w, _)| w.as_str()).collect();
		assert!(words.contains(&"world"), "candidates={:?}", candidates);

		// "world" carries bigram evidence after "hello"; the identity
		// non-word cannot outrank it.
		let world_rank = words.iter().position(|w| *w == "world").unwrap();
		let wrold_rank = words.iter().position(|w| *w == "wrold");
		if let Some(wrold_rank) = wrold_rank {
			assert!(world_rank < wrold_rank);
		}
	}

	#[test]
	fn untrained_model_yields_no_candidates() {
		let model = LanguageModel::new();
		assert!(model.candidates("wrold", &["hello"], 5, 2).is_empty());
	}

	#[test]
	fn likely_word_passes_the_relative_gate() {
		let model = trained_model();
		assert!(model.is_word_likely("sat", &["the", "cat"], 0.5, 3));
	}

	#[test]
	fn vocabulary_membership_is_case_insensitive() {
		let model = trained_model();
		assert!(model.in_vocabulary("The"));
		assert!(!model.in_vocabulary("zebra"));
	}

	#[test]
	fn non_word_tokens_are_not_trained() {
		let mut model = LanguageModel::new();
		model.train(&[vec!["the", "42", "cats", "don't", "meow"]]);
		assert!(!model.in_vocabulary("42"));
		assert!(model.in_vocabulary("don't"));
	}

	#[test]
	fn snapshot_round_trip_preserves_queries() {
		let model = trained_model();

		let mut path = std::env::temp_dir();
		path.push(format!("textlm-snapshot-{}.bin", std::process::id()));

		model.save(&path).unwrap();
		let reloaded = LanguageModel::load(&path).unwrap();
		std::fs::remove_file(&path).ok();

		assert!(reloaded.is_trained());
		assert_eq!(reloaded.total_words(), model.total_words());
		assert_eq!(
			reloaded.probability("sat", &["the", "cat"], 3).to_bits(),
			model.probability("sat", &["the", "cat"], 3).to_bits()
		);
		assert_eq!(
			reloaded.perplexity(&["the", "cat", "sat"], 3).to_bits(),
			model.perplexity(&["the", "cat", "sat"], 3).to_bits()
		);
		assert_eq!(reloaded.continuation_count("sat", 2), model.continuation_count("sat", 2));
	}

	#[test]
	fn loading_a_missing_snapshot_fails_explicitly() {
		assert!(LanguageModel::load("/nonexistent/model.bin").is_err());
	}
}
