use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::counts::TransitionCounts;

/// Default (and maximum useful) character n-gram order.
pub const DEFAULT_ORDER: usize = 5;

/// Additive smoothing constant.
const ADD_K: f64 = 0.5;

/// Floor applied before logarithms in `score_word`.
const PROB_FLOOR: f64 = 1e-10;

/// Score answered for any word when the model is untrained.
const UNTRAINED_SCORE: f64 = -100.0;

/// Word boundary markers added around every trained word.
const START_MARKER: char = '^';
const END_MARKER: char = '$';

/// Character-level n-gram companion model.
///
/// Judges whether a character sequence looks like a plausible word of
/// the training vocabulary, independent of any sentence context. Every
/// word is padded with explicit start/end markers and character n-grams
/// of all orders up to `order` are counted; scoring walks the word and
/// sums add-k-smoothed per-character log-probabilities, backing off to
/// shorter character contexts whenever a context was never observed.
///
/// The result feeds the hybrid scorer's spelling-plausibility term; the
/// model is never swapped into the word-level pipeline.
///
/// # Invariants
/// - `order` is always >= 1
/// - Scores are finite for every input, trained or not
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CharNgramModel {
	/// The maximum n-gram order counted and used for scoring.
	order: usize,

	/// Per order: context string (length `n - 1`) → follower counts.
	ngrams: HashMap<usize, HashMap<String, TransitionCounts<char>>>,

	/// All characters observed during training (markers included).
	alphabet: HashSet<char>,

	/// Whether any training call has completed.
	trained: bool,
}

impl Default for CharNgramModel {
	fn default() -> Self {
		Self::new(DEFAULT_ORDER)
	}
}

impl CharNgramModel {
	/// Creates an empty model counting n-grams up to `order`.
	///
	/// An `order` of zero is treated as 1.
	pub fn new(order: usize) -> Self {
		Self {
			order: order.max(1),
			ngrams: HashMap::new(),
			alphabet: HashSet::new(),
			trained: false,
		}
	}

	/// Trains the model on vocabulary words.
	///
	/// Each word is padded as `^word$` and every character n-gram of
	/// order 1 to `order` is counted. Training is additive.
	pub fn train<I, S>(&mut self, words: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for word in words {
			let padded = pad(word.as_ref());
			self.alphabet.extend(padded.iter().copied());

			for n in 1..=self.order {
				if padded.len() < n {
					continue;
				}
				let table = self.ngrams.entry(n).or_insert_with(HashMap::new);
				for window in padded.windows(n) {
					let context: String = window[..n - 1].iter().collect();
					let follower = window[n - 1];
					table
						.entry(context)
						.or_insert_with(TransitionCounts::new)
						.record(follower);
				}
			}
		}

		self.trained = true;
	}

	/// Smoothed probability of `follower` after a character context.
	///
	/// Add-k smoothing over the observed followers of the context; a
	/// context with no observations backs off to the context shortened
	/// by its oldest character, down to a uniform estimate over the
	/// alphabet at order 1.
	fn probability(&self, follower: char, context: &str, n: usize) -> f64 {
		let counts = self
			.ngrams
			.get(&n)
			.and_then(|table| table.get(context));

		let total = counts.map(|c| c.total()).unwrap_or(0);
		if total == 0 {
			if n > 1 {
				let shorter: String = context.chars().skip(1).collect();
				return self.probability(follower, &shorter, n - 1);
			}
			return 1.0 / (self.alphabet.len() + 1) as f64;
		}

		let count = counts.map(|c| c.count(&follower)).unwrap_or(0);
		(count as f64 + ADD_K) / (total as f64 + ADD_K * self.alphabet.len() as f64)
	}

	/// Scores how much `word` looks like a word of the training set.
	///
	/// # Returns
	/// The sum of per-character log-probabilities over the padded word,
	/// divided by the word length. Higher is better; typical values are
	/// negative. An untrained model (or an empty word) answers a fixed
	/// low score instead of failing.
	pub fn score_word(&self, word: &str) -> f64 {
		if !self.trained || word.is_empty() {
			return UNTRAINED_SCORE;
		}

		let padded = pad(word);
		let mut log_prob = 0.0;

		for i in 1..padded.len() {
			let n = self.order.min(i + 1);
			let context: String = padded[i + 1 - n..i].iter().collect();
			let prob = self.probability(padded[i], &context, n);
			log_prob += prob.max(PROB_FLOOR).ln();
		}

		log_prob / word.chars().count() as f64
	}

	/// The maximum n-gram order of this model.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Whether any training call has completed.
	pub fn is_trained(&self) -> bool {
		self.trained
	}

	/// Merges another model into this one.
	///
	/// # Errors
	/// Returns an error if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.order != other.order {
			return Err(format!(
				"Order mismatch: self={}, other={}",
				self.order, other.order
			));
		}

		for (n, table) in &other.ngrams {
			let own = self.ngrams.entry(*n).or_insert_with(HashMap::new);
			for (context, counts) in table {
				own.entry(context.clone())
					.or_insert_with(TransitionCounts::new)
					.merge(counts);
			}
		}

		self.alphabet.extend(other.alphabet.iter().copied());
		self.trained |= other.trained;

		Ok(())
	}

	/// Serializes the model to a compact binary snapshot.
	pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<(), Box<dyn std::error::Error>> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(filepath, bytes)?;
		Ok(())
	}

	/// Loads a model from a snapshot written by `save`.
	pub fn load<P: AsRef<Path>>(filepath: P) -> Result<Self, Box<dyn std::error::Error>> {
		let bytes = std::fs::read(filepath)?;
		let model = postcard::from_bytes(&bytes)?;
		Ok(model)
	}
}

/// Pads a word with the boundary markers, as characters.
fn pad(word: &str) -> Vec<char> {
	let mut padded = Vec::with_capacity(word.len() + 2);
	padded.push(START_MARKER);
	padded.extend(word.chars());
	padded.push(END_MARKER);
	padded
}

#[cfg(test)]
mod tests {
	use super::*;

	fn trained_model() -> CharNgramModel {
		let mut model = CharNgramModel::default();
		model.train([
			"the", "that", "this", "there", "then", "them",
			"cat", "cats", "rat", "rats", "mat", "hat",
			"sitting", "running", "jumping", "standing",
		]);
		model
	}

	#[test]
	fn plausible_words_outscore_gibberish() {
		let model = trained_model();
		assert!(model.score_word("that") > model.score_word("xqzv"));
		assert!(model.score_word("catting") > model.score_word("qqqq"));
	}

	#[test]
	fn scores_are_finite_and_negative() {
		let model = trained_model();
		for word in ["the", "cat", "zzzzzz", "a"] {
			let score = model.score_word(word);
			assert!(score.is_finite());
			assert!(score < 0.0);
		}
	}

	#[test]
	fn untrained_model_answers_fixed_low_score() {
		let model = CharNgramModel::default();
		assert_eq!(model.score_word("hello"), UNTRAINED_SCORE);
	}

	#[test]
	fn empty_word_does_not_divide_by_zero() {
		let model = trained_model();
		assert_eq!(model.score_word(""), UNTRAINED_SCORE);
	}

	#[test]
	fn length_normalization_keeps_long_words_comparable() {
		let model = trained_model();
		let short = model.score_word("cat");
		let long = model.score_word("catcatcat");
		// Without normalization the long word would trail by orders of
		// magnitude; normalized scores stay within a small factor.
		assert!((short - long).abs() < short.abs());
	}

	#[test]
	fn merge_requires_matching_order() {
		let mut a = CharNgramModel::new(5);
		let b = CharNgramModel::new(3);
		assert!(a.merge(&b).is_err());
	}

	#[test]
	fn merge_combines_evidence() {
		let mut a = CharNgramModel::new(3);
		a.train(["cat"]);
		let mut b = CharNgramModel::new(3);
		b.train(["cats", "rats"]);

		a.merge(&b).unwrap();
		assert!(a.score_word("cats") > a.score_word("qqqq"));
	}

	#[test]
	fn snapshot_round_trip_preserves_scores() {
		let model = trained_model();

		let mut path = std::env::temp_dir();
		path.push(format!("textlm-char-snapshot-{}.bin", std::process::id()));

		model.save(&path).unwrap();
		let reloaded = CharNgramModel::load(&path).unwrap();
		std::fs::remove_file(&path).ok();

		assert_eq!(
			reloaded.score_word("that").to_bits(),
			model.score_word("that").to_bits()
		);
	}
}
