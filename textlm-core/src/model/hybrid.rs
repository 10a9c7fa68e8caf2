use super::char_model::CharNgramModel;
use super::edits::damerau_levenshtein_distance;
use super::language_model::LanguageModel;

/// Blend weights for the hybrid score.
///
/// Tunable constants; the defaults favor the word model with the
/// character model as a spelling-robustness term and a small long-range
/// 4-gram bonus.
#[derive(Clone, Copy, Debug)]
pub struct HybridWeights {
	pub word: f64,
	pub char_ngram: f64,
	pub fourgram: f64,
}

impl Default for HybridWeights {
	fn default() -> Self {
		Self { word: 0.6, char_ngram: 0.3, fourgram: 0.1 }
	}
}

/// Combines the word model, the character model and an edit-distance
/// penalty into one candidate-ranking score.
///
/// # Responsibilities
/// - Score a single candidate against its sentence context
/// - Rank a candidate list, best first
///
/// The word term is the trigram interpolated probability; the character
/// term is the exponentiated word-plausibility score (mapping the
/// length-normalized log-probability back into `[0, 1]`); the 4-gram
/// term only contributes when three context words are available. When
/// the original word is known, the whole score is damped by
/// `1 / (distance + 1)` so corrections stay close to what was typed.
pub struct HybridScorer<'a> {
	word_model: &'a LanguageModel,
	char_model: Option<&'a CharNgramModel>,
	weights: HybridWeights,
}

impl<'a> HybridScorer<'a> {
	/// Creates a scorer over a word model and an optional char model.
	pub fn new(word_model: &'a LanguageModel, char_model: Option<&'a CharNgramModel>) -> Self {
		Self { word_model, char_model, weights: HybridWeights::default() }
	}

	/// Creates a scorer with explicit blend weights.
	pub fn with_weights(
		word_model: &'a LanguageModel,
		char_model: Option<&'a CharNgramModel>,
		weights: HybridWeights,
	) -> Self {
		Self { word_model, char_model, weights }
	}

	/// Calculates the weighted score of one candidate.
	///
	/// # Parameters
	/// - `candidate`: The candidate word to score.
	/// - `context`: Preceding words, most recent last.
	/// - `original_word`: The word as typed, when scoring corrections;
	///   enables the edit-distance penalty.
	///
	/// # Returns
	/// A non-negative score; higher is better. Only meaningful relative
	/// to other candidates scored against the same context.
	pub fn score_candidate<S: AsRef<str>>(
		&self,
		candidate: &str,
		context: &[S],
		original_word: Option<&str>,
	) -> f64 {
		let mut score = self.weights.word
			* self.word_model.interpolated_probability(candidate, context, 3);

		if let Some(char_model) = self.char_model {
			let char_prob = char_model.score_word(candidate).exp();
			score += self.weights.char_ngram * char_prob;
		}

		if context.len() >= 3 {
			score += self.weights.fourgram
				* self.word_model.interpolated_probability(candidate, context, 4);
		}

		if let Some(original) = original_word {
			let distance = damerau_levenshtein_distance(
				&original.to_lowercase(),
				&candidate.to_lowercase(),
			);
			if distance > 0 {
				score /= (distance + 1) as f64;
			}
		}

		score
	}

	/// Ranks candidates by hybrid score, best first.
	pub fn rank_candidates<S: AsRef<str>>(
		&self,
		candidates: &[String],
		context: &[S],
		original_word: Option<&str>,
	) -> Vec<(String, f64)> {
		let mut scored: Vec<(String, f64)> = candidates
			.iter()
			.map(|candidate| {
				let score = self.score_candidate(candidate, context, original_word);
				(candidate.clone(), score)
			})
			.collect();

		scored.sort_by(|a, b| b.1.total_cmp(&a.1));
		scored
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn trained_models() -> (LanguageModel, CharNgramModel) {
		let mut word_model = LanguageModel::new();
		word_model.train(&[
			vec!["the", "quick", "brown", "fox", "jumps"],
			vec!["the", "lazy", "brown", "dog", "sleeps"],
			vec!["the", "quick", "brown", "fox", "runs"],
		]);

		let mut char_model = CharNgramModel::default();
		char_model.train(word_model.vocabulary());

		(word_model, char_model)
	}

	#[test]
	fn contextual_candidate_outranks_unrelated_one() {
		let (word_model, char_model) = trained_models();
		let scorer = HybridScorer::new(&word_model, Some(&char_model));

		let ranked = scorer.rank_candidates(
			&["fox".to_owned(), "lazy".to_owned()],
			&["the", "quick", "brown"],
			None,
		);

		assert_eq!(ranked[0].0, "fox");
	}

	#[test]
	fn edit_distance_penalty_damps_far_corrections() {
		let (word_model, char_model) = trained_models();
		let scorer = HybridScorer::new(&word_model, Some(&char_model));

		let context: [&str; 2] = ["quick", "brown"];
		let near = scorer.score_candidate("fox", &context, Some("foxx"));
		let far = scorer.score_candidate("fox", &context, Some("fafafa"));
		let exact = scorer.score_candidate("fox", &context, Some("fox"));

		assert!(exact > near);
		assert!(near > far);
	}

	#[test]
	fn works_without_a_char_model() {
		let (word_model, _) = trained_models();
		let scorer = HybridScorer::new(&word_model, None);

		let score = scorer.score_candidate("fox", &["quick", "brown"], None);
		assert!(score > 0.0);
	}

	#[test]
	fn fourgram_term_needs_three_context_words() {
		let (word_model, char_model) = trained_models();
		let scorer = HybridScorer::new(&word_model, Some(&char_model));

		let short_ctx: [&str; 2] = ["quick", "brown"];
		let long_ctx: [&str; 3] = ["the", "quick", "brown"];
		let with_fourgram = scorer.score_candidate("fox", &long_ctx, None);
		let without = scorer.score_candidate("fox", &short_ctx, None);

		// "the quick brown fox" is an observed 4-gram, so the longer
		// context can only help here.
		assert!(with_fourgram >= without);
	}

	#[test]
	fn custom_weights_are_honored() {
		let (word_model, char_model) = trained_models();
		let weights = HybridWeights { word: 1.0, char_ngram: 0.0, fourgram: 0.0 };
		let scorer = HybridScorer::with_weights(&word_model, Some(&char_model), weights);

		let score = scorer.score_candidate("fox", &["quick", "brown"], None);
		let expected = word_model.interpolated_probability("fox", &["quick", "brown"], 3);
		assert!((score - expected).abs() < 1e-12);
	}
}
