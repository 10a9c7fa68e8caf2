//! Word tokenization and sentence splitting.
//!
//! Training and scoring both operate on lowercase word tokens. A word
//! token is a run of alphanumeric characters, optionally containing an
//! internal apostrophe (contractions like `don't` stay together).
//! Punctuation and other symbols are dropped.

/// Splits raw text into lowercase word tokens.
///
/// # Parameters
/// - `text`: Input text, any unicode.
///
/// # Returns
/// Word tokens in order of appearance, lowercased. Empty input yields
/// an empty vector.
///
/// # Notes
/// - Contractions are kept as a single token (`can't`).
/// - A leading or trailing apostrophe is not part of a token.
pub fn tokenize(text: &str) -> Vec<String> {
	tokenize_with_positions(text)
		.into_iter()
		.map(|(token, _, _)| token)
		.collect()
}

/// Splits raw text into lowercase word tokens with byte positions.
///
/// # Returns
/// Tuples of `(token, start, end)` where `start..end` is the byte range
/// of the token in the original text. The token itself is lowercased;
/// the range refers to the original casing.
pub fn tokenize_with_positions(text: &str) -> Vec<(String, usize, usize)> {
	let mut tokens = Vec::new();

	let mut start: Option<usize> = None;
	let mut prev_was_word = false;

	for (index, c) in text.char_indices() {
		let is_word_char = c.is_alphanumeric()
			|| (c == '\'' && prev_was_word && has_word_char_after(text, index));

		if is_word_char {
			if start.is_none() {
				start = Some(index);
			}
		} else if let Some(s) = start.take() {
			tokens.push((text[s..index].to_lowercase(), s, index));
		}
		prev_was_word = c.is_alphanumeric();
	}

	if let Some(s) = start {
		tokens.push((text[s..].to_lowercase(), s, text.len()));
	}

	tokens
}

/// Splits text into sentences on `.`, `!` and `?` boundaries.
///
/// Sentences are returned trimmed and non-empty; the terminators are
/// dropped. Text without any terminator is a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
	text.split(['.', '!', '?'])
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect()
}

/// True if the character directly after the byte `index` is alphanumeric.
///
/// Used to keep apostrophes inside contractions while rejecting ones at
/// a word boundary.
fn has_word_char_after(text: &str, index: usize) -> bool {
	text[index..]
		.chars()
		.nth(1)
		.map(char::is_alphanumeric)
		.unwrap_or(false)
}
