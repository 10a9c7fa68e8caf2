//! Edit-distance machinery for spelling correction.
//!
//! Provides the combinatorial neighbor generator used to build
//! correction candidate sets, plus Levenshtein and Damerau-Levenshtein
//! distances used by the hybrid scorer's closeness penalty.

use std::collections::HashSet;

/// Alphabet used for insertions and replacements.
const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Generates every string reachable from `word` by `distance` edits.
///
/// An edit is a single-character deletion, adjacent transposition,
/// replacement or insertion over the `a-z` alphabet. `distance` must be
/// 1 or 2; distance 2 is generated by applying distance 1 twice.
///
/// # Parameters
/// - `word`: Input word (lowercased internally).
/// - `distance`: Number of edits, clamped to `1..=2`.
///
/// # Returns
/// The set of all reachable strings. This is purely combinatorial; no
/// vocabulary filtering or probability is involved, and degenerate
/// results (including the empty string from deleting a one-character
/// word) are retained for the caller to filter.
pub fn edit_neighbors(word: &str, distance: usize) -> HashSet<String> {
	let one = single_edits(word);
	if distance <= 1 {
		return one;
	}
	one.iter().flat_map(|edit| single_edits(edit)).collect()
}

/// Generates all strings exactly one edit away from `word`.
fn single_edits(word: &str) -> HashSet<String> {
	let word = word.to_lowercase();
	let chars: Vec<char> = word.chars().collect();
	let mut edits = HashSet::new();

	for split in 0..=chars.len() {
		let (left, right) = chars.split_at(split);

		// Deletion
		if !right.is_empty() {
			edits.insert(collect_parts(left, &right[1..], None));
		}

		// Adjacent transposition
		if right.len() > 1 {
			let mut swapped = right.to_vec();
			swapped.swap(0, 1);
			edits.insert(collect_parts(left, &swapped, None));
		}

		for c in ALPHABET.chars() {
			// Replacement
			if !right.is_empty() {
				edits.insert(collect_parts(left, &right[1..], Some(c)));
			}
			// Insertion
			edits.insert(collect_parts(left, right, Some(c)));
		}
	}

	edits
}

/// Builds `left + inserted? + right` as a `String`.
fn collect_parts(left: &[char], right: &[char], inserted: Option<char>) -> String {
	let mut s = String::with_capacity(left.len() + right.len() + 1);
	s.extend(left);
	if let Some(c) = inserted {
		s.push(c);
	}
	s.extend(right);
	s
}

/// Calculates the Levenshtein distance between two strings.
///
/// Counts single-character insertions, deletions and substitutions.
pub fn levenshtein_distance(source: &str, target: &str) -> usize {
	let source_chars: Vec<char> = source.chars().collect();
	let target_chars: Vec<char> = target.chars().collect();

	if source_chars.is_empty() {
		return target_chars.len();
	}
	if target_chars.is_empty() {
		return source_chars.len();
	}

	let mut previous_row: Vec<usize> = (0..=target_chars.len()).collect();

	for (i, sc) in source_chars.iter().enumerate() {
		let mut current_row = vec![i + 1];
		for (j, tc) in target_chars.iter().enumerate() {
			let insertions = previous_row[j + 1] + 1;
			let deletions = current_row[j] + 1;
			let substitutions = previous_row[j] + usize::from(sc != tc);
			current_row.push(insertions.min(deletions).min(substitutions));
		}
		previous_row = current_row;
	}

	previous_row[target_chars.len()]
}

/// Calculates the Damerau-Levenshtein distance between two strings.
///
/// Like Levenshtein, but counts an adjacent transposition as a single
/// edit. This matches the operations `edit_neighbors` generates.
pub fn damerau_levenshtein_distance(source: &str, target: &str) -> usize {
	let source_chars: Vec<char> = source.chars().collect();
	let target_chars: Vec<char> = target.chars().collect();
	let len1 = source_chars.len();
	let len2 = target_chars.len();

	let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];
	for (i, row) in matrix.iter_mut().enumerate() {
		row[0] = i;
	}
	for j in 0..=len2 {
		matrix[0][j] = j;
	}

	for i in 1..=len1 {
		for j in 1..=len2 {
			let cost = usize::from(source_chars[i - 1] != target_chars[j - 1]);

			let deletion = matrix[i - 1][j] + 1;
			let insertion = matrix[i][j - 1] + 1;
			let substitution = matrix[i - 1][j - 1] + cost;
			matrix[i][j] = deletion.min(insertion).min(substitution);

			// Transposition
			if i > 1
				&& j > 1
				&& source_chars[i - 1] == target_chars[j - 2]
				&& source_chars[i - 2] == target_chars[j - 1]
			{
				matrix[i][j] = matrix[i][j].min(matrix[i - 2][j - 2] + cost);
			}
		}
	}

	matrix[len1][len2]
}
