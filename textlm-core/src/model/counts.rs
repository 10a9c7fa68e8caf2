use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Transition counts observed after one fixed context.
///
/// A `TransitionCounts` stores, for a single (n-1)-gram context, how
/// many times each follower was observed after it, together with the
/// cached sum of all those counts. It is the value type of every count
/// table in the word and character models; the context itself is the
/// key of the enclosing map.
///
/// ## Responsibilities
/// - Accumulate follower occurrences during training
/// - Answer count / total / unique-follower queries with zero-on-missing
///   read semantics (reads never create entries)
/// - Merge with another table for the same context (parallel training)
///
/// ## Invariants
/// - `total` always equals the sum of all follower counts
/// - Every stored follower count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct TransitionCounts<T: Eq + Hash> {
	/// Follower occurrences indexed by the next token.
	/// Example: { "sat" => 42, "ran" => 3 }
	followers: HashMap<T, u64>,
	/// Cached sum of all follower counts.
	total: u64,
}

impl<T: Eq + Hash + Clone> TransitionCounts<T> {
	/// Creates an empty table.
	pub(crate) fn new() -> Self {
		Self { followers: HashMap::new(), total: 0 }
	}

	/// Records one occurrence of `follower` after this context.
	///
	/// Returns `true` when the follower was never observed here before,
	/// which is the signal the continuation-count tables key on.
	pub(crate) fn record(&mut self, follower: T) -> bool {
		let entry = self.followers.entry(follower).or_insert(0);
		*entry += 1;
		self.total += 1;
		*entry == 1
	}

	/// Returns how often `follower` was observed, zero if never.
	pub(crate) fn count(&self, follower: &T) -> u64 {
		self.followers.get(follower).copied().unwrap_or(0)
	}

	/// Returns the total number of observations for this context.
	pub(crate) fn total(&self) -> u64 {
		self.total
	}

	/// Returns the number of distinct followers ever observed.
	pub(crate) fn unique_followers(&self) -> usize {
		self.followers.len()
	}

	/// Iterates over the distinct followers observed after this context.
	pub(crate) fn followers(&self) -> impl Iterator<Item = &T> {
		self.followers.keys()
	}

	/// Merges another table for the same context into this one.
	///
	/// Follower counts and totals are summed. Intended for combining
	/// partial models built on separate threads.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (follower, occurrence) in &other.followers {
			*self.followers.entry(follower.clone()).or_insert(0) += *occurrence;
		}
		self.total += other.total;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn record_updates_count_and_total() {
		let mut counts: TransitionCounts<String> = TransitionCounts::new();
		counts.record("sat".to_owned());
		counts.record("sat".to_owned());
		counts.record("ran".to_owned());

		assert_eq!(counts.count(&"sat".to_owned()), 2);
		assert_eq!(counts.count(&"ran".to_owned()), 1);
		assert_eq!(counts.total(), 3);
		assert_eq!(counts.unique_followers(), 2);
	}

	#[test]
	fn missing_follower_reads_zero_without_insertion() {
		let counts: TransitionCounts<char> = TransitionCounts::new();
		assert_eq!(counts.count(&'x'), 0);
		assert_eq!(counts.unique_followers(), 0);
	}

	#[test]
	fn merge_sums_counts() {
		let mut left: TransitionCounts<String> = TransitionCounts::new();
		left.record("sat".to_owned());

		let mut right: TransitionCounts<String> = TransitionCounts::new();
		right.record("sat".to_owned());
		right.record("ran".to_owned());

		left.merge(&right);
		assert_eq!(left.count(&"sat".to_owned()), 2);
		assert_eq!(left.count(&"ran".to_owned()), 1);
		assert_eq!(left.total(), 3);
	}
}
