use super::state::State;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashMap;

/// Order of every chain built by this crate.
pub const ORDER: usize = 2;

/// Word-level n-gram transition table.
///
/// The `Chain` maps each key ([`ORDER`] consecutive tokens joined by a single
/// space) to the `State` listing the tokens observed right after it.
///
/// # Responsibilities
/// - Build the table from a token sequence
/// - Select start keys, uniformly or filtered by a seed word
/// - Look up successors of a key
///
/// # Invariants
/// - Every key holds exactly [`ORDER`] tokens
/// - `keys` holds every key of `states` exactly once, in first-seen order,
///   so a fixed random source always selects the same key
/// - Every state has at least one successor
#[derive(Clone, Debug, Default)]
pub struct Chain {
	/// Mapping from a key to its corresponding state
	states: HashMap<String, State>,

	/// Keys in first-seen order
	keys: Vec<String>,
}

impl Chain {
	/// Builds a chain from a token sequence.
	///
	/// A sequence of `ORDER` tokens or fewer yields an empty chain.
	pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
		let mut chain = Self::default();
		chain.add_tokens(tokens);
		chain
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Keys in first-seen order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.keys.iter().map(String::as_str)
	}

	/// Adds a token sequence to the chain.
	///
	/// For every start index `i` in `[0, len - ORDER)`, the `ORDER` tokens
	/// starting at `i` form the key and token `i + ORDER` is recorded as its
	/// successor.
	///
	/// # Notes
	/// - Tokens are taken as-is; lowercasing is the tokenizer's job.
	/// - Sequences of `ORDER` tokens or fewer add nothing.
	pub fn add_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) {
		if tokens.len() <= ORDER {
			return;
		}

		for i in 0..tokens.len() - ORDER {
			let key = tokens[i..i + ORDER]
				.iter()
				.map(AsRef::as_ref)
				.collect::<Vec<_>>()
				.join(" ");
			let successor = tokens[i + ORDER].as_ref();

			if !self.states.contains_key(&key) {
				self.keys.push(key.clone());
			}
			self.states.entry(key).or_default().add_successor(successor);
		}
	}

	/// Returns the successors recorded for `key`, or an empty slice if the
	/// key was never seen.
	pub fn successors(&self, key: &str) -> &[String] {
		self.states.get(key).map(State::successors).unwrap_or(&[])
	}

	/// Picks the next token after `key`, uniformly over its successors.
	///
	/// Returns `None` on a dead end.
	pub fn predict<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> Option<&str> {
		self.states.get(key)?.predict(rng)
	}

	/// Returns a key chosen uniformly among all keys.
	///
	/// Returns `None` if the chain is empty.
	pub fn random_key<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		self.keys.choose(rng).map(String::as_str)
	}

	/// Returns every key whose first token starts with `seed`,
	/// ignoring case.
	pub fn keys_starting_with(&self, seed: &str) -> Vec<&str> {
		let seed = seed.to_lowercase();
		self.keys
			.iter()
			.filter(|key| {
				key.split(' ')
					.next()
					.is_some_and(|first| first.to_lowercase().starts_with(&seed))
			})
			.map(String::as_str)
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::tokenizer::tokenize_corpus;

	#[test]
	fn sequences_can_be_added_in_pieces() {
		let mut chain = Chain::default();
		chain.add_tokens(&["a", "b", "c"]);
		chain.add_tokens(&["a", "b", "d"]);
		chain.add_tokens(&["x", "y"]);
		assert_eq!(chain.keys().collect::<Vec<_>>(), ["a b"]);
		assert_eq!(chain.successors("a b"), ["c", "d"]);
		// No key spans two pieces
		assert!(chain.successors("b c").is_empty());
	}

	#[test]
	fn short_sequences_build_nothing() {
		assert!(Chain::from_tokens::<&str>(&[]).is_empty());
		assert!(Chain::from_tokens(&["a", "b"]).is_empty());
		assert_eq!(Chain::from_tokens(&["a", "b", "c"]).len(), 1);
	}

	#[test]
	fn successors_keep_repetitions() {
		let corpus = ["the cat sat", "the cat ran", "the cat slept"];
		let chain = Chain::from_tokens(&tokenize_corpus(&corpus));

		assert_eq!(chain.successors("the cat"), ["sat", "ran", "slept"]);
		assert_eq!(chain.successors("cat sat"), ["the"]);
		assert!(chain.successors("cat slept").is_empty());
		assert_eq!(
			chain.keys().collect::<Vec<_>>(),
			["the cat", "cat sat", "sat the", "cat ran", "ran the"]
		);
	}

	#[test]
	fn frequency_is_encoded_by_repetition() {
		let chain = Chain::from_tokens(&["a", "b", "c", "a", "b", "c", "a", "b", "d"]);
		assert_eq!(chain.successors("a b"), ["c", "c", "d"]);
	}

	#[test]
	fn seed_filter_matches_first_token_prefix() {
		let chain = Chain::from_tokens(&["the", "cat", "sat", "then", "they", "ran", "away"]);
		assert_eq!(chain.keys_starting_with("THE"), ["the cat", "then they", "they ran"]);
		assert_eq!(chain.keys_starting_with("ca"), ["cat sat"]);
		assert!(chain.keys_starting_with("zebra").is_empty());
	}
}
