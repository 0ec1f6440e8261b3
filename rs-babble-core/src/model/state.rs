use rand::Rng;
use rand::seq::IndexedRandom;

/// Represents a state in the word chain.
///
/// A `State` corresponds to one key (two consecutive tokens joined by a
/// single space) and stores every token observed right after it.
///
/// Conceptually, this is a node in a Markov chain. Unlike a counted
/// transition table, successors are kept as a plain list: a token seen
/// twice appears twice and is therefore twice as likely to be picked.
///
/// The key itself lives in the owning `Chain`.
///
/// ## Invariants
/// - All successors were observed after the state's key
/// - A state stored in a `Chain` always has at least one successor
#[derive(Clone, Debug, Default)]
pub struct State {
	/// Observed successors, in observation order, repetitions included.
	successors: Vec<String>,
}

impl State {
	/// Returns the observed successors, repetitions included.
	pub fn successors(&self) -> &[String] {
		&self.successors
	}

	/// Records one more occurrence of `token` following this key.
	pub fn add_successor(&mut self, token: &str) {
		self.successors.push(token.to_owned());
	}

	/// Picks the next token uniformly over the successor list.
	///
	/// Since repeated observations are stored repeatedly, this is a
	/// frequency-weighted pick over distinct tokens.
	///
	/// Returns `None` if the state has no successors.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		self.successors.choose(rng).map(String::as_str)
	}
}
