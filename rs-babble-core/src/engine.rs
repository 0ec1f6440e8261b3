use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusBackend, CorpusStore};
use crate::error::StoreError;
use crate::model::chain::Chain;
use crate::model::generator::{self, DEFAULT_MAX_LEN, Reply};

/// Reply policy owned by the caller.
///
/// The engine never decides on its own how often a seed is honored or how
/// long a reply may be; these are passed in on every request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyOptions {
	/// Maximum number of walk iterations.
	pub max_len: usize,

	/// Probability (0.0..=1.0) of steering the reply with a word from the
	/// seed text.
	pub seed_probability: f64,

	/// Shortest word (in characters) of the seed text eligible as a seed.
	pub min_seed_len: usize,
}

impl Default for ReplyOptions {
	fn default() -> Self {
		Self {
			max_len: DEFAULT_MAX_LEN,
			seed_probability: 1.0,
			min_seed_len: 3,
		}
	}
}

/// Entry point for a chat layer: learn messages, produce replies.
///
/// # Responsibilities
/// - Route inbound messages to the group's corpus
/// - Run snapshot → tokenize → chain → walk for replies
/// - Turn caller policy into a seed word
///
/// Filtering which messages to learn and deciding when to reply belong to
/// the caller.
pub struct Engine {
	store: CorpusStore,
}

impl Engine {
	pub fn new(store: CorpusStore) -> Self {
		Self { store }
	}

	/// Creates an engine over `backend` with the default capacity.
	pub fn with_backend<B: CorpusBackend + 'static>(backend: B) -> Self {
		Self::new(CorpusStore::new(backend))
	}

	pub fn store(&self) -> &CorpusStore {
		&self.store
	}

	/// Learns `text` for `group`.
	///
	/// Returns `Ok(false)` for a message already in the corpus.
	///
	/// # Errors
	/// See [`CorpusStore::insert`]. A [`StoreError::Save`] means the text
	/// was learned but not yet persisted; a [`StoreError::Load`] means it
	/// was not learned at all.
	pub fn ingest(&self, group: &str, text: &str) -> Result<bool, StoreError> {
		self.store.insert(group, text)
	}

	/// Generates a reply from the group's corpus.
	///
	/// # Behavior
	/// - With probability `options.seed_probability`, one word of
	///   `seed_text` at least `options.min_seed_len` characters long is
	///   picked as seed word
	/// - Returns [`Reply::InsufficientData`] when the group has nothing to
	///   build a chain from
	pub fn generate_reply<R: Rng + ?Sized>(
		&self,
		group: &str,
		seed_text: Option<&str>,
		options: &ReplyOptions,
		rng: &mut R,
	) -> Reply {
		let chain = self.store.chain(group);
		if chain.is_empty() {
			return Reply::InsufficientData;
		}

		let seed_word = seed_text.and_then(|text| pick_seed_word(text, options, rng));
		generator::generate(&chain, options.max_len, seed_word.as_deref(), rng)
	}

	/// Returns the chain currently backing replies for `group`.
	pub fn chain(&self, group: &str) -> Arc<Chain> {
		self.store.chain(group)
	}

	pub fn snapshot(&self, group: &str) -> Vec<String> {
		self.store.snapshot(group)
	}

	pub fn reset(&self, group: &str) -> Result<(), StoreError> {
		self.store.reset(group)
	}
}

/// Picks the seed word for a reply, or `None` to start anywhere.
fn pick_seed_word<R: Rng + ?Sized>(seed_text: &str, options: &ReplyOptions, rng: &mut R) -> Option<String> {
	let probability = options.seed_probability.clamp(0.0, 1.0);
	if probability <= 0.0 || (probability < 1.0 && !rng.random_bool(probability)) {
		return None;
	}

	let candidates: Vec<String> = seed_text
		.split_whitespace()
		.map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
		.filter(|word| word.chars().count() >= options.min_seed_len.max(1))
		.collect();
	if candidates.is_empty() {
		return None;
	}

	let index = rng.random_range(0..candidates.len());
	candidates.into_iter().nth(index)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::corpus::MemoryBackend;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn seed_words_respect_minimum_length() {
		let options = ReplyOptions { min_seed_len: 4, ..ReplyOptions::default() };
		let mut rng = StdRng::seed_from_u64(0);
		for _ in 0..20 {
			let word = pick_seed_word("hi, the Kitten!", &options, &mut rng);
			assert_eq!(word.as_deref(), Some("kitten"));
		}
		assert_eq!(pick_seed_word("a b c", &options, &mut rng), None);
	}

	#[test]
	fn zero_probability_never_seeds() {
		let options = ReplyOptions { seed_probability: 0.0, ..ReplyOptions::default() };
		let mut rng = StdRng::seed_from_u64(0);
		assert_eq!(pick_seed_word("kitten kitten", &options, &mut rng), None);
	}

	#[test]
	fn empty_group_has_insufficient_data() {
		let engine = Engine::with_backend(MemoryBackend::new());
		let mut rng = StdRng::seed_from_u64(0);
		let reply = engine.generate_reply("nobody", Some("hello there"), &ReplyOptions::default(), &mut rng);
		assert_eq!(reply, Reply::InsufficientData);
	}

	#[test]
	fn options_deserialize_with_defaults() {
		let options: ReplyOptions = serde_json::from_str(r#"{"max_len": 10}"#).unwrap();
		assert_eq!(options, ReplyOptions { max_len: 10, ..ReplyOptions::default() });
	}
}
