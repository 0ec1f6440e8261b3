use super::chain::{Chain, ORDER};
use super::tokenizer::contains_url;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// Default number of walk iterations.
pub const DEFAULT_MAX_LEN: usize = 25;

/// Hard bound on walk iterations, restarts included. Guarantees termination
/// on degenerate chains and must not be tuned.
pub const MAX_ATTEMPTS: usize = 100;

/// A dead end before this many output tokens triggers a restart instead of
/// ending the walk.
pub const MIN_TOKENS_BEFORE_STOP: usize = 5;

/// Separator inserted in the output when the walk restarts from a new key.
pub const RESTART_SEPARATOR: &str = "...";

/// Cleaned output never exceeds this many characters.
pub const MAX_OUTPUT_CHARS: usize = 200;

/// Truncation only backs up to a whitespace found past this character.
const MIN_CUT_CHARS: usize = 100;

pub const INSUFFICIENT_DATA: &str = "insufficient data";
pub const GENERATION_FAILED: &str = "generation failed";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static INNER_PERIOD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([^\s.])").expect("period pattern is valid"));

/// Outcome of a generation request.
///
/// None of these are errors: callers branch on the variant (or compare the
/// rendered string against the sentinels) rather than on a `Result`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
	/// Cleaned generated text.
	Text(String),
	/// The corpus is empty, too short, or yields no chain keys.
	InsufficientData,
	/// The walk produced nothing once cleaned.
	GenerationFailed,
}

impl Reply {
	/// Returns the text, or the sentinel string for the edge variants.
	pub fn as_str(&self) -> &str {
		match self {
			Reply::Text(text) => text,
			Reply::InsufficientData => INSUFFICIENT_DATA,
			Reply::GenerationFailed => GENERATION_FAILED,
		}
	}

	pub fn is_text(&self) -> bool {
		matches!(self, Reply::Text(_))
	}

	pub fn into_string(self) -> String {
		match self {
			Reply::Text(text) => text,
			other => other.as_str().to_owned(),
		}
	}
}

impl fmt::Display for Reply {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Walks `chain` to produce a reply of at most `max_len` walk iterations.
///
/// # Start key
/// With a `seed_word`, the start key is drawn uniformly among keys whose
/// first token starts with it (ignoring case). Without a seed, or when no
/// key matches, it is drawn uniformly among all keys.
///
/// # Walk
/// Each iteration looks up the successors of the last [`ORDER`] output
/// tokens:
/// - a successor exists: one is appended, picked uniformly over the list
/// - dead end with fewer than [`MIN_TOKENS_BEFORE_STOP`] tokens: the walk
///   restarts from a random key, appending [`RESTART_SEPARATOR`] and the
///   key's tokens
/// - dead end otherwise: the walk stops
///
/// Every iteration, restarts included, counts against [`MAX_ATTEMPTS`].
///
/// # Notes
/// - Pure: the only source of variation is `rng`.
/// - Returns [`Reply::InsufficientData`] on an empty chain.
pub fn generate<R: Rng + ?Sized>(chain: &Chain, max_len: usize, seed_word: Option<&str>, rng: &mut R) -> Reply {
	let Some(start) = pick_start_key(chain, seed_word, rng) else {
		return Reply::InsufficientData;
	};

	let mut output: Vec<String> = start.split(' ').map(str::to_owned).collect();

	let mut attempts = 0;
	for _ in 0..max_len {
		if attempts >= MAX_ATTEMPTS {
			break;
		}
		attempts += 1;

		let key = output[output.len().saturating_sub(ORDER)..].join(" ");
		if let Some(next) = chain.predict(&key, rng) {
			output.push(next.to_owned());
			continue;
		}

		if output.len() >= MIN_TOKENS_BEFORE_STOP {
			break;
		}

		// Restart from anywhere in the chain
		let Some(restart) = chain.random_key(rng) else {
			break;
		};
		output.push(RESTART_SEPARATOR.to_owned());
		output.extend(restart.split(' ').map(str::to_owned));
	}

	let cleaned = clean_output(&output.join(" "));
	if cleaned.is_empty() {
		Reply::GenerationFailed
	} else {
		Reply::Text(cleaned)
	}
}

fn pick_start_key<'a, R: Rng + ?Sized>(chain: &'a Chain, seed_word: Option<&str>, rng: &mut R) -> Option<&'a str> {
	if let Some(seed) = seed_word.filter(|s| !s.is_empty()) {
		let candidates = chain.keys_starting_with(seed);
		if !candidates.is_empty() {
			let index = rng.random_range(0..candidates.len());
			return Some(candidates[index]);
		}
	}
	chain.random_key(rng)
}

/// Normalizes raw walk output.
///
/// - Whitespace runs collapse to one space
/// - Leading and trailing whitespace is trimmed
/// - A period glued to the next word gets one space after it
///   (`end.start` becomes `end. start`); tokens holding a URL are left
///   whole, and runs of periods such as [`RESTART_SEPARATOR`] are kept
/// - Text longer than [`MAX_OUTPUT_CHARS`] is cut to that length, then
///   backed up to the last whitespace if it lies past character 100
pub fn clean_output(raw: &str) -> String {
	let collapsed = WHITESPACE_RE.replace_all(raw, " ");
	let spaced = collapsed
		.trim()
		.split(' ')
		.map(|token| {
			if contains_url(token) {
				Cow::Borrowed(token)
			} else {
				INNER_PERIOD_RE.replace_all(token, ". ${1}")
			}
		})
		.collect::<Vec<_>>()
		.join(" ");
	let trimmed = spaced.as_str();

	if trimmed.chars().count() <= MAX_OUTPUT_CHARS {
		return trimmed.to_owned();
	}

	let cut: String = trimmed.chars().take(MAX_OUTPUT_CHARS).collect();
	let boundary = cut
		.char_indices()
		.filter(|(_, c)| c.is_whitespace())
		.map(|(byte, _)| byte)
		.last();

	match boundary {
		Some(byte) if cut[..byte].chars().count() > MIN_CUT_CHARS => cut[..byte].trim_end().to_owned(),
		_ => cut.trim_end().to_owned(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::tokenizer::tokenize_corpus;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn cat_chain() -> Chain {
		Chain::from_tokens(&tokenize_corpus(&["the cat sat", "the cat ran", "the cat slept"]))
	}

	#[test]
	fn empty_chain_is_insufficient_data() {
		let chain = Chain::from_tokens::<&str>(&[]);
		let mut rng = StdRng::seed_from_u64(0);
		assert_eq!(generate(&chain, DEFAULT_MAX_LEN, None, &mut rng), Reply::InsufficientData);
	}

	#[test]
	fn seed_word_selects_matching_key() {
		let chain = cat_chain();
		for seed in 0..50 {
			let mut rng = StdRng::seed_from_u64(seed);
			let reply = generate(&chain, 5, Some("the"), &mut rng);
			let tokens: Vec<&str> = reply.as_str().split(' ').collect();
			assert_eq!(&tokens[..2], ["the", "cat"]);
			assert!(["sat", "ran", "slept"].contains(&tokens[2]), "unexpected third token {:?}", tokens[2]);
		}
	}

	#[test]
	fn unmatched_seed_falls_back_to_any_key() {
		let chain = cat_chain();
		let mut rng = StdRng::seed_from_u64(3);
		assert!(generate(&chain, 5, Some("zebra"), &mut rng).is_text());
	}

	#[test]
	fn same_seed_same_output() {
		let chain = cat_chain();
		let first = generate(&chain, DEFAULT_MAX_LEN, None, &mut StdRng::seed_from_u64(42));
		let second = generate(&chain, DEFAULT_MAX_LEN, None, &mut StdRng::seed_from_u64(42));
		assert_eq!(first, second);
	}

	#[test]
	fn dead_end_after_five_tokens_stops_the_walk() {
		// Only path: a b c d e f, dead end at "e f"
		let chain = Chain::from_tokens(&["a", "b", "c", "d", "e", "f"]);
		let mut rng = StdRng::seed_from_u64(9);
		let reply = generate(&chain, DEFAULT_MAX_LEN, Some("a"), &mut rng);
		assert_eq!(reply, Reply::Text("a b c d e f".to_owned()));
	}

	#[test]
	fn early_dead_end_restarts_with_separator() {
		// "x y" -> z, then "y z" is a dead end after three tokens
		let chain = Chain::from_tokens(&["x", "y", "z"]);
		let mut rng = StdRng::seed_from_u64(5);
		let reply = generate(&chain, DEFAULT_MAX_LEN, None, &mut rng);
		assert!(reply.as_str().starts_with("x y z ... x y z"), "got {reply}");
	}

	#[test]
	fn pathological_chain_terminates_within_attempts() {
		let chain = Chain::from_tokens(&["x", "y", "z"]);
		let mut rng = StdRng::seed_from_u64(11);
		let reply = generate(&chain, 10_000, None, &mut rng);
		assert!(reply.is_text());
		assert!(reply.as_str().chars().count() <= MAX_OUTPUT_CHARS);
	}

	#[test]
	fn max_len_bounds_the_walk() {
		let tokens: Vec<String> = (0..50).map(|i| format!("w{i}")).collect();
		let chain = Chain::from_tokens(&tokens);
		let reply = generate(&chain, 3, Some("w0"), &mut StdRng::seed_from_u64(1));
		assert_eq!(reply.as_str(), "w0 w1 w2 w3 w4");
	}

	#[test]
	fn urls_survive_generation() {
		let chain = Chain::from_tokens(&tokenize_corpus(&["check http://x.example.com/path now please reply soon"]));
		let reply = generate(&chain, DEFAULT_MAX_LEN, Some("check"), &mut StdRng::seed_from_u64(2));
		assert_eq!(reply.as_str(), "check http://x.example.com/path now please reply soon");
	}

	#[test]
	fn cleaning_collapses_whitespace_and_periods() {
		assert_eq!(clean_output("  hello   world.   bye \n"), "hello world. bye");
		assert_eq!(clean_output("see example.com now."), "see example.com now.");
		assert_eq!(clean_output("it ended.then  it began.again"), "it ended. then it began. again");
		assert_eq!(clean_output("see www.rust-lang.org/learn.html"), "see www.rust-lang.org/learn.html");
		assert_eq!(clean_output("   "), "");
	}

	#[test]
	fn long_output_is_cut_at_a_word_boundary() {
		let raw = vec!["abcdefghi"; 40].join(" ");
		let cleaned = clean_output(&raw);
		assert!(cleaned.chars().count() <= MAX_OUTPUT_CHARS);
		assert!(cleaned.split(' ').all(|word| word == "abcdefghi"));
	}

	#[test]
	fn dense_output_is_cut_hard() {
		let raw = format!("{} {}", "a".repeat(50), "b".repeat(300));
		let cleaned = clean_output(&raw);
		assert_eq!(cleaned.chars().count(), MAX_OUTPUT_CHARS);
	}

	#[test]
	fn sentinels_render_as_strings() {
		assert_eq!(Reply::InsufficientData.to_string(), INSUFFICIENT_DATA);
		assert_eq!(Reply::GenerationFailed.into_string(), GENERATION_FAILED);
		assert_eq!(Reply::Text("hi".into()).as_str(), "hi");
	}
}
