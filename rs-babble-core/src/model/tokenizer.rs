use once_cell::sync::Lazy;
use regex::Regex;

/// Joined corpus text shorter than this (in characters) yields no tokens.
pub const MIN_TEXT_LEN: usize = 10;

/// Private-use marker framing URL placeholders.
const MARKER: char = '\u{E000}';

/// URL-like substrings: explicit schemes, `www.` prefixes, or a run of
/// non-space characters ending in a common top-level domain (with an
/// optional path or query).
static URL_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(concat!(
		r"https?://\S+",
		r"|www\.\S+",
		r"|\S+\.(?:com|net|org|io|gg|co|dev|app|me|tv|xyz|edu|gov|info|ly|uk|de|fr|ru|jp)\b(?:[/?#]\S*)?",
	))
	.expect("URL pattern is valid")
});

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new("\u{E000}(\\d+)\u{E000}").expect("placeholder pattern is valid")
});

/// Joins corpus entries into the single lowercase text the tokenizer
/// consumes.
pub fn join_corpus<S: AsRef<str>>(entries: &[S]) -> String {
	entries
		.iter()
		.map(|entry| entry.as_ref().to_lowercase())
		.collect::<Vec<_>>()
		.join(" ")
}

/// Splits corpus text into tokens without ever breaking a URL apart.
///
/// The text is lowercased and stripped of the placeholder marker. Every URL
/// match is then swapped for an indexed placeholder, the result is split on
/// whitespace, and placeholders are restored to the URL text they stand for.
///
/// Returns an empty vector when the text is shorter than [`MIN_TEXT_LEN`]
/// characters; callers treat that as "insufficient data".
pub fn tokenize(text: &str) -> Vec<String> {
	// The marker only ever frames placeholders we insert ourselves
	let text = text.to_lowercase().replace(MARKER, "");
	if text.chars().count() < MIN_TEXT_LEN {
		return Vec::new();
	}

	let mut urls: Vec<String> = Vec::new();
	let protected = URL_RE.replace_all(&text, |caps: &regex::Captures| {
		urls.push(caps[0].to_owned());
		format!("{MARKER}{}{MARKER}", urls.len() - 1)
	});

	protected
		.split_whitespace()
		.map(|token| restore_urls(token, &urls))
		.collect()
}

/// Returns true if `token` contains anything the tokenizer keeps whole as
/// a URL.
pub(crate) fn contains_url(token: &str) -> bool {
	URL_RE.is_match(token)
}

/// Tokenizes a corpus snapshot: shorthand for `tokenize(&join_corpus(..))`.
pub fn tokenize_corpus<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
	tokenize(&join_corpus(entries))
}

fn restore_urls(token: &str, urls: &[String]) -> String {
	if !token.contains(MARKER) {
		return token.to_owned();
	}
	PLACEHOLDER_RE
		.replace_all(token, |caps: &regex::Captures| {
			caps[1]
				.parse::<usize>()
				.ok()
				.and_then(|index| urls.get(index))
				.cloned()
				.unwrap_or_default()
		})
		.into_owned()
}
