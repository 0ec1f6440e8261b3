use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rs_babble_core::ReplyOptions;
use rs_babble_core::corpus::DEFAULT_CAPACITY;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BabbleConfig {
	#[serde(default)]
	pub server: ServerConfig,
	#[serde(default)]
	pub corpus: CorpusConfig,
	#[serde(default)]
	pub reply: ReplyOptions,
}

impl BabbleConfig {
	/// Loads the configuration file, or defaults if there is none.
	pub fn load() -> Result<Self> {
		let config_path = resolve_config_path();
		if config_path.exists() {
			return Self::from_file(&config_path);
		}

		Ok(BabbleConfig::default())
	}

	pub fn from_file(config_path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(config_path)
			.with_context(|| format!("failed to read config file {}", config_path.display()))?;
		Self::from_toml(&raw).with_context(|| format!("failed to parse TOML from {}", config_path.display()))
	}

	pub fn from_toml(raw: &str) -> Result<Self> {
		let parsed: BabbleConfig = toml::from_str(raw)?;
		anyhow::ensure!(
			(0.0..=1.0).contains(&parsed.reply.seed_probability),
			"reply.seed_probability must be between 0.0 and 1.0, got {}",
			parsed.reply.seed_probability
		);
		Ok(parsed)
	}
}

fn resolve_config_path() -> PathBuf {
	if let Ok(path) = env::var("BABBLE_CONFIG") {
		return Path::new(&path).to_path_buf();
	}

	Path::new("./babble.toml").to_path_buf()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default = "default_workers")]
	pub workers: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			workers: default_workers(),
		}
	}
}

fn default_host() -> String {
	"127.0.0.1".to_owned()
}

fn default_port() -> u16 {
	5000
}

fn default_workers() -> usize {
	num_cpus::get()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
	#[serde(default = "default_data_dir")]
	pub data_dir: PathBuf,
	#[serde(default = "default_capacity")]
	pub capacity: usize,
	/// Messages shorter than this (after trimming) are not learned.
	#[serde(default = "default_min_message_len")]
	pub min_message_len: usize,
}

impl Default for CorpusConfig {
	fn default() -> Self {
		Self {
			data_dir: default_data_dir(),
			capacity: default_capacity(),
			min_message_len: default_min_message_len(),
		}
	}
}

fn default_data_dir() -> PathBuf {
	Path::new("./data").to_path_buf()
}

fn default_capacity() -> usize {
	DEFAULT_CAPACITY
}

fn default_min_message_len() -> usize {
	3
}
