use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::BackendError;
use crate::io;

/// Durable storage of group corpora.
///
/// Corpora are exchanged as ordered lists of strings; implementations must
/// preserve order. Calls are synchronous and may fail.
pub trait CorpusBackend: Send + Sync {
	/// Loads a group's corpus. An unknown group is an empty corpus, not an
	/// error.
	fn load(&self, group: &str) -> Result<Vec<String>, BackendError>;

	/// Replaces a group's persisted corpus.
	fn save(&self, group: &str, entries: &[String]) -> Result<(), BackendError>;

	/// Deletes a group's persisted corpus.
	fn remove(&self, group: &str) -> Result<(), BackendError> {
		self.save(group, &[])
	}
}

impl<B: CorpusBackend + ?Sized> CorpusBackend for Arc<B> {
	fn load(&self, group: &str) -> Result<Vec<String>, BackendError> {
		(**self).load(group)
	}

	fn save(&self, group: &str, entries: &[String]) -> Result<(), BackendError> {
		(**self).save(group, entries)
	}

	fn remove(&self, group: &str) -> Result<(), BackendError> {
		(**self).remove(group)
	}
}

/// In-process backend.
///
/// Nothing survives the process, but the store behaves exactly as with a
/// durable backend. Can be switched offline to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
	corpora: Mutex<HashMap<String, Vec<String>>>,
	offline: Mutex<bool>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// When offline, every call fails with [`BackendError::Unavailable`].
	pub fn set_offline(&self, offline: bool) {
		if let Ok(mut flag) = self.offline.lock() {
			*flag = offline;
		}
	}

	/// Returns the persisted corpus of a group, bypassing the offline flag.
	pub fn persisted(&self, group: &str) -> Option<Vec<String>> {
		self.corpora.lock().ok()?.get(group).cloned()
	}

	fn check_online(&self) -> Result<(), BackendError> {
		match self.offline.lock() {
			Ok(flag) if !*flag => Ok(()),
			Ok(_) => Err(BackendError::Unavailable("memory backend is offline".to_owned())),
			Err(_) => Err(BackendError::Unavailable("memory backend lock poisoned".to_owned())),
		}
	}
}

impl CorpusBackend for MemoryBackend {
	fn load(&self, group: &str) -> Result<Vec<String>, BackendError> {
		self.check_online()?;
		let corpora = self
			.corpora
			.lock()
			.map_err(|_| BackendError::Unavailable("memory backend lock poisoned".to_owned()))?;
		Ok(corpora.get(group).cloned().unwrap_or_default())
	}

	fn save(&self, group: &str, entries: &[String]) -> Result<(), BackendError> {
		self.check_online()?;
		let mut corpora = self
			.corpora
			.lock()
			.map_err(|_| BackendError::Unavailable("memory backend lock poisoned".to_owned()))?;
		corpora.insert(group.to_owned(), entries.to_vec());
		Ok(())
	}

	fn remove(&self, group: &str) -> Result<(), BackendError> {
		self.check_online()?;
		let mut corpora = self
			.corpora
			.lock()
			.map_err(|_| BackendError::Unavailable("memory backend lock poisoned".to_owned()))?;
		corpora.remove(group);
		Ok(())
	}
}

/// File backend: one JSON array per group in a data directory.
///
/// - `<folder>/<encoded group>.json`, see [`io::encode_group`]
/// - Writes go to a temporary file renamed over the target, so a crash
///   never leaves a half-written corpus
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
	folder: PathBuf,
}

impl JsonFileBackend {
	pub const EXTENSION: &'static str = "json";

	/// Opens (and creates if needed) a data directory.
	///
	/// # Errors
	/// Returns an error if the directory cannot be created.
	pub fn new<P: AsRef<Path>>(folder: P) -> Result<Self, BackendError> {
		let folder = io::normalize_folder(folder.as_ref());
		fs::create_dir_all(&folder)?;
		Ok(Self { folder })
	}

	/// Lists every group with a persisted corpus.
	///
	/// Files whose name is not a valid group encoding are skipped.
	pub fn list_groups(&self) -> Result<Vec<String>, BackendError> {
		Ok(io::list_files(&self.folder, Self::EXTENSION)?
			.into_iter()
			.filter_map(|path| io::get_group(path).ok())
			.collect())
	}

	fn path(&self, group: &str) -> Result<PathBuf, BackendError> {
		if group.is_empty() {
			return Err(BackendError::InvalidGroup(group.to_owned()));
		}
		Ok(io::build_group_path(&self.folder, group, Self::EXTENSION))
	}
}

impl CorpusBackend for JsonFileBackend {
	fn load(&self, group: &str) -> Result<Vec<String>, BackendError> {
		let path = self.path(group)?;
		if !path.exists() {
			return Ok(Vec::new());
		}
		let bytes = fs::read(path)?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	fn save(&self, group: &str, entries: &[String]) -> Result<(), BackendError> {
		let path = self.path(group)?;
		let tmp = path.with_extension("json.tmp");
		fs::write(&tmp, serde_json::to_vec(entries)?)?;
		fs::rename(tmp, path)?;
		Ok(())
	}

	fn remove(&self, group: &str) -> Result<(), BackendError> {
		let path = self.path(group)?;
		match fs::remove_file(path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}
