//! Per-group learned text.
//!
//! Each group owns an ordered, deduplicated, capacity-bounded list of raw
//! messages. The store keeps one lock per group so that groups never
//! contend with each other while operations on the same group are
//! serialized.

mod backend;

pub use backend::{CorpusBackend, JsonFileBackend, MemoryBackend};

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, warn};

use crate::error::{BackendError, StoreError};
use crate::model::chain::Chain;
use crate::model::tokenizer::tokenize_corpus;

/// Default number of messages kept per group.
pub const DEFAULT_CAPACITY: usize = 2000;

/// Ordered, deduplicated, capacity-bounded message list.
///
/// # Invariants
/// - No two entries are equal (exact, case-sensitive comparison)
/// - `entries.len() <= capacity`
/// - `seen` holds exactly the strings in `entries`
#[derive(Clone, Debug)]
pub struct Corpus {
	capacity: usize,
	entries: VecDeque<String>,
	seen: HashSet<String>,
}

impl Corpus {
	/// Creates an empty corpus. A capacity of 0 is raised to 1.
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity: capacity.max(1),
			entries: VecDeque::new(),
			seen: HashSet::new(),
		}
	}

	/// Rebuilds a corpus from persisted entries, dropping duplicates and
	/// keeping only the newest `capacity` entries.
	pub fn from_entries<I: IntoIterator<Item = String>>(capacity: usize, entries: I) -> Self {
		let mut corpus = Self::new(capacity);
		for entry in entries {
			corpus.insert(entry);
		}
		corpus
	}

	/// Appends `text` unless it is already present.
	///
	/// Returns `false` for a duplicate. When the corpus grows past its
	/// capacity the oldest entries are evicted.
	pub fn insert(&mut self, text: String) -> bool {
		if self.seen.contains(&text) {
			return false;
		}
		self.seen.insert(text.clone());
		self.entries.push_back(text);

		while self.entries.len() > self.capacity {
			if let Some(evicted) = self.entries.pop_front() {
				self.seen.remove(&evicted);
			}
		}
		true
	}

	pub fn contains(&self, text: &str) -> bool {
		self.seen.contains(text)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Entries, oldest first.
	pub fn to_vec(&self) -> Vec<String> {
		self.entries.iter().cloned().collect()
	}
}

/// State of one group, guarded by its own lock.
#[derive(Debug, Default)]
struct GroupSlot {
	/// `None` until the persisted corpus has been loaded.
	corpus: Option<Corpus>,
	/// Chain built from the current corpus, dropped on every change.
	chain: Option<Arc<Chain>>,
}

/// Per-group corpus store backed by a [`CorpusBackend`].
///
/// # Responsibilities
/// - Deduplicate and cap each group's corpus
/// - Persist after every insert and reset
/// - Serve snapshots from memory after the first successful load
/// - Cache the chain built from each group's corpus
///
/// # Concurrency
/// The group arena lock is only held to find or create a group's slot;
/// all work happens under the slot's own lock.
pub struct CorpusStore {
	capacity: usize,
	backend: Box<dyn CorpusBackend>,
	groups: Mutex<HashMap<String, Arc<Mutex<GroupSlot>>>>,
}

impl CorpusStore {
	/// Creates a store with the default capacity.
	pub fn new<B: CorpusBackend + 'static>(backend: B) -> Self {
		Self::with_capacity(backend, DEFAULT_CAPACITY)
	}

	pub fn with_capacity<B: CorpusBackend + 'static>(backend: B, capacity: usize) -> Self {
		Self {
			capacity: capacity.max(1),
			backend: Box::new(backend),
			groups: Mutex::new(HashMap::new()),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Learns `text` for `group`.
	///
	/// - Returns `Ok(false)` if `text` is already in the corpus
	/// - Returns `Ok(true)` once the text is stored and persisted
	///
	/// # Errors
	/// - [`StoreError::EmptyText`] if `text` is empty
	/// - [`StoreError::Load`] if the persisted corpus could not be read; the
	///   text is not learned and nothing is written, so the next call retries
	/// - [`StoreError::Save`] if persisting failed; the text is still kept
	///   in memory and will be written by the next successful save
	pub fn insert(&self, group: &str, text: &str) -> Result<bool, StoreError> {
		if text.is_empty() {
			return Err(StoreError::EmptyText);
		}

		let slot = self.slot(group);
		let mut slot = lock(&slot);
		let corpus = self.load(group, &mut slot).map_err(|source| {
			error!("Failed to load corpus of group {group:?}, message not learned: {source}");
			StoreError::Load { group: group.to_owned(), source }
		})?;

		if !corpus.insert(text.to_owned()) {
			return Ok(false);
		}
		let entries = corpus.to_vec();
		slot.chain = None;

		self.backend.save(group, &entries).map_err(|source| {
			error!("Failed to persist corpus of group {group:?}: {source}");
			StoreError::Save { group: group.to_owned(), source }
		})?;
		Ok(true)
	}

	/// Returns a copy of the group's corpus, oldest first.
	///
	/// Unknown or reset groups yield an empty list. If the backend fails
	/// to load, the group is treated as empty for this call only.
	pub fn snapshot(&self, group: &str) -> Vec<String> {
		let Some(slot) = self.known_slot(group) else {
			return Vec::new();
		};
		let mut slot = lock(&slot);
		self.try_load(group, &mut slot).map(|corpus| corpus.to_vec()).unwrap_or_default()
	}

	/// Returns the chain for the group's current corpus, building it on
	/// first use after a change.
	pub fn chain(&self, group: &str) -> Arc<Chain> {
		let Some(slot) = self.known_slot(group) else {
			return Arc::new(Chain::default());
		};
		let mut slot = lock(&slot);
		if let Some(chain) = &slot.chain {
			return Arc::clone(chain);
		}

		let Some(corpus) = self.try_load(group, &mut slot) else {
			// Never cache a chain built while the backend was failing
			return Arc::new(Chain::default());
		};
		let chain = Arc::new(Chain::from_tokens(&tokenize_corpus(&corpus.to_vec())));
		debug!("Built chain for group {group:?}: {} keys from {} messages", chain.len(), corpus.len());
		slot.chain = Some(Arc::clone(&chain));
		chain
	}

	/// Deletes the group's corpus, in memory and in the backend.
	///
	/// # Errors
	/// [`StoreError::Remove`] if the backend failed; the group is still
	/// empty in memory.
	pub fn reset(&self, group: &str) -> Result<(), StoreError> {
		let slot = self.slot(group);
		let mut slot = lock(&slot);
		slot.corpus = Some(Corpus::new(self.capacity));
		slot.chain = None;

		self.backend.remove(group).map_err(|source| {
			error!("Failed to delete corpus of group {group:?}: {source}");
			StoreError::Remove { group: group.to_owned(), source }
		})
	}

	/// Finds or creates the group's slot.
	fn slot(&self, group: &str) -> Arc<Mutex<GroupSlot>> {
		let mut groups = lock(&self.groups);
		Arc::clone(groups.entry(group.to_owned()).or_default())
	}

	/// Finds the group's slot for a read.
	///
	/// A group seen for the first time gets a slot only if the backend has
	/// a non-empty corpus for it, so reads on unknown groups leave the
	/// arena as it was.
	fn known_slot(&self, group: &str) -> Option<Arc<Mutex<GroupSlot>>> {
		let existing = lock(&self.groups).get(group).cloned();
		if existing.is_some() {
			return existing;
		}

		let entries = match self.backend.load(group) {
			Ok(entries) if !entries.is_empty() => entries,
			Ok(_) => return None,
			Err(e) => {
				warn!("Failed to load corpus of group {group:?}, treating it as empty: {e}");
				return None;
			}
		};
		let corpus = Corpus::from_entries(self.capacity, entries);

		// Another caller may have created the slot meanwhile; theirs wins
		let mut groups = lock(&self.groups);
		let slot = groups.entry(group.to_owned()).or_insert_with(|| {
			Arc::new(Mutex::new(GroupSlot { corpus: Some(corpus), chain: None }))
		});
		Some(Arc::clone(slot))
	}

	/// Loads the persisted corpus into the slot if it is not there yet.
	///
	/// A failed load leaves the slot unloaded.
	fn load<'a>(&self, group: &str, slot: &'a mut GroupSlot) -> Result<&'a mut Corpus, BackendError> {
		if slot.corpus.is_none() {
			let entries = self.backend.load(group)?;
			slot.corpus = Some(Corpus::from_entries(self.capacity, entries));
		}
		Ok(slot.corpus.get_or_insert_with(|| Corpus::new(self.capacity)))
	}

	/// Like `load`, but a failure reads as "no corpus" for this call.
	fn try_load<'a>(&self, group: &str, slot: &'a mut GroupSlot) -> Option<&'a mut Corpus> {
		self.load(group, slot)
			.map_err(|e| warn!("Failed to load corpus of group {group:?}, treating it as empty: {e}"))
			.ok()
	}
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
