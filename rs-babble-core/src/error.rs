use thiserror::Error;

/// Failure reported by a [`CorpusBackend`](crate::corpus::CorpusBackend).
#[derive(Debug, Error)]
pub enum BackendError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Invalid corpus encoding: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid group id: {0:?}")]
	InvalidGroup(String),

	#[error("Backend unavailable: {0}")]
	Unavailable(String),
}

/// Failure reported by the corpus store.
///
/// A `Save` or `Remove` error is recoverable: the in-memory corpus already
/// reflects the operation and only its durable copy is stale. A `Load`
/// error means nothing changed; the call can simply be retried.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Cannot learn an empty message")]
	EmptyText,

	#[error("Failed to load corpus of group {group:?}: {source}")]
	Load {
		group: String,
		#[source]
		source: BackendError,
	},

	#[error("Failed to persist corpus of group {group:?}: {source}")]
	Save {
		group: String,
		#[source]
		source: BackendError,
	},

	#[error("Failed to delete corpus of group {group:?}: {source}")]
	Remove {
		group: String,
		#[source]
		source: BackendError,
	},
}
