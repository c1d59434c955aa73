pub mod changes;
pub mod index;
pub mod mutate;
pub mod rebuild;
pub mod search;
pub mod time_serde;

use std::sync::Arc;

pub use changes::RecordChange;
pub use rebuild::RebuildOutcome;
pub use search::{SearchRequest, SearchResult};

use lodestar_config::Config;
use lodestar_storage::{records::RecordStore, registry::CollectionRegistry};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Storage { message: String },
	Vector { message: String },
}

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Vector { message } => write!(f, "Vector backend error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<lodestar_storage::Error> for ServiceError {
	fn from(err: lodestar_storage::Error) -> Self {
		match err {
			lodestar_storage::Error::Sqlx(err) => Self::Storage { message: err.to_string() },
			other => Self::Vector { message: other.to_string() },
		}
	}
}

/// The semantic indexing and retrieval service. Holds the process-wide
/// collection registry and the authoritative record store; every operation
/// is an async I/O call against one or both.
pub struct LodestarService {
	pub cfg: Config,
	pub records: Arc<dyn RecordStore>,
	pub registry: CollectionRegistry,
}
impl LodestarService {
	pub fn new(cfg: Config, records: Arc<dyn RecordStore>, registry: CollectionRegistry) -> Self {
		Self { cfg, records, registry }
	}

	/// Resolves the known collections, absorbing failures: the registry
	/// re-attempts resolution on every call, so a degraded start only delays
	/// readiness instead of wedging the process.
	pub async fn ensure_ready(&self) {
		if let Err(err) = self.registry.ensure_initialized().await {
			tracing::warn!(error = %err, "Collection initialization incomplete. Continuing.");
		}
	}
}
