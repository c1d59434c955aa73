use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
};

use tracing::warn;

use crate::{
	Error, Result,
	vector::{KNOWN_COLLECTIONS, VectorCollection, VectorStore},
};

/// Process-wide cache of live collection handles. Each name is resolved
/// lazily, written once, and read thereafter.
pub struct CollectionRegistry {
	store: Arc<dyn VectorStore>,
	handles: RwLock<HashMap<String, Arc<dyn VectorCollection>>>,
}
impl CollectionRegistry {
	pub fn new(store: Arc<dyn VectorStore>) -> Self {
		Self { store, handles: RwLock::new(HashMap::new()) }
	}

	/// Resolves every known collection up front, creating the missing ones.
	/// Idempotent. Per-collection failures fold into one aggregate error;
	/// `get` re-attempts resolution per call, so a failed pass here never
	/// wedges the process.
	pub async fn ensure_initialized(&self) -> Result<()> {
		let existing = self.store.list_collections().await?;
		let mut failed = Vec::new();

		for (name, description) in KNOWN_COLLECTIONS {
			if self.cached(name).is_some() {
				continue;
			}

			let resolved = if existing.iter().any(|listed| listed == name) {
				self.store.get_collection(name).await
			} else {
				self.create_or_adopt(name, description).await
			};

			match resolved {
				Ok(handle) => self.cache(name, handle),
				Err(err) => {
					warn!(collection = name, error = %err, "Collection initialization failed.");
					failed.push(name.to_string());
				},
			}
		}

		if failed.is_empty() { Ok(()) } else { Err(Error::Init(failed.join(", "))) }
	}

	/// Returns the cached handle for `name`, resolving it on a miss and
	/// creating the collection when the backend has never seen it.
	pub async fn get(&self, name: &str) -> Result<Arc<dyn VectorCollection>> {
		if let Some(handle) = self.cached(name) {
			return Ok(handle);
		}

		let handle = match self.store.get_collection(name).await {
			Ok(handle) => handle,
			Err(err) if err.is_not_found() => {
				let description = KNOWN_COLLECTIONS
					.iter()
					.find(|(known, _)| *known == name)
					.map(|(_, description)| *description)
					.unwrap_or_default();

				self.create_or_adopt(name, description).await?
			},
			Err(err) => return Err(err),
		};

		self.cache(name, handle.clone());

		Ok(handle)
	}

	/// A create that loses a double-create race resolves to the collection
	/// the other caller made.
	async fn create_or_adopt(
		&self,
		name: &str,
		description: &str,
	) -> Result<Arc<dyn VectorCollection>> {
		match self.store.create_collection(name, description).await {
			Ok(handle) => Ok(handle),
			Err(err) if err.is_conflict() => self.store.get_collection(name).await,
			Err(err) => Err(err),
		}
	}

	fn cached(&self, name: &str) -> Option<Arc<dyn VectorCollection>> {
		let handles = self.handles.read().unwrap_or_else(|err| err.into_inner());

		handles.get(name).cloned()
	}

	fn cache(&self, name: &str, handle: Arc<dyn VectorCollection>) {
		let mut handles = self.handles.write().unwrap_or_else(|err| err.into_inner());

		// First writer wins when two callers resolved the same name.
		handles.entry(name.to_string()).or_insert(handle);
	}
}
