use tracing::warn;

use lodestar_storage::Metadata;

use crate::LodestarService;

/// Backend requests carry at most this many ids per delete call.
const DELETE_BATCH_SIZE: usize = 100;

impl LodestarService {
	/// Inserts one document. Failures are logged and reported as `false`,
	/// never propagated; the vector index is a derived cache and every write
	/// into it is best-effort.
	pub async fn add_document(
		&self,
		collection: &str,
		id: &str,
		text: &str,
		metadata: Metadata,
	) -> bool {
		let handle = match self.registry.get(collection).await {
			Ok(handle) => handle,
			Err(err) => {
				warn!(collection, id, error = %err, "Collection unavailable for add.");

				return false;
			},
		};
		let ids = [id.to_string()];
		let documents = [text.to_string()];
		let metadatas = [metadata];

		match handle.add(&ids, &documents, &metadatas).await {
			Ok(()) => true,
			Err(err) => {
				warn!(collection, id, error = %err, "Document add failed.");

				false
			},
		}
	}

	/// Updates one document, falling back to an insert when the backend has
	/// no such id — an index that drifted behind the authoritative store
	/// heals itself on the next write.
	///
	/// Concurrent updates for the same id converge to a valid stored state,
	/// not necessarily the last caller's; serialize writes per id when strict
	/// ordering matters.
	pub async fn update_document(
		&self,
		collection: &str,
		id: &str,
		text: &str,
		metadata: Metadata,
	) -> bool {
		let handle = match self.registry.get(collection).await {
			Ok(handle) => handle,
			Err(err) => {
				warn!(collection, id, error = %err, "Collection unavailable for update.");

				return false;
			},
		};
		let ids = [id.to_string()];
		let documents = [text.to_string()];
		let metadatas = [metadata.clone()];

		match handle.update(&ids, &documents, &metadatas).await {
			Ok(()) => true,
			Err(err) if err.is_not_found() => self.add_document(collection, id, text, metadata).await,
			Err(err) => {
				warn!(collection, id, error = %err, "Document update failed.");

				false
			},
		}
	}

	pub async fn delete_document(&self, collection: &str, id: &str) -> bool {
		let ids = [id.to_string()];

		self.delete_documents(collection, &ids).await
	}

	/// Removes documents in fixed-size batches. A failed batch is logged and
	/// the remaining batches still run; returns `true` only when every batch
	/// succeeded.
	pub async fn delete_documents(&self, collection: &str, ids: &[String]) -> bool {
		if ids.is_empty() {
			return true;
		}

		let handle = match self.registry.get(collection).await {
			Ok(handle) => handle,
			Err(err) => {
				warn!(collection, error = %err, "Collection unavailable for delete.");

				return false;
			},
		};
		let mut all_ok = true;

		for batch in ids.chunks(DELETE_BATCH_SIZE) {
			if let Err(err) = handle.delete(batch).await {
				warn!(
					collection,
					batch_len = batch.len(),
					error = %err,
					"Delete batch failed. Continuing with remaining batches."
				);
				all_ok = false;
			}
		}

		all_ok
	}

	/// Removes every document stored under `owner_id`, including orphans
	/// whose authoritative record no longer exists.
	pub async fn purge_owner(&self, collection: &str, owner_id: &str) -> bool {
		let handle = match self.registry.get(collection).await {
			Ok(handle) => handle,
			Err(err) => {
				warn!(collection, owner_id, error = %err, "Collection unavailable for purge.");

				return false;
			},
		};
		let mut filter = Metadata::new();

		filter.insert("owner_id".to_string(), serde_json::Value::String(owner_id.to_string()));

		match handle.delete_where(&filter).await {
			Ok(()) => true,
			Err(err) => {
				warn!(collection, owner_id, error = %err, "Owner purge failed.");

				false
			},
		}
	}
}
