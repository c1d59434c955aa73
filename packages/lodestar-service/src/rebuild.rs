use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use lodestar_storage::models::DocumentKind;

use crate::LodestarService;

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct RebuildOutcome {
	pub success: bool,
	pub processed_count: u64,
}

struct PageOutcome {
	fetched: usize,
	indexed: u64,
}

impl LodestarService {
	/// Rebuilds one tenant's index for a document kind from the
	/// authoritative store: purge stale vectors, then re-embed every record,
	/// page by page. Never errors — the structured outcome reports whether
	/// the rebuild ran and how many records were re-indexed, so a scheduler
	/// can poll it instead of catching.
	///
	/// Safe to re-run after an interruption: upserts are idempotent and
	/// deletes tolerant, so a second pass converges to the same index.
	pub async fn rebuild_index(&self, owner_id: &str, kind: DocumentKind) -> RebuildOutcome {
		self.ensure_ready().await;

		let collection = kind.collection_name();
		let ids = match self.list_ids(owner_id, kind).await {
			Ok(ids) => ids,
			Err(err) => {
				warn!(owner_id, collection, error = %err, "Cannot enumerate records. Aborting rebuild.");

				return RebuildOutcome { success: false, processed_count: 0 };
			},
		};
		let total = ids.len();
		let stale: Vec<String> = ids.iter().map(Uuid::to_string).collect();

		// The re-embed below converges the index whether or not the purge
		// lands; a failed purge only leaves it more work.
		if !self.delete_documents(collection, &stale).await {
			warn!(owner_id, collection, "Stale vector purge incomplete. Proceeding.");
		}
		if !self.purge_owner(collection, owner_id).await {
			warn!(owner_id, collection, "Orphan purge incomplete. Proceeding.");
		}

		let page_size = self.cfg.rebuild.page_size;
		let mut processed = 0_u64;
		let mut page = 1_u32;

		loop {
			let outcome = match self.index_page(owner_id, kind, page, page_size).await {
				Ok(outcome) => outcome,
				Err(err) if page == 1 => {
					warn!(owner_id, collection, error = %err, "First page fetch failed. Aborting rebuild.");

					return RebuildOutcome { success: false, processed_count: 0 };
				},
				Err(err) => {
					warn!(owner_id, collection, page, error = %err, "Page fetch failed. Stopping early.");

					break;
				},
			};

			if outcome.fetched == 0 {
				break;
			}

			processed += outcome.indexed;

			info!(owner_id, collection, processed, total, "Reindex progress.");

			// Pace the embedding backend between pages.
			tokio::time::sleep(Duration::from_millis(self.cfg.rebuild.page_delay_ms)).await;

			page += 1;
		}

		RebuildOutcome { success: true, processed_count: processed }
	}

	async fn list_ids(
		&self,
		owner_id: &str,
		kind: DocumentKind,
	) -> lodestar_storage::Result<Vec<Uuid>> {
		match kind {
			DocumentKind::Message => self.records.list_message_ids(owner_id).await,
			DocumentKind::Contact => self.records.list_contact_ids(owner_id).await,
			DocumentKind::Template => self.records.list_template_ids(owner_id).await,
		}
	}

	/// Fetches one page and re-indexes each record. Per-record failures are
	/// logged by the mutator and skipped here; only the fetch itself can
	/// fail the page.
	async fn index_page(
		&self,
		owner_id: &str,
		kind: DocumentKind,
		page: u32,
		page_size: u32,
	) -> lodestar_storage::Result<PageOutcome> {
		let mut indexed = 0_u64;
		let fetched = match kind {
			DocumentKind::Message => {
				let rows = self.records.fetch_messages(owner_id, None, page, page_size).await?;

				for record in &rows {
					if self.index_message(record).await {
						indexed += 1;
					}
				}

				rows.len()
			},
			DocumentKind::Contact => {
				let rows = self.records.fetch_contacts(owner_id, None, page, page_size).await?;

				for record in &rows {
					if self.index_contact(record).await {
						indexed += 1;
					}
				}

				rows.len()
			},
			DocumentKind::Template => {
				let rows = self.records.fetch_templates(owner_id, None, page, page_size).await?;

				for record in &rows {
					if self.index_template(record).await {
						indexed += 1;
					}
				}

				rows.len()
			},
		};

		Ok(PageOutcome { fetched, indexed })
	}
}
