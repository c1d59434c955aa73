use std::collections::HashMap;

use serde_json::Value;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use lodestar_domain::{markup, snippet};
use lodestar_storage::{
	Metadata,
	models::MessageRecord,
	vector::{EMAILS_COLLECTION, QueryOutput, VectorCollection},
};

use crate::{LodestarService, ServiceError, ServiceResult, index};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub owner_id: String,
	pub query: String,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub folder: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub contact_id: Option<Uuid>,
	#[serde(default, with = "crate::time_serde::option")]
	pub sent_after: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub sent_before: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
	pub id: Uuid,
	pub title: String,
	pub snippet: String,
	#[serde(with = "crate::time_serde")]
	pub sent_at: OffsetDateTime,
	pub from_address: String,
	pub to_addresses: Vec<String>,
	/// `1 - distance`; 1.0 is an identical match.
	pub score: f32,
	pub metadata: Metadata,
}

impl LodestarService {
	/// Tenant-scoped similarity search over indexed messages, hydrated into
	/// authoritative records with ranked, snippeted results.
	///
	/// Search is advisory: backend failures degrade to an empty list. Only a
	/// malformed request or an unresolvable collection surfaces as an error.
	pub async fn search(&self, req: SearchRequest) -> ServiceResult<Vec<SearchResult>> {
		let owner_id = req.owner_id.trim();

		if owner_id.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "owner_id is required.".to_string(),
			});
		}
		if req.query.trim().is_empty() {
			return Err(ServiceError::InvalidRequest { message: "query is required.".to_string() });
		}

		let limit = req.limit.unwrap_or(self.cfg.search.default_limit).max(1);
		let filter = build_filter(owner_id, &req);
		let collection = self.registry.get(EMAILS_COLLECTION).await?;
		let Some(output) =
			self.query_with_retry(collection.as_ref(), req.query.trim(), &filter, limit).await
		else {
			return Ok(Vec::new());
		};

		if output.ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut results = self.hydrate(owner_id, &req, &output).await;

		results.sort_by(|a, b| {
			b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
		});
		results.truncate(limit as usize);

		Ok(results)
	}

	/// Bounded retry around one similarity query. `None` after exhaustion
	/// means "no results", not an error.
	async fn query_with_retry(
		&self,
		collection: &dyn VectorCollection,
		query: &str,
		filter: &Metadata,
		limit: u32,
	) -> Option<QueryOutput> {
		let attempts = self.cfg.search.retry_attempts;

		for attempt in 0..attempts {
			match collection.query(query, filter, limit).await {
				Ok(output) => return Some(output),
				Err(err) => {
					warn!(attempt, error = %err, "Similarity query failed.");

					if attempt + 1 < attempts {
						let backoff = self.cfg.search.retry_backoff_ms * 2_u64.pow(attempt);

						tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
					}
				},
			}
		}

		warn!("Similarity query exhausted retries. Returning no results.");

		None
	}

	/// Re-reads each hit from the authoritative store, owner-scoped again so
	/// a mis-indexed hit for another tenant can never leak through. Hits
	/// whose record vanished are dropped.
	async fn hydrate(
		&self,
		owner_id: &str,
		req: &SearchRequest,
		output: &QueryOutput,
	) -> Vec<SearchResult> {
		let mut wanted = Vec::with_capacity(output.ids.len());

		for raw_id in &output.ids {
			match Uuid::parse_str(raw_id) {
				Ok(id) => wanted.push(id),
				Err(_) => warn!(id = raw_id.as_str(), "Dropping hit with a non-UUID id."),
			}
		}

		if wanted.is_empty() {
			return Vec::new();
		}

		let fetched = match self
			.records
			.fetch_messages(owner_id, Some(&wanted), 1, wanted.len() as u32)
			.await
		{
			Ok(rows) => rows,
			Err(err) => {
				warn!(error = %err, "Hydration fetch failed. Returning no results.");

				return Vec::new();
			},
		};
		let by_id: HashMap<Uuid, MessageRecord> =
			fetched.into_iter().map(|record| (record.message_id, record)).collect();
		let query = req.query.trim();
		let mut results = Vec::new();

		for (rank, raw_id) in output.ids.iter().enumerate() {
			let Ok(id) = Uuid::parse_str(raw_id) else {
				continue;
			};
			let Some(record) = by_id.get(&id) else {
				continue;
			};

			// The backend filter is equality-only; the date range applies here.
			if !within_date_range(record.sent_at, req.sent_after, req.sent_before) {
				continue;
			}

			let score = output
				.distances
				.get(rank)
				.copied()
				.flatten()
				.map(|distance| 1.0 - distance)
				.unwrap_or(0.0);
			let body = markup::strip_markup(&record.body);
			let stored = output.metadatas.get(rank).cloned().unwrap_or_default();

			results.push(SearchResult {
				id,
				title: record.subject.clone(),
				snippet: snippet::build_snippet(&body, query),
				sent_at: record.sent_at,
				from_address: record.from_address.clone(),
				to_addresses: record.to_addresses.clone(),
				score,
				metadata: merge_metadata(stored, index::message_metadata(record)),
			});
		}

		results
	}
}

/// Flat equality filter sent to the backend; the owner scope is never
/// optional.
fn build_filter(owner_id: &str, req: &SearchRequest) -> Metadata {
	let mut filter = Metadata::new();

	filter.insert("owner_id".to_string(), Value::String(owner_id.to_string()));

	if let Some(folder) = req.folder.as_ref().filter(|folder| !folder.is_empty()) {
		filter.insert("folder".to_string(), Value::String(folder.clone()));
	}
	if let Some(status) = req.status.as_ref().filter(|status| !status.is_empty()) {
		filter.insert("status".to_string(), Value::String(status.clone()));
	}
	if let Some(contact_id) = req.contact_id {
		filter.insert("contact_id".to_string(), Value::String(contact_id.to_string()));
	}

	filter
}

fn within_date_range(
	sent_at: OffsetDateTime,
	after: Option<OffsetDateTime>,
	before: Option<OffsetDateTime>,
) -> bool {
	if let Some(after) = after
		&& sent_at < after
	{
		return false;
	}
	if let Some(before) = before
		&& sent_at > before
	{
		return false;
	}

	true
}

/// Stored snapshot overlaid by the authoritative envelope; the authoritative
/// store wins on conflicting keys.
fn merge_metadata(stored: Metadata, authoritative: Metadata) -> Metadata {
	let mut merged = stored;

	for (key, value) in authoritative {
		merged.insert(key, value);
	}

	merged
}
