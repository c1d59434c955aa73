use std::{sync::Arc, time::Duration};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
	BoxFuture, Error, Metadata, Result,
	vector::{QueryOutput, VectorCollection, VectorStore},
};

/// HTTP client for a Chroma-style vector backend. The backend embeds both
/// documents and query text itself; the model bound at collection creation
/// comes from config.
pub struct ChromaStore {
	client: Client,
	base_url: String,
	embedding_model: String,
}
impl ChromaStore {
	pub fn new(cfg: &lodestar_config::VectorBackend) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			client,
			base_url: cfg.url.trim_end_matches('/').to_string(),
			embedding_model: cfg.embedding_model.clone(),
		})
	}

	fn collections_url(&self) -> String {
		format!("{}/api/v1/collections", self.base_url)
	}

	fn handle(&self, info: CollectionInfo) -> Arc<dyn VectorCollection> {
		Arc::new(ChromaCollection {
			client: self.client.clone(),
			url: format!("{}/{}", self.collections_url(), info.id),
			name: info.name,
		})
	}
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
	id: String,
	name: String,
}

impl VectorStore for ChromaStore {
	fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(async move {
			let response = self.client.get(self.collections_url()).send().await?;
			let infos: Vec<CollectionInfo> = check(response, "collections").await?.json().await?;

			Ok(infos.into_iter().map(|info| info.name).collect())
		})
	}

	fn create_collection<'a>(
		&'a self,
		name: &'a str,
		description: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn VectorCollection>>> {
		Box::pin(async move {
			let body = json!({
				"name": name,
				"metadata": {
					"description": description,
					"embedding_model": self.embedding_model,
				},
			});
			let response = self.client.post(self.collections_url()).json(&body).send().await?;
			let info: CollectionInfo = check(response, name).await?.json().await?;

			Ok(self.handle(info))
		})
	}

	fn get_collection<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn VectorCollection>>> {
		Box::pin(async move {
			let url = format!("{}/{name}", self.collections_url());
			let response = self.client.get(url).send().await?;
			let info: CollectionInfo = check(response, name).await?.json().await?;

			Ok(self.handle(info))
		})
	}
}

struct ChromaCollection {
	client: Client,
	url: String,
	name: String,
}

impl VectorCollection for ChromaCollection {
	fn add<'a>(
		&'a self,
		ids: &'a [String],
		documents: &'a [String],
		metadatas: &'a [Metadata],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let body = json!({ "ids": ids, "documents": documents, "metadatas": metadatas });
			let response =
				self.client.post(format!("{}/add", self.url)).json(&body).send().await?;

			check(response, &self.name).await?;

			Ok(())
		})
	}

	fn update<'a>(
		&'a self,
		ids: &'a [String],
		documents: &'a [String],
		metadatas: &'a [Metadata],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let body = json!({ "ids": ids, "documents": documents, "metadatas": metadatas });
			let response =
				self.client.post(format!("{}/update", self.url)).json(&body).send().await?;

			check(response, &self.name).await?;

			Ok(())
		})
	}

	fn delete<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let body = json!({ "ids": ids });
			let response =
				self.client.post(format!("{}/delete", self.url)).json(&body).send().await?;

			check(response, &self.name).await?;

			Ok(())
		})
	}

	fn delete_where<'a>(&'a self, filter: &'a Metadata) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let body = json!({ "where": filter });
			let response =
				self.client.post(format!("{}/delete", self.url)).json(&body).send().await?;

			check(response, &self.name).await?;

			Ok(())
		})
	}

	fn query<'a>(
		&'a self,
		query_text: &'a str,
		filter: &'a Metadata,
		n_results: u32,
	) -> BoxFuture<'a, Result<QueryOutput>> {
		Box::pin(async move {
			let body = json!({
				"query_texts": [query_text],
				"where": filter,
				"n_results": n_results,
				"include": ["metadatas", "distances"],
			});
			let response =
				self.client.post(format!("{}/query", self.url)).json(&body).send().await?;
			let raw: RawQueryResponse = check(response, &self.name).await?.json().await?;

			Ok(flatten_query_response(raw))
		})
	}
}

#[derive(Debug, Deserialize)]
struct RawQueryResponse {
	ids: Vec<Vec<String>>,
	#[serde(default)]
	distances: Option<Vec<Vec<Option<f64>>>>,
	#[serde(default)]
	metadatas: Option<Vec<Vec<Option<Metadata>>>>,
}

/// The wire shape nests one row per query text; this client always sends
/// exactly one.
fn flatten_query_response(raw: RawQueryResponse) -> QueryOutput {
	let ids = raw.ids.into_iter().next().unwrap_or_default();
	let distance_row =
		raw.distances.and_then(|rows| rows.into_iter().next()).unwrap_or_default();
	let metadata_row =
		raw.metadatas.and_then(|rows| rows.into_iter().next()).unwrap_or_default();
	let mut distances = Vec::with_capacity(ids.len());
	let mut metadatas = Vec::with_capacity(ids.len());

	for index in 0..ids.len() {
		distances
			.push(distance_row.get(index).copied().flatten().map(|distance| distance as f32));
		metadatas.push(metadata_row.get(index).cloned().flatten().unwrap_or_default());
	}

	QueryOutput { ids, distances, metadatas }
}

/// Maps non-success responses to typed errors so callers can branch on
/// missing collections or ids and on create races.
async fn check(response: reqwest::Response, subject: &str) -> Result<reqwest::Response> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let message = response.text().await.unwrap_or_default();
	let lowered = message.to_lowercase();

	if status == StatusCode::NOT_FOUND
		|| lowered.contains("not found")
		|| lowered.contains("does not exist")
	{
		return Err(Error::NotFound(subject.to_string()));
	}
	if status == StatusCode::CONFLICT || lowered.contains("already exists") {
		return Err(Error::Conflict(subject.to_string()));
	}

	Err(Error::Backend { status: status.as_u16(), message })
}
