use std::sync::Arc;

use crate::{BoxFuture, Metadata, Result};

pub const EMAILS_COLLECTION: &str = "emails";
pub const CONTACTS_COLLECTION: &str = "contacts";
pub const TEMPLATES_COLLECTION: &str = "templates";

/// Every collection this process manages, with the description each is
/// created under.
pub const KNOWN_COLLECTIONS: [(&str, &str); 3] = [
	(EMAILS_COLLECTION, "Semantic index over message subjects and bodies."),
	(CONTACTS_COLLECTION, "Semantic index over contact profiles."),
	(TEMPLATES_COLLECTION, "Semantic index over reusable text templates."),
];

/// Raw similarity hits for a single query text, in backend rank order.
/// Distances are lower-is-closer; metadata is the snapshot stored at index
/// time. Ephemeral — hydration replaces this with authoritative records.
#[derive(Clone, Debug, Default)]
pub struct QueryOutput {
	pub ids: Vec<String>,
	pub distances: Vec<Option<f32>>,
	pub metadatas: Vec<Metadata>,
}

/// The vector/embedding backend. Embedding happens backend-side: documents
/// and query text go over the wire as plain text.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>>>;

	fn create_collection<'a>(
		&'a self,
		name: &'a str,
		description: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn VectorCollection>>>;

	fn get_collection<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn VectorCollection>>>;
}

/// A live handle onto one named collection.
pub trait VectorCollection
where
	Self: Send + Sync,
{
	fn add<'a>(
		&'a self,
		ids: &'a [String],
		documents: &'a [String],
		metadatas: &'a [Metadata],
	) -> BoxFuture<'a, Result<()>>;

	fn update<'a>(
		&'a self,
		ids: &'a [String],
		documents: &'a [String],
		metadatas: &'a [Metadata],
	) -> BoxFuture<'a, Result<()>>;

	fn delete<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<()>>;

	/// Deletes every document whose metadata matches the flat equality map.
	fn delete_where<'a>(&'a self, filter: &'a Metadata) -> BoxFuture<'a, Result<()>>;

	/// `filter` is a flat equality map over stored metadata keys.
	fn query<'a>(
		&'a self,
		query_text: &'a str,
		filter: &'a Metadata,
		n_results: u32,
	) -> BoxFuture<'a, Result<QueryOutput>>;
}
