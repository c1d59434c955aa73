use std::{
	collections::{HashMap, HashSet, VecDeque},
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use lodestar_storage::{
	BoxFuture, Error, Metadata, Result,
	vector::{QueryOutput, VectorCollection, VectorStore},
};

#[derive(Clone, Debug)]
pub struct StoredDocument {
	pub text: String,
	pub metadata: Metadata,
}

/// In-memory stand-in for the vector backend. Failure knobs and call
/// accounting let tests script partial failures and assert request shapes.
#[derive(Default)]
pub struct MemoryVectorStore {
	collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
	fail_list: AtomicBool,
	not_found_gets: AtomicUsize,
	list_calls: AtomicUsize,
	get_calls: AtomicUsize,
	create_calls: AtomicUsize,
}
impl MemoryVectorStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates the named collection directly, bypassing the store API. For
	/// seeding state that predates the code under test.
	pub fn seed(&self, name: &str) -> Arc<MemoryCollection> {
		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		collections.entry(name.to_string()).or_insert_with(Arc::default).clone()
	}

	pub fn collection(&self, name: &str) -> Option<Arc<MemoryCollection>> {
		let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		collections.get(name).cloned()
	}

	pub fn fail_list_collections(&self, fail: bool) {
		self.fail_list.store(fail, Ordering::SeqCst);
	}

	/// The next `count` `get_collection` calls report the collection missing
	/// even when it exists. For racing a concurrent creator.
	pub fn report_missing_on_next_get(&self, count: usize) {
		self.not_found_gets.store(count, Ordering::SeqCst);
	}

	pub fn list_calls(&self) -> usize {
		self.list_calls.load(Ordering::SeqCst)
	}

	pub fn get_calls(&self) -> usize {
		self.get_calls.load(Ordering::SeqCst)
	}

	pub fn create_calls(&self) -> usize {
		self.create_calls.load(Ordering::SeqCst)
	}
}

impl VectorStore for MemoryVectorStore {
	fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		self.list_calls.fetch_add(1, Ordering::SeqCst);

		let result = if self.fail_list.load(Ordering::SeqCst) {
			Err(backend_error("list_collections failed"))
		} else {
			let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
			let mut names: Vec<String> = collections.keys().cloned().collect();

			names.sort();

			Ok(names)
		};

		Box::pin(async move { result })
	}

	fn create_collection<'a>(
		&'a self,
		name: &'a str,
		_description: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn VectorCollection>>> {
		self.create_calls.fetch_add(1, Ordering::SeqCst);

		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
		let result = if collections.contains_key(name) {
			Err(Error::Conflict(name.to_string()))
		} else {
			let collection = Arc::new(MemoryCollection::default());

			collections.insert(name.to_string(), collection.clone());

			Ok(collection as Arc<dyn VectorCollection>)
		};

		Box::pin(async move { result })
	}

	fn get_collection<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn VectorCollection>>> {
		self.get_calls.fetch_add(1, Ordering::SeqCst);

		let simulated_misses = self.not_found_gets.load(Ordering::SeqCst);
		let result = if simulated_misses > 0 {
			self.not_found_gets.store(simulated_misses - 1, Ordering::SeqCst);

			Err(Error::NotFound(name.to_string()))
		} else {
			let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

			match collections.get(name) {
				Some(collection) => Ok(collection.clone() as Arc<dyn VectorCollection>),
				None => Err(Error::NotFound(name.to_string())),
			}
		};

		Box::pin(async move { result })
	}
}

#[derive(Default)]
pub struct MemoryCollection {
	docs: Mutex<HashMap<String, StoredDocument>>,
	scripted_queries: Mutex<VecDeque<QueryOutput>>,
	fail_queries: AtomicUsize,
	query_calls: AtomicUsize,
	delete_calls: AtomicUsize,
	delete_batch_sizes: Mutex<Vec<usize>>,
	failing_delete_calls: Mutex<HashSet<usize>>,
	fail_writes: Mutex<HashSet<String>>,
}
impl MemoryCollection {
	pub fn ids(&self) -> Vec<String> {
		let docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());
		let mut ids: Vec<String> = docs.keys().cloned().collect();

		ids.sort();

		ids
	}

	pub fn contains(&self, id: &str) -> bool {
		let docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());

		docs.contains_key(id)
	}

	pub fn document(&self, id: &str) -> Option<StoredDocument> {
		let docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());

		docs.get(id).cloned()
	}

	/// Queues a canned result returned by the next un-failed `query` call.
	pub fn push_query_result(&self, output: QueryOutput) {
		let mut scripted = self.scripted_queries.lock().unwrap_or_else(|err| err.into_inner());

		scripted.push_back(output);
	}

	/// The next `count` query calls fail before consuming scripted results.
	pub fn fail_next_queries(&self, count: usize) {
		self.fail_queries.store(count, Ordering::SeqCst);
	}

	/// Add and update calls touching `id` fail from now on.
	pub fn fail_writes_for(&self, id: &str) {
		let mut fail_writes = self.fail_writes.lock().unwrap_or_else(|err| err.into_inner());

		fail_writes.insert(id.to_string());
	}

	/// The `ordinal`-th delete call (1-based) fails without removing anything.
	pub fn fail_delete_call(&self, ordinal: usize) {
		let mut failing = self.failing_delete_calls.lock().unwrap_or_else(|err| err.into_inner());

		failing.insert(ordinal);
	}

	pub fn query_calls(&self) -> usize {
		self.query_calls.load(Ordering::SeqCst)
	}

	pub fn delete_batch_sizes(&self) -> Vec<usize> {
		let sizes = self.delete_batch_sizes.lock().unwrap_or_else(|err| err.into_inner());

		sizes.clone()
	}

	fn write_blocked(&self, ids: &[String]) -> bool {
		let fail_writes = self.fail_writes.lock().unwrap_or_else(|err| err.into_inner());

		ids.iter().any(|id| fail_writes.contains(id))
	}

	fn store_documents(&self, ids: &[String], documents: &[String], metadatas: &[Metadata]) {
		let mut docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());

		for (index, id) in ids.iter().enumerate() {
			let text = documents.get(index).cloned().unwrap_or_default();
			let metadata = metadatas.get(index).cloned().unwrap_or_default();

			docs.insert(id.clone(), StoredDocument { text, metadata });
		}
	}
}

impl VectorCollection for MemoryCollection {
	fn add<'a>(
		&'a self,
		ids: &'a [String],
		documents: &'a [String],
		metadatas: &'a [Metadata],
	) -> BoxFuture<'a, Result<()>> {
		let result = if self.write_blocked(ids) {
			Err(backend_error("add failed"))
		} else {
			self.store_documents(ids, documents, metadatas);

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn update<'a>(
		&'a self,
		ids: &'a [String],
		documents: &'a [String],
		metadatas: &'a [Metadata],
	) -> BoxFuture<'a, Result<()>> {
		let result = if self.write_blocked(ids) {
			Err(backend_error("update failed"))
		} else {
			let missing: Vec<String> = {
				let docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());

				ids.iter().filter(|id| !docs.contains_key(*id)).cloned().collect()
			};

			if missing.is_empty() {
				self.store_documents(ids, documents, metadatas);

				Ok(())
			} else {
				Err(Error::NotFound(missing.join(", ")))
			}
		};

		Box::pin(async move { result })
	}

	fn delete<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<()>> {
		let call = self.delete_calls.fetch_add(1, Ordering::SeqCst) + 1;

		{
			let mut sizes = self.delete_batch_sizes.lock().unwrap_or_else(|err| err.into_inner());

			sizes.push(ids.len());
		}

		let failing = {
			let failing = self.failing_delete_calls.lock().unwrap_or_else(|err| err.into_inner());

			failing.contains(&call)
		};
		let result = if failing {
			Err(backend_error("delete failed"))
		} else {
			let mut docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());

			for id in ids {
				docs.remove(id);
			}

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn delete_where<'a>(&'a self, filter: &'a Metadata) -> BoxFuture<'a, Result<()>> {
		let mut docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());

		docs.retain(|_, doc| {
			!filter.iter().all(|(key, expected)| doc.metadata.get(key) == Some(expected))
		});

		drop(docs);

		Box::pin(async move { Ok(()) })
	}

	fn query<'a>(
		&'a self,
		query_text: &'a str,
		filter: &'a Metadata,
		n_results: u32,
	) -> BoxFuture<'a, Result<QueryOutput>> {
		self.query_calls.fetch_add(1, Ordering::SeqCst);

		let failures = self.fail_queries.load(Ordering::SeqCst);
		let result = if failures > 0 {
			self.fail_queries.store(failures - 1, Ordering::SeqCst);

			Err(backend_error("query failed"))
		} else {
			let scripted = {
				let mut queue =
					self.scripted_queries.lock().unwrap_or_else(|err| err.into_inner());

				queue.pop_front()
			};

			match scripted {
				Some(output) => Ok(output),
				None => Ok(self.naive_query(query_text, filter, n_results)),
			}
		};

		Box::pin(async move { result })
	}
}

impl MemoryCollection {
	/// Fallback ranking for tests that do not script hits: equality-filtered
	/// documents containing the query text, in id order, fixed distance.
	fn naive_query(&self, query_text: &str, filter: &Metadata, n_results: u32) -> QueryOutput {
		let docs = self.docs.lock().unwrap_or_else(|err| err.into_inner());
		let needle = query_text.to_lowercase();
		let mut matched: Vec<(String, StoredDocument)> = docs
			.iter()
			.filter(|(_, doc)| {
				filter.iter().all(|(key, expected)| doc.metadata.get(key) == Some(expected))
			})
			.filter(|(_, doc)| doc.text.to_lowercase().contains(&needle))
			.map(|(id, doc)| (id.clone(), doc.clone()))
			.collect();

		matched.sort_by(|a, b| a.0.cmp(&b.0));
		matched.truncate(n_results as usize);

		QueryOutput {
			ids: matched.iter().map(|(id, _)| id.clone()).collect(),
			distances: matched.iter().map(|_| Some(0.5)).collect(),
			metadatas: matched.into_iter().map(|(_, doc)| doc.metadata).collect(),
		}
	}
}

fn backend_error(message: &str) -> Error {
	Error::Backend { status: 503, message: message.to_string() }
}
