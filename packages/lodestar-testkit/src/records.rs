use std::{
	collections::HashSet,
	sync::{
		Mutex,
		atomic::{AtomicBool, Ordering},
	},
};

use uuid::Uuid;

use lodestar_storage::{
	BoxFuture, Result,
	models::{ContactRecord, MessageRecord, TemplateRecord},
	records::RecordStore,
};

/// In-memory stand-in for the authoritative record store, with the same
/// owner scoping, ordering, and paging contract as the Postgres one.
#[derive(Default)]
pub struct MemoryRecordStore {
	messages: Mutex<Vec<MessageRecord>>,
	contacts: Mutex<Vec<ContactRecord>>,
	templates: Mutex<Vec<TemplateRecord>>,
	fail_list_ids: AtomicBool,
	failing_pages: Mutex<HashSet<u32>>,
}
impl MemoryRecordStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_message(&self, record: MessageRecord) {
		let mut messages = self.messages.lock().unwrap_or_else(|err| err.into_inner());

		messages.push(record);
	}

	pub fn push_contact(&self, record: ContactRecord) {
		let mut contacts = self.contacts.lock().unwrap_or_else(|err| err.into_inner());

		contacts.push(record);
	}

	pub fn push_template(&self, record: TemplateRecord) {
		let mut templates = self.templates.lock().unwrap_or_else(|err| err.into_inner());

		templates.push(record);
	}

	pub fn fail_list_ids(&self, fail: bool) {
		self.fail_list_ids.store(fail, Ordering::SeqCst);
	}

	/// Fetches for the given page number (1-based) fail, on every kind.
	pub fn fail_page(&self, page: u32) {
		let mut failing = self.failing_pages.lock().unwrap_or_else(|err| err.into_inner());

		failing.insert(page);
	}

	fn page_blocked(&self, page: u32) -> bool {
		let failing = self.failing_pages.lock().unwrap_or_else(|err| err.into_inner());

		failing.contains(&page)
	}

	fn list_blocked(&self) -> bool {
		self.fail_list_ids.load(Ordering::SeqCst)
	}
}

impl RecordStore for MemoryRecordStore {
	fn list_message_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
		let result = if self.list_blocked() {
			Err(list_error())
		} else {
			let messages = self.messages.lock().unwrap_or_else(|err| err.into_inner());

			Ok(messages
				.iter()
				.filter(|record| record.owner_id == owner_id)
				.map(|record| record.message_id)
				.collect())
		};

		Box::pin(async move { result })
	}

	fn fetch_messages<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<MessageRecord>>> {
		let result = if self.page_blocked(page) {
			Err(page_error(page))
		} else {
			let messages = self.messages.lock().unwrap_or_else(|err| err.into_inner());
			let mut rows: Vec<MessageRecord> = messages
				.iter()
				.filter(|record| record.owner_id == owner_id)
				.filter(|record| ids.is_none_or(|wanted| wanted.contains(&record.message_id)))
				.cloned()
				.collect();

			rows.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(a.message_id.cmp(&b.message_id)));

			Ok(paginate(rows, page, page_size))
		};

		Box::pin(async move { result })
	}

	fn list_contact_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
		let result = if self.list_blocked() {
			Err(list_error())
		} else {
			let contacts = self.contacts.lock().unwrap_or_else(|err| err.into_inner());

			Ok(contacts
				.iter()
				.filter(|record| record.owner_id == owner_id)
				.map(|record| record.contact_id)
				.collect())
		};

		Box::pin(async move { result })
	}

	fn fetch_contacts<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<ContactRecord>>> {
		let result = if self.page_blocked(page) {
			Err(page_error(page))
		} else {
			let contacts = self.contacts.lock().unwrap_or_else(|err| err.into_inner());
			let mut rows: Vec<ContactRecord> = contacts
				.iter()
				.filter(|record| record.owner_id == owner_id)
				.filter(|record| ids.is_none_or(|wanted| wanted.contains(&record.contact_id)))
				.cloned()
				.collect();

			rows.sort_by(|a, b| {
				b.created_at.cmp(&a.created_at).then(a.contact_id.cmp(&b.contact_id))
			});

			Ok(paginate(rows, page, page_size))
		};

		Box::pin(async move { result })
	}

	fn list_template_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
		let result = if self.list_blocked() {
			Err(list_error())
		} else {
			let templates = self.templates.lock().unwrap_or_else(|err| err.into_inner());

			Ok(templates
				.iter()
				.filter(|record| record.owner_id == owner_id)
				.map(|record| record.template_id)
				.collect())
		};

		Box::pin(async move { result })
	}

	fn fetch_templates<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<TemplateRecord>>> {
		let result = if self.page_blocked(page) {
			Err(page_error(page))
		} else {
			let templates = self.templates.lock().unwrap_or_else(|err| err.into_inner());
			let mut rows: Vec<TemplateRecord> = templates
				.iter()
				.filter(|record| record.owner_id == owner_id)
				.filter(|record| ids.is_none_or(|wanted| wanted.contains(&record.template_id)))
				.cloned()
				.collect();

			rows.sort_by(|a, b| {
				b.updated_at.cmp(&a.updated_at).then(a.template_id.cmp(&b.template_id))
			});

			Ok(paginate(rows, page, page_size))
		};

		Box::pin(async move { result })
	}
}

fn paginate<T>(rows: Vec<T>, page: u32, page_size: u32) -> Vec<T> {
	let start = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);

	rows.into_iter().skip(start).take(page_size as usize).collect()
}

fn list_error() -> lodestar_storage::Error {
	lodestar_storage::Error::Backend { status: 500, message: "listing ids failed".to_string() }
}

fn page_error(page: u32) -> lodestar_storage::Error {
	lodestar_storage::Error::Backend { status: 500, message: format!("page {page} fetch failed") }
}
