use uuid::Uuid;

use crate::{
	BoxFuture, Result,
	models::{ContactRecord, MessageRecord, TemplateRecord},
};

/// Read API of the authoritative record store. Pages are 1-based and ordered
/// most-recent-first on a stable sort key per kind; `ids` narrows a fetch to
/// the given primary keys. Every fetch is tenant-scoped by `owner_id`.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn list_message_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>>;

	fn fetch_messages<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<MessageRecord>>>;

	fn list_contact_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>>;

	fn fetch_contacts<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<ContactRecord>>>;

	fn list_template_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>>;

	fn fetch_templates<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<TemplateRecord>>>;
}

pub struct PgRecordStore {
	pool: sqlx::PgPool,
}
impl PgRecordStore {
	pub fn new(pool: sqlx::PgPool) -> Self {
		Self { pool }
	}
}

impl RecordStore for PgRecordStore {
	fn list_message_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
		Box::pin(async move {
			let ids =
				sqlx::query_scalar::<_, Uuid>("SELECT message_id FROM messages WHERE owner_id = $1")
					.bind(owner_id)
					.fetch_all(&self.pool)
					.await?;

			Ok(ids)
		})
	}

	fn fetch_messages<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<MessageRecord>>> {
		Box::pin(async move {
			let rows = sqlx::query_as::<_, MessageRecord>(
				"\
SELECT
	message_id,
	owner_id,
	subject,
	body,
	from_address,
	to_addresses,
	sent_at,
	folder,
	status,
	contact_id,
	metadata
FROM messages
WHERE owner_id = $1 AND ($2::uuid[] IS NULL OR message_id = ANY($2))
ORDER BY sent_at DESC, message_id
LIMIT $3 OFFSET $4",
			)
			.bind(owner_id)
			.bind(ids)
			.bind(i64::from(page_size))
			.bind(page_offset(page, page_size))
			.fetch_all(&self.pool)
			.await?;

			Ok(rows)
		})
	}

	fn list_contact_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
		Box::pin(async move {
			let ids =
				sqlx::query_scalar::<_, Uuid>("SELECT contact_id FROM contacts WHERE owner_id = $1")
					.bind(owner_id)
					.fetch_all(&self.pool)
					.await?;

			Ok(ids)
		})
	}

	fn fetch_contacts<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<ContactRecord>>> {
		Box::pin(async move {
			let rows = sqlx::query_as::<_, ContactRecord>(
				"\
SELECT
	contact_id,
	owner_id,
	name,
	email,
	company,
	notes,
	created_at
FROM contacts
WHERE owner_id = $1 AND ($2::uuid[] IS NULL OR contact_id = ANY($2))
ORDER BY created_at DESC, contact_id
LIMIT $3 OFFSET $4",
			)
			.bind(owner_id)
			.bind(ids)
			.bind(i64::from(page_size))
			.bind(page_offset(page, page_size))
			.fetch_all(&self.pool)
			.await?;

			Ok(rows)
		})
	}

	fn list_template_ids<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Uuid>>> {
		Box::pin(async move {
			let ids = sqlx::query_scalar::<_, Uuid>(
				"SELECT template_id FROM templates WHERE owner_id = $1",
			)
			.bind(owner_id)
			.fetch_all(&self.pool)
			.await?;

			Ok(ids)
		})
	}

	fn fetch_templates<'a>(
		&'a self,
		owner_id: &'a str,
		ids: Option<&'a [Uuid]>,
		page: u32,
		page_size: u32,
	) -> BoxFuture<'a, Result<Vec<TemplateRecord>>> {
		Box::pin(async move {
			let rows = sqlx::query_as::<_, TemplateRecord>(
				"\
SELECT
	template_id,
	owner_id,
	name,
	body,
	updated_at
FROM templates
WHERE owner_id = $1 AND ($2::uuid[] IS NULL OR template_id = ANY($2))
ORDER BY updated_at DESC, template_id
LIMIT $3 OFFSET $4",
			)
			.bind(owner_id)
			.bind(ids)
			.bind(i64::from(page_size))
			.bind(page_offset(page, page_size))
			.fetch_all(&self.pool)
			.await?;

			Ok(rows)
		})
	}
}

fn page_offset(page: u32, page_size: u32) -> i64 {
	i64::from(page.saturating_sub(1)) * i64::from(page_size)
}
