pub mod records;
pub mod vector;

pub use records::MemoryRecordStore;
pub use vector::{MemoryCollection, MemoryVectorStore, StoredDocument};

use std::sync::Once;

use time::OffsetDateTime;
use uuid::Uuid;

use lodestar_storage::models::{ContactRecord, MessageRecord, TemplateRecord};

static INIT_TRACING: Once = Once::new();

/// Installs a fmt subscriber once per process so test runs honor `RUST_LOG`.
pub fn init_tracing() {
	INIT_TRACING.call_once(|| {
		let filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
		let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
	});
}

pub fn message_record(owner_id: &str, subject: &str, body: &str) -> MessageRecord {
	MessageRecord {
		message_id: Uuid::new_v4(),
		owner_id: owner_id.to_string(),
		subject: subject.to_string(),
		body: body.to_string(),
		from_address: "sender@example.com".to_string(),
		to_addresses: vec!["recipient@example.com".to_string()],
		sent_at: OffsetDateTime::now_utc(),
		folder: "inbox".to_string(),
		status: "received".to_string(),
		contact_id: None,
		metadata: serde_json::json!({}),
	}
}

pub fn contact_record(owner_id: &str, name: &str, email: &str) -> ContactRecord {
	ContactRecord {
		contact_id: Uuid::new_v4(),
		owner_id: owner_id.to_string(),
		name: name.to_string(),
		email: email.to_string(),
		company: None,
		notes: None,
		created_at: OffsetDateTime::now_utc(),
	}
}

pub fn template_record(owner_id: &str, name: &str, body: &str) -> TemplateRecord {
	TemplateRecord {
		template_id: Uuid::new_v4(),
		owner_id: owner_id.to_string(),
		name: name.to_string(),
		body: body.to_string(),
		updated_at: OffsetDateTime::now_utc(),
	}
}
