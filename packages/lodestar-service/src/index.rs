use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use lodestar_domain::markup;
use lodestar_storage::{
	Metadata,
	models::{ContactRecord, MessageRecord, TemplateRecord},
	vector::{CONTACTS_COLLECTION, EMAILS_COLLECTION, TEMPLATES_COLLECTION},
};

use crate::LodestarService;

impl LodestarService {
	/// Upserts a message into the `emails` collection. Idempotent per id:
	/// re-indexing the same record replaces the stored document.
	pub async fn index_message(&self, record: &MessageRecord) -> bool {
		let text = message_text(record);
		let metadata = message_metadata(record);

		self.update_document(EMAILS_COLLECTION, &record.message_id.to_string(), &text, metadata)
			.await
	}

	pub async fn index_contact(&self, record: &ContactRecord) -> bool {
		let text = contact_text(record);
		let metadata = contact_metadata(record);

		self.update_document(CONTACTS_COLLECTION, &record.contact_id.to_string(), &text, metadata)
			.await
	}

	pub async fn index_template(&self, record: &TemplateRecord) -> bool {
		let text = template_text(record);
		let metadata = template_metadata(record);

		self.update_document(TEMPLATES_COLLECTION, &record.template_id.to_string(), &text, metadata)
			.await
	}
}

fn message_text(record: &MessageRecord) -> String {
	format!("{}\n\n{}", record.subject, markup::strip_markup(&record.body))
}

/// Flat scalar envelope stored beside the embedding. Free-form record
/// metadata rides along; non-scalar entries are skipped and structural keys
/// win over free-form ones.
pub(crate) fn message_metadata(record: &MessageRecord) -> Metadata {
	let mut metadata = Metadata::new();

	metadata.insert("owner_id".to_string(), Value::String(record.owner_id.clone()));
	metadata.insert("subject".to_string(), Value::String(record.subject.clone()));
	metadata.insert("from_address".to_string(), Value::String(record.from_address.clone()));
	metadata.insert("to_addresses".to_string(), Value::String(record.to_addresses.join(", ")));
	metadata.insert("sent_at".to_string(), Value::String(format_timestamp(record.sent_at)));
	metadata.insert("folder".to_string(), Value::String(record.folder.clone()));
	metadata.insert("status".to_string(), Value::String(record.status.clone()));

	if let Some(contact_id) = record.contact_id {
		metadata.insert("contact_id".to_string(), Value::String(contact_id.to_string()));
	}
	if let Some(extra) = record.metadata.as_object() {
		for (key, value) in extra {
			if is_scalar(value) && !metadata.contains_key(key) {
				metadata.insert(key.clone(), value.clone());
			}
		}
	}

	metadata
}

fn contact_text(record: &ContactRecord) -> String {
	let mut parts = vec![record.name.as_str(), record.email.as_str()];

	if let Some(company) = record.company.as_deref().filter(|company| !company.is_empty()) {
		parts.push(company);
	}
	if let Some(notes) = record.notes.as_deref().filter(|notes| !notes.is_empty()) {
		parts.push(notes);
	}

	parts.join("\n")
}

fn contact_metadata(record: &ContactRecord) -> Metadata {
	let mut metadata = Metadata::new();

	metadata.insert("owner_id".to_string(), Value::String(record.owner_id.clone()));
	metadata.insert("name".to_string(), Value::String(record.name.clone()));
	metadata.insert("email".to_string(), Value::String(record.email.clone()));

	if let Some(company) = record.company.as_ref() {
		metadata.insert("company".to_string(), Value::String(company.clone()));
	}

	metadata.insert("created_at".to_string(), Value::String(format_timestamp(record.created_at)));

	metadata
}

fn template_text(record: &TemplateRecord) -> String {
	format!("{}\n\n{}", record.name, markup::strip_markup(&record.body))
}

fn template_metadata(record: &TemplateRecord) -> Metadata {
	let mut metadata = Metadata::new();

	metadata.insert("owner_id".to_string(), Value::String(record.owner_id.clone()));
	metadata.insert("name".to_string(), Value::String(record.name.clone()));
	metadata.insert("updated_at".to_string(), Value::String(format_timestamp(record.updated_at)));

	metadata
}

fn is_scalar(value: &Value) -> bool {
	matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn format_timestamp(ts: OffsetDateTime) -> String {
	ts.format(&Rfc3339).unwrap_or_else(|_| ts.unix_timestamp().to_string())
}
