use uuid::Uuid;

use lodestar_storage::{
	models::{ContactRecord, MessageRecord, TemplateRecord},
	vector::{CONTACTS_COLLECTION, EMAILS_COLLECTION, TEMPLATES_COLLECTION},
};

use crate::LodestarService;

/// An authoritative record changed. Ingestion layers call
/// `on_record_changed` with one of these; the core subscribes to no event
/// bus of its own.
#[derive(Debug, Clone)]
pub enum RecordChange {
	MessageUpserted(MessageRecord),
	MessageDeleted(Uuid),
	ContactUpserted(ContactRecord),
	ContactDeleted(Uuid),
	TemplateUpserted(TemplateRecord),
	TemplateDeleted(Uuid),
}

impl LodestarService {
	/// Applies one record change to the index. Best-effort, like the mutator
	/// operations it dispatches to.
	pub async fn on_record_changed(&self, change: RecordChange) -> bool {
		match change {
			RecordChange::MessageUpserted(record) => self.index_message(&record).await,
			RecordChange::MessageDeleted(id) => {
				self.delete_document(EMAILS_COLLECTION, &id.to_string()).await
			},
			RecordChange::ContactUpserted(record) => self.index_contact(&record).await,
			RecordChange::ContactDeleted(id) => {
				self.delete_document(CONTACTS_COLLECTION, &id.to_string()).await
			},
			RecordChange::TemplateUpserted(record) => self.index_template(&record).await,
			RecordChange::TemplateDeleted(id) => {
				self.delete_document(TEMPLATES_COLLECTION, &id.to_string()).await
			},
		}
	}
}
