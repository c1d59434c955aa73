use uuid::Uuid;

use lodestar_service::RecordChange;
use lodestar_storage::vector::{
	CONTACTS_COLLECTION, EMAILS_COLLECTION, TEMPLATES_COLLECTION,
};
use lodestar_testkit::{contact_record, message_record, template_record};

#[tokio::test]
async fn indexing_twice_converges_to_one_document() {
	let h = super::harness();
	let mut record = message_record("owner-a", "First subject", "First body");

	assert!(h.service.index_message(&record).await);

	record.subject = "Second subject".to_string();
	record.body = "Second body".to_string();

	assert!(h.service.index_message(&record).await);

	let collection = h.store.collection(EMAILS_COLLECTION).expect("Collection should exist.");
	let id = record.message_id.to_string();

	assert_eq!(collection.ids(), vec![id.clone()]);

	let doc = collection.document(&id).expect("Document should be stored.");

	assert!(doc.text.contains("Second subject"));
	assert!(doc.text.contains("Second body"));
	assert!(!doc.text.contains("First body"));
}

#[tokio::test]
async fn update_falls_back_to_add_for_an_unknown_id() {
	let h = super::harness();
	let record = message_record("owner-a", "Drifted", "The index never saw this one.");

	// No prior add; the update self-heals into an insert.
	assert!(h.service.index_message(&record).await);

	let collection = h.store.collection(EMAILS_COLLECTION).expect("Collection should exist.");

	assert!(collection.contains(&record.message_id.to_string()));
}

#[tokio::test]
async fn indexed_message_carries_the_owner_envelope() {
	let h = super::harness();
	let record = message_record("owner-a", "Subject", "Body");

	assert!(h.service.index_message(&record).await);

	let collection = h.store.collection(EMAILS_COLLECTION).expect("Collection should exist.");
	let doc =
		collection.document(&record.message_id.to_string()).expect("Document should be stored.");

	assert_eq!(doc.metadata.get("owner_id"), Some(&serde_json::json!("owner-a")));
	assert_eq!(doc.metadata.get("folder"), Some(&serde_json::json!("inbox")));
}

#[tokio::test]
async fn contacts_and_templates_index_into_their_own_collections() {
	let h = super::harness();
	let contact = contact_record("owner-a", "Ada Lovelace", "ada@example.com");
	let template = template_record("owner-a", "Welcome", "<p>Hello there</p>");

	assert!(h.service.index_contact(&contact).await);
	assert!(h.service.index_template(&template).await);

	let contacts = h.store.collection(CONTACTS_COLLECTION).expect("Collection should exist.");
	let templates = h.store.collection(TEMPLATES_COLLECTION).expect("Collection should exist.");

	assert!(contacts.contains(&contact.contact_id.to_string()));

	let doc = templates
		.document(&template.template_id.to_string())
		.expect("Template should be stored.");

	assert!(doc.text.contains("Hello there"));
	assert!(!doc.text.contains("<p>"));
}

#[tokio::test]
async fn write_failures_surface_as_false_not_errors() {
	let h = super::harness();
	let record = message_record("owner-a", "Unlucky", "This write fails.");
	let collection = h.store.seed(EMAILS_COLLECTION);

	collection.fail_writes_for(&record.message_id.to_string());

	assert!(!h.service.index_message(&record).await);
	assert!(!collection.contains(&record.message_id.to_string()));
}

#[tokio::test]
async fn delete_chunks_at_one_hundred_and_continues_past_a_failed_batch() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);

	collection.fail_delete_call(2);

	let ids: Vec<String> = (0..250).map(|_| Uuid::new_v4().to_string()).collect();
	let ok = h.service.delete_documents(EMAILS_COLLECTION, &ids).await;

	assert!(!ok, "A failed batch must surface in the aggregate outcome.");
	assert_eq!(collection.delete_batch_sizes(), vec![100, 100, 50]);
}

#[tokio::test]
async fn record_changes_dispatch_to_index_and_delete() {
	let h = super::harness();
	let record = message_record("owner-a", "Changed", "Body");

	assert!(h.service.on_record_changed(RecordChange::MessageUpserted(record.clone())).await);

	let collection = h.store.collection(EMAILS_COLLECTION).expect("Collection should exist.");

	assert!(collection.contains(&record.message_id.to_string()));

	assert!(h.service.on_record_changed(RecordChange::MessageDeleted(record.message_id)).await);

	assert!(!collection.contains(&record.message_id.to_string()));
}
