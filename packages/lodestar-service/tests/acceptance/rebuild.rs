use serde_json::json;
use uuid::Uuid;

use lodestar_storage::{
	Metadata,
	models::DocumentKind,
	vector::{CONTACTS_COLLECTION, EMAILS_COLLECTION, VectorCollection},
};
use lodestar_testkit::{contact_record, message_record};

async fn seed_stale(collection: &dyn VectorCollection, id: &str, owner_id: &str) {
	let ids = [id.to_string()];
	let documents = ["stale text".to_string()];
	let mut metadata = Metadata::new();

	metadata.insert("owner_id".to_string(), json!(owner_id));

	let metadatas = [metadata];

	collection.add(&ids, &documents, &metadatas).await.expect("Seeding should succeed.");
}

#[tokio::test]
async fn rebuild_converges_to_exactly_the_authoritative_records() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let y = message_record("owner-a", "Y subject", "y body");
	let z = message_record("owner-a", "Z subject", "z body");

	h.records.push_message(y.clone());
	h.records.push_message(z.clone());

	// X is an orphan: indexed once, but its record is gone. Y is indexed
	// with stale content.
	let x_id = Uuid::new_v4().to_string();

	seed_stale(collection.as_ref(), &x_id, "owner-a").await;
	seed_stale(collection.as_ref(), &y.message_id.to_string(), "owner-a").await;

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(outcome.success);
	assert_eq!(outcome.processed_count, 2);
	assert!(!collection.contains(&x_id));

	let mut expected = vec![y.message_id.to_string(), z.message_id.to_string()];

	expected.sort();

	assert_eq!(collection.ids(), expected);

	let doc = collection
		.document(&y.message_id.to_string())
		.expect("Rebuilt document should be stored.");

	assert!(doc.text.contains("Y subject"));
	assert!(!doc.text.contains("stale text"));
}

#[tokio::test]
async fn rebuild_leaves_other_tenants_untouched() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let other_id = Uuid::new_v4().to_string();

	seed_stale(collection.as_ref(), &other_id, "owner-b").await;
	h.records.push_message(message_record("owner-a", "Mine", "body"));

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(outcome.success);
	assert!(collection.contains(&other_id));
}

#[tokio::test]
async fn one_failing_record_does_not_stop_the_rebuild() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let mut records = Vec::new();

	for index in 0..5 {
		let record = message_record("owner-a", &format!("Subject {index}"), "body");

		h.records.push_message(record.clone());
		records.push(record);
	}

	collection.fail_writes_for(&records[2].message_id.to_string());

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(outcome.success);
	assert_eq!(outcome.processed_count, 4);
	assert!(!collection.contains(&records[2].message_id.to_string()));
}

#[tokio::test]
async fn failing_to_enumerate_ids_aborts_the_rebuild() {
	let h = super::harness();

	h.records.push_message(message_record("owner-a", "Subject", "body"));
	h.records.fail_list_ids(true);

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(!outcome.success);
	assert_eq!(outcome.processed_count, 0);
}

#[tokio::test]
async fn a_first_page_fetch_failure_aborts_the_rebuild() {
	let h = super::harness();

	h.records.push_message(message_record("owner-a", "Subject", "body"));
	h.records.fail_page(1);

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(!outcome.success);
	assert_eq!(outcome.processed_count, 0);
}

#[tokio::test]
async fn a_later_page_fetch_failure_keeps_earlier_progress() {
	let h = super::harness();

	// Three records across two pages at page size 2.
	for index in 0..3 {
		h.records.push_message(message_record("owner-a", &format!("Subject {index}"), "body"));
	}

	h.records.fail_page(2);

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(outcome.success);
	assert_eq!(outcome.processed_count, 2);
}

#[tokio::test]
async fn a_failed_stale_purge_does_not_abort_the_rebuild() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let record = message_record("owner-a", "Survivor", "body");

	h.records.push_message(record.clone());
	collection.fail_delete_call(1);

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(outcome.success);
	assert_eq!(outcome.processed_count, 1);
	assert!(collection.contains(&record.message_id.to_string()));
}

#[tokio::test]
async fn rebuild_is_safely_rerunnable() {
	let h = super::harness();

	for index in 0..3 {
		h.records.push_message(message_record("owner-a", &format!("Subject {index}"), "body"));
	}

	let first = h.service.rebuild_index("owner-a", DocumentKind::Message).await;
	let second = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(first.success && second.success);
	assert_eq!(first.processed_count, 3);
	assert_eq!(second.processed_count, 3);

	let collection = h.store.collection(EMAILS_COLLECTION).expect("Collection should exist.");

	assert_eq!(collection.ids().len(), 3);
}

#[tokio::test]
async fn rebuild_handles_contacts_as_a_kind_of_their_own() {
	let h = super::harness();
	let contact = contact_record("owner-a", "Ada Lovelace", "ada@example.com");

	h.records.push_contact(contact.clone());

	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Contact).await;

	assert!(outcome.success);
	assert_eq!(outcome.processed_count, 1);

	let collection = h.store.collection(CONTACTS_COLLECTION).expect("Collection should exist.");

	assert!(collection.contains(&contact.contact_id.to_string()));
}

#[tokio::test]
async fn rebuilding_an_empty_tenant_succeeds_with_zero_processed() {
	let h = super::harness();
	let outcome = h.service.rebuild_index("owner-a", DocumentKind::Message).await;

	assert!(outcome.success);
	assert_eq!(outcome.processed_count, 0);
}
