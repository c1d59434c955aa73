use time::Duration;
use uuid::Uuid;

use lodestar_service::ServiceError;
use lodestar_storage::{Metadata, vector::{EMAILS_COLLECTION, QueryOutput}};
use lodestar_testkit::message_record;

fn hits(ids: Vec<String>, distances: Vec<Option<f32>>) -> QueryOutput {
	let metadatas = vec![Metadata::new(); ids.len()];

	QueryOutput { ids, distances, metadatas }
}

#[tokio::test]
async fn results_are_ordered_by_descending_score() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let a = message_record("owner-a", "A", "alpha body");
	let b = message_record("owner-a", "B", "beta body");
	let c = message_record("owner-a", "C", "gamma body");

	for record in [&a, &b, &c] {
		h.records.push_message(record.clone());
	}

	collection.push_query_result(hits(
		vec![
			a.message_id.to_string(),
			b.message_id.to_string(),
			c.message_id.to_string(),
		],
		vec![Some(0.1), Some(0.5), Some(0.05)],
	));

	let results =
		h.service.search(super::request("owner-a", "body")).await.expect("Search should succeed.");
	let ids: Vec<Uuid> = results.iter().map(|result| result.id).collect();

	assert_eq!(ids, vec![c.message_id, a.message_id, b.message_id]);
	assert!((results[0].score - 0.95).abs() < 1e-6);
	assert!((results[1].score - 0.9).abs() < 1e-6);
	assert!((results[2].score - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn a_missing_distance_scores_zero() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let record = message_record("owner-a", "No distance", "body text");

	h.records.push_message(record.clone());
	collection.push_query_result(hits(vec![record.message_id.to_string()], vec![None]));

	let results =
		h.service.search(super::request("owner-a", "body")).await.expect("Search should succeed.");

	assert_eq!(results.len(), 1);
	assert_eq!(results[0].score, 0.0);
}

#[tokio::test]
async fn hits_for_another_tenant_never_leak_through() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let foreign = message_record("owner-b", "Private", "belongs to another tenant");

	h.records.push_message(foreign.clone());

	// A mis-indexed raw hit pointing at owner-b's record.
	collection.push_query_result(hits(vec![foreign.message_id.to_string()], vec![Some(0.1)]));

	let results =
		h.service.search(super::request("owner-a", "tenant")).await.expect("Search should succeed.");

	assert!(results.is_empty());
}

#[tokio::test]
async fn query_failures_degrade_to_an_empty_result() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);

	collection.fail_next_queries(3);

	let results =
		h.service.search(super::request("owner-a", "anything")).await.expect("Search should not error.");

	assert!(results.is_empty());
	assert_eq!(collection.query_calls(), 3);
}

#[tokio::test]
async fn a_hit_whose_record_vanished_is_dropped() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let kept = message_record("owner-a", "Kept", "still in the record store");

	h.records.push_message(kept.clone());
	collection.push_query_result(hits(
		vec![Uuid::new_v4().to_string(), kept.message_id.to_string()],
		vec![Some(0.1), Some(0.2)],
	));

	let results =
		h.service.search(super::request("owner-a", "record")).await.expect("Search should succeed.");
	let ids: Vec<Uuid> = results.iter().map(|result| result.id).collect();

	assert_eq!(ids, vec![kept.message_id]);
}

#[tokio::test]
async fn snippets_center_on_the_query_inside_the_normalized_body() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let body = format!(
		"<p>{} the quick brown fox jumps over the lazy dog {}</p>",
		"intro ".repeat(50),
		"outro ".repeat(50)
	);
	let record = message_record("owner-a", "Foxes", &body);

	h.records.push_message(record.clone());
	collection.push_query_result(hits(vec![record.message_id.to_string()], vec![Some(0.2)]));

	let results = h
		.service
		.search(super::request("owner-a", "brown fox"))
		.await
		.expect("Search should succeed.");

	assert_eq!(results.len(), 1);

	let snippet = &results[0].snippet;

	assert!(snippet.contains("brown fox"));
	assert!(snippet.len() < body.len());
	assert!(snippet.starts_with("..."));
	assert!(snippet.ends_with("..."));
}

#[tokio::test]
async fn date_range_filters_apply_at_hydration() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let mut old = message_record("owner-a", "Old", "archive body");
	let recent = message_record("owner-a", "Recent", "fresh body");

	old.sent_at = recent.sent_at - Duration::days(30);

	h.records.push_message(old.clone());
	h.records.push_message(recent.clone());
	collection.push_query_result(hits(
		vec![old.message_id.to_string(), recent.message_id.to_string()],
		vec![Some(0.1), Some(0.2)],
	));

	let mut req = super::request("owner-a", "body");

	req.sent_after = Some(recent.sent_at - Duration::days(7));

	let results = h.service.search(req).await.expect("Search should succeed.");
	let ids: Vec<Uuid> = results.iter().map(|result| result.id).collect();

	assert_eq!(ids, vec![recent.message_id]);
}

#[tokio::test]
async fn authoritative_metadata_wins_over_the_stored_snapshot() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let record = message_record("owner-a", "Fresh subject", "body text");

	h.records.push_message(record.clone());

	let mut stale = Metadata::new();

	stale.insert("subject".to_string(), serde_json::json!("Stale subject"));
	stale.insert("index_note".to_string(), serde_json::json!("kept"));

	collection.push_query_result(QueryOutput {
		ids: vec![record.message_id.to_string()],
		distances: vec![Some(0.3)],
		metadatas: vec![stale],
	});

	let results =
		h.service.search(super::request("owner-a", "body")).await.expect("Search should succeed.");
	let metadata = &results[0].metadata;

	assert_eq!(metadata.get("subject"), Some(&serde_json::json!("Fresh subject")));
	assert_eq!(metadata.get("index_note"), Some(&serde_json::json!("kept")));
}

#[tokio::test]
async fn no_hits_is_an_empty_list_not_an_error() {
	let h = super::harness();

	h.store.seed(EMAILS_COLLECTION);

	let results = h
		.service
		.search(super::request("owner-a", "nothing indexed"))
		.await
		.expect("Search should succeed.");

	assert!(results.is_empty());
}

#[tokio::test]
async fn a_blank_owner_is_rejected() {
	let h = super::harness();

	assert!(matches!(
		h.service.search(super::request("  ", "query")).await,
		Err(ServiceError::InvalidRequest { .. })
	));
}

#[tokio::test]
async fn limit_caps_the_result_list() {
	let h = super::harness();
	let collection = h.store.seed(EMAILS_COLLECTION);
	let mut ids = Vec::new();
	let mut distances = Vec::new();

	for index in 0..5 {
		let record = message_record("owner-a", &format!("Subject {index}"), "common body");

		ids.push(record.message_id.to_string());
		distances.push(Some(0.1 * index as f32));
		h.records.push_message(record);
	}

	collection.push_query_result(hits(ids, distances));

	let mut req = super::request("owner-a", "body");

	req.limit = Some(2);

	let results = h.service.search(req).await.expect("Search should succeed.");

	assert_eq!(results.len(), 2);
	assert!(results[0].score >= results[1].score);
}
