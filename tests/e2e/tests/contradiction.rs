//! Scenario: a later statement of the same fact supersedes an earlier one.

use mnemos_e2e_tests::harness::TestClient;
use mnemos_e2e_tests::mocks::ingest;

#[tokio::test]
async fn moving_cities_supersedes_the_old_location() {
    let harness = TestClient::new_temp().await;
    let client = &harness.client;

    let first = client
        .store_memory_with_conflict_detection(ingest("I live in New York City.", "u1"))
        .await
        .unwrap();
    let second = client
        .store_memory_with_conflict_detection(ingest("I live in San Francisco now.", "u1"))
        .await
        .unwrap();

    let old_id = first.memory_id().to_string();
    let new_id = second.memory_id().to_string();
    assert_ne!(old_id, new_id);

    let old = client.get_memory(&old_id).unwrap().expect("old memory still exists");
    assert!(!old.is_latest);
    assert_eq!(old.superseded_by.as_deref(), Some(new_id.as_str()));

    let new = client.get_memory(&new_id).unwrap().expect("new memory exists");
    assert!(new.is_latest);

    let edges = client.get_outgoing_edges(&new_id).unwrap();
    assert!(edges
        .iter()
        .any(|e| e.relationship_type == mnemos_core::EdgeType::Supersedes && e.to_id == old_id));

    // Current retrieval only ever surfaces the latest generation of a fact.
    let response = client.retrieve_context("where do I live", "u1", 10).await.unwrap();
    assert!(response.results.iter().any(|r| r.memory.id == new_id));
    assert!(!response.results.iter().any(|r| r.memory.id == old_id));
}
