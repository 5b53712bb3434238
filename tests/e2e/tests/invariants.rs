//! End-to-end invariants that need the full client (storage + vector index
//! + contradiction resolution wired together), as opposed to the narrower
//! per-module invariants already covered by unit tests inside the crate.

use mnemos_e2e_tests::harness::TestClient;
use mnemos_e2e_tests::mocks::ingest;

#[tokio::test]
async fn at_most_one_latest_fact_per_subject_and_predicate() {
    let harness = TestClient::new_temp().await;
    let client = &harness.client;

    let mut ids = Vec::new();
    for city in ["Boston", "Chicago", "Denver", "Seattle"] {
        let outcome = client
            .store_memory_with_conflict_detection(ingest(&format!("I live in {city}."), "u1"))
            .await
            .unwrap();
        ids.push(outcome.memory_id().to_string());
    }

    // Every earlier "lives_in" statement should have been superseded; only
    // the last one ingested stays latest.
    let latest_count = ids
        .iter()
        .filter(|id| client.get_memory(id).unwrap().unwrap().is_latest)
        .count();
    assert_eq!(latest_count, 1, "exactly one city memory should remain latest");
    assert!(client.get_memory(ids.last().unwrap()).unwrap().unwrap().is_latest);
}

#[tokio::test]
async fn freshly_ingested_memory_is_its_own_top_match() {
    let harness = TestClient::new_temp().await;
    let client = &harness.client;

    let stored = client
        .store_message(ingest("The quarterly planning offsite is in Lisbon.", "u1"))
        .await
        .unwrap();

    let response = client
        .retrieve_context("The quarterly planning offsite is in Lisbon.", "u1", 1)
        .await
        .unwrap();
    let top = response.results.first().expect("expected at least one result");
    assert_eq!(top.memory.id, stored);
    assert!(top.breakdown.vector >= 0.999, "vector score was {}", top.breakdown.vector);
}
