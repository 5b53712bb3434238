//! Scenario: a direct factual statement is classified as factual on query
//! and its matching fact boosts the result score.

use mnemos_e2e_tests::harness::TestClient;
use mnemos_e2e_tests::mocks::ingest;
use mnemos_core::QueryType;

#[tokio::test]
async fn mothers_name_is_retrievable_via_fact_match() {
    let harness = TestClient::new_temp().await;
    let client = &harness.client;

    let stored = client
        .store_memory_with_conflict_detection(ingest("My mom's name is Sarah.", "u1"))
        .await
        .unwrap();

    let facts = client.extract_facts("My mom's name is Sarah.");
    assert!(facts
        .iter()
        .any(|f| f.predicate == "name" && f.object == "Sarah"));

    let response = client
        .retrieve_context("what is my mom's name", "u1", 5)
        .await
        .unwrap();

    assert_eq!(response.query_type, QueryType::Factual);
    let result = response
        .results
        .iter()
        .find(|r| r.memory.id == stored.memory_id())
        .expect("mom's name memory should be retrieved");
    assert!(result.breakdown.fact_match >= 0.8, "fact_match was {}", result.breakdown.fact_match);
}
