//! Scenario: a temporally-phrased query is classified as such and favors
//! recently stored memories over older ones in the same session.
//!
//! Recency decay itself (the 30/7/1-day-old thresholds) is exercised at the
//! unit level in `retrieval::tests::recency_decays_with_age`, since nothing
//! in the public facade can backdate a memory's `created_at` — it is always
//! real ingestion time.

use mnemos_e2e_tests::harness::TestClient;
use mnemos_e2e_tests::mocks::ingest;
use mnemos_core::QueryType;

#[tokio::test]
async fn temporal_phrasing_is_classified_as_temporal() {
    let harness = TestClient::new_temp().await;
    let client = &harness.client;

    client
        .store_message(ingest("I went hiking in the mountains.", "u1"))
        .await
        .unwrap();

    let response = client
        .retrieve_context("what happened last week with the hiking trip", "u1", 5)
        .await
        .unwrap();

    assert_eq!(response.query_type, QueryType::Temporal);
    assert!(response.strategies_used.contains(&"keyword"));
}
