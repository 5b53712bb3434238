//! Scenario: two preference facts with the same predicate but different
//! objects don't contradict each other — both stay current.

use mnemos_e2e_tests::harness::TestClient;
use mnemos_e2e_tests::mocks::ingest;

#[tokio::test]
async fn liking_two_activities_leaves_both_latest() {
    let harness = TestClient::new_temp().await;
    let client = &harness.client;

    let running = client
        .store_memory_with_conflict_detection(ingest("I like running.", "u1"))
        .await
        .unwrap();
    let swimming = client
        .store_memory_with_conflict_detection(ingest("I like swimming.", "u1"))
        .await
        .unwrap();

    let running_node = client.get_memory(running.memory_id()).unwrap().unwrap();
    let swimming_node = client.get_memory(swimming.memory_id()).unwrap().unwrap();
    assert!(running_node.is_latest);
    assert!(swimming_node.is_latest);

    let response = client.retrieve_context("what do I like to do", "u1", 10).await.unwrap();
    let running_result = response
        .results
        .iter()
        .find(|r| r.memory.id == running.memory_id())
        .expect("running memory should be retrievable");
    assert!(running_result.breakdown.keyword >= 0.5);
}
