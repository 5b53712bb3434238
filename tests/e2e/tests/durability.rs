//! Scenario: a large batch of memories survives closing and reopening the
//! database, and retrieval keeps returning the same top result per query.

use mnemos_e2e_tests::harness::TestClient;
use mnemos_e2e_tests::mocks::TestDataFactory;

const BATCH_SIZE: usize = 1000;

#[tokio::test]
async fn top_result_is_stable_across_reopen() {
    let harness = TestClient::new_temp().await;
    let inputs = TestDataFactory::batch("u1", BATCH_SIZE);

    let mut ids = Vec::with_capacity(BATCH_SIZE);
    for input in inputs {
        let id = harness.client.store_message(input).await.unwrap();
        ids.push(id);
    }

    let queries = [
        "Rust programming uses ownership for memory safety",
        "Python is popular for data science and machine learning",
        "Mitochondria is the powerhouse of the cell",
        "To make pasta, boil water and add salt",
        "Gravity is the force of attraction between masses",
    ];

    let mut before = Vec::new();
    for query in queries {
        let response = harness.client.retrieve_context(query, "u1", 1).await.unwrap();
        before.push(response.results.first().map(|r| r.memory.id.clone()));
    }

    let harness = harness.reopen().await;
    let stats = harness.client.get_memory_stats("u1").unwrap();
    assert_eq!(stats.total_nodes, BATCH_SIZE as i64);

    for (query, expected) in queries.iter().zip(before.iter()) {
        let response = harness.client.retrieve_context(query, "u1", 1).await.unwrap();
        let actual = response.results.first().map(|r| r.memory.id.clone());
        assert_eq!(&actual, expected, "top result for {query:?} changed after reopen");
    }
}
