//! Scenario: a goal memory accumulates progress/blocker links from later
//! memories, and the coaching view reports the resulting counts.

use mnemos_e2e_tests::harness::TestClient;
use mnemos_e2e_tests::mocks::ingest;

#[tokio::test]
async fn progress_and_blocker_memories_link_to_the_goal() {
    let harness = TestClient::new_temp().await;
    let client = &harness.client;

    let goal = client
        .store_memory_with_conflict_detection(ingest("My goal is to run a marathon this year.", "u1"))
        .await
        .unwrap();
    client
        .store_memory_with_conflict_detection(ingest(
            "I finished a 10 mile training run for the marathon this year.",
            "u1",
        ))
        .await
        .unwrap();
    client
        .store_memory_with_conflict_detection(ingest(
            "I'm stuck on my marathon training run, it is really difficult this year.",
            "u1",
        ))
        .await
        .unwrap();

    let clusters = client.goal_clusters("u1").await.unwrap();
    let cluster = clusters
        .iter()
        .find(|c| c.goal_memory_id == goal.memory_id())
        .expect("goal should have registered a cluster");
    assert_eq!(cluster.progress_ids.len(), 1);
    assert_eq!(cluster.blocker_ids.len(), 1);

    let coaching = client
        .coaching_context("u1", &cluster.id)
        .await
        .unwrap()
        .expect("coaching context should be available for a registered goal");
    assert_eq!(coaching.progress_count, 1);
    assert_eq!(coaching.blocker_count, 1);
}
