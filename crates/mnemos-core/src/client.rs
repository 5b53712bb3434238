//! Client Facade: composes Storage, the Vector Index, the embedding
//! provider, extraction, contradiction resolution, goal clustering, and
//! retrieval behind a single set of async entry points.

use crate::config::{Config, VectorIndexKind};
use crate::contradiction::{self, ContradictionType, Resolution};
use crate::embeddings::{validate_dimensions, EmbeddingProvider};
use crate::error::{MemoryError, Result};
use crate::extraction::extract;
use crate::goals::GoalRegistry;
use crate::memory::{DeleteMode, Edge, EdgeType, Fact, IngestInput, MemoryNode, MemoryStats, Session, TrackedEntity};
use crate::retrieval::{self, RetrievalResponse, RetrievalSnapshot};
use crate::search::{LinearIndex, VectorIndex};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "vector-search")]
use crate::search::HnswIndex;

/// Cosine similarity above which an incoming memory is treated as a
/// duplicate of an existing one rather than ingested anew. Runs before
/// contradiction resolution: per the duplicate-vs-contradiction ordering
/// question, dedup always takes precedence, so a near-identical restatement
/// of an existing fact never reaches the contradiction engine.
const DUPLICATE_SIMILARITY_THRESHOLD: f32 = 0.85;

#[derive(Debug, Clone)]
pub enum StoreOutcome {
    Duplicate {
        memory_id: String,
        similarity: f32,
    },
    Stored {
        memory_id: String,
        contradictions: Vec<contradiction::ContradictionResult>,
    },
}

impl StoreOutcome {
    pub fn memory_id(&self) -> &str {
        match self {
            StoreOutcome::Duplicate { memory_id, .. } => memory_id,
            StoreOutcome::Stored { memory_id, .. } => memory_id,
        }
    }
}

/// Query-embedding cache capacity: recent retrieval calls tend to repeat a
/// handful of phrasings (timeline scrubbing, coaching check-ins), so this
/// stays small rather than growing with the corpus.
const QUERY_CACHE_CAPACITY: usize = 100;

/// Top-level facade. Cheap to clone (everything inside is `Arc`-shared);
/// intended to be constructed once per embedded database and shared across
/// callers.
pub struct MemoryClient {
    config: Config,
    storage: crate::storage::Storage,
    vector_index: RwLock<Box<dyn VectorIndex>>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    goal_registry: Arc<GoalRegistry>,
    loaded_goal_users: Mutex<HashSet<String>>,
    sessions: Mutex<std::collections::HashMap<String, Session>>,
    query_cache: Mutex<lru::LruCache<String, Vec<f32>>>,
}

impl MemoryClient {
    /// Opens (creating if necessary) the database at `path`, runs
    /// migrations, and streams persisted embeddings into a fresh Vector
    /// Index, logging the recovered count.
    pub async fn new(
        config: Config,
        path: Option<PathBuf>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if embedding_provider.dimensions() != config.embedding_dimensions {
            return Err(MemoryError::Configuration(format!(
                "embedding provider reports {} dimensions, config expects {}",
                embedding_provider.dimensions(),
                config.embedding_dimensions
            )));
        }

        let storage = crate::storage::Storage::new(path, config.embedding_dimensions)?;

        let mut vector_index = build_vector_index(&config)?;
        let embeddings = storage.list_embeddings()?;
        let embedding_count = embeddings.len();
        vector_index.rebuild_from(&mut embeddings.into_iter())?;
        tracing::info!(count = embedding_count, "loaded embeddings into vector index");

        Ok(Self {
            config,
            storage,
            vector_index: RwLock::new(vector_index),
            embedding_provider,
            goal_registry: Arc::new(GoalRegistry::new()),
            loaded_goal_users: Mutex::new(HashSet::new()),
            sessions: Mutex::new(std::collections::HashMap::new()),
            query_cache: Mutex::new(lru::LruCache::new(
                std::num::NonZeroUsize::new(QUERY_CACHE_CAPACITY).expect("capacity is non-zero"),
            )),
        })
    }

    /// Embeds `query_text`, reusing a cached vector for a repeated query
    /// rather than calling the embedding provider again.
    async fn embed_query(&self, query_text: &str) -> std::result::Result<Vec<f32>, crate::embeddings::EmbeddingError> {
        if let Some(cached) = self.query_cache.lock().await.get(query_text) {
            return Ok(cached.clone());
        }
        let embedding = self.embedding_provider.embed(query_text).await?;
        self.query_cache.lock().await.put(query_text.to_string(), embedding.clone());
        Ok(embedding)
    }

    async fn ensure_goals_loaded(&self, user_id: &str) -> Result<()> {
        let mut loaded = self.loaded_goal_users.lock().await;
        if loaded.contains(user_id) {
            return Ok(());
        }
        let clusters = self.storage.list_goal_clusters(user_id)?;
        self.goal_registry.load_user(user_id, clusters);
        loaded.insert(user_id.to_string());
        Ok(())
    }

    /// Nearest vectors above [`DUPLICATE_SIMILARITY_THRESHOLD`], filtered to
    /// `user_id`'s own memories — the index holds every user's vectors
    /// mixed together (same caveat `clear_all_memories` works around), so an
    /// unfiltered top-1 hit could belong to a different user entirely.
    async fn find_near_duplicate(&self, user_id: &str, embedding: &[f32]) -> Result<Option<(String, f32)>> {
        let index = self.vector_index.read().await;
        let excluded = HashSet::new();
        // Over-fetch past the nearest hit since candidates from other users
        // are filtered out below rather than excluded from the search itself.
        let hits = index.search(embedding, 10, DUPLICATE_SIMILARITY_THRESHOLD, &excluded)?;
        drop(index);

        for (candidate_id, similarity) in hits {
            match self.storage.get_node(&candidate_id)? {
                Some(node) if node.user_id == user_id => return Ok(Some((candidate_id, similarity))),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Plain ingest: embeds and persists a memory with no extraction or
    /// conflict detection. The write-through invariant holds: the node is
    /// not considered stored until both Storage and the Vector Index have
    /// the embedding.
    pub async fn store_message(&self, input: IngestInput) -> Result<String> {
        let now = Utc::now();
        let embedding = self.embedding_provider.embed(&input.content).await?;
        validate_dimensions(&embedding, self.config.embedding_dimensions)?;

        let id = uuid::Uuid::new_v4().to_string();
        let node = MemoryNode::new(id.clone(), input, now);

        self.storage
            .put_node_with_edges_and_embedding(&node, Some(&embedding), &[])?;
        self.vector_index.write().await.insert(&id, &embedding)?;

        Ok(id)
    }

    /// Conflict-aware ingest: extraction, contradiction resolution,
    /// fact/entity persistence, and goal linking, all on top of the same
    /// write-through embedding path as `store_message`.
    pub async fn store_memory_with_conflict_detection(
        &self,
        input: IngestInput,
    ) -> Result<StoreOutcome> {
        let now = Utc::now();
        let user_id = input.user_id.clone();
        let embedding = self.embedding_provider.embed(&input.content).await?;
        validate_dimensions(&embedding, self.config.embedding_dimensions)?;

        if let Some((dup_id, similarity)) = self.find_near_duplicate(&user_id, &embedding).await? {
            self.storage.record_access(&dup_id, None)?;
            return Ok(StoreOutcome::Duplicate {
                memory_id: dup_id,
                similarity,
            });
        }

        self.ensure_goals_loaded(&user_id).await?;

        let extraction = extract(&input.content, now);
        let id = uuid::Uuid::new_v4().to_string();
        let mut node = MemoryNode::new(id.clone(), input, now);
        node.emotional_valence = extraction.valence.clone();
        node.entities = extraction.entities.iter().map(|e| e.name.clone()).collect();
        if crate::goals::is_goal_content(&node.content) {
            node.memory_type = crate::memory::MemoryType::Goal;
        }

        let mut edges = Vec::new();
        let mut contradictions = Vec::new();

        for extracted in &extraction.facts {
            let existing = self.storage.get_facts_by_subject(&extracted.subject, &user_id)?;
            let candidate = Fact {
                id: uuid::Uuid::new_v4().to_string(),
                subject: extracted.subject.clone(),
                predicate: extracted.predicate.clone(),
                object: extracted.object.clone(),
                predicate_category: extracted.category,
                confidence: extracted.confidence,
                source_memory_id: id.clone(),
                valid_from: Some(now),
                valid_until: None,
                detection_method: "regex".to_string(),
                user_id: user_id.clone(),
                is_latest: true,
                created_at: now,
            };

            let result = contradiction::check(&candidate, &existing);
            self.apply_contradiction(&result, &candidate, &id, &mut edges).await?;
            contradictions.push(result);
        }

        for extracted_entity in &extraction.entities {
            let normalized = TrackedEntity::normalize(&extracted_entity.name);
            let tracked = TrackedEntity {
                id: uuid::Uuid::new_v4().to_string(),
                name: extracted_entity.name.clone(),
                normalized_name: normalized,
                entity_type: extracted_entity.entity_type,
                aliases: Vec::new(),
                first_mentioned: now,
                mention_count: 1,
                related_fact_ids: Vec::new(),
                user_id: user_id.clone(),
            };
            // Entity persistence failures are best-effort: logged, never
            // fail the underlying memory's ingest.
            if let Err(err) = self.storage.put_entity(&tracked) {
                tracing::warn!(error = %err, entity = %tracked.name, "failed to persist tracked entity");
            }
        }

        self.storage
            .put_node_with_edges_and_embedding(&node, Some(&embedding), &edges)?;
        self.vector_index.write().await.insert(&id, &embedding)?;

        if matches!(node.memory_type, crate::memory::MemoryType::Goal) {
            let cluster = self
                .goal_registry
                .register_goal(id.clone(), node.content.clone(), user_id.clone());
            self.storage.put_goal_cluster(&cluster)?;
        } else {
            let links =
                self.goal_registry
                    .link(&id, &node.content, node.emotional_valence.sentiment, &user_id);
            for link in &links {
                let link_id = uuid::Uuid::new_v4().to_string();
                let relationship = classification_label(link.classification);
                if let Err(err) =
                    self.storage
                        .put_goal_link(&link_id, &id, &link.goal_id, relationship, link.relevance)
                {
                    tracing::warn!(error = %err, goal_id = %link.goal_id, "failed to persist goal link");
                    continue;
                }
                if let Some(cluster) = self.goal_registry.get(&link.goal_id) {
                    self.storage.put_goal_cluster(&cluster)?;
                }
            }
        }

        Ok(StoreOutcome::Stored {
            memory_id: id,
            contradictions,
        })
    }

    async fn apply_contradiction(
        &self,
        result: &contradiction::ContradictionResult,
        candidate: &Fact,
        memory_id: &str,
        edges: &mut Vec<Edge>,
    ) -> Result<()> {
        if result.contradiction_type == ContradictionType::None {
            self.storage.put_fact(candidate)?;
            return Ok(());
        }

        match result.resolution {
            Resolution::NewSupersedes => {
                if let Some(old) = &result.existing {
                    self.storage.mark_fact_superseded(&old.id)?;
                    self.storage.mark_superseded(&old.source_memory_id, memory_id)?;
                    edges.push(Edge::new(
                        uuid::Uuid::new_v4().to_string(),
                        memory_id.to_string(),
                        old.source_memory_id.clone(),
                        EdgeType::Supersedes,
                    ));
                    self.vector_index.write().await.remove(&old.source_memory_id)?;
                }
                self.storage.put_fact(candidate)?;
            }
            Resolution::KeepExisting => {
                let mut audit = candidate.clone();
                audit.is_latest = false;
                self.storage.put_fact(&audit)?;
            }
            Resolution::Coexist | Resolution::NeedsUserInput | Resolution::None => {
                self.storage.put_fact(candidate)?;
            }
        }
        Ok(())
    }

    pub async fn delete_memory(&self, id: &str, mode: DeleteMode) -> Result<bool> {
        let deleted = self.storage.delete_node(id, mode)?;
        if deleted {
            self.vector_index.write().await.remove(id)?;
        }
        Ok(deleted)
    }

    /// Classifies `query_text`, gathers a per-user snapshot, and runs the
    /// four retrieval strategies concurrently over it.
    pub async fn retrieve_context(
        &self,
        query_text: &str,
        user_id: &str,
        top_k: usize,
    ) -> Result<RetrievalResponse> {
        self.retrieve_context_with_cancellation(query_text, user_id, top_k, CancellationToken::new())
            .await
    }

    pub async fn retrieve_context_with_cancellation(
        &self,
        query_text: &str,
        user_id: &str,
        top_k: usize,
        cancel: CancellationToken,
    ) -> Result<RetrievalResponse> {
        self.ensure_goals_loaded(user_id).await?;

        let filters = crate::storage::QueryFilters {
            user_id: Some(user_id.to_string()),
            only_latest: true,
            ..Default::default()
        };
        let nodes = self
            .storage
            .query_nodes(&filters, self.config.default_max_results as i64, 0)?;
        let facts = self.storage.list_facts(user_id)?;

        let query_embedding = match self.embed_query(query_text).await {
            Ok(v) => Some(v),
            Err(err) => {
                tracing::warn!(error = %err, "query embedding failed, falling back to keyword-only retrieval");
                None
            }
        };

        let snapshot = RetrievalSnapshot {
            nodes,
            facts,
            query_embedding,
        };

        let index = self.vector_index.read().await;
        let response = retrieval::retrieve(
            query_text,
            user_id,
            top_k,
            snapshot,
            index.as_ref(),
            self.goal_registry.as_ref(),
            cancel,
        )
        .await;
        drop(index);

        for result in &response.results {
            let _ = self.storage.record_access(&result.memory.id, None);
        }

        Ok(response)
    }

    pub async fn query_across_sessions(
        &self,
        query_text: &str,
        user_id: &str,
        top_k: usize,
    ) -> Result<RetrievalResponse> {
        self.retrieve_context(query_text, user_id, top_k).await
    }

    pub fn get_timeline(
        &self,
        user_id: &str,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<MemoryNode>> {
        let filters = crate::storage::QueryFilters {
            user_id: Some(user_id.to_string()),
            created_after: after,
            created_before: before,
            only_latest: true,
            ..Default::default()
        };
        let mut nodes = self.storage.query_nodes(&filters, limit, 0)?;
        nodes.sort_by_key(|n| n.created_at);
        Ok(nodes)
    }

    pub async fn start_session(&self, session_type: &str) -> String {
        let session = Session::new(uuid::Uuid::new_v4().to_string(), session_type.to_string());
        let id = session.id.clone();
        if let Err(err) = self.storage.put_session(&session) {
            tracing::warn!(error = %err, "failed to persist session start");
        }
        self.sessions.lock().await.insert(id.clone(), session);
        id
    }

    pub async fn end_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.end = Some(Utc::now());
            self.storage.put_session(session)?;
        }
        Ok(())
    }

    pub fn get_session_memories(&self, session_id: &str, user_id: &str) -> Result<Vec<MemoryNode>> {
        Ok(self.storage.get_session_memories(session_id, user_id)?)
    }

    /// Fetches a single memory by id regardless of `is_latest` status, unlike
    /// [`Self::retrieve_context`] and [`Self::get_timeline`] which only see
    /// the current generation of each fact.
    pub fn get_memory(&self, id: &str) -> Result<Option<MemoryNode>> {
        Ok(self.storage.get_node(id)?)
    }

    /// Outgoing edges from a memory, e.g. the `Supersedes` edge a
    /// contradiction resolution creates on the new memory pointing at the
    /// one it replaced.
    pub fn get_outgoing_edges(&self, id: &str) -> Result<Vec<Edge>> {
        Ok(self.storage.get_edges_from(id)?)
    }

    /// Runs extraction alone, without persisting anything; useful for
    /// callers that want to preview facts before committing to an ingest.
    pub fn extract_facts(&self, text: &str) -> Vec<crate::extraction::ExtractedFact> {
        extract(text, Utc::now()).facts
    }

    pub fn get_memory_stats(&self, user_id: &str) -> Result<MemoryStats> {
        Ok(self.storage.get_stats(user_id)?)
    }

    /// Coaching view of a single goal cluster: progress/blocker/motivation
    /// counts and the trend derived from them. `None` if `goal_id` names no
    /// cluster this client has loaded for the owning user.
    pub async fn coaching_context(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Option<crate::goals::CoachingContext>> {
        self.ensure_goals_loaded(user_id).await?;
        Ok(self.goal_registry.coaching_context(goal_id))
    }

    /// Every goal cluster this client has registered for `user_id`.
    pub async fn goal_clusters(&self, user_id: &str) -> Result<Vec<crate::memory::GoalCluster>> {
        self.ensure_goals_loaded(user_id).await?;
        Ok(self.goal_registry.all_for_user(user_id))
    }

    pub async fn clear_all_memories(&self, user_id: &str) -> Result<()> {
        self.storage.clear_all_memories(user_id)?;
        self.goal_registry.load_user(user_id, Vec::new());
        self.loaded_goal_users.lock().await.remove(user_id);
        // Cheapest correct way to drop this user's vectors from an index
        // that has no user-scoped removal: rebuild from what Storage still
        // has, which by now excludes the cleared user's rows.
        let remaining = self.storage.list_embeddings()?;
        let mut index = self.vector_index.write().await;
        index.rebuild_from(&mut remaining.into_iter())?;
        Ok(())
    }
}

fn classification_label(classification: crate::goals::LinkClassification) -> &'static str {
    match classification {
        crate::goals::LinkClassification::Progress => "progress_toward",
        crate::goals::LinkClassification::Blocker => "blocker_for",
        crate::goals::LinkClassification::Motivation => "motivation_for",
        crate::goals::LinkClassification::RelatedTo => "insight_about",
    }
}

fn build_vector_index(config: &Config) -> Result<Box<dyn VectorIndex>> {
    match config.vector_index {
        VectorIndexKind::Linear => Ok(Box::new(LinearIndex::new(config.embedding_dimensions))),
        VectorIndexKind::Hnsw => {
            #[cfg(feature = "vector-search")]
            {
                Ok(Box::new(HnswIndex::new(
                    config.embedding_dimensions,
                    config.hnsw.m,
                    config.hnsw.ef_construction,
                )?))
            }
            #[cfg(not(feature = "vector-search"))]
            {
                Err(MemoryError::Configuration(
                    "vector_index = hnsw requires the `vector-search` feature".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DeterministicProvider {
        dims: usize,
        calls: AtomicUsize,
    }

    impl DeterministicProvider {
        fn new(dims: usize) -> Self {
            Self {
                dims,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for DeterministicProvider {
        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            let seed = self.calls.fetch_add(1, Ordering::SeqCst) as f32;
            let mut v = vec![0.0; self.dims];
            let hash: u32 = text.bytes().map(|b| b as u32).sum();
            v[(hash as usize + seed as usize) % self.dims] = 1.0;
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn model_id(&self) -> &str {
            "deterministic-test-provider"
        }
    }

    async fn test_client() -> MemoryClient {
        let mut config = Config {
            embedding_dimensions: 8,
            ..Config::default()
        };
        config.vector_index = VectorIndexKind::Linear;
        let provider = Arc::new(DeterministicProvider::new(8));
        MemoryClient::new(config, None, provider).await.unwrap()
    }

    fn ingest(content: &str, user_id: &str) -> IngestInput {
        IngestInput {
            content: content.to_string(),
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn store_message_roundtrips_through_storage() {
        let client = test_client().await;
        let id = client.store_message(ingest("hello world", "u1")).await.unwrap();
        let node = client.storage.get_node(&id).unwrap().unwrap();
        assert_eq!(node.content, "hello world");
    }

    #[tokio::test]
    async fn contradiction_marks_old_node_superseded() {
        let client = test_client().await;
        client
            .store_memory_with_conflict_detection(ingest("I live in NYC.", "u1"))
            .await
            .unwrap();
        let outcome = client
            .store_memory_with_conflict_detection(ingest("I moved to San Francisco.", "u1"))
            .await
            .unwrap();

        match outcome {
            StoreOutcome::Stored { contradictions, .. } => {
                assert!(contradictions
                    .iter()
                    .any(|c| c.contradiction_type != ContradictionType::None));
            }
            StoreOutcome::Duplicate { .. } => panic!("expected a stored outcome"),
        }
    }

    #[tokio::test]
    async fn clear_all_memories_empties_stats() {
        let client = test_client().await;
        client.store_message(ingest("hello", "u1")).await.unwrap();
        client.clear_all_memories("u1").await.unwrap();
        let stats = client.get_memory_stats("u1").unwrap();
        assert_eq!(stats.total_nodes, 0);
    }

    #[tokio::test]
    async fn embed_query_caches_repeated_queries() {
        // DeterministicProvider's embedding changes every call (it mixes in
        // a counter), so two cache hits for the same text only agree if
        // embed_query actually served the second one from the cache.
        let client = test_client().await;
        let first = client.embed_query("where do I live").await.unwrap();
        let second = client.embed_query("where do I live").await.unwrap();
        assert_eq!(first, second);
    }
}
