//! SQLite-backed Storage Engine.
//!
//! Uses separate reader/writer connections so every public method takes
//! `&self`: the writer serializes mutations behind a `Mutex`, while reads
//! can proceed through their own connection without waiting on a writer
//! that might be mid-transaction. Journaling is DELETE (rollback-journal)
//! mode, not WAL, so the database file coexists cleanly with host
//! applications that may also open it directly.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use super::migrations;
use crate::memory::{
    DeleteMode, Edge, EdgeType, EmotionalValence, Fact, GoalCluster, IngestInput, Layer,
    MemoryNode, MemoryStats, MemoryType, Metadata, PredicateCategory, Session, TrackedEntity,
    ValenceSample,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("initialization failed: {0}")]
    Init(String),

    #[error("schema version regression: database is at {on_disk}, crate supports {supported}")]
    SchemaVersionRegression { on_disk: i64, supported: i64 },

    #[error("embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid stored enum value: {0}")]
    InvalidEnum(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Turns a [`crate::config::StorageLocation`] into a concrete database
/// file path under `file_name`. A host application calls this itself
/// before passing the result to [`Storage::new`]; this crate never
/// resolves it implicitly, since discovering where config lives is out of
/// scope (only interpreting it once constructed is in scope).
pub fn resolve_storage_path(
    location: &crate::config::StorageLocation,
    file_name: &str,
) -> Result<PathBuf> {
    use crate::config::StorageLocation;
    use directories::{ProjectDirs, UserDirs};

    let dir = match location {
        StorageLocation::Custom(path) => return Ok(path.clone()),
        StorageLocation::Documents => UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(Path::to_path_buf))
            .ok_or_else(|| StorageError::Init("could not determine documents directory".into()))?,
        StorageLocation::ApplicationSupport => ProjectDirs::from("dev", "mnemos", "mnemos-core")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| StorageError::Init("could not determine application support directory".into()))?,
        StorageLocation::Caches => ProjectDirs::from("dev", "mnemos", "mnemos-core")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .ok_or_else(|| StorageError::Init("could not determine cache directory".into()))?,
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(file_name))
}

/// Conjunction of filters for `query_nodes`.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    pub memory_type: Option<MemoryType>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub content_contains: Option<String>,
    pub metadata_key: Option<String>,
    pub metadata_key_value: Option<(String, String)>,
    pub user_id: Option<String>,
    pub only_latest: bool,
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = DELETE;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA defer_foreign_keys = ON;
         PRAGMA cache_size = -8000;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(s.to_string()))
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<MemoryNode> {
    let memory_type: String = row.get("memory_type")?;
    let layer: String = row.get("layer")?;
    let created_at: String = row.get("created_at")?;
    let conversation_date: String = row.get("conversation_date")?;
    let event_date: Option<String> = row.get("event_date")?;
    let last_accessed: Option<String> = row.get("last_accessed")?;
    let container_tags: String = row.get("container_tags")?;
    let emotional_valence: String = row.get("emotional_valence")?;
    let entities: String = row.get("entities")?;
    let topics: String = row.get("topics")?;
    let metadata: String = row.get("metadata")?;

    Ok(MemoryNode {
        id: row.get("id")?,
        content: row.get("content")?,
        memory_type: MemoryType::from_str(&memory_type).unwrap_or(MemoryType::General),
        layer: Layer::from_str(&layer).unwrap_or(Layer::Working),
        created_at: parse_timestamp(&created_at).unwrap_or_else(|_| Utc::now()),
        conversation_date: parse_timestamp(&conversation_date).unwrap_or_else(|_| Utc::now()),
        event_date: event_date.and_then(|s| parse_timestamp(&s).ok()),
        importance: row.get("importance")?,
        confidence: row.get("confidence")?,
        is_latest: row.get::<_, i64>("is_latest")? != 0,
        is_static: row.get::<_, i64>("is_static")? != 0,
        superseded_by: row.get("superseded_by")?,
        goal_id: row.get("goal_id")?,
        container_tags: serde_json::from_str(&container_tags).unwrap_or_default(),
        user_id: row.get("user_id")?,
        access_count: row.get::<_, i64>("access_count")? as u64,
        useful_retrievals: row.get::<_, i64>("useful_retrievals")? as u64,
        total_retrievals: row.get::<_, i64>("total_retrievals")? as u64,
        last_accessed: last_accessed.and_then(|s| parse_timestamp(&s).ok()),
        emotional_valence: serde_json::from_str(&emotional_valence).unwrap_or_default(),
        entities: serde_json::from_str(&entities).unwrap_or_default(),
        topics: serde_json::from_str(&topics).unwrap_or_default(),
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

/// Single-file embedded relational store. Owns on-disk bytes exclusively;
/// every other component holds only derived/transient state.
pub struct Storage {
    reader: Mutex<Connection>,
    writer: Mutex<Connection>,
    dimensions: usize,
    path: Option<PathBuf>,
}

impl Storage {
    pub fn new(path: Option<PathBuf>, dimensions: usize) -> Result<Self> {
        let (reader, writer) = match &path {
            Some(p) => {
                if let Some(parent) = p.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                (Connection::open(p)?, Connection::open(p)?)
            }
            None => {
                // In-memory databases are connection-local; share one file-backed
                // temp-like setup isn't possible, so reader and writer share a
                // single in-memory connection behind the writer's mutex only
                // when no path is given (test/ephemeral usage).
                let conn = Connection::open_in_memory()?;
                configure_connection(&conn)?;
                migrations::apply_migrations(&conn)?;
                return Ok(Self {
                    reader: Mutex::new(Connection::open_in_memory()?),
                    writer: Mutex::new(conn),
                    dimensions,
                    path: None,
                });
            }
        };

        configure_connection(&reader)?;
        configure_connection(&writer)?;
        migrations::apply_migrations(&writer)?;

        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            dimensions,
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        // When running in-memory without a path, reads go through the
        // writer connection, since SQLite in-memory databases aren't
        // shared across connections.
        if self.path.is_none() {
            return self.writer();
        }
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("reader lock poisoned".into()))
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    pub fn put_node(&self, node: &MemoryNode) -> Result<()> {
        let writer = self.writer()?;
        self.put_node_tx(&writer, node)
    }

    fn put_node_tx(&self, conn: &Connection, node: &MemoryNode) -> Result<()> {
        conn.execute(
            "INSERT INTO nodes (
                id, content, memory_type, layer, created_at, updated_at, conversation_date,
                event_date, importance, confidence, is_latest, is_static, superseded_by,
                goal_id, container_tags, user_id, access_count, useful_retrievals,
                total_retrievals, last_accessed, emotional_valence, entities, topics, metadata
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24)
            ON CONFLICT(id) DO UPDATE SET
                content=excluded.content, memory_type=excluded.memory_type, layer=excluded.layer,
                updated_at=excluded.updated_at, conversation_date=excluded.conversation_date,
                event_date=excluded.event_date, importance=excluded.importance,
                confidence=excluded.confidence, is_latest=excluded.is_latest,
                is_static=excluded.is_static, superseded_by=excluded.superseded_by,
                goal_id=excluded.goal_id, container_tags=excluded.container_tags,
                access_count=excluded.access_count, useful_retrievals=excluded.useful_retrievals,
                total_retrievals=excluded.total_retrievals, last_accessed=excluded.last_accessed,
                emotional_valence=excluded.emotional_valence, entities=excluded.entities,
                topics=excluded.topics, metadata=excluded.metadata",
            params![
                node.id,
                node.content,
                node.memory_type.to_string(),
                node.layer.to_string(),
                node.created_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                node.conversation_date.to_rfc3339(),
                node.event_date.map(|d| d.to_rfc3339()),
                node.importance,
                node.confidence,
                node.is_latest as i64,
                node.is_static as i64,
                node.superseded_by,
                node.goal_id,
                serde_json::to_string(&node.container_tags)?,
                node.user_id,
                node.access_count as i64,
                node.useful_retrievals as i64,
                node.total_retrievals as i64,
                node.last_accessed.map(|d| d.to_rfc3339()),
                serde_json::to_string(&node.emotional_valence)?,
                serde_json::to_string(&node.entities)?,
                serde_json::to_string(&node.topics)?,
                serde_json::to_string(&node.metadata)?,
            ],
        )?;
        Ok(())
    }

    /// Ingests a node plus its embedding and any edges in one transaction;
    /// on failure all three roll back.
    pub fn put_node_with_edges_and_embedding(
        &self,
        node: &MemoryNode,
        embedding: Option<&[f32]>,
        edges: &[Edge],
    ) -> Result<()> {
        if let Some(vector) = embedding {
            if vector.len() != self.dimensions {
                return Err(StorageError::DimensionMismatch {
                    expected: self.dimensions,
                    got: vector.len(),
                });
            }
        }

        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        self.put_node_tx(&tx, node)?;
        if let Some(vector) = embedding {
            tx.execute(
                "INSERT INTO embeddings (node_id, vector, dimensions, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(node_id) DO UPDATE SET vector=excluded.vector,
                    dimensions=excluded.dimensions, created_at=excluded.created_at",
                params![
                    node.id,
                    vector_to_bytes(vector),
                    vector.len() as i64,
                    Utc::now().to_rfc3339(),
                ],
            )?;
        }
        for edge in edges {
            Self::put_edge_tx(&tx, edge)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Result<Option<MemoryNode>> {
        let reader = self.reader()?;
        reader
            .query_row("SELECT * FROM nodes WHERE id = ?1", params![id], row_to_node)
            .optional()
            .map_err(StorageError::from)
    }

    pub fn query_nodes(
        &self,
        filters: &QueryFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MemoryNode>> {
        let reader = self.reader()?;
        let mut clauses: Vec<String> = Vec::new();
        let mut bound: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ty) = filters.memory_type {
            clauses.push("memory_type = ?".to_string());
            bound.push(Box::new(ty.to_string()));
        }
        if let Some(after) = filters.created_after {
            clauses.push("created_at > ?".to_string());
            bound.push(Box::new(after.to_rfc3339()));
        }
        if let Some(before) = filters.created_before {
            clauses.push("created_at < ?".to_string());
            bound.push(Box::new(before.to_rfc3339()));
        }
        if let Some(needle) = &filters.content_contains {
            clauses.push("content LIKE ?".to_string());
            bound.push(Box::new(format!("%{needle}%")));
        }
        if let Some(user_id) = &filters.user_id {
            clauses.push("user_id = ?".to_string());
            bound.push(Box::new(user_id.clone()));
        }
        if let Some(key) = &filters.metadata_key {
            clauses.push("json_extract(metadata, '$.' || ?) IS NOT NULL".to_string());
            bound.push(Box::new(key.clone()));
        }
        if let Some((key, value)) = &filters.metadata_key_value {
            clauses.push("json_extract(metadata, '$.' || ? || '.value') = ?".to_string());
            bound.push(Box::new(key.clone()));
            bound.push(Box::new(value.clone()));
        }
        if filters.only_latest {
            clauses.push("is_latest = 1".to_string());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM nodes {where_clause} ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        bound.push(Box::new(limit));
        bound.push(Box::new(offset));

        let mut stmt = reader.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_node)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    pub fn get_all_nodes(&self, limit: i64, offset: i64) -> Result<Vec<MemoryNode>> {
        self.query_nodes(&QueryFilters::default(), limit, offset)
    }

    /// `edges.from_id`/`edges.to_id` both carry `ON DELETE CASCADE`, so
    /// deleting a node always removes every edge touching it regardless of
    /// direction — `mode` has no further work to do beyond that cascade.
    /// The four variants are kept because callers reason about deletion in
    /// those terms (`crate::memory::DeleteMode`'s doc comment is the source
    /// of truth), but they're not distinguishable at the storage layer.
    pub fn delete_node(&self, id: &str, _mode: DeleteMode) -> Result<bool> {
        let writer = self.writer()?;
        let rows = writer.execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn mark_superseded(&self, old_id: &str, new_id: &str) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "UPDATE nodes SET is_latest = 0, superseded_by = ?2, updated_at = ?3 WHERE id = ?1",
            params![old_id, new_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn record_access(&self, id: &str, useful: Option<bool>) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "UPDATE nodes SET access_count = access_count + 1,
                total_retrievals = total_retrievals + 1,
                useful_retrievals = useful_retrievals + ?2,
                last_accessed = ?3
             WHERE id = ?1",
            params![
                id,
                matches!(useful, Some(true)) as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    pub fn put_edge(&self, edge: &Edge) -> Result<()> {
        let writer = self.writer()?;
        Self::put_edge_tx(&writer, edge)
    }

    fn put_edge_tx(conn: &Connection, edge: &Edge) -> Result<()> {
        conn.execute(
            "INSERT INTO edges (id, from_id, to_id, relationship_type, weight, created_at, metadata)
             VALUES (?1,?2,?3,?4,?5,?6,?7)
             ON CONFLICT(id) DO UPDATE SET weight=excluded.weight, metadata=excluded.metadata",
            params![
                edge.id,
                edge.from_id,
                edge.to_id,
                edge.relationship_type.to_string(),
                edge.weight,
                edge.created_at.to_rfc3339(),
                serde_json::to_string(&edge.metadata)?,
            ],
        )?;
        Ok(())
    }

    fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<Edge> {
        let relationship_type: String = row.get("relationship_type")?;
        let created_at: String = row.get("created_at")?;
        let metadata: String = row.get("metadata")?;
        Ok(Edge {
            id: row.get("id")?,
            from_id: row.get("from_id")?,
            to_id: row.get("to_id")?,
            relationship_type: EdgeType::from_str(&relationship_type)
                .unwrap_or(EdgeType::Related),
            weight: row.get("weight")?,
            created_at: parse_timestamp(&created_at).unwrap_or_else(|_| Utc::now()),
            metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        })
    }

    pub fn get_edges_from(&self, id: &str) -> Result<Vec<Edge>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM edges WHERE from_id = ?1")?;
        let rows = stmt.query_map(params![id], Self::row_to_edge)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    pub fn get_edges_to(&self, id: &str) -> Result<Vec<Edge>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM edges WHERE to_id = ?1")?;
        let rows = stmt.query_map(params![id], Self::row_to_edge)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    pub fn get_edges_between(&self, from_id: &str, to_id: &str) -> Result<Vec<Edge>> {
        let reader = self.reader()?;
        let mut stmt =
            reader.prepare("SELECT * FROM edges WHERE from_id = ?1 AND to_id = ?2")?;
        let rows = stmt.query_map(params![from_id, to_id], Self::row_to_edge)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    // ------------------------------------------------------------------
    // Embeddings
    // ------------------------------------------------------------------

    pub fn put_embedding(&self, node_id: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO embeddings (node_id, vector, dimensions, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(node_id) DO UPDATE SET vector=excluded.vector,
                dimensions=excluded.dimensions, created_at=excluded.created_at",
            params![
                node_id,
                vector_to_bytes(vector),
                vector.len() as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn get_embedding(&self, node_id: &str) -> Result<Option<Vec<f32>>> {
        let reader = self.reader()?;
        let row: Option<(Vec<u8>, i64)> = reader
            .query_row(
                "SELECT vector, dimensions FROM embeddings WHERE node_id = ?1",
                params![node_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((bytes, dims)) => {
                let vector = bytes_to_vector(&bytes);
                if vector.len() != dims as usize || vector.len() != self.dimensions {
                    return Err(StorageError::DimensionMismatch {
                        expected: self.dimensions,
                        got: vector.len(),
                    });
                }
                Ok(Some(vector))
            }
        }
    }

    pub fn list_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT node_id, vector FROM embeddings")?;
        let rows = stmt.query_map([], |row| {
            let node_id: String = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((node_id, bytes_to_vector(&bytes)))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    pub fn delete_embedding(&self, node_id: &str) -> Result<()> {
        let writer = self.writer()?;
        writer.execute("DELETE FROM embeddings WHERE node_id = ?1", params![node_id])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Facts
    // ------------------------------------------------------------------

    pub fn put_fact(&self, fact: &Fact) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO facts (
                id, memory_id, subject, predicate, object, predicate_category, confidence,
                valid_from, valid_until, detection_method, created_at, user_id, is_latest
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
            params![
                fact.id,
                fact.source_memory_id,
                fact.subject,
                fact.predicate,
                fact.object,
                fact.predicate_category.to_string(),
                fact.confidence,
                fact.valid_from.map(|d| d.to_rfc3339()),
                fact.valid_until.map(|d| d.to_rfc3339()),
                fact.detection_method,
                fact.created_at.to_rfc3339(),
                fact.user_id,
                fact.is_latest as i64,
            ],
        )?;
        Ok(())
    }

    fn row_to_fact(row: &rusqlite::Row) -> rusqlite::Result<Fact> {
        let predicate_category: String = row.get("predicate_category")?;
        let valid_from: Option<String> = row.get("valid_from")?;
        let valid_until: Option<String> = row.get("valid_until")?;
        let created_at: String = row.get("created_at")?;
        Ok(Fact {
            id: row.get("id")?,
            subject: row.get("subject")?,
            predicate: row.get("predicate")?,
            object: row.get("object")?,
            predicate_category: PredicateCategory::from_str(&predicate_category)
                .unwrap_or(PredicateCategory::Belief),
            confidence: row.get("confidence")?,
            source_memory_id: row.get("memory_id")?,
            valid_from: valid_from.and_then(|s| parse_timestamp(&s).ok()),
            valid_until: valid_until.and_then(|s| parse_timestamp(&s).ok()),
            detection_method: row.get("detection_method")?,
            user_id: row.get("user_id")?,
            is_latest: row.get::<_, i64>("is_latest")? != 0,
            created_at: parse_timestamp(&created_at).unwrap_or_else(|_| Utc::now()),
        })
    }

    pub fn get_facts_by_subject(&self, subject: &str, user_id: &str) -> Result<Vec<Fact>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM facts WHERE subject = ?1 AND user_id = ?2 AND is_latest = 1",
        )?;
        let rows = stmt.query_map(params![subject, user_id], Self::row_to_fact)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    pub fn list_facts(&self, user_id: &str) -> Result<Vec<Fact>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM facts WHERE user_id = ?1 AND is_latest = 1")?;
        let rows = stmt.query_map(params![user_id], Self::row_to_fact)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    pub fn mark_fact_superseded(&self, fact_id: &str) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "UPDATE facts SET is_latest = 0 WHERE id = ?1",
            params![fact_id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    pub fn put_entity(&self, entity: &TrackedEntity) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO entities (
                id, name, normalized_name, entity_type, aliases, first_mentioned,
                mention_count, related_fact_ids, user_id
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)
             ON CONFLICT(normalized_name, entity_type, user_id) DO UPDATE SET
                mention_count = mention_count + 1,
                related_fact_ids = excluded.related_fact_ids",
            params![
                entity.id,
                entity.name,
                entity.normalized_name,
                entity.entity_type.to_string(),
                serde_json::to_string(&entity.aliases)?,
                entity.first_mentioned.to_rfc3339(),
                entity.mention_count as i64,
                serde_json::to_string(&entity.related_fact_ids)?,
                entity.user_id,
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Goal clusters
    // ------------------------------------------------------------------

    pub fn put_goal_cluster(&self, cluster: &GoalCluster) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO goal_clusters (
                id, goal_memory_id, goal_content, created_at, progress_ids, blocker_ids,
                motivation_ids, insight_ids, emotional_trajectory, user_id
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)
             ON CONFLICT(id) DO UPDATE SET
                progress_ids=excluded.progress_ids, blocker_ids=excluded.blocker_ids,
                motivation_ids=excluded.motivation_ids, insight_ids=excluded.insight_ids,
                emotional_trajectory=excluded.emotional_trajectory",
            params![
                cluster.id,
                cluster.goal_memory_id,
                cluster.goal_content,
                cluster.created_at.to_rfc3339(),
                serde_json::to_string(&cluster.progress_ids)?,
                serde_json::to_string(&cluster.blocker_ids)?,
                serde_json::to_string(&cluster.motivation_ids)?,
                serde_json::to_string(&cluster.insight_ids)?,
                serde_json::to_string(&cluster.emotional_trajectory)?,
                cluster.user_id,
            ],
        )?;
        Ok(())
    }

    fn row_to_goal_cluster(row: &rusqlite::Row) -> rusqlite::Result<GoalCluster> {
        let created_at: String = row.get("created_at")?;
        let progress_ids: String = row.get("progress_ids")?;
        let blocker_ids: String = row.get("blocker_ids")?;
        let motivation_ids: String = row.get("motivation_ids")?;
        let insight_ids: String = row.get("insight_ids")?;
        let emotional_trajectory: String = row.get("emotional_trajectory")?;
        Ok(GoalCluster {
            id: row.get("id")?,
            goal_memory_id: row.get("goal_memory_id")?,
            goal_content: row.get("goal_content")?,
            created_at: parse_timestamp(&created_at).unwrap_or_else(|_| Utc::now()),
            progress_ids: serde_json::from_str(&progress_ids).unwrap_or_default(),
            blocker_ids: serde_json::from_str(&blocker_ids).unwrap_or_default(),
            motivation_ids: serde_json::from_str(&motivation_ids).unwrap_or_default(),
            insight_ids: serde_json::from_str(&insight_ids).unwrap_or_default(),
            emotional_trajectory: serde_json::from_str(&emotional_trajectory).unwrap_or_default(),
            user_id: row.get("user_id")?,
        })
    }

    pub fn get_goal_cluster(&self, id: &str) -> Result<Option<GoalCluster>> {
        let reader = self.reader()?;
        reader
            .query_row(
                "SELECT * FROM goal_clusters WHERE id = ?1",
                params![id],
                Self::row_to_goal_cluster,
            )
            .optional()
            .map_err(StorageError::from)
    }

    pub fn list_goal_clusters(&self, user_id: &str) -> Result<Vec<GoalCluster>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM goal_clusters WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], Self::row_to_goal_cluster)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    pub fn put_goal_link(
        &self,
        id: &str,
        memory_id: &str,
        goal_id: &str,
        relationship_type: &str,
        relevance: f32,
    ) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO memory_goal_links (id, memory_id, goal_id, relationship_type, relevance, created_at)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                id,
                memory_id,
                goal_id,
                relationship_type,
                relevance,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn put_session(&self, session: &Session) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO sessions (id, start, end, session_type, metadata)
             VALUES (?1,?2,?3,?4,?5)
             ON CONFLICT(id) DO UPDATE SET end=excluded.end",
            params![
                session.id,
                session.start.to_rfc3339(),
                session.end.map(|d| d.to_rfc3339()),
                session.session_type,
                serde_json::to_string(&session.metadata)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_session_memories(&self, session_id: &str, user_id: &str) -> Result<Vec<MemoryNode>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM nodes WHERE user_id = ?1
             AND json_extract(metadata, '$.session_id.value') = ?2
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![user_id, session_id], row_to_node)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(StorageError::from)
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    pub fn get_stats(&self, user_id: &str) -> Result<MemoryStats> {
        let reader = self.reader()?;
        let total_nodes: i64 = reader.query_row(
            "SELECT COUNT(*) FROM nodes WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let total_edges: i64 = reader.query_row(
            "SELECT COUNT(*) FROM edges e JOIN nodes n ON e.from_id = n.id WHERE n.user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let total_facts: i64 = reader.query_row(
            "SELECT COUNT(*) FROM facts WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let total_entities: i64 = reader.query_row(
            "SELECT COUNT(*) FROM entities WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let total_goal_clusters: i64 = reader.query_row(
            "SELECT COUNT(*) FROM goal_clusters WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let mut nodes_by_layer = std::collections::HashMap::new();
        let mut stmt = reader.prepare(
            "SELECT layer, COUNT(*) FROM nodes WHERE user_id = ?1 GROUP BY layer",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (layer, count) = row?;
            nodes_by_layer.insert(layer, count);
        }

        Ok(MemoryStats {
            total_nodes,
            total_edges,
            total_facts,
            total_entities,
            total_goal_clusters,
            nodes_by_layer,
        })
    }

    pub fn clear_all_memories(&self, user_id: &str) -> Result<()> {
        let writer = self.writer()?;
        writer.execute("DELETE FROM nodes WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let storage = Storage::new(Some(path), 4).unwrap();
        (dir, storage)
    }

    fn sample_node(id: &str) -> MemoryNode {
        let input = IngestInput {
            content: "I live in NYC".into(),
            user_id: "u1".into(),
            ..Default::default()
        };
        MemoryNode::new(id.into(), input, Utc::now())
    }

    #[test]
    fn put_and_get_node_roundtrips() {
        let (_dir, storage) = temp_storage();
        let node = sample_node("n1");
        storage.put_node(&node).unwrap();
        let fetched = storage.get_node("n1").unwrap().unwrap();
        assert_eq!(fetched.content, node.content);
        assert!(fetched.is_latest);
    }

    #[test]
    fn get_unknown_node_returns_none() {
        let (_dir, storage) = temp_storage();
        assert!(storage.get_node("missing").unwrap().is_none());
    }

    #[test]
    fn delete_unknown_node_is_a_no_op() {
        let (_dir, storage) = temp_storage();
        assert!(!storage.delete_node("missing", DeleteMode::Cascade).unwrap());
    }

    #[test]
    fn put_node_with_embedding_and_edges_is_atomic() {
        let (_dir, storage) = temp_storage();
        let node_a = sample_node("a");
        let node_b = sample_node("b");
        storage.put_node(&node_b).unwrap();

        let edge = Edge::new("e1".into(), "a".into(), "b".into(), EdgeType::Related);
        storage
            .put_node_with_edges_and_embedding(&node_a, Some(&[1.0, 0.0, 0.0, 0.0]), &[edge])
            .unwrap();

        assert!(storage.get_node("a").unwrap().is_some());
        assert_eq!(storage.get_embedding("a").unwrap().unwrap().len(), 4);
        assert_eq!(storage.get_edges_from("a").unwrap().len(), 1);
    }

    #[test]
    fn dimension_mismatch_on_embedding_fails_without_corrupting_state() {
        let (_dir, storage) = temp_storage();
        let node = sample_node("n1");
        let err = storage.put_node_with_edges_and_embedding(&node, Some(&[1.0, 0.0]), &[]);
        assert!(matches!(err, Err(StorageError::DimensionMismatch { .. })));
        assert!(storage.get_node("n1").unwrap().is_none());
    }

    #[test]
    fn delete_node_cascades_embeddings_and_edges() {
        let (_dir, storage) = temp_storage();
        let node_a = sample_node("a");
        let node_b = sample_node("b");
        storage.put_node(&node_a).unwrap();
        storage.put_node(&node_b).unwrap();
        storage.put_embedding("a", &[1.0, 0.0, 0.0, 0.0]).unwrap();
        storage
            .put_edge(&Edge::new("e1".into(), "a".into(), "b".into(), EdgeType::Related))
            .unwrap();

        storage.delete_node("a", DeleteMode::Cascade).unwrap();

        assert!(storage.get_node("a").unwrap().is_none());
        assert!(storage.get_embedding("a").unwrap().is_none());
        assert!(storage.get_edges_from("a").unwrap().is_empty());
    }

    #[test]
    fn mark_superseded_flips_flags() {
        let (_dir, storage) = temp_storage();
        let old = sample_node("old");
        let new = sample_node("new");
        storage.put_node(&old).unwrap();
        storage.put_node(&new).unwrap();

        storage.mark_superseded("old", "new").unwrap();

        let fetched = storage.get_node("old").unwrap().unwrap();
        assert!(!fetched.is_latest);
        assert_eq!(fetched.superseded_by, Some("new".to_string()));
    }

    #[test]
    fn reopening_same_path_reproduces_nodes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        {
            let storage = Storage::new(Some(path.clone()), 4).unwrap();
            storage.put_node(&sample_node("n1")).unwrap();
        }
        let storage = Storage::new(Some(path), 4).unwrap();
        assert!(storage.get_node("n1").unwrap().is_some());
    }

    #[test]
    fn resolve_storage_path_honors_custom_location() {
        let custom = PathBuf::from("/tmp/some/exact/path/mem.db");
        let resolved = resolve_storage_path(
            &crate::config::StorageLocation::Custom(custom.clone()),
            "ignored.db",
        )
        .unwrap();
        assert_eq!(resolved, custom);
    }

    #[test]
    fn resolve_storage_path_application_support_creates_directory() {
        let resolved = resolve_storage_path(
            &crate::config::StorageLocation::ApplicationSupport,
            "swiftmem_test-user.db",
        )
        .unwrap();
        assert_eq!(resolved.file_name().unwrap(), "swiftmem_test-user.db");
        assert!(resolved.parent().unwrap().exists());
    }
}
