//! Schema versioning and migrations.
//!
//! Version is a monotonically increasing integer recorded in
//! `schema_version` with the timestamp of each applied migration. On open,
//! `get_current_version` computes `max(version)`; `apply_migrations` then
//! runs `current+1..=target` in order. Every migration must be idempotent
//! (guard `ALTER TABLE` behind a column-existence check) since a host may
//! reopen an already-migrated database.

use rusqlite::Connection;

use super::StorageError;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                memory_type TEXT NOT NULL,
                layer TEXT NOT NULL DEFAULT 'working',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                conversation_date TEXT NOT NULL,
                event_date TEXT,
                importance REAL NOT NULL DEFAULT 0.5,
                confidence REAL NOT NULL DEFAULT 1.0,
                is_latest INTEGER NOT NULL DEFAULT 1,
                is_static INTEGER NOT NULL DEFAULT 0,
                superseded_by TEXT,
                goal_id TEXT,
                container_tags TEXT NOT NULL DEFAULT '[]',
                user_id TEXT NOT NULL,
                access_count INTEGER NOT NULL DEFAULT 0,
                useful_retrievals INTEGER NOT NULL DEFAULT 0,
                total_retrievals INTEGER NOT NULL DEFAULT 0,
                last_accessed TEXT,
                emotional_valence TEXT NOT NULL DEFAULT '{}',
                entities TEXT NOT NULL DEFAULT '[]',
                topics TEXT NOT NULL DEFAULT '[]',
                metadata TEXT NOT NULL DEFAULT '{}'
            );
            CREATE INDEX IF NOT EXISTS idx_nodes_user ON nodes(user_id);
            CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(memory_type);
            CREATE INDEX IF NOT EXISTS idx_nodes_layer ON nodes(layer);
            CREATE INDEX IF NOT EXISTS idx_nodes_created_at ON nodes(created_at);
            CREATE INDEX IF NOT EXISTS idx_nodes_is_latest ON nodes(is_latest);

            CREATE TABLE IF NOT EXISTS edges (
                id TEXT PRIMARY KEY,
                from_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                to_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                relationship_type TEXT NOT NULL,
                weight REAL NOT NULL DEFAULT 1.0,
                created_at TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}'
            );
            CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_id);
            CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_id);
            CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(relationship_type);

            CREATE TABLE IF NOT EXISTS embeddings (
                node_id TEXT PRIMARY KEY REFERENCES nodes(id) ON DELETE CASCADE,
                vector BLOB NOT NULL,
                dimensions INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS facts (
                id TEXT PRIMARY KEY,
                memory_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                subject TEXT NOT NULL,
                predicate TEXT NOT NULL,
                object TEXT NOT NULL,
                predicate_category TEXT NOT NULL,
                confidence REAL NOT NULL,
                valid_from TEXT,
                valid_until TEXT,
                detection_method TEXT NOT NULL,
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL,
                is_latest INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_facts_memory ON facts(memory_id);
            CREATE INDEX IF NOT EXISTS idx_facts_subject ON facts(subject);
            CREATE INDEX IF NOT EXISTS idx_facts_subject_predicate ON facts(subject, predicate);
            CREATE INDEX IF NOT EXISTS idx_facts_category ON facts(predicate_category);
            CREATE INDEX IF NOT EXISTS idx_facts_user ON facts(user_id);

            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                normalized_name TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                aliases TEXT NOT NULL DEFAULT '[]',
                first_mentioned TEXT NOT NULL,
                mention_count INTEGER NOT NULL DEFAULT 1,
                related_fact_ids TEXT NOT NULL DEFAULT '[]',
                user_id TEXT NOT NULL,
                UNIQUE(normalized_name, entity_type, user_id)
            );

            CREATE TABLE IF NOT EXISTS goal_clusters (
                id TEXT PRIMARY KEY,
                goal_memory_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                goal_content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                progress_ids TEXT NOT NULL DEFAULT '[]',
                blocker_ids TEXT NOT NULL DEFAULT '[]',
                motivation_ids TEXT NOT NULL DEFAULT '[]',
                insight_ids TEXT NOT NULL DEFAULT '[]',
                emotional_trajectory TEXT NOT NULL DEFAULT '[]',
                user_id TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_goal_clusters_user ON goal_clusters(user_id);

            CREATE TABLE IF NOT EXISTS memory_metadata_v2 (
                memory_id TEXT PRIMARY KEY REFERENCES nodes(id) ON DELETE CASCADE,
                layer TEXT NOT NULL,
                temporal_info TEXT NOT NULL DEFAULT '{}',
                emotional_valence TEXT NOT NULL DEFAULT '{}',
                useful_retrievals INTEGER NOT NULL DEFAULT 0,
                total_retrievals INTEGER NOT NULL DEFAULT 0,
                superseded_by TEXT,
                goal_id TEXT
            );

            CREATE TABLE IF NOT EXISTS memory_goal_links (
                id TEXT PRIMARY KEY,
                memory_id TEXT NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
                goal_id TEXT NOT NULL REFERENCES goal_clusters(id) ON DELETE CASCADE,
                relationship_type TEXT NOT NULL,
                relevance REAL NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_goal_links_memory ON memory_goal_links(memory_id);
            CREATE INDEX IF NOT EXISTS idx_goal_links_goal ON memory_goal_links(goal_id);

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                start TEXT NOT NULL,
                end TEXT,
                session_type TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}'
            );
        "#,
    },
];

pub fn get_current_version(conn: &Connection) -> Result<i64, StorageError> {
    let exists: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |_| Ok(true),
        )
        .unwrap_or(false);
    if !exists {
        return Ok(0);
    }
    let version: Option<i64> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version.unwrap_or(0))
}

pub fn apply_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current = get_current_version(conn)?;
    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }
        tracing::info!(version = migration.version, "applying migration");
        conn.execute_batch(migration.sql)?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().to_rfc3339()],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_starts_at_zero_then_migrates() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), 0);
        apply_migrations(&conn).unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), 1);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        apply_migrations(&conn).unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), 1);
    }
}
