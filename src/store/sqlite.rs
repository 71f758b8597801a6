//! SQLite-backed store for learner models and curriculum topics

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::{TopicStore, UserStore};
use crate::curriculum::Topic;
use crate::mastery::UserModel;

/// Models and topics are stored as JSON documents keyed by id
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init_schema(&conn)?;

        info!("Opened tutor store at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                model TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                topic TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_topics_position ON topics(position);
        "#)?;

        Ok(())
    }

    /// Replace the stored curriculum with `topics`, keeping their order
    pub async fn seed_topics(&self, topics: &[Topic]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM topics", [])?;
        for (position, topic) in topics.iter().enumerate() {
            tx.execute(
                "INSERT INTO topics (id, position, topic) VALUES (?1, ?2, ?3)",
                params![topic.id, position as i64, serde_json::to_string(topic)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>> {
        let conn = self.conn.lock().await;
        let json: Option<String> = conn
            .query_row("SELECT model FROM users WHERE id = ?1", params![user_id], |row| row.get(0))
            .optional()?;

        match json {
            Some(json) => {
                let mut model: UserModel = serde_json::from_str(&json)
                    .with_context(|| format!("Corrupt model for user '{}'", user_id))?;
                // aggregates are derived, never stored
                model.refresh_aggregates(Utc::now());
                Ok(Some(model))
            }
            None => Ok(None),
        }
    }

    async fn put_user(&self, model: &UserModel) -> Result<()> {
        let json = serde_json::to_string(model)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO users (id, model, updated_at) VALUES (?1, ?2, ?3)",
            params![model.user_id, json, model.updated_at.to_rfc3339()],
        )?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

#[async_trait::async_trait]
impl TopicStore for SqliteStore {
    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        let conn = self.conn.lock().await;
        let json: Option<String> = conn
            .query_row("SELECT topic FROM topics WHERE id = ?1", params![topic_id], |row| row.get(0))
            .optional()?;
        json.map(|j| serde_json::from_str(&j).context("Corrupt topic record"))
            .transpose()
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT topic FROM topics ORDER BY position")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        rows.iter()
            .map(|j| serde_json::from_str(j).context("Corrupt topic record"))
            .collect()
    }

    async fn put_topic(&self, topic: &Topic) -> Result<()> {
        let json = serde_json::to_string(topic)?;
        let conn = self.conn.lock().await;
        let position: i64 = conn.query_row(
            "SELECT COALESCE((SELECT position FROM topics WHERE id = ?1), \
             (SELECT COALESCE(MAX(position) + 1, 0) FROM topics))",
            params![topic.id],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO topics (id, position, topic) VALUES (?1, ?2, ?3)",
            params![topic.id, position, json],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::curriculum::sample_curriculum;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_user_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tutor.db");
        let graph = sample_curriculum();

        {
            let store = SqliteStore::new(&path).await.unwrap();
            let mut model = UserModel::new("ada", graph.catalog(), &TrackerConfig::default());
            if let Some(state) = model.skills.get_mut("biology.genetics") {
                state.set_current(0.95);
            }
            store.put_user(&model).await.unwrap();
        }

        let store = SqliteStore::new(&path).await.unwrap();
        let model = store.get_user("ada").await.unwrap().unwrap();
        assert!((model.mastery("biology.genetics") - 0.95).abs() < 1e-12);
        assert!(model.aggregates.strengths.iter().any(|s| s.as_str() == "biology.genetics"));
        assert!(store.get_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_topics_keep_order() {
        let store = SqliteStore::in_memory().unwrap();
        let graph = sample_curriculum();
        store.seed_topics(graph.topics()).await.unwrap();

        let listed: Vec<String> = store.list_topics().await.unwrap().into_iter().map(|t| t.id).collect();
        let expected: Vec<String> = graph.topics().iter().map(|t| t.id.clone()).collect();
        assert_eq!(listed, expected);

        let genetics = store.get_topic("genetics").await.unwrap().unwrap();
        store.put_topic(&genetics).await.unwrap();
        let relisted: Vec<String> = store.list_topics().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(relisted, expected);
    }
}
