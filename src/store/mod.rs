//! Durable storage collaborators
//!
//! Provides:
//! - `UserStore`: learner models keyed by user id
//! - `TopicStore`: curriculum topics
//! - In-memory and SQLite implementations

pub mod memory;
pub mod sqlite;

use anyhow::Result;

use crate::curriculum::Topic;
use crate::mastery::UserModel;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Load a learner model; `None` if the user has never been stored
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>>;

    async fn put_user(&self, model: &UserModel) -> Result<()>;

    async fn list_users(&self) -> Result<Vec<String>>;
}

#[async_trait::async_trait]
pub trait TopicStore: Send + Sync {
    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>>;

    /// Topics in insertion order
    async fn list_topics(&self) -> Result<Vec<Topic>>;

    async fn put_topic(&self, topic: &Topic) -> Result<()>;
}
