//! In-process store, mainly for tests and ephemeral sessions

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{TopicStore, UserStore};
use crate::curriculum::Topic;
use crate::mastery::UserModel;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, UserModel>>,
    topics: RwLock<Vec<Topic>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topics(topics: Vec<Topic>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            topics: RwLock::new(topics),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned().map(|mut model| {
            model.refresh_aggregates(Utc::now());
            model
        }))
    }

    async fn put_user(&self, model: &UserModel) -> Result<()> {
        self.users.write().await.insert(model.user_id.clone(), model.clone());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.users.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait::async_trait]
impl TopicStore for MemoryStore {
    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        Ok(self.topics.read().await.iter().find(|t| t.id == topic_id).cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.topics.read().await.clone())
    }

    async fn put_topic(&self, topic: &Topic) -> Result<()> {
        let mut topics = self.topics.write().await;
        match topics.iter_mut().find(|t| t.id == topic.id) {
            Some(existing) => *existing = topic.clone(),
            None => topics.push(topic.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::curriculum::SkillCatalog;
    use crate::types::Difficulty;

    #[tokio::test]
    async fn test_user_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get_user("ada").await.unwrap().is_none());

        let model = UserModel::new("ada", &SkillCatalog::new(), &TrackerConfig::default());
        store.put_user(&model).await.unwrap();
        assert!(store.get_user("ada").await.unwrap().is_some());
        assert_eq!(store.list_users().await.unwrap(), vec!["ada"]);
    }

    #[tokio::test]
    async fn test_put_topic_replaces() {
        let store = MemoryStore::new();
        store.put_topic(&Topic::new("a", "A", Difficulty::default(), 10)).await.unwrap();
        store.put_topic(&Topic::new("a", "A2", Difficulty::default(), 10)).await.unwrap();
        let topics = store.list_topics().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].name, "A2");
    }
}
