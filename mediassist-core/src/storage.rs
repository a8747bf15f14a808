use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::Result, severity::AlertList, vitals::VitalsReading};

/// Everything known about one uploaded report.
#[derive(Debug, Clone)]
pub struct ReportSession {
    pub id: String,
    pub current_step_id: String,
    pub status_message: Option<String>,
    pub file_name: Option<String>,
    /// Raw upload; taken by text extraction and not kept afterwards.
    pub document: Option<Vec<u8>>,
    pub text: Option<String>,
    pub vitals: Option<VitalsReading>,
    pub alerts: Option<AlertList>,
    pub summary_requested: bool,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReportSession {
    /// Fresh session with a random id, positioned at `step_id`.
    pub fn new(step_id: &str) -> Self {
        Self::new_from_step(Uuid::new_v4().to_string(), step_id)
    }

    pub fn new_from_step(sid: String, step_id: &str) -> Self {
        Self {
            id: sid,
            current_step_id: step_id.to_string(),
            status_message: None,
            file_name: None,
            document: None,
            text: None,
            vitals: None,
            alerts: None,
            summary_requested: false,
            summary: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_document(mut self, file_name: Option<String>, bytes: Vec<u8>) -> Self {
        self.file_name = file_name;
        self.document = Some(bytes);
        self
    }
}

/// Trait for storing and retrieving report sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: ReportSession) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<ReportSession>>;
    async fn delete(&self, id: &str) -> Result<()>;

    /// Replace a stored session. Returns `false`, storing nothing, when the
    /// session was deleted in the meantime.
    async fn update(&self, session: ReportSession) -> Result<bool>;

    /// Drop every session created at or before `cutoff` and return their ids.
    async fn remove_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>>;
}

/// In-memory implementation of SessionStorage
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, ReportSession>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: ReportSession) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ReportSession>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn update(&self, session: ReportSession) -> Result<bool> {
        match self.sessions.get_mut(&session.id) {
            Some(mut entry) => {
                *entry = session;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.created_at <= cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        for id in &expired {
            self.sessions.remove(id);
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn update_does_not_resurrect_deleted_session() {
        let storage = InMemorySessionStorage::new();
        let mut session = ReportSession::new_from_step("s1".to_string(), "load_text");
        storage.save(session.clone()).await.unwrap();

        session.text = Some("BP 120/80".to_string());
        assert!(storage.update(session.clone()).await.unwrap());
        let stored = storage.get("s1").await.unwrap().unwrap();
        assert_eq!(stored.text.as_deref(), Some("BP 120/80"));

        storage.delete("s1").await.unwrap();
        assert!(!storage.update(session).await.unwrap());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn remove_expired_keeps_recent_sessions() {
        let storage = InMemorySessionStorage::new();
        let mut old = ReportSession::new_from_step("old".to_string(), "load_text");
        old.created_at = Utc::now() - TimeDelta::hours(2);
        storage.save(old).await.unwrap();
        storage
            .save(ReportSession::new_from_step("fresh".to_string(), "load_text"))
            .await
            .unwrap();

        let expired = storage
            .remove_expired(Utc::now() - TimeDelta::hours(1))
            .await
            .unwrap();

        assert_eq!(expired, vec!["old".to_string()]);
        assert_eq!(storage.len(), 1);
        assert!(storage.get("fresh").await.unwrap().is_some());
    }
}
