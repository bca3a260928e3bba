//! In-process session store with per-record expiry.
//!
//! Records are held as encoded JSON payloads to mirror the semantics of an
//! external key-value cache: every load goes through the versioned decode
//! path, and every save refreshes the record's lifetime.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    models::{SessionEntity, decode_session, encode_session},
    session_store::SessionStore,
    storage::{StorageError, StorageResult},
};

struct StoredRecord {
    payload: String,
    expires_at: Instant,
}

/// Session store backed by an in-process map.
pub struct MemorySessionStore {
    records: Arc<DashMap<String, StoredRecord>>,
    lifetime: Duration,
}

impl MemorySessionStore {
    /// Build a store applying `lifetime` to every saved record.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            lifetime,
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let records = self.records.clone();
        let lifetime = self.lifetime;
        Box::pin(async move {
            let payload = encode_session(&session)
                .map_err(|source| StorageError::corrupt(session.guild_id.clone(), source))?;
            records.insert(
                session.guild_id.clone(),
                StoredRecord {
                    payload,
                    expires_at: Instant::now() + lifetime,
                },
            );
            Ok(())
        })
    }

    fn load(&self, guild_id: &str) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let records = self.records.clone();
        let guild_id = guild_id.to_owned();
        Box::pin(async move {
            let expired = match records.get(&guild_id) {
                Some(record) if record.expires_at > Instant::now() => {
                    return decode_session(&record.payload)
                        .map(Some)
                        .map_err(|source| StorageError::corrupt(guild_id.clone(), source));
                }
                Some(_) => true,
                None => false,
            };
            if expired {
                records.remove(&guild_id);
            }
            Ok(None)
        })
    }

    fn list_unfinished(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let records = self.records.clone();
        Box::pin(async move {
            let now = Instant::now();
            let mut sessions = Vec::new();
            for record in records.iter() {
                if record.expires_at <= now {
                    continue;
                }
                let entity = decode_session(&record.payload)
                    .map_err(|source| StorageError::corrupt(record.key().clone(), source))?;
                if !entity.finished {
                    sessions.push(entity);
                }
            }
            Ok(sessions)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use time::OffsetDateTime;

    use super::*;
    use crate::dao::models::SESSION_REVISION;

    fn entity(guild_id: &str, finished: bool) -> SessionEntity {
        SessionEntity {
            revision: SESSION_REVISION,
            start_time: OffsetDateTime::now_utc(),
            question: "q".into(),
            answers: vec!["a".into()],
            remaining_questions: 1,
            last_question_index: Some(0),
            started: true,
            finished,
            waiting: false,
            guild_id: guild_id.into(),
            channel_id: "channel".into(),
            user_scores: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.save(entity("guild", false)).await.unwrap();

        let loaded = store.load("guild").await.unwrap().unwrap();
        assert_eq!(loaded.guild_id, "guild");
        assert_eq!(loaded.remaining_questions, 1);
    }

    #[tokio::test]
    async fn missing_guild_loads_none() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_record_loads_none() {
        let store = MemorySessionStore::new(Duration::ZERO);
        store.save(entity("guild", false)).await.unwrap();
        assert!(store.load("guild").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_unfinished_skips_concluded_sessions() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.save(entity("guild-live", false)).await.unwrap();
        store.save(entity("guild-done", true)).await.unwrap();

        let unfinished = store.list_unfinished().await.unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].guild_id, "guild-live");
    }

    #[tokio::test]
    async fn corrupt_payload_surfaces_as_storage_error() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.records.insert(
            "guild".into(),
            StoredRecord {
                payload: "{not json".into(),
                expires_at: Instant::now() + Duration::from_secs(60),
            },
        );

        assert!(matches!(
            store.load("guild").await,
            Err(StorageError::Corrupt { .. })
        ));
    }
}
