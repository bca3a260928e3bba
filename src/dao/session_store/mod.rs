//! Store abstraction for session records.

pub mod memory;

use futures::future::BoxFuture;

use crate::dao::{models::SessionEntity, storage::StorageResult};

/// Abstraction over the persistence layer for trivia sessions.
///
/// Records are keyed by guild identifier alone; the channel a session is
/// bound to lives inside the record. Every save refreshes the backend's
/// fixed record lifetime, so abandoned sessions expire on their own.
pub trait SessionStore: Send + Sync {
    /// Persist a session record, replacing any previous one for the guild.
    fn save(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the session record for a guild, if one exists and has not expired.
    fn load(&self, guild_id: &str) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// All stored sessions that have not concluded, used to resume after a restart.
    fn list_unfinished(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
