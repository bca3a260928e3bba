//! Serialized session records and the versioned decode path.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Schema revision written into every persisted session record. Bump this
/// whenever the stored layout changes so old payloads are rejected instead
/// of silently misread.
pub const SESSION_REVISION: u32 = 1;

/// Stored form of a trivia session, serialized to JSON by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntity {
    /// Schema revision tag, see [`SESSION_REVISION`].
    pub revision: u32,
    /// Timestamp the session was created.
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// Current question text (empty if none asked yet).
    pub question: String,
    /// Accepted answers for the current question; may be empty.
    pub answers: Vec<String>,
    /// Questions left to ask, including the current one.
    pub remaining_questions: u32,
    /// Bank index of the most recently asked question.
    pub last_question_index: Option<usize>,
    /// Whether the session has been started.
    pub started: bool,
    /// Whether the session has concluded.
    pub finished: bool,
    /// Whether the session is currently blocking on an answer.
    pub waiting: bool,
    /// Community the session belongs to; also the store key.
    pub guild_id: String,
    /// The single channel this session is bound to.
    pub channel_id: String,
    /// Accumulated score per participant.
    pub user_scores: HashMap<String, u32>,
}

/// Error raised when a stored payload cannot be turned into a [`SessionEntity`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON for the current layout.
    #[error("malformed session record")]
    Malformed(#[from] serde_json::Error),
    /// The payload was written by an incompatible schema revision.
    #[error("unsupported session revision {found} (expected {SESSION_REVISION})")]
    UnsupportedRevision {
        /// Revision tag found in the stored payload.
        found: u32,
    },
}

/// Serialize a session record to its stored JSON form.
pub fn encode_session(entity: &SessionEntity) -> serde_json::Result<String> {
    serde_json::to_string(entity)
}

/// Decode a stored payload, rejecting unknown schema revisions.
pub fn decode_session(raw: &str) -> Result<SessionEntity, DecodeError> {
    let entity: SessionEntity = serde_json::from_str(raw)?;
    if entity.revision != SESSION_REVISION {
        return Err(DecodeError::UnsupportedRevision {
            found: entity.revision,
        });
    }
    Ok(entity)
}
