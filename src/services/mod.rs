//! Reconciliation services: command dispatch, session flow, and timers.

pub mod commands;
pub mod replies;
pub mod scheduler;
pub mod session_service;
pub mod storage_supervisor;

use std::sync::Arc;

use crate::{
    dao::session_store::SessionStore, error::ServiceError, state::SharedState,
};

/// Obtain the installed session store or fail the reconciliation as degraded.
pub(crate) async fn require_store(
    state: &SharedState,
) -> Result<Arc<dyn SessionStore>, ServiceError> {
    state.session_store().await.ok_or(ServiceError::Degraded)
}

/// Deliver a plain-text reply to a channel.
pub(crate) async fn send(
    state: &SharedState,
    channel_id: &str,
    text: &str,
) -> Result<(), ServiceError> {
    state
        .transport()
        .send_message(channel_id, text)
        .await
        .map_err(ServiceError::Transport)
}
