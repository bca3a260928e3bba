//! One-shot deferred reconciliations driving a session forward.
//!
//! Each transition arms exactly one timer. There is no cancellation: a timer
//! that fires after the session has already advanced compares the
//! `remaining_questions` snapshot it captured at schedule time against the
//! freshly loaded value and retires as a no-op on mismatch. Duplicate and
//! stale fires are neutralized the same way.
//!
//! The follow-up timer is always armed between the persist and the outbound
//! send: a reply that cannot be delivered must not stall a live session.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dao::session_store::SessionStore,
    error::ServiceError,
    services::{replies, send},
    state::{SharedState, session::Session},
};

/// Arm a single deferred reconciliation for `guild_id`.
///
/// `snapshot` is the `remaining_questions` value observed when the timer was
/// armed.
pub fn schedule_reconcile(state: SharedState, guild_id: String, delay: Duration, snapshot: u32) {
    tokio::spawn(async move {
        sleep(delay).await;
        if let Err(err) = reconcile(&state, &guild_id, snapshot).await {
            warn!(guild_id, error = %err, "deferred reconciliation failed");
        }
    });
}

/// Load the authoritative session and advance it, unless something else did
/// in the interim.
pub async fn reconcile(
    state: &SharedState,
    guild_id: &str,
    snapshot: u32,
) -> Result<(), ServiceError> {
    let Some(store) = state.session_store().await else {
        return Err(ServiceError::Degraded);
    };
    let gate = state.guild_gate(guild_id);
    let _guard = gate.lock().await;

    let Some(entity) = store.load(guild_id).await? else {
        debug!(guild_id, "timer fired for a session that no longer exists");
        return Ok(());
    };
    let mut session: Session = entity.into();

    if session.finished {
        debug!(guild_id, "timer fired on a finished session");
        return Ok(());
    }
    if session.remaining_questions != snapshot {
        debug!(
            guild_id,
            snapshot,
            current = session.remaining_questions,
            "session advanced since timer was armed; retiring"
        );
        return Ok(());
    }

    let store = store.as_ref();
    if session.waiting {
        close_expired_question(state, store, &mut session).await
    } else if session.remaining_questions == 0 {
        finish_session(state, store, &mut session).await
    } else {
        ask_next_question(state, store, &mut session).await
    }
}

/// Pick the next question (never the previous index), open the answer
/// window, and arm the question timeout.
async fn ask_next_question(
    state: &SharedState,
    store: &dyn SessionStore,
    session: &mut Session,
) -> Result<(), ServiceError> {
    let index = state.bank().pick(session.last_question_index);
    session.pose_question(index, state.bank().get(index));
    store.save(session.clone().into()).await?;

    info!(
        guild_id = session.guild_id.as_str(),
        index,
        remaining = session.remaining_questions,
        "asking next question"
    );
    schedule_reconcile(
        state.clone(),
        session.guild_id.clone(),
        state.config().question_delay,
        session.remaining_questions,
    );
    send(state, &session.channel_id, &session.question).await?;
    Ok(())
}

/// Close an unanswered question: reveal the answer (or the trick-question
/// message), decrement the quota, and arm the post-answer delay.
async fn close_expired_question(
    state: &SharedState,
    store: &dyn SessionStore,
    session: &mut Session,
) -> Result<(), ServiceError> {
    let reveal = session.answers.first().cloned();
    session.expire_question();
    let snapshot = session.remaining_questions;
    store.save(session.clone().into()).await?;

    info!(
        guild_id = session.guild_id.as_str(),
        remaining = snapshot,
        "question timed out"
    );
    schedule_reconcile(
        state.clone(),
        session.guild_id.clone(),
        state.config().post_answer_delay,
        snapshot,
    );
    let text = match reveal {
        Some(answer) => replies::timed_out(&answer),
        None => replies::TRICK_QUESTION.to_owned(),
    };
    send(state, &session.channel_id, &text).await?;
    Ok(())
}

/// Conclude the session and announce the winners. Terminal; no further
/// timers are armed.
async fn finish_session(
    state: &SharedState,
    store: &dyn SessionStore,
    session: &mut Session,
) -> Result<(), ServiceError> {
    session.finish();
    store.save(session.clone().into()).await?;

    info!(guild_id = session.guild_id.as_str(), "session finished");
    send(
        state,
        &session.channel_id,
        &replies::winners_announcement(&session.winners()),
    )
    .await?;
    Ok(())
}
