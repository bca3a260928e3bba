//! Reconciliation entry points for start, stop, and free-text answers.
//!
//! Every function here runs one atomic load-decide-persist sequence under
//! the guild's gate. Mutations are persisted before any reply is sent, so a
//! failed write abandons the in-memory mutation and the next load re-reads
//! the last durably saved record. Follow-up timers are armed right after the
//! persist and before any reply, so a failed delivery never leaves a live
//! session without a pending reconciliation.

use tracing::{debug, info};

use crate::{
    error::ServiceError,
    matcher,
    services::{replies, require_store, scheduler, send},
    state::{SharedState, session::Session},
};

/// Begin a session in `target_channel_id` for a guild.
///
/// Fails with [`ServiceError::ChannelNotFound`] before taking any state
/// action when the referenced channel does not exist. A live session makes
/// this a no-op with an "already in progress" reply; a finished one is
/// superseded by the fresh record.
pub async fn handle_start(
    state: &SharedState,
    guild_id: &str,
    origin_channel_id: &str,
    target_channel_id: &str,
) -> Result<(), ServiceError> {
    if !state.transport().channel_exists(target_channel_id).await {
        return Err(ServiceError::ChannelNotFound(target_channel_id.to_owned()));
    }

    let store = require_store(state).await?;
    let gate = state.guild_gate(guild_id);
    let _guard = gate.lock().await;

    if let Some(existing) = store.load(guild_id).await? {
        if existing.started && !existing.finished {
            send(
                state,
                origin_channel_id,
                &replies::game_already_running(&existing.channel_id),
            )
            .await?;
            return Ok(());
        }
    }

    let mut session = Session::new(
        guild_id.to_owned(),
        target_channel_id.to_owned(),
        state.config().questions_per_game,
        state.bank(),
    );
    session.started = true;
    let snapshot = session.remaining_questions;
    store.save(session.clone().into()).await?;

    info!(
        guild_id,
        channel_id = target_channel_id,
        questions = snapshot,
        "started trivia session"
    );
    scheduler::schedule_reconcile(
        state.clone(),
        guild_id.to_owned(),
        state.config().start_delay,
        snapshot,
    );
    send(
        state,
        origin_channel_id,
        &replies::game_started(target_channel_id),
    )
    .await?;
    Ok(())
}

/// End the current session for a guild.
///
/// In-flight timers are not cancelled; their next reconciliation observes
/// `finished` and retires.
pub async fn handle_stop(
    state: &SharedState,
    guild_id: &str,
    channel_id: &str,
) -> Result<(), ServiceError> {
    let store = require_store(state).await?;
    let gate = state.guild_gate(guild_id);
    let _guard = gate.lock().await;

    let Some(entity) = store.load(guild_id).await? else {
        return Err(ServiceError::NoActiveSession);
    };
    let mut session: Session = entity.into();
    if !session.is_live() {
        return Err(ServiceError::NoActiveSession);
    }

    session.finish();
    store.save(session.into()).await?;

    info!(guild_id, "stopped trivia session");
    send(state, channel_id, replies::GAME_STOPPED).await?;
    Ok(())
}

/// Reconcile a free-text message against the guild's session.
///
/// Messages are silently ignored when no live session exists, when they
/// arrive outside the bound channel, when the answer window is closed, or
/// when the text does not match; no participation points are awarded.
pub async fn handle_message(
    state: &SharedState,
    guild_id: &str,
    channel_id: &str,
    author_id: &str,
    content: &str,
) -> Result<(), ServiceError> {
    let store = require_store(state).await?;
    let gate = state.guild_gate(guild_id);
    let _guard = gate.lock().await;

    let Some(entity) = store.load(guild_id).await? else {
        return Ok(());
    };
    let mut session: Session = entity.into();

    if session.channel_id != channel_id {
        debug!(guild_id, channel_id, "message outside the session channel");
        return Ok(());
    }
    if !session.is_live() || !session.waiting {
        debug!(guild_id, "ignoring answer outside the answer window");
        return Ok(());
    }
    if !matcher::matches_any(content, &session.answers, state.config().match_threshold) {
        debug!(guild_id, "incorrect answer");
        return Ok(());
    }

    // Matched, so the answer set is non-empty; reveal its canonical entry.
    let accepted = session.answers.first().cloned().unwrap_or_default();
    session.record_correct_answer(author_id);
    let snapshot = session.remaining_questions;
    store.save(session.clone().into()).await?;

    info!(
        guild_id,
        user_id = author_id,
        remaining = snapshot,
        "correct answer received"
    );
    scheduler::schedule_reconcile(
        state.clone(),
        guild_id.to_owned(),
        state.config().post_answer_delay,
        snapshot,
    );
    send(
        state,
        channel_id,
        &replies::correct_answer(author_id, &accepted),
    )
    .await?;
    Ok(())
}

/// Post the guild's current scores where the command was issued.
///
/// Scores come from the stored session record, live or recently finished,
/// so the command works mid-game and until the record expires.
pub async fn handle_scoreboard(
    state: &SharedState,
    guild_id: &str,
    channel_id: &str,
) -> Result<(), ServiceError> {
    let store = require_store(state).await?;
    let gate = state.guild_gate(guild_id);
    let _guard = gate.lock().await;

    let entries = match store.load(guild_id).await? {
        Some(entity) => Session::from(entity).scoreboard(),
        None => Vec::new(),
    };
    send(state, channel_id, &replies::scoreboard(&entries)).await?;
    Ok(())
}

/// Re-arm reconciliation timers for sessions that were live when the
/// process last stopped. Returns the number of sessions resumed.
pub async fn resume_unfinished(state: &SharedState) -> Result<usize, ServiceError> {
    let store = require_store(state).await?;
    let sessions = store.list_unfinished().await?;
    let count = sessions.len();

    if count > 0 {
        info!(count, "resuming unfinished sessions");
    }
    for entity in sessions {
        scheduler::schedule_reconcile(
            state.clone(),
            entity.guild_id,
            state.config().start_delay,
            entity.remaining_questions,
        );
    }
    Ok(count)
}
