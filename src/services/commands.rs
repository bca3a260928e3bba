//! Command parsing and the boundary where service errors become replies.

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    error::ServiceError,
    services::{replies, session_service},
    state::SharedState,
};

/// Prefix marking a message as addressed to the bot.
pub const COMMAND_WORD: &str = "!trivia";

/// A recognised command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin a session in the referenced channel.
    Start {
        /// Channel the session should be bound to.
        target_channel_id: String,
    },
    /// End the current session in the invoking guild.
    Stop,
    /// Post the guild's current scores.
    Scoreboard,
}

/// Error raised when command text cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    /// The command word was present but the rest made no sense.
    #[error("unrecognised command: {0}")]
    Unknown(String),
    /// The start argument was not a `<#id>` channel reference.
    #[error("`{0}` is not a channel reference")]
    InvalidChannelReference(String),
}

/// Whether a message is addressed to the bot.
pub fn is_command(content: &str) -> bool {
    content.starts_with(COMMAND_WORD)
}

/// Parse a command invocation. The leading command word is ignored.
pub fn parse(content: &str) -> Result<Command, CommandParseError> {
    let args: Vec<&str> = content.split_whitespace().collect();
    match args.as_slice() {
        [_, "start", reference] => {
            let target_channel_id = parse_channel_reference(reference)
                .ok_or_else(|| CommandParseError::InvalidChannelReference((*reference).into()))?;
            Ok(Command::Start { target_channel_id })
        }
        [_, "stop"] => Ok(Command::Stop),
        [_, "scoreboard"] => Ok(Command::Scoreboard),
        _ => Err(CommandParseError::Unknown(content.to_owned())),
    }
}

/// Extract the channel id out of a `<#1234>` style reference.
fn parse_channel_reference(raw: &str) -> Option<String> {
    raw.strip_prefix("<#")?
        .strip_suffix('>')
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

/// Entry point for every inbound chat message. Commands route to the
/// start/stop flow, everything else is treated as a potential answer.
pub async fn handle_inbound(
    state: &SharedState,
    guild_id: &str,
    channel_id: &str,
    author_id: &str,
    content: &str,
) {
    if is_command(content) {
        dispatch_command(state, guild_id, channel_id, content).await;
    } else {
        dispatch_answer(state, guild_id, channel_id, author_id, content).await;
    }
}

async fn dispatch_command(state: &SharedState, guild_id: &str, channel_id: &str, content: &str) {
    let command = match parse(content) {
        Ok(command) => command,
        Err(err @ CommandParseError::Unknown(_)) => {
            debug!(guild_id, error = %err, "unparseable command");
            reply(state, channel_id, replies::UNKNOWN_COMMAND).await;
            return;
        }
        Err(err @ CommandParseError::InvalidChannelReference(_)) => {
            debug!(guild_id, error = %err, "invalid channel reference");
            reply(state, channel_id, replies::INVALID_CHANNEL).await;
            return;
        }
    };

    let outcome = match command {
        Command::Start { target_channel_id } => {
            session_service::handle_start(state, guild_id, channel_id, &target_channel_id).await
        }
        Command::Stop => session_service::handle_stop(state, guild_id, channel_id).await,
        Command::Scoreboard => {
            session_service::handle_scoreboard(state, guild_id, channel_id).await
        }
    };

    if let Err(err) = outcome {
        report_failure(state, guild_id, channel_id, err).await;
    }
}

async fn dispatch_answer(
    state: &SharedState,
    guild_id: &str,
    channel_id: &str,
    author_id: &str,
    content: &str,
) {
    match session_service::handle_message(state, guild_id, channel_id, author_id, content).await {
        Ok(()) => {}
        // Degraded mode stays silent here: most free-text messages are not
        // answers at all, and apologising to each one would flood the channel.
        Err(ServiceError::Degraded) => {
            debug!(guild_id, "ignoring message while degraded");
        }
        Err(err @ ServiceError::Unavailable(_)) => {
            warn!(guild_id, error = %err, "answer reconciliation failed");
            reply(state, channel_id, replies::SORRY).await;
        }
        Err(err) => {
            warn!(guild_id, error = %err, "answer reconciliation failed");
        }
    }
}

/// Map a failed command to its user-facing reply.
async fn report_failure(state: &SharedState, guild_id: &str, channel_id: &str, err: ServiceError) {
    let text = match &err {
        ServiceError::ChannelNotFound(_) => replies::CHANNEL_NOT_FOUND,
        ServiceError::NoActiveSession => replies::NO_GAME_IN_PROGRESS,
        ServiceError::Unavailable(_) | ServiceError::Degraded => replies::SORRY,
        ServiceError::Transport(_) => {
            warn!(guild_id, error = %err, "failed to deliver reply");
            return;
        }
    };

    warn!(guild_id, channel_id, error = %err, "command failed");
    reply(state, channel_id, text).await;
}

async fn reply(state: &SharedState, channel_id: &str, text: &str) {
    if let Err(err) = state.transport().send_message(channel_id, text).await {
        warn!(channel_id, error = %err, "failed to deliver reply");
    }
}
