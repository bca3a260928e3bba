//! Runtime configuration: reconciliation delays, question quota, and record lifetime.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::matcher;

/// Default location on disk where the binary looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_HOST_CONFIG_PATH";

/// Pause between a session starting and the first question being asked.
const DEFAULT_START_DELAY_SECS: u64 = 5;
/// Time participants get to answer a question before it times out.
const DEFAULT_QUESTION_DELAY_SECS: u64 = 30;
/// Pause between a question resolving and the next one (or the finish).
const DEFAULT_POST_ANSWER_DELAY_SECS: u64 = 5;
/// Number of questions asked per session.
const DEFAULT_QUESTIONS_PER_GAME: u32 = 3;
/// Lifetime applied to every persisted session record.
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Delay before the first question of a fresh session is asked.
    pub start_delay: Duration,
    /// Answer window for each question.
    pub question_delay: Duration,
    /// Pause after a question resolves, before the next reconciliation.
    pub post_answer_delay: Duration,
    /// Question quota preset on every new session.
    pub questions_per_game: u32,
    /// Expiration applied by the store on every write.
    pub session_ttl: Duration,
    /// Similarity threshold handed to the answer matcher.
    pub match_threshold: f64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(DEFAULT_START_DELAY_SECS),
            question_delay: Duration::from_secs(DEFAULT_QUESTION_DELAY_SECS),
            post_answer_delay: Duration::from_secs(DEFAULT_POST_ANSWER_DELAY_SECS),
            questions_per_game: DEFAULT_QUESTIONS_PER_GAME,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            match_threshold: matcher::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    start_delay_secs: Option<u64>,
    question_delay_secs: Option<u64>,
    post_answer_delay_secs: Option<u64>,
    questions_per_game: Option<u32>,
    session_ttl_secs: Option<u64>,
    match_threshold: Option<f64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            start_delay: value
                .start_delay_secs
                .map_or(defaults.start_delay, Duration::from_secs),
            question_delay: value
                .question_delay_secs
                .map_or(defaults.question_delay, Duration::from_secs),
            post_answer_delay: value
                .post_answer_delay_secs
                .map_or(defaults.post_answer_delay, Duration::from_secs),
            questions_per_game: value
                .questions_per_game
                .unwrap_or(defaults.questions_per_game),
            session_ttl: value
                .session_ttl_secs
                .map_or(defaults.session_ttl, Duration::from_secs),
            match_threshold: value.match_threshold.unwrap_or(defaults.match_threshold),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_raw_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"question_delay_secs": 45, "questions_per_game": 10}"#)
                .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.question_delay, Duration::from_secs(45));
        assert_eq!(config.questions_per_game, 10);
        assert_eq!(
            config.start_delay,
            Duration::from_secs(DEFAULT_START_DELAY_SECS)
        );
        assert_eq!(
            config.session_ttl,
            Duration::from_secs(DEFAULT_SESSION_TTL_SECS)
        );
    }

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert!(config.questions_per_game > 0);
        assert!(config.match_threshold > 0.0 && config.match_threshold <= 1.0);
        assert_eq!(config.match_threshold, matcher::DEFAULT_THRESHOLD);
        assert!(config.session_ttl > config.question_delay);
    }
}
