//! Static question bank with a "never repeat the previous index" picker.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the binary looks for the question set.
const DEFAULT_BANK_PATH: &str = "config/questions.json";
/// Environment variable that overrides [`DEFAULT_BANK_PATH`].
const BANK_PATH_ENV: &str = "TRIVIA_HOST_QUESTIONS_PATH";

#[derive(Debug, Clone, Deserialize)]
/// A question and the answers accepted for it.
pub struct TriviaQuestion {
    /// Question text sent to the channel verbatim.
    pub text: String,
    /// Accepted answers; an empty set makes this a trick question that can
    /// only resolve via timeout.
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Clone)]
/// Ordered, fixed-size set of questions shared by every session.
pub struct QuestionBank {
    questions: Vec<TriviaQuestion>,
}

impl QuestionBank {
    /// Build a bank from an explicit question set, falling back to the
    /// built-in set when it is empty.
    pub fn new(questions: Vec<TriviaQuestion>) -> Self {
        if questions.is_empty() {
            warn!("question set is empty; using built-in questions");
            return Self::default();
        }
        Self { questions }
    }

    /// Load the question set from disk, falling back to the built-in set.
    pub fn load() -> Self {
        let path = resolve_bank_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<TriviaQuestion>>(&contents) {
                Ok(questions) => {
                    let bank = Self::new(questions);
                    info!(
                        path = %path.display(),
                        count = bank.len(),
                        "loaded question set"
                    );
                    bank
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse question set; using built-in questions"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "question file not found; using built-in questions"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read question set; using built-in questions"
                );
                Self::default()
            }
        }
    }

    /// Number of questions in the bank.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank holds no questions. Never true in practice since
    /// construction falls back to the built-in set.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The question stored at `index`.
    pub fn get(&self, index: usize) -> &TriviaQuestion {
        &self.questions[index]
    }

    /// Pick a random index, avoiding `last` when the bank has more than one
    /// entry. A random collision with the previous index moves to the next
    /// slot, wrapping around the end of the bank.
    pub fn pick(&self, last: Option<usize>) -> usize {
        let mut index = rand::rng().random_range(0..self.questions.len());
        if last == Some(index) {
            index += 1;
            if index >= self.questions.len() {
                index = 0;
            }
        }
        index
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self {
            questions: builtin_questions(),
        }
    }
}

/// Resolve the question file path taking the environment override into account.
fn resolve_bank_path() -> PathBuf {
    env::var_os(BANK_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BANK_PATH))
}

/// Built-in question set shipped with the binary.
fn builtin_questions() -> Vec<TriviaQuestion> {
    fn question(text: &str, answers: &[&str]) -> TriviaQuestion {
        TriviaQuestion {
            text: text.to_owned(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    vec![
        question(
            "Which planet in our solar system has the most moons?",
            &["Saturn"],
        ),
        question(
            "What is the only metal that is liquid at room temperature?",
            &["Mercury", "Quicksilver"],
        ),
        question(
            "Which ocean is the deepest on Earth?",
            &["Pacific", "Pacific Ocean", "The Pacific"],
        ),
        question(
            "What is the chemical symbol for gold?",
            &["Au"],
        ),
        question(
            "Which composer wrote the Ninth Symphony while almost completely deaf?",
            &["Beethoven", "Ludwig van Beethoven"],
        ),
        question(
            "Name the first question I have ever asked you. Careful now.",
            &[],
        ),
    ]
}
