//! The per-guild session record and its legal mutations.

use std::collections::HashMap;

use time::OffsetDateTime;

use crate::{
    bank::{QuestionBank, TriviaQuestion},
    dao::models::{SESSION_REVISION, SessionEntity},
};

/// A participant holding the top score once a session concludes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    /// Participant identifier.
    pub user_id: String,
    /// Final score.
    pub score: u32,
}

/// Live state of one trivia session bound to a guild and a channel.
///
/// Every mutation here happens under the guild's gate and is followed by a
/// persist; the struct itself never outlives a single reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Timestamp the session was created.
    pub start_time: OffsetDateTime,
    /// Current question text.
    pub question: String,
    /// Accepted answers for the current question; empty for trick questions.
    pub answers: Vec<String>,
    /// Questions left to ask, including the current one.
    pub remaining_questions: u32,
    /// Bank index of the most recently asked question, used only to avoid
    /// immediate repeats.
    pub last_question_index: Option<usize>,
    /// Whether the first question has been issued.
    pub started: bool,
    /// Whether the session has concluded. Terminal.
    pub finished: bool,
    /// Whether the session is currently blocking on an answer.
    pub waiting: bool,
    /// Community the session belongs to.
    pub guild_id: String,
    /// The single channel this session is bound to. Immutable while live.
    pub channel_id: String,
    /// Accumulated score per participant.
    pub user_scores: HashMap<String, u32>,
}

impl Session {
    /// Create a fresh session with the configured question quota and an
    /// initial question seeded from the bank.
    pub fn new(
        guild_id: String,
        channel_id: String,
        questions_per_game: u32,
        bank: &QuestionBank,
    ) -> Self {
        let seed = bank.pick(None);
        let question = bank.get(seed);
        Self {
            start_time: OffsetDateTime::now_utc(),
            question: question.text.clone(),
            answers: question.answers.clone(),
            remaining_questions: questions_per_game,
            last_question_index: Some(seed),
            started: false,
            finished: false,
            waiting: false,
            guild_id,
            channel_id,
            user_scores: HashMap::new(),
        }
    }

    /// Whether the session still accepts reconciliations.
    pub fn is_live(&self) -> bool {
        self.started && !self.finished
    }

    /// Install a question and open the answer window.
    pub fn pose_question(&mut self, index: usize, question: &TriviaQuestion) {
        self.last_question_index = Some(index);
        self.question = question.text.clone();
        self.answers = question.answers.clone();
        self.waiting = true;
    }

    /// Record a correct answer from `user_id` and close the answer window.
    pub fn record_correct_answer(&mut self, user_id: &str) {
        *self.user_scores.entry(user_id.to_owned()).or_insert(0) += 1;
        self.remaining_questions = self.remaining_questions.saturating_sub(1);
        self.waiting = false;
    }

    /// Close the answer window without a scorer after a timeout.
    pub fn expire_question(&mut self) {
        self.remaining_questions = self.remaining_questions.saturating_sub(1);
        self.waiting = false;
    }

    /// Conclude the session.
    pub fn finish(&mut self) {
        self.finished = true;
        self.waiting = false;
    }

    /// Every participant with their score, highest first; ties break on
    /// identifier so announcements are deterministic.
    pub fn scoreboard(&self) -> Vec<(String, u32)> {
        let mut entries: Vec<(String, u32)> = self
            .user_scores
            .iter()
            .map(|(user_id, score)| (user_id.clone(), *score))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// Participants holding the highest score, sorted by identifier so
    /// announcements are deterministic. Empty when no one scored a point.
    pub fn winners(&self) -> Vec<Winner> {
        let highest = self.user_scores.values().copied().max().unwrap_or(0);
        if highest == 0 {
            return Vec::new();
        }

        let mut winners: Vec<Winner> = self
            .user_scores
            .iter()
            .filter(|(_, score)| **score == highest)
            .map(|(user_id, score)| Winner {
                user_id: user_id.clone(),
                score: *score,
            })
            .collect();
        winners.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        winners
    }
}

impl From<SessionEntity> for Session {
    fn from(value: SessionEntity) -> Self {
        Self {
            start_time: value.start_time,
            question: value.question,
            answers: value.answers,
            remaining_questions: value.remaining_questions,
            last_question_index: value.last_question_index,
            started: value.started,
            finished: value.finished,
            waiting: value.waiting,
            guild_id: value.guild_id,
            channel_id: value.channel_id,
            user_scores: value.user_scores,
        }
    }
}

impl From<Session> for SessionEntity {
    fn from(value: Session) -> Self {
        Self {
            revision: SESSION_REVISION,
            start_time: value.start_time,
            question: value.question,
            answers: value.answers,
            remaining_questions: value.remaining_questions,
            last_question_index: value.last_question_index,
            started: value.started,
            finished: value.finished,
            waiting: value.waiting,
            guild_id: value.guild_id,
            channel_id: value.channel_id,
            user_scores: value.user_scores,
        }
    }
}
