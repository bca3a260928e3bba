//! End-to-end session flows against an in-memory store and a recording transport.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;
use trivia_host::{
    bank::{QuestionBank, TriviaQuestion},
    config::AppConfig,
    dao::session_store::{SessionStore, memory::MemorySessionStore},
    services::{commands, replies},
    state::{AppState, SharedState},
    transport::{ChatTransport, TransportError},
};

const GUILD: &str = "guild-1";
const LOBBY: &str = "lobby";
const TRIVIA: &str = "trivia";

/// Transport that records every outbound message instead of delivering it.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    missing_channels: Vec<String>,
    failing_channels: Vec<String>,
}

impl RecordingTransport {
    fn with_missing_channel(channel_id: &str) -> Self {
        Self {
            missing_channels: vec![channel_id.to_owned()],
            ..Self::default()
        }
    }

    fn with_failing_channel(channel_id: &str) -> Self {
        Self {
            failing_channels: vec![channel_id.to_owned()],
            ..Self::default()
        }
    }

    fn transcript(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn texts_for(&self, channel_id: &str) -> Vec<String> {
        self.transcript()
            .into_iter()
            .filter(|(channel, _)| channel == channel_id)
            .map(|(_, text)| text)
            .collect()
    }
}

impl ChatTransport for RecordingTransport {
    fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        if self.failing_channels.iter().any(|c| c == channel_id) {
            let channel_id = channel_id.to_owned();
            return Box::pin(async move {
                Err(TransportError::Delivery {
                    channel_id,
                    message: "delivery refused".into(),
                })
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_owned(), text.to_owned()));
        Box::pin(async { Ok(()) })
    }

    fn channel_exists(&self, channel_id: &str) -> BoxFuture<'static, bool> {
        let exists = !self.missing_channels.iter().any(|c| c == channel_id);
        Box::pin(async move { exists })
    }
}

fn single_question_bank(answers: &[&str]) -> QuestionBank {
    QuestionBank::new(vec![TriviaQuestion {
        text: "What is the magic word?".into(),
        answers: answers.iter().map(|a| a.to_string()).collect(),
    }])
}

fn test_config(questions_per_game: u32) -> AppConfig {
    AppConfig {
        start_delay: Duration::from_millis(100),
        question_delay: Duration::from_millis(1_000),
        post_answer_delay: Duration::from_millis(100),
        questions_per_game,
        session_ttl: Duration::from_secs(3_600),
        match_threshold: 0.8,
    }
}

async fn test_state(
    questions_per_game: u32,
    bank: QuestionBank,
    transport: Arc<RecordingTransport>,
) -> (SharedState, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new(Duration::from_secs(3_600)));
    let state = AppState::new(test_config(questions_per_game), bank, transport);
    state.install_session_store(store.clone()).await;
    (state, store)
}

/// Advance virtual time past pending timers and let spawned tasks settle.
async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

async fn start_game(state: &SharedState) {
    commands::handle_inbound(
        state,
        GUILD,
        LOBBY,
        "host",
        &format!("!trivia start <#{TRIVIA}>"),
    )
    .await;
}

async fn say(state: &SharedState, channel_id: &str, author_id: &str, text: &str) {
    commands::handle_inbound(state, GUILD, channel_id, author_id, text).await;
}

#[tokio::test(start_paused = true)]
async fn start_announces_then_asks_the_first_question_after_the_delay() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, _) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    assert_eq!(
        transport.texts_for(LOBBY),
        vec![replies::game_started(TRIVIA)]
    );
    assert!(transport.texts_for(TRIVIA).is_empty());

    settle(150).await;
    assert_eq!(
        transport.texts_for(TRIVIA),
        vec!["What is the magic word?".to_owned()]
    );
}

#[tokio::test(start_paused = true)]
async fn correct_answer_scores_and_advances_to_the_next_question() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(2, single_question_bank(&["zig", "zag"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;

    // Near-match with different case still counts.
    say(&state, TRIVIA, "alice", "Zig").await;

    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert_eq!(entity.remaining_questions, 1);
    assert!(!entity.waiting);
    assert_eq!(entity.user_scores["alice"], 1);

    let texts = transport.texts_for(TRIVIA);
    assert_eq!(*texts.last().unwrap(), replies::correct_answer("alice", "zig"));

    settle(150).await;
    assert_eq!(
        transport.texts_for(TRIVIA).last().unwrap(),
        "What is the magic word?"
    );
}

#[tokio::test(start_paused = true)]
async fn full_game_announces_tied_winners() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;
    say(&state, TRIVIA, "bob", "zig").await;
    settle(150).await;
    say(&state, TRIVIA, "alice", "zig").await;
    settle(150).await;

    let finale = transport.texts_for(TRIVIA).last().unwrap().clone();
    assert!(finale.contains("<@!alice> - 1 point\n"));
    assert!(finale.contains("<@!bob> - 1 point\n"));

    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert!(entity.finished);
    assert_eq!(entity.remaining_questions, 0);
}

#[tokio::test(start_paused = true)]
async fn unanswered_question_times_out_and_reveals_the_answer() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(1, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;
    settle(1_000).await;

    let texts = transport.texts_for(TRIVIA);
    assert_eq!(*texts.last().unwrap(), replies::timed_out("zig"));

    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert_eq!(entity.remaining_questions, 0);
    assert!(!entity.waiting);

    // Post-answer delay elapses with nobody having scored.
    settle(150).await;
    assert_eq!(
        *transport.texts_for(TRIVIA).last().unwrap(),
        replies::NO_WINNERS
    );
}

#[tokio::test(start_paused = true)]
async fn trick_question_resolves_via_timeout_only() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, _) = test_state(1, single_question_bank(&[]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;

    // No answer can ever be correct.
    say(&state, TRIVIA, "alice", "anything at all").await;
    assert_eq!(transport.texts_for(TRIVIA).len(), 1);

    settle(1_000).await;
    assert_eq!(
        *transport.texts_for(TRIVIA).last().unwrap(),
        replies::TRICK_QUESTION
    );
}

#[tokio::test(start_paused = true)]
async fn stale_question_timer_retires_without_effect() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(1, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;
    say(&state, TRIVIA, "alice", "zig").await;
    settle(150).await;

    let before = transport.transcript();
    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert!(entity.finished);

    // The original question timer is still in flight; once it fires it must
    // observe the advanced session and do nothing.
    settle(2_000).await;
    assert_eq!(transport.transcript(), before);
    assert_eq!(
        store.load(GUILD).await.unwrap().unwrap().remaining_questions,
        0
    );
}

#[tokio::test(start_paused = true)]
async fn undeliverable_replies_do_not_stall_the_session() {
    let transport = Arc::new(RecordingTransport::with_failing_channel(TRIVIA));
    let (state, store) = test_state(1, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;

    // The question could not be delivered but its timeout is still armed.
    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert!(entity.waiting);
    assert!(transport.texts_for(TRIVIA).is_empty());

    settle(1_000).await;
    settle(150).await;

    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert!(entity.finished);
    assert_eq!(entity.remaining_questions, 0);
}

#[tokio::test(start_paused = true)]
async fn scoreboard_lists_current_scores_mid_game() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, _) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;
    say(&state, TRIVIA, "alice", "zig").await;

    say(&state, LOBBY, "host", "!trivia scoreboard").await;
    let board = transport.texts_for(LOBBY).last().unwrap().clone();
    assert!(board.contains("- <@!alice>: 1 point"));
}

#[tokio::test(start_paused = true)]
async fn scoreboard_without_scores_reports_none_available() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, _) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    say(&state, LOBBY, "host", "!trivia scoreboard").await;
    assert_eq!(
        transport.texts_for(LOBBY),
        vec![replies::NO_SCORES.to_owned()]
    );
}

#[tokio::test(start_paused = true)]
async fn second_start_reports_the_game_in_progress() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, _) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    start_game(&state).await;

    assert_eq!(
        transport.texts_for(LOBBY),
        vec![
            replies::game_started(TRIVIA),
            replies::game_already_running(TRIVIA),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_without_a_game_reports_and_writes_nothing() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    say(&state, LOBBY, "host", "!trivia stop").await;

    assert_eq!(
        transport.texts_for(LOBBY),
        vec![replies::NO_GAME_IN_PROGRESS.to_owned()]
    );
    assert!(store.load(GUILD).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn stop_ends_the_game_and_silences_pending_timers() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;
    say(&state, LOBBY, "host", "!trivia stop").await;

    assert_eq!(
        *transport.texts_for(LOBBY).last().unwrap(),
        replies::GAME_STOPPED
    );
    assert!(store.load(GUILD).await.unwrap().unwrap().finished);

    let before = transport.transcript();
    settle(2_000).await;
    assert_eq!(transport.transcript(), before);
}

#[tokio::test(start_paused = true)]
async fn start_with_a_missing_channel_takes_no_state_action() {
    let transport = Arc::new(RecordingTransport::with_missing_channel(TRIVIA));
    let (state, store) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;

    assert_eq!(
        transport.texts_for(LOBBY),
        vec![replies::CHANNEL_NOT_FOUND.to_owned()]
    );
    assert!(store.load(GUILD).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn answers_outside_the_bound_channel_are_ignored() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;

    say(&state, LOBBY, "alice", "zig").await;
    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert!(entity.waiting);
    assert!(entity.user_scores.is_empty());

    // The same text in the bound channel scores.
    say(&state, TRIVIA, "alice", "zig").await;
    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert_eq!(entity.user_scores["alice"], 1);
}

#[tokio::test(start_paused = true)]
async fn answers_between_questions_are_not_double_scored() {
    let transport = Arc::new(RecordingTransport::default());
    let (state, store) = test_state(2, single_question_bank(&["zig"]), transport.clone()).await;

    start_game(&state).await;
    settle(150).await;
    say(&state, TRIVIA, "alice", "zig").await;

    // The answer window is closed while the post-answer delay runs.
    say(&state, TRIVIA, "bob", "zig").await;

    let entity = store.load(GUILD).await.unwrap().unwrap();
    assert_eq!(entity.user_scores["alice"], 1);
    assert!(!entity.user_scores.contains_key("bob"));
    assert!(
        !transport
            .texts_for(TRIVIA)
            .iter()
            .any(|text| text.contains("<@!bob>"))
    );
}
