//! User-facing reply text in the bot's voice.

use crate::state::session::Winner;

/// Sent when a storage failure prevents a request from being fulfilled.
pub const SORRY: &str =
    "Sorry, I'm having trouble fulfilling your request right now, please try again later.";
/// Sent when a command cannot be parsed.
pub const UNKNOWN_COMMAND: &str = "I'm afraid I don't know what you're talking about. \
     If you want to start a game use the \"start\" command.";
/// Sent when a stop request arrives with no live session.
pub const NO_GAME_IN_PROGRESS: &str =
    "There's no trivia game going on right now. Feel free to start one.";
/// Acknowledgement for an explicit stop.
pub const GAME_STOPPED: &str = "Alright, I've called off the current game. Come back any time.";
/// Sent when a question with no valid answer times out.
pub const TRICK_QUESTION: &str =
    "That was a trick question, there was no right answer. Don't look at me like that.";
/// Finish announcement when nobody scored a single point.
pub const NO_WINNERS: &str = "Well it appears no one won because no one answered a *single* \
     question right. You people really don't know much about your world.";
/// Sent when a scoreboard is requested but nobody has scored yet.
pub const NO_SCORES: &str = "Currently no scores are available. Try playing a game to \
     get some scores in the scoreboard.";
/// Sent when the start command references a channel that does not exist.
pub const CHANNEL_NOT_FOUND: &str = "I'm sorry, I can't find that channel.";
/// Sent when the start command argument is not a channel reference.
pub const INVALID_CHANNEL: &str = "That's not a valid channel.";

/// Announcement posted where the start command was issued.
pub fn game_started(channel_id: &str) -> String {
    format!("I started a game in <#{channel_id}>. I promise not to go easy.")
}

/// Reply to a start command while a session is already live.
pub fn game_already_running(channel_id: &str) -> String {
    format!("A game is already in progress in <#{channel_id}>, come join in on the fun!")
}

/// Reply to the first correct answer for a question.
pub fn correct_answer(user_id: &str, answer: &str) -> String {
    format!("Correct, <@!{user_id}>! The answer is \"{answer}\".")
}

/// Reveal posted when a question times out unanswered.
pub fn timed_out(answer: &str) -> String {
    format!("Time's up! The correct answer was \"{answer}\".")
}

/// Current scores for the guild, highest first.
pub fn scoreboard(entries: &[(String, u32)]) -> String {
    if entries.is_empty() {
        return NO_SCORES.to_owned();
    }

    let mut message = String::from("Here is the scoreboard for this server:\n");
    for (user_id, score) in entries {
        let plural = if *score == 1 { "" } else { "s" };
        message.push_str(&format!("\n- <@!{user_id}>: {score} point{plural}"));
    }
    message
}

/// Finish announcement listing every top scorer, or commiseration when
/// there are none.
pub fn winners_announcement(winners: &[Winner]) -> String {
    if winners.is_empty() {
        return NO_WINNERS.to_owned();
    }

    let mut message = String::from("Alright, we're out of questions. Here are your winners:\n\n");
    for winner in winners {
        let plural = if winner.score == 1 { "" } else { "s" };
        message.push_str(&format!(
            "* <@!{}> - {} point{}\n",
            winner.user_id, winner.score, plural
        ));
    }
    message.push_str("\nThank you for playing! I hope to see you again soon.");
    message
}
