//! Communication session management
//!
//! This module defines the trait for tunneling narration from the game
//! engine to the participants, the messages that flow through it, and the
//! two tunnels the crate ships: the console and an in-memory recorder.
//! Every message is written as one unit, so narration from concurrent
//! workers never interleaves.

use std::{
    fmt::Display,
    io::Write,
    sync::{Mutex, PoisonError},
};

use itertools::Itertools;

use crate::{
    leaderboard::{Prize, Winner},
    names,
    quiz::{
        assist::{Assist, Effect},
        question::OptionKey,
    },
};

/// Trait for sending narration through a communication tunnel
///
/// Implementations must write each message atomically with respect to
/// messages sent from other tasks.
pub trait Tunnel: Send + Sync {
    /// Sends a narration message
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);
}

/// Narration sent to the participants during a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateMessage {
    /// The join phase has begun
    WaitingForPlayers,
    /// Asks the occupant of a seat for a name
    NamePrompt {
        /// 1-based seat number
        seat: usize,
    },
    /// The requested name was rejected
    NameError {
        /// 1-based seat number
        seat: usize,
        /// Why the name was rejected
        error: names::Error,
    },
    /// A name was generated because none was given
    NameGenerated {
        /// 1-based seat number
        seat: usize,
        /// The generated name
        name: String,
    },
    /// Asks whether the participant wants to join
    JoinPrompt {
        /// The participant's name
        name: String,
    },
    /// The participant joined the session
    Joined {
        /// The participant's name
        name: String,
    },
    /// The participant declined to join
    Declined {
        /// The participant's name
        name: String,
    },
    /// Nobody joined, so the session ends
    NoParticipants,
    /// Rounds are about to begin
    GameStarting {
        /// Number of active participants
        count: usize,
    },
    /// Announces the question of a round
    RoundAnnouncement {
        /// Index of the round (0-based)
        index: usize,
        /// Total number of rounds
        count: usize,
        /// The question text
        question: String,
    },
    /// Lists the options a viewer can currently see
    OptionListing {
        /// Visible options in display order
        options: Vec<(OptionKey, String)>,
    },
    /// Asks a participant for an answer or a lifeline
    AnswerPrompt {
        /// The participant's name
        name: String,
        /// Keys the participant may answer with
        keys: Vec<OptionKey>,
    },
    /// Effect of a lifeline a participant just spent
    AssistEffect {
        /// The participant's name
        name: String,
        /// What the lifeline revealed or changed
        effect: Effect,
    },
    /// The participant tried to spend a lifeline twice
    AssistAlreadyUsed {
        /// The participant's name
        name: String,
        /// The lifeline they tried to use
        assist: Assist,
    },
    /// The line was not a visible option nor a lifeline keyword
    InvalidInput {
        /// The participant's name
        name: String,
    },
    /// The participant ran out of time
    TimeUp {
        /// The participant's name
        name: String,
    },
    /// Results of a round are about to be read out
    ResultsHeader {
        /// Index of the round (0-based)
        index: usize,
    },
    /// Verdict on one participant's answer
    Verdict {
        /// The participant's name
        name: String,
        /// The answer given, `None` if there was none
        answer: Option<OptionKey>,
        /// Points awarded for the answer
        awarded: u64,
    },
    /// Scores after a round, in seat order
    Standings {
        /// Participant names and their cumulative scores
        scores: Vec<(String, u64)>,
    },
    /// Per-round breakdown at the end of the session, best first
    Summary {
        /// Participant names, totals and the points earned each round
        rows: Vec<(String, u64, Vec<u64>)>,
    },
    /// Final winners and their prizes
    Winners {
        /// Every participant tied at the top score
        winners: Vec<(String, u64, Prize)>,
    },
}

impl UpdateMessage {
    /// Builds the winners announcement from resolved winners
    pub fn winners(winners: &[Winner]) -> Self {
        Self::Winners {
            winners: winners
                .iter()
                .map(|w| (w.name.clone(), w.score, w.prize))
                .collect_vec(),
        }
    }

    /// Whether the message asks for input and should stay on the same line
    pub fn is_prompt(&self) -> bool {
        matches!(
            self,
            Self::NamePrompt { .. } | Self::JoinPrompt { .. } | Self::AnswerPrompt { .. }
        )
    }
}

impl Display for UpdateMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "Waiting for players to login..."),
            Self::NamePrompt { seat } => write!(f, "Player {seat}, enter your name: "),
            Self::NameError { seat, error } => write!(f, "Player {seat}: {error}, try again."),
            Self::NameGenerated { seat, name } => {
                write!(f, "Player {seat} will be known as {name}.")
            }
            Self::JoinPrompt { name } => {
                write!(f, "[{name}] Do you want to join the quiz? (yes/no): ")
            }
            Self::Joined { name } => write!(f, "[{name}] has joined the quiz!"),
            Self::Declined { name } => write!(f, "[{name}] chose not to join."),
            Self::NoParticipants => write!(f, "No players joined. Game canceled."),
            Self::GameStarting { count } => write!(f, "\nGame Starting with {count} players..."),
            Self::RoundAnnouncement {
                index,
                count,
                question,
            } => write!(f, "\nRound {}/{count}: {question}", index + 1),
            Self::OptionListing { options } => write!(
                f,
                "{}",
                options
                    .iter()
                    .map(|(key, text)| format!("[{key}] {text}"))
                    .join("\n")
            ),
            Self::AnswerPrompt { name, keys } => write!(
                f,
                "[{name}] Choose {} or lifeline ({} / {} / {}): ",
                keys.iter().join("/"),
                Assist::FiftyFifty.keyword(),
                Assist::CallAFriend.keyword(),
                Assist::AskTheAudience.keyword()
            ),
            Self::AssistEffect { name, effect } => match effect {
                Effect::Removed(_) => write!(f, "[{name}] [50/50] Two wrong options removed!"),
                Effect::FriendSuggests(key) => write!(
                    f,
                    "[{name}] [Call a Friend] Your friend thinks the answer is: {key}"
                ),
                Effect::Poll(poll) => write!(
                    f,
                    "[{name}] [Ask the Audience] Audience Poll Results:\n{}",
                    poll.iter()
                        .map(|(key, share)| format!("  {key}: {share}%"))
                        .join("\n")
                ),
            },
            Self::AssistAlreadyUsed { name, assist } => {
                write!(f, "[{name}] You already used {assist}.")
            }
            Self::InvalidInput { name } => write!(f, "[{name}] Invalid input."),
            Self::TimeUp { name } => write!(f, "\n[{name}] Time's up!"),
            Self::ResultsHeader { index } => write!(f, "\nResults for Round {}:", index + 1),
            Self::Verdict {
                name,
                answer,
                awarded,
            } => {
                let answer = answer.map_or_else(|| "nothing".to_owned(), |key| key.to_string());
                if *awarded > 0 {
                    write!(f, "{name} answered: {answer} - Correct! +{awarded} points.")
                } else {
                    write!(f, "{name} answered: {answer} - Wrong. No points.")
                }
            }
            Self::Standings { scores } => write!(
                f,
                "\nScores:\n{}",
                scores
                    .iter()
                    .map(|(name, score)| format!("{name}: {score} points"))
                    .join("\n")
            ),
            Self::Summary { rows } => write!(
                f,
                "\nFinal standings:\n{}",
                rows.iter()
                    .enumerate()
                    .map(|(i, (name, total, points))| format!(
                        "{}. {name} - {total} points ({})",
                        i + 1,
                        points.iter().join(" + ")
                    ))
                    .join("\n")
            ),
            Self::Winners { winners } => write!(
                f,
                "\nWinner(s):\n{}",
                winners
                    .iter()
                    .map(|(name, score, prize)| format!(
                        "{name} with {score} points - Prize: {prize}"
                    ))
                    .join("\n")
            ),
        }
    }
}

/// Tunnel writing narration to standard output
///
/// Writes are serialized by a lock held for the whole message. Prompts are
/// left without a trailing newline so input is typed on the same line.
#[derive(Debug)]
pub struct ConsoleTunnel {
    /// Guarded output handle
    out: Mutex<std::io::Stdout>,
}

impl Default for ConsoleTunnel {
    fn default() -> Self {
        Self {
            out: Mutex::new(std::io::stdout()),
        }
    }
}

impl Tunnel for ConsoleTunnel {
    fn send_message(&self, message: &UpdateMessage) {
        let out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out = out.lock();
        let written = if message.is_prompt() {
            write!(out, "{message}")
        } else {
            writeln!(out, "{message}")
        }
        .and_then(|()| out.flush());
        if let Err(e) = written {
            log::warn!("failed to write narration: {e}");
        }
    }
}

/// Tunnel keeping every message in memory
///
/// Useful to inspect what a session narrated, for example in tests.
#[derive(Debug, Default)]
pub struct RecordingTunnel {
    /// Messages in the order they were sent
    messages: Mutex<Vec<UpdateMessage>>,
}

impl RecordingTunnel {
    /// Returns a copy of every message sent so far
    pub fn messages(&self) -> Vec<UpdateMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counts the messages matching a predicate
    pub fn count<F: Fn(&UpdateMessage) -> bool>(&self, predicate: F) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|m| predicate(m))
            .count()
    }
}

impl Tunnel for RecordingTunnel {
    fn send_message(&self, message: &UpdateMessage) {
        log::trace!("narration: {message}");
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_prompts() {
        assert!(UpdateMessage::NamePrompt { seat: 1 }.is_prompt());
        assert!(
            UpdateMessage::JoinPrompt {
                name: "Ann".to_string()
            }
            .is_prompt()
        );
        assert!(
            UpdateMessage::AnswerPrompt {
                name: "Ann".to_string(),
                keys: vec![OptionKey::A, OptionKey::B],
            }
            .is_prompt()
        );
        assert!(!UpdateMessage::NoParticipants.is_prompt());
    }

    #[test]
    fn test_answer_prompt_lists_offered_keys() {
        let three = UpdateMessage::AnswerPrompt {
            name: "Ann".to_string(),
            keys: vec![OptionKey::A, OptionKey::B, OptionKey::C],
        };
        assert_eq!(
            three.to_string(),
            "[Ann] Choose A/B/C or lifeline (5050 / call / ask): "
        );

        let after_fifty_fifty = UpdateMessage::AnswerPrompt {
            name: "Ann".to_string(),
            keys: vec![OptionKey::B, OptionKey::D],
        };
        assert_eq!(
            after_fifty_fifty.to_string(),
            "[Ann] Choose B/D or lifeline (5050 / call / ask): "
        );
    }

    #[test]
    fn test_option_listing_display() {
        let message = UpdateMessage::OptionListing {
            options: vec![
                (OptionKey::B, "Paris".to_string()),
                (OptionKey::D, "Madrid".to_string()),
            ],
        };
        assert_eq!(message.to_string(), "[B] Paris\n[D] Madrid");
    }

    #[test]
    fn test_verdict_display() {
        let correct = UpdateMessage::Verdict {
            name: "Ann".to_string(),
            answer: Some(OptionKey::B),
            awarded: 10,
        };
        assert_eq!(correct.to_string(), "Ann answered: B - Correct! +10 points.");

        let silent = UpdateMessage::Verdict {
            name: "Bob".to_string(),
            answer: None,
            awarded: 0,
        };
        assert_eq!(silent.to_string(), "Bob answered: nothing - Wrong. No points.");
    }

    #[test]
    fn test_poll_display() {
        let message = UpdateMessage::AssistEffect {
            name: "Ann".to_string(),
            effect: Effect::Poll(vec![(OptionKey::A, 70), (OptionKey::B, 10)]),
        };
        assert_eq!(
            message.to_string(),
            "[Ann] [Ask the Audience] Audience Poll Results:\n  A: 70%\n  B: 10%"
        );
    }

    #[test]
    fn test_winners_display() {
        let message = UpdateMessage::Winners {
            winners: vec![
                ("Ann".to_string(), 30, Prize::Amount(1_000_000)),
                ("Bob".to_string(), 30, Prize::Amount(1_000_000)),
            ],
        };
        assert_eq!(
            message.to_string(),
            "\nWinner(s):\nAnn with 30 points - Prize: 1,000,000\nBob with 30 points - Prize: 1,000,000"
        );
    }

    #[test]
    fn test_recording_tunnel_keeps_order() {
        let tunnel = RecordingTunnel::default();
        tunnel.send_message(&UpdateMessage::WaitingForPlayers);
        tunnel.send_message(&UpdateMessage::NoParticipants);

        assert_eq!(
            tunnel.messages(),
            vec![UpdateMessage::WaitingForPlayers, UpdateMessage::NoParticipants]
        );
        assert_eq!(
            tunnel.count(|m| matches!(m, UpdateMessage::NoParticipants)),
            1
        );
    }
}
