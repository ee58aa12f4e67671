//! Answer collection for one participant in one round
//!
//! A collector prompts its participant until they pick a visible option or
//! the round's deadline passes. Lifeline keywords are handled along the way.
//! The deadline covers everything, including waiting for the shared input,
//! so a collector always finishes within its time limit.

use std::{collections::BTreeSet, time::Duration};

use tokio::time::Instant;

use crate::{
    console::LineSource,
    participant::Participant,
    quiz::{
        assist::{Assist, Effect},
        question::{OptionKey, Question},
    },
    session::{Tunnel, UpdateMessage},
};

/// Phase of a collector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollectorState {
    /// Waiting for the participant to type something
    #[default]
    AwaitingInput,
    /// A lifeline keyword was typed and is being handled
    AssistInvoked(Assist),
    /// A visible option was chosen; terminal
    Answered(OptionKey),
    /// The deadline passed or input ended without an answer; terminal
    TimedOut,
}

impl CollectorState {
    /// Whether the collector has finished
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Answered(_) | Self::TimedOut)
    }
}

/// What a line of input asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Spend a lifeline
    Assist(Assist),
    /// Answer with a visible option
    Answer(OptionKey),
    /// Anything else, including options hidden by 50/50
    Invalid,
}

impl Command {
    /// Interprets a line of input against the current question
    ///
    /// # Arguments
    ///
    /// * `line` - The raw line typed by the participant
    /// * `question` - The question being answered
    /// * `hidden` - Options hidden from this participant this round
    pub fn parse(line: &str, question: &Question, hidden: &BTreeSet<OptionKey>) -> Self {
        let line = line.trim();
        if let Ok(assist) = line.parse::<Assist>() {
            return Self::Assist(assist);
        }
        match line.parse::<OptionKey>() {
            Ok(key) if question.offers(key) && !hidden.contains(&key) => Self::Answer(key),
            _ => Self::Invalid,
        }
    }
}

/// Collects one participant's answer to one question
pub struct Collector<'a, T: Tunnel + ?Sized> {
    participant: &'a mut Participant,
    question: &'a Question,
    input: &'a LineSource,
    tunnel: &'a T,
    hidden: BTreeSet<OptionKey>,
    state: CollectorState,
    rng: fastrand::Rng,
}

impl<'a, T: Tunnel + ?Sized> Collector<'a, T> {
    /// Creates a collector in the awaiting-input state
    ///
    /// The participant's previous answer is cleared so that a collector that
    /// never reaches an answer leaves "no answer" behind.
    pub fn new(
        participant: &'a mut Participant,
        question: &'a Question,
        input: &'a LineSource,
        tunnel: &'a T,
        rng: fastrand::Rng,
    ) -> Self {
        participant.set_last_answer(None);
        Self {
            participant,
            question,
            input,
            tunnel,
            hidden: BTreeSet::new(),
            state: CollectorState::AwaitingInput,
            rng,
        }
    }

    /// Runs the collector to a terminal state
    ///
    /// # Arguments
    ///
    /// * `time_limit` - How long the participant has, counted from now
    ///
    /// # Returns
    ///
    /// The terminal state, `Answered` or `TimedOut`. The participant's last
    /// answer is set accordingly.
    pub async fn run(mut self, time_limit: Duration) -> CollectorState {
        let deadline = Instant::now() + time_limit;
        match tokio::time::timeout_at(deadline, self.answer()).await {
            Ok(Some(key)) => self.state = CollectorState::Answered(key),
            Ok(None) => {
                log::warn!(
                    "input for {} closed before an answer was given",
                    self.participant.name()
                );
                self.state = CollectorState::TimedOut;
            }
            Err(_) => {
                log::debug!("{} ran out of time", self.participant.name());
                self.state = CollectorState::TimedOut;
                self.tunnel.send_message(&UpdateMessage::TimeUp {
                    name: self.participant.name().to_owned(),
                });
            }
        }
        let answer = match self.state {
            CollectorState::Answered(key) => Some(key),
            _ => None,
        };
        self.participant.set_last_answer(answer);
        self.state
    }

    /// Prompts until a visible option is chosen or input ends
    async fn answer(&mut self) -> Option<OptionKey> {
        loop {
            let line = {
                let mut lines = self.input.lock().await;
                self.tunnel.send_message(&UpdateMessage::AnswerPrompt {
                    name: self.participant.name().to_owned(),
                    keys: self
                        .question
                        .keys()
                        .filter(|key| !self.hidden.contains(key))
                        .collect(),
                });
                lines.recv().await?
            };
            match Command::parse(&line, self.question, &self.hidden) {
                Command::Answer(key) => return Some(key),
                Command::Assist(assist) => {
                    self.state = CollectorState::AssistInvoked(assist);
                    self.invoke(assist);
                    self.state = CollectorState::AwaitingInput;
                }
                Command::Invalid => self.tunnel.send_message(&UpdateMessage::InvalidInput {
                    name: self.participant.name().to_owned(),
                }),
            }
        }
    }

    /// Spends a lifeline if the participant still has it
    fn invoke(&mut self, assist: Assist) {
        let name = self.participant.name().to_owned();
        if !self.participant.claim_assist(assist) {
            self.tunnel
                .send_message(&UpdateMessage::AssistAlreadyUsed { name, assist });
            return;
        }
        log::info!("{name} used {assist}");
        let effect = assist.apply(self.question, &mut self.hidden, &mut self.rng);
        let removed = matches!(effect, Effect::Removed(_));
        self.tunnel
            .send_message(&UpdateMessage::AssistEffect { name, effect });
        if removed {
            self.tunnel.send_message(&UpdateMessage::OptionListing {
                options: self
                    .question
                    .visible_options(|key| self.hidden.contains(&key)),
            });
        }
    }
}
