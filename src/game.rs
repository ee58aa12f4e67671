//! Session lifecycle
//!
//! This module contains the [`Game`] that drives a whole session: the join
//! phase, where every seat decides concurrently whether to play, the rounds,
//! and the final report with winners and prizes.

use std::{sync::Arc, time::Duration};

use garde::Validate;
use itertools::Itertools;
use tokio::sync::Mutex;

use crate::{
    Error,
    console::{Inputs, LineSource},
    constants,
    latch::Latch,
    leaderboard::{Leaderboard, Winner, resolve_winners},
    names::{NameStyle, Names},
    participant::Participant,
    quiz::bank::QuestionBank,
    round::Round,
    session::{Tunnel, UpdateMessage},
};

type ValidationResult = garde::Result;

/// Validates that a duration in whole seconds lies within `[MIN, MAX]`
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Shape of a session
///
/// Defaults come from [`constants`]; anything else must stay within the
/// bounds declared there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct Options {
    /// Number of seats offered during the join phase
    #[garde(range(min = 1, max = constants::game::MAX_SLOT_COUNT))]
    slots: usize,
    /// Number of rounds to play
    #[garde(range(
        min = constants::game::MIN_ROUND_COUNT,
        max = constants::game::MAX_ROUND_COUNT
    ))]
    rounds: usize,
    /// Time each participant has to answer a question
    #[garde(custom(validate_duration::<
        { constants::answer::MIN_TIME_LIMIT },
        { constants::answer::MAX_TIME_LIMIT },
    >))]
    time_limit: Duration,
    /// Style of names generated for blank name entries
    #[garde(dive)]
    name_style: NameStyle,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            slots: constants::game::SLOT_COUNT,
            rounds: constants::game::ROUND_COUNT,
            time_limit: Duration::from_secs(constants::answer::TIME_LIMIT),
            name_style: NameStyle::default(),
        }
    }
}

impl Options {
    /// Creates options with the default name style
    ///
    /// # Arguments
    ///
    /// * `slots` - Number of seats offered during the join phase
    /// * `rounds` - Number of rounds to play
    /// * `time_limit` - Time each participant has to answer
    pub fn new(slots: usize, rounds: usize, time_limit: Duration) -> Self {
        Self {
            slots,
            rounds,
            time_limit,
            name_style: NameStyle::default(),
        }
    }

    /// Replaces the style of generated names
    #[must_use]
    pub fn with_name_style(self, name_style: NameStyle) -> Self {
        Self { name_style, ..self }
    }

    /// Returns the number of seats
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Returns the number of rounds
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Returns the answer time limit
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
}

/// Phase of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Seats are deciding whether to join
    #[default]
    Joining,
    /// A round is being played (0-based index)
    Round(usize),
    /// The session has ended
    Done,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nobody opted in, so no round was played
    NoParticipants,
    /// Every round was played
    Finished {
        /// Participants tied at the top score, with their prize
        winners: Vec<Winner>,
    },
}

/// A complete trivia session
///
/// The game owns the participant records between phases. During a phase
/// each record is moved into the worker task responsible for it.
pub struct Game<T: Tunnel> {
    /// Validated session shape
    options: Options,
    /// Source of the questions played
    bank: QuestionBank,
    /// Where every seat reads its lines from
    inputs: Inputs,
    /// Narration sink
    tunnel: Arc<T>,
    /// Shuffles questions and drives the lifelines
    rng: fastrand::Rng,
    /// Active participants in seat order, empty until join completes
    participants: Vec<Participant>,
    /// Per-round points of every active participant
    leaderboard: Leaderboard,
    /// Current phase of the session
    state: State,
}

impl<T: Tunnel> std::fmt::Debug for Game<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Counts a latch down when dropped, including when a join worker panics
struct CountDownOnDrop(Arc<Latch>);

impl Drop for CountDownOnDrop {
    fn drop(&mut self) {
        self.0.count_down();
    }
}

impl<T: Tunnel + 'static> Game<T> {
    /// Creates a session
    ///
    /// # Arguments
    ///
    /// * `options` - Shape of the session
    /// * `bank` - Questions to draw from
    /// * `inputs` - Where every seat reads its lines from
    /// * `tunnel` - Narration sink
    ///
    /// # Errors
    ///
    /// * `Error::InvalidOptions` - The options are out of bounds
    /// * `Error::NotEnoughQuestions` - The bank holds fewer questions than rounds
    /// * `Error::UnroutedSeat` - A seat has no input source
    pub fn new(
        options: Options,
        bank: QuestionBank,
        inputs: Inputs,
        tunnel: Arc<T>,
    ) -> Result<Self, Error> {
        options.validate().map_err(Error::InvalidOptions)?;
        if bank.len() < options.rounds {
            return Err(Error::NotEnoughQuestions {
                rounds: options.rounds,
                available: bank.len(),
            });
        }
        if let Some(seat) = (1..=options.slots).find(|seat| inputs.for_seat(*seat).is_none()) {
            return Err(Error::UnroutedSeat(seat));
        }
        Ok(Self {
            options,
            bank,
            inputs,
            tunnel,
            rng: fastrand::Rng::new(),
            participants: Vec::new(),
            leaderboard: Leaderboard::default(),
            state: State::Joining,
        })
    }

    /// Replaces the source of randomness, e.g. with a seeded one
    #[must_use]
    pub fn with_rng(self, rng: fastrand::Rng) -> Self {
        Self { rng, ..self }
    }

    /// Returns the active participants in seat order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Returns the per-round scoring history
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Returns the current phase
    pub fn state(&self) -> State {
        self.state
    }

    /// Plays the whole session
    ///
    /// Runs the join phase, then every round, then resolves the winners.
    ///
    /// # Returns
    ///
    /// How the session ended
    ///
    /// # Errors
    ///
    /// * `Error::UnroutedSeat` - A seat has no input source
    /// * `Error::NotEnoughQuestions` - The bank ran short of questions
    /// * `Error::Worker` - A worker task panicked
    pub async fn play(&mut self) -> Result<Outcome, Error> {
        self.state = State::Joining;
        self.tunnel.send_message(&UpdateMessage::WaitingForPlayers);

        self.participants = self
            .join()
            .await?
            .into_iter()
            .filter(Participant::is_active)
            .collect();

        if self.participants.is_empty() {
            log::info!("no seat opted in");
            self.state = State::Done;
            self.tunnel.send_message(&UpdateMessage::NoParticipants);
            return Ok(Outcome::NoParticipants);
        }

        self.tunnel.send_message(&UpdateMessage::GameStarting {
            count: self.participants.len(),
        });

        let questions = self.bank.draw(self.options.rounds, &mut self.rng)?;
        let count = questions.len();
        for (index, question) in questions.into_iter().enumerate() {
            self.state = State::Round(index);
            log::debug!("round {} of {count} begins", index + 1);
            let round = Round::new(
                index,
                count,
                question,
                self.tunnel.clone(),
                self.options.time_limit,
            );
            let points = round
                .play(&mut self.participants, &self.inputs, &mut self.rng)
                .await?;
            self.leaderboard.add_scores(&points);
        }

        self.state = State::Done;
        self.announce_summary();

        let winners = resolve_winners(&self.participants, count);
        self.tunnel.send_message(&UpdateMessage::winners(&winners));
        Ok(Outcome::Finished { winners })
    }

    /// Runs one join worker per seat and waits for every seat to decide
    ///
    /// # Returns
    ///
    /// Every seat's participant record in seat order, active or not
    async fn join(&self) -> Result<Vec<Participant>, Error> {
        let sources = (1..=self.options.slots)
            .map(|seat| self.inputs.for_seat(seat).ok_or(Error::UnroutedSeat(seat)))
            .collect::<Result<Vec<_>, _>>()?;

        let latch = Arc::new(Latch::new(sources.len()));
        let names = Arc::new(Mutex::new(Names::default()));

        let handles = sources
            .into_iter()
            .enumerate()
            .map(|(i, input)| {
                let done = CountDownOnDrop(latch.clone());
                let names = names.clone();
                let tunnel = self.tunnel.clone();
                let style = self.options.name_style;
                tokio::spawn(async move {
                    let participant =
                        join_seat(Participant::new(i + 1), &input, &names, &style, &*tunnel).await;
                    drop(done);
                    participant
                })
            })
            .collect_vec();

        latch.wait().await;
        log::debug!("every seat has decided");

        let mut seated = Vec::with_capacity(handles.len());
        for handle in handles {
            seated.push(handle.await?);
        }
        Ok(seated)
    }

    /// Narrates the per-round breakdown, best total first
    fn announce_summary(&self) {
        let rows = self
            .leaderboard
            .scores_descending()
            .iter()
            .filter_map(|(id, total)| {
                let participant = self.participants.iter().find(|p| p.id() == *id)?;
                Some((
                    participant.name().to_owned(),
                    *total,
                    self.leaderboard.player_summary(*id),
                ))
            })
            .collect_vec();
        self.tunnel.send_message(&UpdateMessage::Summary { rows });
    }
}

/// Runs the join dialog of one seat
///
/// The seat keeps its input for the whole dialog, so on a shared console the
/// name and the decision of one seat are never split by another seat.
///
/// # Returns
///
/// The seat's participant, active if they answered `yes`
async fn join_seat<T: Tunnel + ?Sized>(
    mut participant: Participant,
    input: &LineSource,
    names: &Mutex<Names>,
    style: &NameStyle,
    tunnel: &T,
) -> Participant {
    let seat = participant.seat();
    let mut lines = input.lock().await;

    let name = loop {
        tunnel.send_message(&UpdateMessage::NamePrompt { seat });
        let Some(line) = lines.recv().await else {
            log::warn!("input for seat {seat} closed during join");
            tunnel.send_message(&UpdateMessage::Declined {
                name: participant.name().to_owned(),
            });
            return participant;
        };
        if line.trim().is_empty() {
            let name = names
                .lock()
                .await
                .set_generated_name(participant.id(), style);
            tunnel.send_message(&UpdateMessage::NameGenerated {
                seat,
                name: name.clone(),
            });
            break name;
        }
        match names.lock().await.set_name(participant.id(), &line) {
            Ok(name) => break name,
            Err(error) => tunnel.send_message(&UpdateMessage::NameError { seat, error }),
        }
    };
    participant.set_name(name.clone());

    tunnel.send_message(&UpdateMessage::JoinPrompt { name: name.clone() });
    let decision = lines.recv().await;
    if decision.is_some_and(|line| line.trim().eq_ignore_ascii_case("yes")) {
        participant.activate();
        log::info!("{name} joined from seat {seat}");
        tunnel.send_message(&UpdateMessage::Joined { name });
    } else {
        tunnel.send_message(&UpdateMessage::Declined { name });
    }
    participant
}
