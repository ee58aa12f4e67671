//! Participants of a quiz session
//!
//! This module defines the identity of a participant and the mutable record
//! the session keeps for each seat: name, score, whether they joined, their
//! answer for the current round and which lifelines they have spent.

use std::fmt::Display;

use enum_map::EnumMap;
use uuid::Uuid;

use crate::{
    constants::scoring::POINTS_PER_CORRECT,
    quiz::{assist::Assist, question::OptionKey},
};

/// A unique identifier for a participant
///
/// Each seat gets an ID when the session is created and keeps it for the
/// whole session, independently of the name chosen during join.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random participant ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random participant ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A seat in the session and everything known about its occupant
///
/// The record is owned by exactly one task at a time: the join worker of its
/// seat, then each round's answer collector, then the scoring worker. This
/// keeps every mutation local to the owning task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable identity of the participant
    id: Id,
    /// 1-based seat number
    seat: usize,
    /// Display name, a placeholder until join assigns one
    name: String,
    /// Cumulative score, always a multiple of the per-answer increment
    score: u64,
    /// Whether the participant opted in during join
    active: bool,
    /// Answer for the current round, `None` meaning no answer
    last_answer: Option<OptionKey>,
    /// Lifelines already spent, never reset during a session
    assists_used: EnumMap<Assist, bool>,
}

impl Participant {
    /// Creates the record for a seat before anyone has joined it
    ///
    /// # Arguments
    ///
    /// * `seat` - The 1-based seat number
    pub fn new(seat: usize) -> Self {
        Self {
            id: Id::new(),
            seat,
            name: format!("Player {seat}"),
            score: 0,
            active: false,
            last_answer: None,
            assists_used: EnumMap::default(),
        }
    }

    /// Returns the participant's ID
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the 1-based seat number
    pub fn seat(&self) -> usize {
        self.seat
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name chosen during join
    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Returns the cumulative score
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Whether the participant opted in to play
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the participant as having opted in
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Returns the answer recorded for the current round
    pub fn last_answer(&self) -> Option<OptionKey> {
        self.last_answer
    }

    /// Records the final answer for the current round
    ///
    /// `None` records that no answer was given.
    pub fn set_last_answer(&mut self, answer: Option<OptionKey>) {
        self.last_answer = answer;
    }

    /// Whether the lifeline has already been spent this session
    pub fn has_used(&self, assist: Assist) -> bool {
        self.assists_used[assist]
    }

    /// Spends a lifeline if it is still available
    ///
    /// # Returns
    ///
    /// `true` if the lifeline was available and is now spent, `false` if it
    /// had been spent before, in which case nothing changes
    pub fn claim_assist(&mut self, assist: Assist) -> bool {
        if self.assists_used[assist] {
            false
        } else {
            self.assists_used[assist] = true;
            true
        }
    }

    /// Scores the current round against the correct key
    ///
    /// # Returns
    ///
    /// The points awarded, either the fixed increment or zero
    pub fn score_answer(&mut self, correct: OptionKey) -> u64 {
        let awarded = if self.last_answer == Some(correct) {
            POINTS_PER_CORRECT
        } else {
            0
        };
        self.score += awarded;
        awarded
    }
}
