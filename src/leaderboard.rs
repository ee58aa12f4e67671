//! Leaderboard, scoring history and winner resolution
//!
//! This module tracks the points every participant earned in every round,
//! keeps the standings in descending order, and resolves the winners of a
//! finished session together with their prizes.

use std::{collections::HashMap, fmt::Display};

use itertools::Itertools;

use crate::{
    constants::scoring::{POINTS_PER_CORRECT, PRIZE_TIERS, TOP_PRIZE},
    participant::{Id, Participant},
};

/// Manages scoring history and standings for a session
///
/// Participants that earned nothing in a round still appear in that round's
/// record with zero points, so every participant has one entry per round.
#[derive(Debug, Default, Clone)]
pub struct Leaderboard {
    /// Points earned by each participant for each round
    points_earned: Vec<Vec<(Id, u64)>>,
    /// Current totals in descending order (cached)
    scores_descending: Vec<(Id, u64)>,
    /// Mapping from participant ID to total score and position (cached)
    score_and_position: HashMap<Id, (u64, usize)>,
}

impl Leaderboard {
    /// Adds the points of one round and updates the standings
    ///
    /// # Arguments
    ///
    /// * `scores` - Slice of (participant_id, points_earned) tuples for the round
    pub fn add_scores(&mut self, scores: &[(Id, u64)]) {
        let mut summary: HashMap<Id, u64> = self
            .score_and_position
            .iter()
            .map(|(id, (points, _))| (*id, *points))
            .collect();

        for (id, points) in scores {
            *summary.entry(*id).or_default() += points;
        }

        // Stable order for equal totals: first appearance in the history
        let order: HashMap<Id, usize> = self
            .points_earned
            .iter()
            .flatten()
            .chain(scores)
            .map(|(id, _)| *id)
            .unique()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();

        self.scores_descending = summary
            .into_iter()
            .sorted_by_key(|(id, points)| (std::cmp::Reverse(*points), order[id]))
            .collect_vec();

        self.score_and_position = self
            .scores_descending
            .iter()
            .enumerate()
            .map(|(position, (id, points))| (*id, (*points, position)))
            .collect();

        self.points_earned.push(scores.to_vec());
    }

    /// Returns the number of rounds recorded
    pub fn rounds(&self) -> usize {
        self.points_earned.len()
    }

    /// Returns the totals in descending order
    pub fn scores_descending(&self) -> &[(Id, u64)] {
        &self.scores_descending
    }

    /// Returns a participant's points for each recorded round
    ///
    /// Rounds the participant has no record for count as zero.
    pub fn player_summary(&self, id: Id) -> Vec<u64> {
        self.points_earned
            .iter()
            .map(|round| {
                round
                    .iter()
                    .find(|(earner, _)| *earner == id)
                    .map_or(0, |(_, points)| *points)
            })
            .collect()
    }

    /// Gets the total score and 0-based position of a participant
    ///
    /// # Returns
    ///
    /// `None` if the participant has no recorded scores
    pub fn score(&self, id: Id) -> Option<(u64, usize)> {
        self.score_and_position.get(&id).copied()
    }
}

/// Prize awarded for a final score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prize {
    /// A cash prize
    Amount(u64),
    /// The score matches no prize tier
    Nothing,
}

impl Prize {
    /// Looks up the prize for a final score
    ///
    /// A perfect session earns the top prize; otherwise only exact matches
    /// of a lower tier pay out.
    ///
    /// # Arguments
    ///
    /// * `score` - The final score
    /// * `rounds` - Number of rounds the session played
    pub fn for_score(score: u64, rounds: usize) -> Self {
        if score > 0 && score == POINTS_PER_CORRECT * rounds as u64 {
            return Self::Amount(TOP_PRIZE);
        }
        PRIZE_TIERS
            .iter()
            .find(|(tier, _)| *tier == score)
            .map_or(Self::Nothing, |(_, amount)| Self::Amount(*amount))
    }
}

impl Display for Prize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amount(amount) => {
                let digits = amount.to_string();
                let grouped = digits
                    .as_bytes()
                    .rchunks(3)
                    .rev()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .join(",");
                write!(f, "{grouped}")
            }
            Self::Nothing => write!(f, ":("),
        }
    }
}

/// A participant tied at the top score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    /// The participant's ID
    pub id: Id,
    /// The participant's display name
    pub name: String,
    /// The winning score
    pub score: u64,
    /// The prize for that score
    pub prize: Prize,
}

/// Resolves the winners of a finished session
///
/// Every participant at the maximum score wins; there is no tie-break.
///
/// # Arguments
///
/// * `participants` - The active participants in seat order
/// * `rounds` - Number of rounds played
///
/// # Returns
///
/// The winners in seat order, empty only if there are no participants
pub fn resolve_winners(participants: &[Participant], rounds: usize) -> Vec<Winner> {
    let Some(best) = participants.iter().map(Participant::score).max() else {
        return Vec::new();
    };
    let prize = Prize::for_score(best, rounds);
    participants
        .iter()
        .filter(|p| p.score() == best)
        .map(|p| Winner {
            id: p.id(),
            name: p.name().to_owned(),
            score: best,
            prize,
        })
        .collect()
}
