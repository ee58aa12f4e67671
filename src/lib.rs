//! # Lifeline Quiz Library
//!
//! This library runs a timed, multi-participant trivia session. Participants
//! join concurrently, answer every round's question against a personal
//! deadline, may spend one-shot lifelines, and are scored round over round
//! until the winners and their prizes are resolved.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

use thiserror::Error;

pub mod collector;
pub mod console;
pub mod constants;
pub mod game;
pub mod latch;
pub mod leaderboard;
pub mod names;
pub mod participant;
pub mod quiz;
pub mod round;
pub mod session;

/// Errors that abort a session
///
/// Gameplay conditions such as malformed input, a reused lifeline or an
/// answer timeout are narrated to the participants and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// The question bank is not valid JSON or does not match the expected shape
    #[error("question bank is malformed: {0}")]
    MalformedBank(#[from] serde_json::Error),
    /// The question bank parsed but violates a question invariant
    #[error("question bank is invalid: {0}")]
    InvalidBank(garde::Report),
    /// The session options are out of bounds
    #[error("session options are invalid: {0}")]
    InvalidOptions(garde::Report),
    /// The bank holds fewer questions than there are rounds to play
    #[error("{rounds} rounds need as many questions but the bank holds {available}")]
    NotEnoughQuestions {
        /// Number of rounds requested
        rounds: usize,
        /// Number of questions in the bank
        available: usize,
    },
    /// A seat has no input source routed to it
    #[error("no input is routed to seat {0}")]
    UnroutedSeat(usize),
    /// A worker task panicked or was aborted
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
