//! Questions, the question bank and the lifelines that act on them
//!
//! This module contains the immutable question data a session is played
//! with, the bank that loads and shuffles it, and the stateless lifeline
//! algorithms participants can spend during a round.

pub mod assist;
pub mod bank;
pub mod question;
