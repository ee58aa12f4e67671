//! Configuration constants for the quiz session
//!
//! This module contains the fixed rules of a session: how many seats and
//! rounds there are, how long a participant may think, how answers are
//! scored, which prizes exist, and how the lifelines behave.

/// Session shape constants
pub mod game {
    /// Number of prospective participant seats offered during the join phase
    pub const SLOT_COUNT: usize = 3;
    /// Maximum number of seats a session may offer
    pub const MAX_SLOT_COUNT: usize = 8;
    /// Number of rounds played in a session
    pub const ROUND_COUNT: usize = 3;
    /// Minimum number of rounds a session may be configured with
    pub const MIN_ROUND_COUNT: usize = 1;
    /// Maximum number of rounds a session may be configured with
    pub const MAX_ROUND_COUNT: usize = 20;
}

/// Answer collection constants
pub mod answer {
    /// Seconds a participant has to settle on an answer
    pub const TIME_LIMIT: u64 = 30;
    /// Minimum configurable answer time limit in seconds
    pub const MIN_TIME_LIMIT: u64 = 5;
    /// Maximum configurable answer time limit in seconds
    pub const MAX_TIME_LIMIT: u64 = 240;
}

/// Scoring and prize constants
pub mod scoring {
    /// Points awarded for a correct answer
    pub const POINTS_PER_CORRECT: u64 = 10;
    /// Prize for a perfect session (every round answered correctly)
    pub const TOP_PRIZE: u64 = 1_000_000;
    /// Lower prize tiers as (exact score, prize) pairs, highest first
    pub const PRIZE_TIERS: [(u64, u64); 2] = [(20, 500_000), (10, 250_000)];
}

/// Lifeline constants
pub mod assist {
    /// Chance that the friend on the phone names the correct option
    pub const FRIEND_ACCURACY: f64 = 0.8;
    /// Share every option receives in the audience poll
    pub const AUDIENCE_BASE_PERCENT: u32 = 10;
    /// Extra share the correct option receives in the audience poll
    pub const AUDIENCE_BOOST_PERCENT: u32 = 60;
    /// Number of wrong options hidden by the 50/50 lifeline
    pub const FIFTY_FIFTY_HIDDEN: usize = 2;
}

/// Question bank constants
pub mod question {
    /// Minimum length of a question text
    pub const MIN_TEXT_LENGTH: usize = 1;
    /// Maximum length of a question text
    pub const MAX_TEXT_LENGTH: usize = 200;
    /// Minimum number of options per question
    pub const MIN_OPTION_COUNT: usize = 3;
    /// Maximum number of options per question
    pub const MAX_OPTION_COUNT: usize = 4;
}

/// Participant name constants
pub mod names {
    /// Maximum length of a participant name in bytes
    pub const MAX_LENGTH: usize = 30;
}
