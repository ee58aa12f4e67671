//! Lifelines a participant may spend once per session
//!
//! Each lifeline is a stateless algorithm over one question. Whether a
//! participant may still use it is tracked on the participant; this module
//! only computes the effect.

use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use enum_map::Enum;
use itertools::Itertools;

use super::question::{OptionKey, Question};
use crate::constants::assist::{
    AUDIENCE_BASE_PERCENT, AUDIENCE_BOOST_PERCENT, FIFTY_FIFTY_HIDDEN, FRIEND_ACCURACY,
};

/// The three kinds of lifeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Assist {
    /// Hides two wrong options
    FiftyFifty,
    /// Asks a friend, who is usually right
    CallAFriend,
    /// Polls the audience, which leans towards the correct option
    AskTheAudience,
}

impl Assist {
    /// Returns the keyword a participant types to invoke this lifeline
    pub fn keyword(self) -> &'static str {
        match self {
            Self::FiftyFifty => "5050",
            Self::CallAFriend => "call",
            Self::AskTheAudience => "ask",
        }
    }

    /// Computes the effect of this lifeline on a question
    ///
    /// # Arguments
    ///
    /// * `question` - The question being answered
    /// * `hidden` - The round's hidden options, extended by 50/50
    /// * `rng` - Source of randomness for the lifeline
    pub fn apply(
        self,
        question: &Question,
        hidden: &mut BTreeSet<OptionKey>,
        rng: &mut fastrand::Rng,
    ) -> Effect {
        match self {
            Self::FiftyFifty => {
                let removed = fifty_fifty(question, rng);
                hidden.extend(removed.iter().copied());
                Effect::Removed(removed)
            }
            Self::CallAFriend => Effect::FriendSuggests(call_a_friend(question, rng)),
            Self::AskTheAudience => Effect::Poll(ask_the_audience(question)),
        }
    }
}

impl Display for Assist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FiftyFifty => write!(f, "50/50"),
            Self::CallAFriend => write!(f, "Call a Friend"),
            Self::AskTheAudience => write!(f, "Ask the Audience"),
        }
    }
}

impl FromStr for Assist {
    type Err = ();

    /// Recognizes a lifeline keyword, ignoring case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        [Self::FiftyFifty, Self::CallAFriend, Self::AskTheAudience]
            .into_iter()
            .find(|assist| assist.keyword().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// What a lifeline revealed or changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// These wrong options are now hidden for the rest of the round
    Removed(Vec<OptionKey>),
    /// The friend's advice
    FriendSuggests(OptionKey),
    /// Vote share per option in percent
    Poll(Vec<(OptionKey, u32)>),
}

/// Picks two distinct wrong options uniformly at random
///
/// Questions always carry at least two wrong options once validated, so the
/// result holds exactly [`FIFTY_FIFTY_HIDDEN`] keys for any playable question.
pub fn fifty_fifty(question: &Question, rng: &mut fastrand::Rng) -> Vec<OptionKey> {
    let mut wrong = question.wrong_keys();
    rng.shuffle(&mut wrong);
    wrong.truncate(FIFTY_FIFTY_HIDDEN);
    wrong.sort_unstable();
    wrong
}

/// Returns the friend's suggestion
///
/// The friend names the correct option with probability
/// [`FRIEND_ACCURACY`]; otherwise any option at random, which may still be
/// the correct one.
pub fn call_a_friend(question: &Question, rng: &mut fastrand::Rng) -> OptionKey {
    if rng.f64() < FRIEND_ACCURACY {
        question.correct()
    } else {
        rng.choice(question.keys()).unwrap_or(question.correct())
    }
}

/// Simulates the audience poll
///
/// Every option gets the base share and the correct one gets the boost on
/// top. The shares are not renormalized, so they may add up past 100.
pub fn ask_the_audience(question: &Question) -> Vec<(OptionKey, u32)> {
    question
        .keys()
        .map(|key| {
            let share = if key == question.correct() {
                AUDIENCE_BASE_PERCENT + AUDIENCE_BOOST_PERCENT
            } else {
                AUDIENCE_BASE_PERCENT
            };
            (key, share)
        })
        .collect_vec()
}
