//! Multiple choice questions
//!
//! A question is immutable once loaded: its text, the options keyed by a
//! letter, and the single correct key. The invariant that the correct key is
//! one of the offered options is enforced through validation when a bank is
//! loaded.

use std::{collections::BTreeMap, str::FromStr};

use enum_map::Enum;
use garde::Validate;
use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;

/// Letter identifying one option of a question
///
/// Keys are parsed case-insensitively and always displayed in upper case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Deserialize, derive_more::Display,
)]
#[serde(try_from = "String")]
pub enum OptionKey {
    /// The first option
    A,
    /// The second option
    B,
    /// The third option
    C,
    /// The fourth option
    D,
}

/// Error returned when text does not name an option key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not an option key")]
pub struct ParseOptionKeyError(String);

impl OptionKey {
    /// Every key of the alphabet in display order
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    /// Maps a single character to a key, ignoring case
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }
}

impl FromStr for OptionKey {
    type Err = ParseOptionKeyError;

    /// Parses a key from text consisting of exactly one letter
    ///
    /// # Errors
    ///
    /// Returns a `ParseOptionKeyError` if the text is not a single key letter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .exactly_one()
            .ok()
            .and_then(Self::from_char)
            .ok_or_else(|| ParseOptionKeyError(s.to_owned()))
    }
}

impl TryFrom<String> for OptionKey {
    type Error = ParseOptionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Builds a validator checking that the correct key is one of the options
fn correct_is_offered(
    options: &BTreeMap<OptionKey, String>,
) -> impl FnOnce(&OptionKey, &()) -> garde::Result + '_ {
    move |correct, _ctx| {
        if options.contains_key(correct) {
            Ok(())
        } else {
            Err(garde::Error::new(format!(
                "correct option {correct} is not among the offered options"
            )))
        }
    }
}

/// A multiple choice question with exactly one correct option
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct Question {
    /// The question text shown to participants
    #[garde(length(min = crate::constants::question::MIN_TEXT_LENGTH, max = crate::constants::question::MAX_TEXT_LENGTH))]
    text: String,
    /// Option texts keyed by their letter
    #[garde(length(min = crate::constants::question::MIN_OPTION_COUNT, max = crate::constants::question::MAX_OPTION_COUNT))]
    options: BTreeMap<OptionKey, String>,
    /// The key of the correct option
    #[garde(custom(correct_is_offered(&self.options)))]
    correct: OptionKey,
}

impl Question {
    /// Creates a question from its parts
    ///
    /// The result is not validated; call [`Validate::validate`] before
    /// playing a question built by hand.
    pub fn new<S: Into<String>>(
        text: S,
        options: impl IntoIterator<Item = (OptionKey, S)>,
        correct: OptionKey,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.into_iter().map(|(k, v)| (k, v.into())).collect(),
            correct,
        }
    }

    /// Returns the question text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the key of the correct option
    pub fn correct(&self) -> OptionKey {
        self.correct
    }

    /// Returns the option keys in display order
    pub fn keys(&self) -> impl ExactSizeIterator<Item = OptionKey> + '_ {
        self.options.keys().copied()
    }

    /// Returns the keys of every wrong option in display order
    pub fn wrong_keys(&self) -> Vec<OptionKey> {
        self.keys().filter(|key| *key != self.correct).collect_vec()
    }

    /// Checks whether the question offers an option with this key
    pub fn offers(&self, key: OptionKey) -> bool {
        self.options.contains_key(&key)
    }

    /// Lists the options that are not hidden, in display order
    ///
    /// # Arguments
    ///
    /// * `hidden` - Predicate telling whether a key is hidden from the viewer
    pub fn visible_options<F: Fn(OptionKey) -> bool>(&self, hidden: F) -> Vec<(OptionKey, String)> {
        self.options
            .iter()
            .filter(|(key, _)| !hidden(**key))
            .map(|(key, text)| (*key, text.clone()))
            .collect_vec()
    }
}
