//! Participant name management and validation
//!
//! This module handles the names chosen during the join phase. It ensures
//! name uniqueness across seats, filters inappropriate content, and hands out
//! generated names to participants who leave the prompt blank.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use heck::ToTitleCase;
use rustrict::CensorStr;
use thiserror::Error;

use crate::{constants::names::MAX_LENGTH, participant::Id};

/// Style of automatically generated participant names
///
/// Generated names are pet-style (adjective + animal) with a configurable
/// number of words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, garde::Validate)]
pub struct NameStyle {
    /// Number of words in a generated name
    #[garde(range(min = 2, max = 3))]
    words: u8,
}

impl Default for NameStyle {
    /// Default name style is two words
    fn default() -> Self {
        Self { words: 2 }
    }
}

impl NameStyle {
    /// Creates a style generating names with the given number of words
    pub fn with_words(words: u8) -> Self {
        Self { words }
    }

    /// Generates a random name according to this style
    ///
    /// # Returns
    ///
    /// A randomly generated name in title case.
    pub fn get_name(&self) -> String {
        loop {
            if let Some(name) = petname::petname(self.words, " ") {
                return name.to_title_case();
            }
        }
    }
}

/// Errors that can occur during name validation and assignment
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested name is already in use by another participant
    #[error("name already in-use")]
    Used,
    /// The participant already has an assigned name
    #[error("participant has an existing name")]
    Assigned,
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

/// Registry of the names taken in a session
///
/// Join workers share one registry behind a lock so two seats can never end
/// up with the same name.
#[derive(Debug, Default, Clone)]
pub struct Names {
    /// Primary mapping from participant ID to name
    mapping: HashMap<Id, String>,
    /// Set of all existing names for quick uniqueness checks
    existing: HashSet<String>,
}

impl Names {
    /// Retrieves the name associated with a participant ID
    pub fn get_name(&self, id: &Id) -> Option<String> {
        self.mapping.get(id).map(std::borrow::ToOwned::to_owned)
    }

    /// Assigns a name to a participant after validation
    ///
    /// # Arguments
    ///
    /// * `id` - The participant ID to assign the name to
    /// * `name` - The requested name (will be trimmed of whitespace)
    ///
    /// # Returns
    ///
    /// The cleaned and assigned name on success
    ///
    /// # Errors
    ///
    /// * `Error::TooLong` - Name exceeds the maximum length
    /// * `Error::Empty` - Name is empty after trimming whitespace
    /// * `Error::Sinful` - Name contains inappropriate content
    /// * `Error::Used` - Name is already taken by another participant
    /// * `Error::Assigned` - Participant already has a name assigned
    pub fn set_name(&mut self, id: Id, name: &str) -> Result<String, Error> {
        let name = rustrict::trim_whitespace(name);
        if name.len() > MAX_LENGTH {
            return Err(Error::TooLong);
        }
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if name.is_inappropriate() {
            return Err(Error::Sinful);
        }
        match self.mapping.entry(id) {
            Entry::Occupied(_) => Err(Error::Assigned),
            Entry::Vacant(v) => {
                if !self.existing.insert(name.to_owned()) {
                    return Err(Error::Used);
                }
                v.insert(name.to_owned());
                Ok(name.to_owned())
            }
        }
    }

    /// Assigns a generated name, retrying until an unused one comes up
    ///
    /// If the participant already has a name, that name is returned.
    pub fn set_generated_name(&mut self, id: Id, style: &NameStyle) -> String {
        if let Some(existing) = self.get_name(&id) {
            return existing;
        }
        loop {
            if let Ok(name) = self.set_name(id, &style.get_name()) {
                return name;
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_names_set_and_get() {
        let mut names = Names::default();
        let id = Id::new();

        let result = names.set_name(id, "TestPlayer");
        assert_eq!(result, Ok("TestPlayer".to_string()));
        assert_eq!(names.get_name(&id), Some("TestPlayer".to_string()));
    }

    #[test]
    fn test_names_too_long() {
        let mut names = Names::default();
        let id = Id::new();

        let long_name = "a".repeat(MAX_LENGTH + 1);
        assert_eq!(names.set_name(id, &long_name), Err(Error::TooLong));
    }

    #[test]
    fn test_names_max_length_allowed() {
        let mut names = Names::default();
        let id = Id::new();

        let max_name = "a".repeat(MAX_LENGTH);
        assert_eq!(names.set_name(id, &max_name), Ok(max_name));
    }

    #[test]
    fn test_names_empty_name() {
        let mut names = Names::default();
        let id = Id::new();

        assert_eq!(names.set_name(id, ""), Err(Error::Empty));
        assert_eq!(names.set_name(id, "   "), Err(Error::Empty));
        assert_eq!(names.set_name(id, "\t\n"), Err(Error::Empty));
    }

    #[test]
    fn test_names_whitespace_trimming() {
        let mut names = Names::default();
        let id = Id::new();

        assert_eq!(
            names.set_name(id, "  TestPlayer  "),
            Ok("TestPlayer".to_string())
        );
    }

    #[test]
    fn test_names_duplicate_error() {
        let mut names = Names::default();
        let id1 = Id::new();
        let id2 = Id::new();
        let id3 = Id::new();

        names.set_name(id1, "Player").unwrap();
        assert_eq!(names.set_name(id2, "Player"), Err(Error::Used));
        assert_eq!(names.set_name(id3, "  Player  "), Err(Error::Used));
    }

    #[test]
    fn test_names_already_assigned_error() {
        let mut names = Names::default();
        let id = Id::new();

        names.set_name(id, "FirstName").unwrap();
        assert_eq!(names.set_name(id, "SecondName"), Err(Error::Assigned));
        assert_eq!(names.get_name(&id), Some("FirstName".to_string()));

        // The rejected name stays available to others
        assert!(names.set_name(Id::new(), "SecondName").is_ok());
    }

    #[test]
    fn test_names_assigned_checked_before_used() {
        let mut names = Names::default();
        let id1 = Id::new();
        let id2 = Id::new();

        names.set_name(id1, "Ann").unwrap();
        names.set_name(id2, "Bob").unwrap();

        assert_eq!(names.set_name(id1, "Bob"), Err(Error::Assigned));
        assert_eq!(names.get_name(&id1), Some("Ann".to_string()));
        assert_eq!(names.get_name(&id2), Some("Bob".to_string()));
    }

    #[test]
    fn test_names_inappropriate_content() {
        let mut names = Names::default();
        let id = Id::new();

        for name in ["damn", "fuck", "shit"] {
            assert_eq!(
                names.set_name(id, name),
                Err(Error::Sinful),
                "Expected '{name}' to be flagged as inappropriate"
            );
        }
    }

    #[test]
    fn test_names_get_nonexistent() {
        let names = Names::default();
        assert_eq!(names.get_name(&Id::new()), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Used.to_string(), "name already in-use");
        assert_eq!(Error::Assigned.to_string(), "participant has an existing name");
        assert_eq!(Error::Empty.to_string(), "name cannot be empty");
        assert_eq!(Error::Sinful.to_string(), "name is inappropriate");
        assert_eq!(Error::TooLong.to_string(), "name is too long");
    }

    #[test]
    fn test_name_style_default() {
        assert_eq!(NameStyle::default(), NameStyle::with_words(2));
    }

    #[test]
    fn test_name_style_generation() {
        let name_2 = NameStyle::with_words(2).get_name();
        assert_eq!(name_2.matches(' ').count(), 1);
        assert!(name_2.chars().next().unwrap().is_uppercase());

        let name_3 = NameStyle::with_words(3).get_name();
        assert_eq!(name_3.matches(' ').count(), 2);
    }

    #[test]
    fn test_set_generated_name_is_unique_and_sticky() {
        let mut names = Names::default();
        let id1 = Id::new();
        let id2 = Id::new();
        let style = NameStyle::default();

        let first = names.set_generated_name(id1, &style);
        let second = names.set_generated_name(id2, &style);

        assert_ne!(first, second);
        assert_eq!(names.set_generated_name(id1, &style), first);
        assert_eq!(names.get_name(&id1), Some(first));
    }
}
