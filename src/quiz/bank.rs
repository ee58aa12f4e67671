//! The question bank a session draws its rounds from
//!
//! The bank is immutable once loaded. A built-in bank ships with the crate
//! as embedded JSON; custom banks can be parsed from any JSON text with the
//! same shape. Every bank is validated before use so that each question is
//! guaranteed to have a correct key among its options.

use garde::Validate;
use itertools::Itertools;
use serde::Deserialize;

use super::question::Question;
use crate::Error;

/// JSON source of the built-in bank
const BUILTIN_BANK: &str = include_str!("questions.json");

/// An immutable, validated collection of questions
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionBank {
    /// All questions of the bank in their stored order
    #[garde(length(min = 1), dive)]
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Loads the bank bundled with the crate
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled data is malformed or invalid, which
    /// indicates a packaging defect.
    pub fn builtin() -> Result<Self, Error> {
        Self::from_json(BUILTIN_BANK)
    }

    /// Parses and validates a bank from JSON text
    ///
    /// # Errors
    ///
    /// * `Error::MalformedBank` - The text is not a bank in JSON form
    /// * `Error::InvalidBank` - A question violates its invariants
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Self::from_questions(serde_json::from_str::<Self>(json)?.questions)
    }

    /// Builds a bank from questions after validating them
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBank` if the list is empty or a question
    /// violates its invariants.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, Error> {
        let bank = Self { questions };
        bank.validate().map_err(Error::InvalidBank)?;
        Ok(bank)
    }

    /// Returns the number of questions in the bank
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Checks if the bank contains any questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns the questions in their stored order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Draws the questions for a session in shuffled order
    ///
    /// # Arguments
    ///
    /// * `rounds` - How many questions to draw
    /// * `rng` - Source of randomness for the shuffle
    ///
    /// # Errors
    ///
    /// Returns `Error::NotEnoughQuestions` if the bank is smaller than the
    /// number of rounds.
    pub fn draw(&self, rounds: usize, rng: &mut fastrand::Rng) -> Result<Vec<Question>, Error> {
        if rounds > self.len() {
            return Err(Error::NotEnoughQuestions {
                rounds,
                available: self.len(),
            });
        }
        let mut questions = self.questions.clone();
        rng.shuffle(&mut questions);
        Ok(questions.into_iter().take(rounds).collect_vec())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::quiz::question::OptionKey;

    #[test]
    fn test_builtin_bank_is_valid() {
        let bank = QuestionBank::builtin().unwrap();
        assert_eq!(bank.len(), 9);
        assert!(!bank.is_empty());
        assert!(bank.questions().iter().all(|q| q.offers(q.correct())));
    }

    #[test]
    fn test_from_json_malformed() {
        let result = QuestionBank::from_json("{\"questions\": [");
        assert!(matches!(result, Err(Error::MalformedBank(_))));
    }

    #[test]
    fn test_from_json_unknown_key() {
        let json = r#"{"questions":[{"text":"?","options":{"A":"1","B":"2","Z":"3"},"correct":"A"}]}"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(Error::MalformedBank(_))
        ));
    }

    #[test]
    fn test_from_json_correct_not_offered() {
        let json = r#"{"questions":[{"text":"?","options":{"A":"1","B":"2","C":"3"},"correct":"D"}]}"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(Error::InvalidBank(_))
        ));
    }

    #[test]
    fn test_empty_bank_is_invalid() {
        assert!(matches!(
            QuestionBank::from_questions(vec![]),
            Err(Error::InvalidBank(_))
        ));
    }

    #[test]
    fn test_draw_takes_distinct_questions() {
        let bank = QuestionBank::builtin().unwrap();
        let mut rng = fastrand::Rng::with_seed(11);
        let drawn = bank.draw(3, &mut rng).unwrap();

        assert_eq!(drawn.len(), 3);
        assert_eq!(drawn.iter().map(Question::text).unique().count(), 3);
        assert!(
            drawn
                .iter()
                .all(|q| bank.questions().iter().any(|b| b == q))
        );
    }

    #[test]
    fn test_draw_whole_bank_is_permutation() {
        let bank = QuestionBank::builtin().unwrap();
        let mut rng = fastrand::Rng::with_seed(3);
        let drawn = bank.draw(bank.len(), &mut rng).unwrap();

        let mut expected = bank.questions().iter().map(Question::text).collect_vec();
        let mut actual = drawn.iter().map(Question::text).collect_vec();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_draw_too_many() {
        let bank = QuestionBank::from_questions(vec![Question::new(
            "Pick A",
            [
                (OptionKey::A, "this"),
                (OptionKey::B, "not this"),
                (OptionKey::C, "nor this"),
            ],
            OptionKey::A,
        )])
        .unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(matches!(
            bank.draw(2, &mut rng),
            Err(Error::NotEnoughQuestions {
                rounds: 2,
                available: 1
            })
        ));
    }
}
