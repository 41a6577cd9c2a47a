use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Question, TRUE_FALSE_LABELS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("option order for question {id} is not a permutation of its options")]
    NotAPermutation { id: QuestionId },

    #[error("true/false question {id} cannot carry a custom option order")]
    UnexpectedOrder { id: QuestionId },
}

/// One question drawn into a session, together with the order its options are shown in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    question: Question,
    shuffled_options: Option<Vec<String>>,
}

impl SelectionEntry {
    /// Pair a question with an option order.
    ///
    /// Multiple-choice questions require an order that is a permutation of their
    /// options; true/false questions require `None`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError` when the order does not fit the question.
    pub fn new(
        question: Question,
        shuffled_options: Option<Vec<String>>,
    ) -> Result<Self, SelectionError> {
        match (question.is_multiple_choice(), shuffled_options) {
            (true, Some(order)) => {
                if !is_permutation(question.options(), &order) {
                    return Err(SelectionError::NotAPermutation { id: question.id() });
                }
                Ok(Self {
                    question,
                    shuffled_options: Some(order),
                })
            }
            (true, None) => Ok(Self::canonical(question)),
            (false, None) => Ok(Self {
                question,
                shuffled_options: None,
            }),
            (false, Some(_)) => Err(SelectionError::UnexpectedOrder { id: question.id() }),
        }
    }

    /// Entry that shows options in the bank's own order.
    #[must_use]
    pub fn canonical(question: Question) -> Self {
        let shuffled_options = question
            .is_multiple_choice()
            .then(|| question.options().to_vec());
        Self {
            question,
            shuffled_options,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn shuffled_options(&self) -> Option<&[String]> {
        self.shuffled_options.as_deref()
    }

    /// Options in the order they are presented; the fixed pair for true/false.
    #[must_use]
    pub fn displayed_options(&self) -> Vec<&str> {
        match &self.shuffled_options {
            Some(order) => order.iter().map(String::as_str).collect(),
            None => TRUE_FALSE_LABELS.to_vec(),
        }
    }
}

fn is_permutation(options: &[String], order: &[String]) -> bool {
    if options.len() != order.len() {
        return false;
    }
    let mut expected: Vec<&str> = options.iter().map(String::as_str).collect();
    let mut actual: Vec<&str> = order.iter().map(String::as_str).collect();
    expected.sort_unstable();
    actual.sort_unstable();
    expected == actual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::TRUE_LABEL;

    fn mc() -> Question {
        Question::multiple_choice(
            QuestionId::new(1),
            "Pick",
            vec!["A".into(), "B".into(), "C".into()],
            "B",
            None,
        )
        .unwrap()
    }

    #[test]
    fn accepts_permutation_and_rejects_same_length_other_set() {
        let ok = SelectionEntry::new(mc(), Some(vec!["C".into(), "A".into(), "B".into()]));
        assert!(ok.is_ok());

        let wrong = SelectionEntry::new(mc(), Some(vec!["A".into(), "A".into(), "B".into()]));
        assert_eq!(
            wrong.unwrap_err(),
            SelectionError::NotAPermutation { id: QuestionId::new(1) }
        );
    }

    #[test]
    fn true_false_shows_fixed_pair() {
        let q = Question::true_false(QuestionId::new(2), "T?", TRUE_LABEL, None).unwrap();
        let entry = SelectionEntry::new(q.clone(), None).unwrap();
        assert_eq!(entry.shuffled_options(), None);
        assert_eq!(entry.displayed_options(), TRUE_FALSE_LABELS.to_vec());

        assert!(SelectionEntry::new(q, Some(vec![TRUE_LABEL.into()])).is_err());
    }

    #[test]
    fn canonical_keeps_bank_order() {
        let entry = SelectionEntry::canonical(mc());
        assert_eq!(entry.displayed_options(), vec!["A", "B", "C"]);
    }
}
