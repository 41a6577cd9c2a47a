use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::ids::QuestionId;

/// Label presented (and expected as answer) for the "true" side of a true/false question.
pub const TRUE_LABEL: &str = "صح";
/// Label presented (and expected as answer) for the "false" side of a true/false question.
pub const FALSE_LABEL: &str = "خطأ";
/// Fixed presentation order of the true/false pair.
pub const TRUE_FALSE_LABELS: [&str; 2] = [TRUE_LABEL, FALSE_LABEL];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("multiple-choice question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("multiple-choice question {id} repeats option {option:?}")]
    DuplicateOption { id: QuestionId, option: String },

    #[error("correct answer of question {id} is not one of its options")]
    AnswerNotAnOption { id: QuestionId },

    #[error("question id {id} appears more than once in the bank")]
    DuplicateId { id: QuestionId },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    TrueFalse,
    MultipleChoice,
}

/// Immutable question as supplied by the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: Option<String>,
}

impl Question {
    /// Build a true/false question. `correct_answer` must be one of [`TRUE_FALSE_LABELS`].
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank or the answer is not a label.
    pub fn true_false(
        id: QuestionId,
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = normalize_prompt(id, prompt.into())?;
        let correct_answer = correct_answer.into();
        if !TRUE_FALSE_LABELS.contains(&correct_answer.as_str()) {
            return Err(QuestionError::AnswerNotAnOption { id });
        }

        Ok(Self {
            id,
            kind: QuestionKind::TrueFalse,
            prompt,
            options: Vec::new(),
            correct_answer,
            explanation: normalize_explanation(explanation),
        })
    }

    /// Build a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, options are empty or repeated,
    /// or `correct_answer` is not one of the options.
    pub fn multiple_choice(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = normalize_prompt(id, prompt.into())?;
        if options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption {
                    id,
                    option: option.clone(),
                });
            }
        }

        let correct_answer = correct_answer.into();
        if !seen.contains(correct_answer.as_str()) {
            return Err(QuestionError::AnswerNotAnOption { id });
        }

        Ok(Self {
            id,
            kind: QuestionKind::MultipleChoice,
            prompt,
            options,
            correct_answer,
            explanation: normalize_explanation(explanation),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Canonical option order. Empty for true/false questions.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Exact string comparison against the correct answer.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

fn normalize_prompt(id: QuestionId, prompt: String) -> Result<String, QuestionError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(QuestionError::EmptyPrompt { id });
    }
    Ok(trimmed.to_string())
}

fn normalize_explanation(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Read-only catalog of questions, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
}

impl QuestionBank {
    /// Build a bank from questions, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        let mut by_id = HashMap::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            if by_id.insert(question.id(), index).is_some() {
                return Err(QuestionError::DuplicateId { id: question.id() });
            }
        }
        Ok(Self { questions, by_id })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.by_id.get(&id).map(|&index| &self.questions[index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
