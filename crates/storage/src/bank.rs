use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use quiz_core::model::{Question, QuestionBank, QuestionError, QuestionId};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("cannot read question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed question bank: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question {id} has unknown type {kind:?}")]
    UnknownKind { id: QuestionId, kind: String },

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Source shape of a question in a bank file.
#[derive(Debug, Clone, Deserialize)]
struct QuestionRow {
    id: QuestionId,
    #[serde(rename = "type")]
    kind: String,
    question: String,
    #[serde(default)]
    options: Vec<String>,
    answer: String,
    #[serde(default)]
    explanation: Option<String>,
}

impl QuestionRow {
    fn into_question(self) -> Result<Question, BankError> {
        match self.kind.as_str() {
            "truefalse" => Ok(Question::true_false(
                self.id,
                self.question,
                self.answer,
                self.explanation,
            )?),
            "multiple" => Ok(Question::multiple_choice(
                self.id,
                self.question,
                self.options,
                self.answer,
                self.explanation,
            )?),
            _ => Err(BankError::UnknownKind {
                id: self.id,
                kind: self.kind,
            }),
        }
    }
}

fn decode_question(value: serde_json::Value) -> Result<Question, BankError> {
    serde_json::from_value::<QuestionRow>(value)?.into_question()
}

/// Parse a JSON array of questions.
///
/// Entries that are not valid questions, and repeats of an id already seen,
/// are skipped with a warning.
///
/// # Errors
///
/// Returns `BankError::Json` if the input is not a JSON array.
pub fn parse_bank(raw: &str) -> Result<QuestionBank, BankError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(values.len());
    let questions = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match decode_question(value) {
            Ok(question) if seen.insert(question.id()) => Some(question),
            Ok(question) => {
                warn!("skipping bank entry {index}: duplicate id {}", question.id());
                None
            }
            Err(err) => {
                warn!("skipping bank entry {index}: {err}");
                None
            }
        })
        .collect();
    Ok(QuestionBank::new(questions)?)
}

/// Load a bank file. A missing file yields an empty bank.
///
/// # Errors
///
/// Returns `BankError` if the file exists but cannot be read or parsed.
pub fn load_bank_file(path: &Path) -> Result<QuestionBank, BankError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("question bank {} not found; using an empty bank", path.display());
            return Ok(QuestionBank::empty());
        }
        Err(err) => return Err(err.into()),
    };
    let bank = parse_bank(&raw)?;
    info!("loaded {} questions from {}", bank.len(), path.display());
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionKind, TRUE_LABEL};

    #[test]
    fn parses_both_question_types() {
        let raw = format!(
            r#"[
                {{"id": 1, "type": "truefalse", "question": "Is it?", "answer": "{TRUE_LABEL}"}},
                {{"id": 2, "type": "multiple", "question": "Which?",
                  "options": ["a", "b", "c"], "answer": "b", "explanation": "because"}}
            ]"#
        );
        let bank = parse_bank(&raw).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.questions()[0].kind(), QuestionKind::TrueFalse);
        let mc = bank.get(QuestionId::new(2)).unwrap();
        assert_eq!(mc.options().len(), 3);
        assert_eq!(mc.explanation(), Some("because"));
    }

    #[test]
    fn invalid_entries_are_skipped_and_the_rest_load() {
        let raw = r#"[
            {"id": 1, "type": "essay", "question": "Why?", "answer": "x"},
            {"id": 2, "type": "multiple", "question": "Which?", "options": ["a"], "answer": "z"},
            {"id": 3, "question": "No type", "answer": "x"},
            {"id": 4, "type": "multiple", "question": "Ok", "options": ["a", "b"], "answer": "a"},
            {"id": 4, "type": "multiple", "question": "Again", "options": ["a"], "answer": "a"}
        ]"#;
        let bank = parse_bank(raw).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.get(QuestionId::new(4)).unwrap().prompt(), "Ok");
    }

    #[test]
    fn unknown_type_is_reported_per_entry() {
        let value =
            serde_json::json!({"id": 1, "type": "essay", "question": "Why?", "answer": "x"});
        assert!(matches!(
            decode_question(value).unwrap_err(),
            BankError::UnknownKind { .. }
        ));
    }

    #[test]
    fn non_array_input_is_an_error() {
        assert!(matches!(
            parse_bank(r#"{"id": 1}"#).unwrap_err(),
            BankError::Json(_)
        ));
    }

    #[test]
    fn missing_file_is_an_empty_bank() {
        let bank = load_bank_file(Path::new("/definitely/not/here/questions.json")).unwrap();
        assert!(bank.is_empty());
    }
}
