use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

use quiz_core::model::{
    QuestionBank, QuestionId, ResultRecord, SelectionEntry, SessionState, SessionStatus,
};

/// Persisted shape of one result: `{ scorePercent, correctCount, totalQuestions, timestamp }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub score_percent: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u32>,
}

impl ResultRow {
    #[must_use]
    pub fn from_record(record: &ResultRecord) -> Self {
        Self {
            score_percent: u32::from(record.score_percent),
            correct_count: record.correct_count,
            total_questions: record.total_questions,
            timestamp: record.timestamp,
            elapsed_seconds: Some(record.elapsed_seconds),
        }
    }

    #[must_use]
    pub fn into_record(self) -> ResultRecord {
        ResultRecord {
            score_percent: u8::try_from(self.score_percent.min(100)).unwrap_or(100),
            correct_count: self.correct_count,
            total_questions: self.total_questions,
            elapsed_seconds: self.elapsed_seconds.unwrap_or_default(),
            timestamp: self.timestamp,
        }
    }
}

/// Persisted shape of a session snapshot.
///
/// Only question ids are stored; bodies are looked up in the bank on load.
/// Answers and option orders are keyed by position in `question_ids`; entries
/// with a non-numeric key or an unreadable value are skipped on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default, deserialize_with = "positional_entries")]
    pub answers: BTreeMap<usize, String>,
    #[serde(default)]
    pub remaining_seconds: Option<i64>,
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
    #[serde(default, deserialize_with = "positional_entries")]
    pub option_orders: BTreeMap<usize, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultRow>,
    /// Absent in snapshots that predate the flag; a stored result then counts as recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_recorded: Option<bool>,
}

fn positional_entries<'de, D, V>(deserializer: D) -> Result<BTreeMap<usize, V>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let Ok(position) = key.trim().parse::<usize>() else {
                warn!("skipping saved entry with non-numeric position {key:?}");
                return None;
            };
            match serde_json::from_value(value) {
                Ok(value) => Some((position, value)),
                Err(err) => {
                    warn!("skipping unreadable saved entry at position {position}: {err}");
                    None
                }
            }
        })
        .collect())
}

/// A snapshot rebuilt against the current bank, plus what had to be repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredProgress {
    pub state: SessionState,
    /// Saved ids that are no longer in the bank (or repeated).
    pub dropped_ids: Vec<QuestionId>,
    /// Questions whose saved option order no longer matched and was replaced by the bank order.
    pub reordered_ids: Vec<QuestionId>,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_session(state: &SessionState) -> Self {
        let question_ids = state
            .selected()
            .iter()
            .map(|entry| entry.question().id())
            .collect();
        let option_orders = state
            .selected()
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                entry
                    .shuffled_options()
                    .map(|order| (position, order.to_vec()))
            })
            .collect();

        Self {
            answers: state.answers().clone(),
            remaining_seconds: Some(i64::from(state.remaining_seconds())),
            question_ids,
            option_orders,
            status: Some(state.status().as_str().to_string()),
            result: state.result().map(ResultRow::from_record),
            history_recorded: state.result().map(|_| state.is_history_recorded()),
        }
    }

    /// Rebuild the session against `bank`.
    ///
    /// Ids missing from the bank are dropped and the remaining entries are
    /// re-indexed; each surviving answer and option order moves with its question.
    #[must_use]
    pub fn into_session(mut self, bank: &QuestionBank, total_seconds: u32) -> RestoredProgress {
        let mut selected = Vec::with_capacity(self.question_ids.len());
        let mut answers = BTreeMap::new();
        let mut seen = HashSet::with_capacity(self.question_ids.len());
        let mut dropped_ids = Vec::new();
        let mut reordered_ids = Vec::new();

        for (saved_position, id) in self.question_ids.iter().copied().enumerate() {
            let question = match bank.get(id) {
                Some(question) if seen.insert(id) => question,
                _ => {
                    dropped_ids.push(id);
                    continue;
                }
            };

            let order = self.option_orders.remove(&saved_position);
            let entry = if question.is_multiple_choice() {
                match order {
                    Some(order) => SelectionEntry::new(question.clone(), Some(order))
                        .unwrap_or_else(|_| {
                            reordered_ids.push(id);
                            SelectionEntry::canonical(question.clone())
                        }),
                    None => SelectionEntry::canonical(question.clone()),
                }
            } else {
                SelectionEntry::canonical(question.clone())
            };

            if let Some(answer) = self.answers.remove(&saved_position) {
                answers.insert(selected.len(), answer);
            }
            selected.push(entry);
        }

        let remaining_seconds = self.remaining_seconds.map_or(total_seconds, |secs| {
            u32::try_from(secs.clamp(0, i64::from(total_seconds))).unwrap_or(total_seconds)
        });
        let status = self
            .status
            .as_deref()
            .and_then(SessionStatus::parse)
            .unwrap_or(if answers.is_empty() && remaining_seconds == total_seconds {
                SessionStatus::NotStarted
            } else {
                SessionStatus::InProgress
            });
        let result = self.result.map(ResultRow::into_record);
        let history_recorded = self.history_recorded.unwrap_or(true);

        RestoredProgress {
            state: SessionState::from_persisted(
                selected,
                answers,
                remaining_seconds,
                total_seconds,
                status,
                result,
            )
            .with_history_recorded(history_recorded),
            dropped_ids,
            reordered_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, TRUE_LABEL};

    fn mc(id: u64) -> Question {
        Question::multiple_choice(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["A".into(), "B".into(), "C".into()],
            "A",
            None,
        )
        .unwrap()
    }

    #[test]
    fn parses_minimal_snapshot_with_only_logical_fields() {
        let raw = r#"{
            "answers": {"0": "A"},
            "remainingSeconds": 1200,
            "questionIds": [1, 2],
            "optionOrders": {"0": ["C", "B", "A"]}
        }"#;
        let record: ProgressRecord = serde_json::from_str(raw).unwrap();
        let bank = QuestionBank::new(vec![mc(1), mc(2)]).unwrap();

        let restored = record.into_session(&bank, 3600);
        let state = restored.state;
        assert_eq!(state.len(), 2);
        assert_eq!(state.answer(0), Some("A"));
        assert_eq!(state.remaining_seconds(), 1200);
        assert_eq!(state.status(), SessionStatus::InProgress);
        assert_eq!(
            state.selected()[0].shuffled_options().unwrap(),
            ["C".to_string(), "B".to_string(), "A".to_string()]
        );
        assert_eq!(
            state.selected()[1].displayed_options(),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn stale_ids_are_dropped_and_answers_follow_their_question() {
        let record = ProgressRecord {
            answers: BTreeMap::from([(0, "A".to_string()), (1, "B".to_string())]),
            remaining_seconds: Some(100),
            question_ids: vec![QuestionId::new(9), QuestionId::new(2)],
            option_orders: BTreeMap::from([(1, vec!["B".into(), "A".into(), "C".into()])]),
            status: None,
            result: None,
            history_recorded: None,
        };
        let bank = QuestionBank::new(vec![mc(1), mc(2)]).unwrap();

        let restored = record.into_session(&bank, 3600);
        assert_eq!(restored.dropped_ids, vec![QuestionId::new(9)]);
        let state = restored.state;
        assert_eq!(state.len(), 1);
        assert_eq!(state.selected()[0].question().id(), QuestionId::new(2));
        assert_eq!(state.answer(0), Some("B"));
        assert_eq!(state.unanswered_count(), 0);
        assert_eq!(
            state.selected()[0].displayed_options(),
            vec!["B", "A", "C"]
        );
    }

    #[test]
    fn mismatched_option_order_falls_back_to_bank_order() {
        let record = ProgressRecord {
            question_ids: vec![QuestionId::new(1)],
            option_orders: BTreeMap::from([(0, vec!["A".into(), "B".into(), "Z".into()])]),
            ..ProgressRecord::default()
        };
        let bank = QuestionBank::new(vec![mc(1)]).unwrap();

        let restored = record.into_session(&bank, 3600);
        assert_eq!(restored.reordered_ids, vec![QuestionId::new(1)]);
        assert_eq!(
            restored.state.selected()[0].displayed_options(),
            vec!["A", "B", "C"]
        );
        assert_eq!(restored.state.status(), SessionStatus::NotStarted);
    }

    #[test]
    fn negative_or_missing_time_is_clamped() {
        let tf = Question::true_false(QuestionId::new(5), "T", TRUE_LABEL, None).unwrap();
        let bank = QuestionBank::new(vec![tf]).unwrap();

        let negative = ProgressRecord {
            remaining_seconds: Some(-5),
            question_ids: vec![QuestionId::new(5)],
            ..ProgressRecord::default()
        };
        assert_eq!(negative.into_session(&bank, 3600).state.remaining_seconds(), 0);

        let missing = ProgressRecord {
            question_ids: vec![QuestionId::new(5)],
            ..ProgressRecord::default()
        };
        assert_eq!(missing.into_session(&bank, 3600).state.remaining_seconds(), 3600);
    }

    #[test]
    fn bad_answer_keys_are_skipped_not_fatal() {
        let raw = r#"{
            "answers": {"0": "A", "one": "B", "1": 7},
            "remainingSeconds": 900,
            "questionIds": [1, 2],
            "optionOrders": {"x": ["A"], "1": ["C", "A", "B"]}
        }"#;
        let record: ProgressRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.answers, BTreeMap::from([(0, "A".to_string())]));
        assert_eq!(record.option_orders.len(), 1);

        let bank = QuestionBank::new(vec![mc(1), mc(2)]).unwrap();
        let state = record.into_session(&bank, 3600).state;
        assert_eq!(state.remaining_seconds(), 900);
        assert_eq!(state.unanswered_count(), 1);
        assert_eq!(state.selected()[1].displayed_options(), vec!["C", "A", "B"]);
    }

    #[test]
    fn history_flag_round_trips_and_defaults_to_recorded() {
        let bank = QuestionBank::new(vec![mc(1)]).unwrap();
        let selected = vec![SelectionEntry::canonical(mc(1))];
        let mut state = SessionState::new(selected, 60);
        quiz_core::scoring::submit(&mut state, quiz_core::time::fixed_now());

        let pending = ProgressRecord::from_session(&state);
        assert_eq!(pending.history_recorded, Some(false));
        let restored = pending.clone().into_session(&bank, 60).state;
        assert!(restored.is_submitted());
        assert!(!restored.is_history_recorded());

        let legacy = ProgressRecord {
            history_recorded: None,
            ..pending
        };
        assert!(legacy.into_session(&bank, 60).state.is_history_recorded());

        let unsubmitted = ProgressRecord::from_session(&SessionState::new(Vec::new(), 60));
        assert_eq!(unsubmitted.history_recorded, None);
    }

    #[test]
    fn result_row_uses_camel_case_fields() {
        let row = ResultRow {
            score_percent: 50,
            correct_count: 1,
            total_questions: 2,
            timestamp: quiz_core::time::fixed_now(),
            elapsed_seconds: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["scorePercent"], 50);
        assert_eq!(json["correctCount"], 1);
        assert_eq!(json["totalQuestions"], 2);
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
        assert!(json.get("elapsedSeconds").is_none());
    }
}
