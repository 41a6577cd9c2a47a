use chrono::{DateTime, Utc};

use crate::model::{ResultRecord, SessionState};

/// Result of a submit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub record: ResultRecord,
    /// False when the session had already been submitted and the stored record was returned.
    pub newly_submitted: bool,
}

/// Positions whose answer equals the question's correct answer exactly.
#[must_use]
pub fn correct_count(state: &SessionState) -> usize {
    state
        .selected()
        .iter()
        .enumerate()
        .filter(|(position, entry)| {
            state
                .answer(*position)
                .is_some_and(|answer| entry.question().is_correct(answer))
        })
        .count()
}

/// `round(100 * correct / total)` with halves rounded up; 0 for an empty selection.
#[must_use]
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    let percent = (200 * correct + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

/// Score the attempt without touching it.
#[must_use]
pub fn evaluate(state: &SessionState, now: DateTime<Utc>) -> ResultRecord {
    let correct = correct_count(state);
    let total = state.len();
    ResultRecord {
        score_percent: score_percent(correct, total),
        correct_count: u32::try_from(correct).unwrap_or(u32::MAX),
        total_questions: u32::try_from(total).unwrap_or(u32::MAX),
        elapsed_seconds: state.elapsed_seconds(),
        timestamp: now,
    }
}

/// Finalize the session. Repeated calls return the stored record unchanged.
pub fn submit(state: &mut SessionState, now: DateTime<Utc>) -> Submission {
    if state.is_submitted() {
        let record = match state.result() {
            Some(record) => record.clone(),
            None => {
                let record = evaluate(state, now);
                state.finalize(record.clone());
                record
            }
        };
        return Submission {
            record,
            newly_submitted: false,
        };
    }

    let record = evaluate(state, now);
    state.finalize(record.clone());
    Submission {
        record,
        newly_submitted: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, Question, SelectionEntry, SessionStatus};
    use crate::time::fixed_now;

    fn mc(id: u64, correct: &str) -> SelectionEntry {
        let q = Question::multiple_choice(
            QuestionId::new(id),
            "Pick",
            vec!["X".into(), "Y".into(), "Z".into()],
            correct,
            None,
        )
        .unwrap();
        SelectionEntry::canonical(q)
    }

    #[test]
    fn one_of_two_correct_scores_fifty() {
        let mut state = SessionState::new(vec![mc(1, "X"), mc(2, "Y")], 3600);
        state.record_answer(0, "X").unwrap();
        state.record_answer(1, "Z").unwrap();

        let submission = submit(&mut state, fixed_now());
        assert!(submission.newly_submitted);
        assert_eq!(submission.record.correct_count, 1);
        assert_eq!(submission.record.total_questions, 2);
        assert_eq!(submission.record.score_percent, 50);
        assert_eq!(state.status(), SessionStatus::Submitted);
    }

    #[test]
    fn empty_selection_scores_zero() {
        let mut state = SessionState::new(Vec::new(), 3600);
        let record = submit(&mut state, fixed_now()).record;
        assert_eq!(record.score_percent, 0);
        assert_eq!(record.correct_count, 0);
        assert_eq!(record.total_questions, 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(score_percent(1, 8), 13); // 12.5
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(3, 3), 100);
    }

    #[test]
    fn second_submit_returns_first_record() {
        let mut state = SessionState::new(vec![mc(1, "X")], 3600);
        state.record_answer(0, "X").unwrap();
        state.tick();
        let first = submit(&mut state, fixed_now());
        let later = fixed_now() + chrono::Duration::minutes(5);
        let second = submit(&mut state, later);

        assert!(!second.newly_submitted);
        assert_eq!(first.record, second.record);
        assert_eq!(second.record.elapsed_seconds, 1);
    }
}
