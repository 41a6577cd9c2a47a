use quiz_core::model::{QuestionId, SessionState};

/// One reviewed question of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub position: usize,
    pub question_id: QuestionId,
    pub prompt: String,
    /// Options as they were shown during the attempt.
    pub options: Vec<String>,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub is_correct: bool,
}

/// Build the review list in selection order.
#[must_use]
pub fn review_items(state: &SessionState) -> Vec<ReviewItem> {
    state
        .selected()
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let question = entry.question();
            let user_answer = state.answer(position).map(str::to_owned);
            let is_correct = user_answer
                .as_deref()
                .is_some_and(|answer| question.is_correct(answer));
            ReviewItem {
                position,
                question_id: question.id(),
                prompt: question.prompt().to_owned(),
                options: entry
                    .displayed_options()
                    .into_iter()
                    .map(str::to_owned)
                    .collect(),
                user_answer,
                correct_answer: question.correct_answer().to_owned(),
                explanation: question.explanation().map(str::to_owned),
                is_correct,
            }
        })
        .collect()
}

/// Plain-text export of a review, one block per question.
#[must_use]
pub fn export_text(items: &[ReviewItem]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!(
            "{}. {}\n   your answer: {}\n   correct answer: {}\n",
            item.position + 1,
            item.prompt,
            item.user_answer.as_deref().unwrap_or("(none)"),
            item.correct_answer
        ));
        if let Some(explanation) = &item.explanation {
            out.push_str(&format!("   explanation: {explanation}\n"));
        }
        out.push('\n');
    }
    out
}
