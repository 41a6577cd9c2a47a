use quiz_core::model::{QuizSettingsDraft, SessionStatus};
use quiz_core::time::fixed_clock;
use services::QuizServices;
use storage::bank::parse_bank;
use storage::repository::Storage;

const BANK: &str = r#"[
    {"id": 1, "type": "truefalse", "question": "One", "answer": "صح"},
    {"id": 2, "type": "multiple", "question": "Two", "options": ["a", "b", "c"], "answer": "c"},
    {"id": 3, "type": "multiple", "question": "Three", "options": ["x", "y"], "answer": "x",
     "explanation": "x first"},
    {"id": 4, "type": "truefalse", "question": "Four", "answer": "خطأ"}
]"#;

#[tokio::test(start_paused = true)]
async fn timed_quiz_runs_to_auto_submit() {
    let settings = QuizSettingsDraft {
        total_seconds: Some(5),
        ..QuizSettingsDraft::default()
    }
    .validate()
    .unwrap();
    let services = QuizServices::in_memory(parse_bank(BANK).unwrap(), settings, fixed_clock());

    let mut session = services.open_session().await.unwrap();
    assert_eq!(session.selected().len(), 4);
    let correct = session.selected()[0].question().correct_answer().to_owned();
    session.record_answer(0, correct).await.unwrap();

    session.start_timer().unwrap();
    let mut submitted = None;
    while let Some(_tick) = session.next_tick().await {
        let report = session.tick().await.unwrap();
        if let Some(record) = report.auto_submitted {
            submitted = Some(record);
        }
    }

    let record = submitted.expect("countdown submits at zero");
    assert_eq!(record.correct_count, 1);
    assert_eq!(record.total_questions, 4);
    assert_eq!(record.score_percent, 25);
    assert_eq!(record.elapsed_seconds, 5);
    assert_eq!(session.status(), SessionStatus::Submitted);
    assert!(!session.has_active_timer());

    let review = session.review();
    assert!(review[0].is_correct);
    assert_eq!(review.iter().filter(|item| item.is_correct).count(), 1);

    let recent = services.history().recent().await.unwrap();
    assert_eq!(recent, vec![record]);
}

#[tokio::test]
async fn shrinking_bank_drops_stale_questions_on_resume() {
    let storage = Storage::in_memory();
    let settings = QuizSettingsDraft::default().validate().unwrap();
    let full = QuizServices::new(
        &storage,
        parse_bank(BANK).unwrap(),
        settings.clone(),
        fixed_clock(),
    );

    let mut session = full.open_session().await.unwrap();
    for position in 0..session.selected().len() {
        let answer = session.selected()[position]
            .question()
            .correct_answer()
            .to_owned();
        session.record_answer(position, answer).await.unwrap();
    }
    let kept: Vec<_> = session
        .selected()
        .iter()
        .map(|entry| entry.question().id())
        .filter(|id| id.value() != 2)
        .collect();

    let smaller = parse_bank(
        r#"[
        {"id": 1, "type": "truefalse", "question": "One", "answer": "صح"},
        {"id": 3, "type": "multiple", "question": "Three", "options": ["x", "y"], "answer": "x"},
        {"id": 4, "type": "truefalse", "question": "Four", "answer": "خطأ"}
    ]"#,
    )
    .unwrap();
    let reduced = QuizServices::new(&storage, smaller, settings, fixed_clock());
    let mut resumed = reduced.open_session().await.unwrap();

    let ids: Vec<_> = resumed
        .selected()
        .iter()
        .map(|entry| entry.question().id())
        .collect();
    assert_eq!(ids, kept);
    assert_eq!(resumed.unanswered_count(), 0);

    let record = resumed.submit().await.unwrap();
    assert_eq!(record.score_percent, 100);
    assert_eq!(record.total_questions, 3);
}

#[tokio::test]
async fn resume_with_emptied_bank_entries_starts_fresh() {
    let storage = Storage::in_memory();
    let settings = QuizSettingsDraft::default().validate().unwrap();
    let first = QuizServices::new(
        &storage,
        parse_bank(r#"[{"id": 9, "type": "truefalse", "question": "Nine", "answer": "صح"}]"#)
            .unwrap(),
        settings.clone(),
        fixed_clock(),
    );
    first.open_session().await.unwrap();

    let replaced = QuizServices::new(&storage, parse_bank(BANK).unwrap(), settings, fixed_clock());
    let session = replaced.open_session().await.unwrap();
    assert_eq!(session.selected().len(), 4);
    assert_eq!(session.status(), SessionStatus::NotStarted);
    assert_eq!(replaced.bank().len(), 4);
}
