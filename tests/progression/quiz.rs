use formation_progress::{Answer, AnswerSheet, EngineConfig, ProgressEngine, ProgressError};
use formation_progress::InMemoryProgressStore;

use crate::support::{engine, quiz_answers, scenario_catalog};

#[test]
fn scores_round_to_the_nearest_percent() {
    let engine = engine(scenario_catalog());
    let result = engine.submit_quiz("u1", "q2", quiz_answers(3)).unwrap();
    assert_eq!(result.score, 60);
    assert_eq!(result.correct_answers, 3);
    assert_eq!(result.total_questions, 5);
    assert!(!result.passed);

    let t2 = result
        .per_question
        .iter()
        .find(|o| o.question_id == "t2")
        .unwrap();
    assert!(!t2.correct);
    assert_eq!(t2.correct_answer, Answer::Boolean(false));
    assert_eq!(t2.explanation.as_deref(), Some("it is false"));
}

#[test]
fn failing_attempts_are_replaced_by_the_latest() {
    let engine = engine(scenario_catalog());
    engine.submit_quiz("u1", "q2", quiz_answers(1)).unwrap();
    engine.submit_quiz("u1", "q2", quiz_answers(3)).unwrap();

    let stored = engine.quiz_result("u1", "q2").unwrap().unwrap();
    assert_eq!(stored.score, 60);
    assert_eq!(stored.answers, quiz_answers(3));
}

#[test]
fn passed_quiz_cannot_be_resubmitted() {
    let engine = engine(scenario_catalog());
    let passed = engine.submit_quiz("u1", "q2", quiz_answers(5)).unwrap();
    assert!(passed.passed);
    let before = engine.quiz_result("u1", "q2").unwrap().unwrap();

    let err = engine.submit_quiz("u1", "q2", quiz_answers(0)).unwrap_err();
    assert_eq!(err.status_code(), 409);
    match err {
        ProgressError::AlreadyPassed { result } => assert_eq!(*result, before),
        other => panic!("expected AlreadyPassed, got {:?}", other),
    }
    assert_eq!(engine.quiz_result("u1", "q2").unwrap().unwrap(), before);
}

#[test]
fn malformed_answer_sheets_are_rejected_without_a_write() {
    let engine = engine(scenario_catalog());

    let mut missing = quiz_answers(5);
    missing.remove("mc2");
    let mut unknown = quiz_answers(5);
    unknown.insert("zz".into(), Answer::Boolean(true));
    let mut wrong_kind = quiz_answers(5);
    wrong_kind.insert("t1".into(), Answer::Choice(1));
    let mut out_of_range = quiz_answers(5);
    out_of_range.insert("mc2".into(), Answer::Choice(2));

    for sheet in [missing, unknown, wrong_kind, out_of_range, AnswerSheet::new()] {
        let err = engine.submit_quiz("u1", "q2", sheet).unwrap_err();
        assert!(matches!(err, ProgressError::InvalidInput(_)), "{:?}", err);
    }
    assert!(engine.quiz_result("u1", "q2").unwrap().is_none());
}

#[test]
fn string_answers_do_not_deserialize() {
    let parsed: Result<AnswerSheet, _> = serde_json::from_str(r#"{"t1": "true", "mc1": "2"}"#);
    assert!(parsed.is_err());
}

#[test]
fn unknown_quiz_is_not_found() {
    let engine = engine(scenario_catalog());
    let err = engine.submit_quiz("u1", "nope", AnswerSheet::new()).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn gate_can_require_finished_contents() {
    let config = EngineConfig::from_toml_str("[quiz]\nrequire_unlocked = true").unwrap();
    let engine =
        ProgressEngine::with_config(InMemoryProgressStore::new(), scenario_catalog(), config).unwrap();

    assert!(!engine.is_chapter_quiz_unlocked("u1", "c2").unwrap());
    let err = engine.submit_quiz("u1", "q2", quiz_answers(5)).unwrap_err();
    assert_eq!(
        err,
        ProgressError::QuizLocked {
            chapter_id: "c2".into()
        }
    );

    for (content, secs) in [("a1", 60.0), ("a2", 120.0), ("b1", 100.0)] {
        engine.record_watch_time("u1", content, secs).unwrap();
    }
    assert!(engine.is_chapter_quiz_unlocked("u1", "c2").unwrap());
    assert!(engine.submit_quiz("u1", "q2", quiz_answers(5)).unwrap().passed);
}
