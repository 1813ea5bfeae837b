use formation_progress::{OutboxStore, ProgressState, QuizStatus};

use crate::support::{engine, quiz_answers, scenario_catalog};

#[test]
fn two_chapter_module_completes_once_after_the_quiz() {
    let engine = engine(scenario_catalog());

    engine.record_watch_time("u", "a1", 60.0).unwrap();
    engine.record_watch_time("u", "a2", 114.0).unwrap();
    assert!(engine.chapter_progress("u", "c1").unwrap().unwrap().is_completed);
    assert!(engine.module_progress("u", "m").unwrap().is_none());

    engine.record_watch_time("u", "b1", 100.0).unwrap();
    assert!(engine.chapter_progress("u", "c2").unwrap().is_none());
    assert!(engine.module_progress("u", "m").unwrap().is_none());
    assert!(engine.store().peek_outbox().unwrap().is_empty());

    let result = engine.submit_quiz("u", "q2", quiz_answers(4)).unwrap();
    assert_eq!(result.score, 80);
    assert!(result.passed);
    assert!(result.chapter_completed);
    assert!(engine.chapter_progress("u", "c2").unwrap().unwrap().is_completed);
    assert!(engine.module_progress("u", "m").unwrap().unwrap().is_completed);

    let outbox = engine.store().peek_outbox().unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].key, "module-completed:u:m");
    assert_eq!(outbox[0].event_type, "ModuleCompleted");

    // re-evaluation of a completed module is a no-op
    assert!(engine.reevaluate_module("u", "m").unwrap());
    assert!(engine.reevaluate_chapter("u", "c2").unwrap());
    engine.record_watch_time("u", "b1", 100.0).unwrap();
    assert_eq!(engine.store().peek_outbox().unwrap().len(), 1);
}

#[test]
fn overview_reports_badges_along_the_way() {
    let engine = engine(scenario_catalog());
    engine.record_watch_time("u", "a1", 60.0).unwrap();
    engine.record_watch_time("u", "a2", 30.0).unwrap();

    let overview = engine.progress_overview("u").unwrap();
    assert_eq!(overview.len(), 1);
    let module = &overview[0];
    assert!(module.unlocked);
    assert_eq!(module.state, ProgressState::NotStarted);

    let c1 = &module.chapters[0];
    assert_eq!(c1.contents[0].state, ProgressState::Completed);
    assert_eq!(c1.contents[1].state, ProgressState::InProgress);
    assert_eq!(c1.contents[1].progress_percent, 25);
    assert!(c1.contents[1].unlocked);
    assert!(c1.quiz.is_none());

    let c2 = &module.chapters[1];
    assert!(!c2.contents[0].unlocked);
    assert_eq!(c2.contents[0].state, ProgressState::NotStarted);
    let quiz = c2.quiz.as_ref().unwrap();
    assert!(!quiz.unlocked);
    assert_eq!(quiz.status, QuizStatus::NotAttempted);
    assert_eq!(quiz.passing_score, 70);
}
