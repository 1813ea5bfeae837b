use chrono::{DateTime, Utc};

use super::{score_submission, AnswerSheet, QuizResult, QuizSubmitResult};
use crate::completion::CompletionEngine;
use crate::error::ProgressError;
use crate::hierarchy::HierarchyStore;
use crate::store::{ProgressStore, UnitOfWork};
use crate::unlock::UnlockResolver;

/// Scores submissions and records results, single pass per user and quiz.
pub struct QuizEngine<'a, H: ?Sized> {
    hierarchy: &'a H,
    completion: CompletionEngine<'a, H>,
    require_unlocked: bool,
}

impl<'a, H: HierarchyStore + ?Sized> QuizEngine<'a, H> {
    pub fn new(hierarchy: &'a H, completion: CompletionEngine<'a, H>) -> Self {
        Self {
            hierarchy,
            completion,
            require_unlocked: false,
        }
    }

    /// Reject submissions while the chapter's contents are unfinished.
    pub fn require_unlocked(mut self, require: bool) -> Self {
        self.require_unlocked = require;
        self
    }

    pub fn submit<S: ProgressStore>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        user_id: &str,
        quiz_id: &str,
        answers: AnswerSheet,
        now: DateTime<Utc>,
    ) -> Result<QuizSubmitResult, ProgressError> {
        let quiz = self.hierarchy.quiz(quiz_id)?;

        if let Some(previous) = uow.get::<QuizResult>(user_id, quiz_id)? {
            if previous.passed {
                return Err(ProgressError::AlreadyPassed {
                    result: Box::new(previous),
                });
            }
        }

        if self.require_unlocked
            && !UnlockResolver::new(self.hierarchy).is_chapter_quiz_unlocked(
                uow,
                user_id,
                &quiz.chapter_id,
            )?
        {
            return Err(ProgressError::QuizLocked {
                chapter_id: quiz.chapter_id,
            });
        }

        let scored = score_submission(&quiz, &answers).map_err(ProgressError::InvalidInput)?;
        uow.upsert(&QuizResult {
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            score: scored.score,
            answers,
            passed: scored.passed,
            submitted_at: now,
        })?;
        tracing::info!(
            user_id,
            quiz_id,
            score = scored.score,
            passed = scored.passed,
            "quiz submitted"
        );

        let chapter_completed = if scored.passed {
            self.completion
                .reevaluate_chapter(uow, user_id, &quiz.chapter_id, now)?
        } else {
            false
        };

        Ok(QuizSubmitResult {
            quiz_id: quiz_id.to_string(),
            score: scored.score,
            passed: scored.passed,
            correct_answers: scored.correct_answers,
            total_questions: scored.total_questions,
            per_question: scored.per_question,
            chapter_completed,
        })
    }
}
