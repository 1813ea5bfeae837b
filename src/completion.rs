//! Completion Engine - watch-time completion and the content → chapter →
//! module cascade.
//!
//! Every operation works on a caller-owned [`UnitOfWork`]: the cascade stages
//! its writes (and the one-time `ModuleCompleted` outbox message) next to the
//! triggering write, and nothing is persisted unless the whole chain succeeds.
//! Each level decides completion with its own pure predicate over child
//! states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;
use crate::hierarchy::{ChapterTree, HierarchyStore};
use crate::outbox::Notification;
use crate::progress::{ChapterProgress, ContentProgress, ModuleProgress};
use crate::quiz::QuizResult;
use crate::store::{ProgressStore, StoreError, UnitOfWork};
use crate::unlock::{all_contents_completed, UnlockResolver};

/// Absorbs float noise in `watch_time / duration` right at the threshold.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Inclusive threshold test on a clamped watch time.
pub fn reaches_threshold(watch_time: f64, duration_secs: u32, threshold: f64) -> bool {
    duration_secs > 0 && watch_time >= threshold * f64::from(duration_secs) - THRESHOLD_EPSILON
}

/// `round(100 * watch_time / duration)`, 0 for a zero duration.
pub fn progress_percent(watch_time: f64, duration_secs: u32) -> u8 {
    if duration_secs == 0 {
        return 0;
    }
    (100.0 * watch_time / f64::from(duration_secs))
        .round()
        .clamp(0.0, 100.0) as u8
}

pub fn contents_completed(contents: impl IntoIterator<Item = bool>) -> bool {
    contents.into_iter().all(|done| done)
}

/// `quiz_passed` is `None` for a chapter without a quiz.
pub fn chapter_completed(contents_done: bool, quiz_passed: Option<bool>) -> bool {
    contents_done && quiz_passed.unwrap_or(true)
}

pub fn module_completed(chapters: impl IntoIterator<Item = bool>) -> bool {
    chapters.into_iter().all(|done| done)
}

/// Result of a watch-time report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchTimeOutcome {
    pub progress: ContentProgress,
    pub progress_percent: u8,
}

pub struct CompletionEngine<'a, H: ?Sized> {
    hierarchy: &'a H,
    threshold: f64,
}

impl<'a, H: HierarchyStore + ?Sized> CompletionEngine<'a, H> {
    pub fn new(hierarchy: &'a H, threshold: f64) -> Self {
        Self {
            hierarchy,
            threshold,
        }
    }

    pub fn record_watch_time<S: ProgressStore>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        user_id: &str,
        content_id: &str,
        observed_secs: f64,
        now: DateTime<Utc>,
    ) -> Result<WatchTimeOutcome, ProgressError> {
        if !observed_secs.is_finite() || observed_secs < 0.0 {
            return Err(ProgressError::InvalidInput(format!(
                "watch time must be a finite, non-negative number of seconds, got {}",
                observed_secs
            )));
        }

        let content = self.hierarchy.content(content_id)?;
        if !UnlockResolver::new(self.hierarchy).is_content_unlocked(uow, user_id, content_id)? {
            return Err(ProgressError::Locked {
                content_id: content_id.to_string(),
            });
        }

        let watch_time = observed_secs.min(f64::from(content.duration_secs));
        let reached = reaches_threshold(watch_time, content.duration_secs, self.threshold);

        let mut progress = uow
            .get::<ContentProgress>(user_id, content_id)?
            .unwrap_or_else(|| ContentProgress::new(user_id, content_id));
        let was_completed = progress.is_completed;
        progress.observe(watch_time, reached, now);
        uow.upsert(&progress)?;

        if progress.is_completed {
            if !was_completed {
                tracing::info!(user_id, content_id, watch_time, "content completed");
            }
            self.reevaluate_chapter(uow, user_id, &content.chapter_id, now)?;
        }

        Ok(WatchTimeOutcome {
            progress_percent: progress_percent(watch_time, content.duration_secs),
            progress,
        })
    }

    /// Complete the chapter if its contents are done and its quiz (if any) is
    /// passed, then cascade into the module. Returns whether the chapter is
    /// completed.
    pub fn reevaluate_chapter<S: ProgressStore>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        user_id: &str,
        chapter_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ProgressError> {
        let tree = self.hierarchy.chapter_with_children(chapter_id)?;

        let already = uow
            .get::<ChapterProgress>(user_id, chapter_id)?
            .is_some_and(|p| p.is_completed);
        if !already && !self.settle_chapter(uow, user_id, &tree, now)? {
            return Ok(false);
        }

        self.reevaluate_module(uow, user_id, &tree.chapter.module_id, now)?;
        Ok(true)
    }

    /// Complete the module once every active chapter is completed. Only the
    /// transition stages a `ModuleCompleted` notification.
    pub fn reevaluate_module<S: ProgressStore>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        user_id: &str,
        module_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ProgressError> {
        let tree = self.hierarchy.module_with_children(module_id)?;

        if uow
            .get::<ModuleProgress>(user_id, module_id)?
            .is_some_and(|p| p.is_completed)
        {
            return Ok(true);
        }

        // A chapter with nothing left to watch never gets a cascade of its
        // own, so rows missing here are settled on the spot.
        let mut chapters = Vec::with_capacity(tree.chapters.len());
        for chapter in &tree.chapters {
            let done = match uow.get::<ChapterProgress>(user_id, &chapter.id)? {
                Some(progress) if progress.is_completed => true,
                _ => {
                    let chapter_tree = self.hierarchy.chapter_with_children(&chapter.id)?;
                    self.settle_chapter(uow, user_id, &chapter_tree, now)?
                }
            };
            chapters.push(done);
        }
        tracing::debug!(user_id, module_id, ?chapters, "module evaluated");
        if !module_completed(chapters) {
            return Ok(false);
        }

        uow.upsert(&ModuleProgress {
            user_id: user_id.to_string(),
            module_id: module_id.to_string(),
            is_completed: true,
            completed_at: Some(now),
        })?;
        let message = Notification::module_completed(user_id, module_id, now)
            .to_message()
            .map_err(|e| StoreError::Serde(e.to_string()))?;
        uow.enqueue(message);
        tracing::info!(user_id, module_id, "module completed");
        Ok(true)
    }

    /// Stage a completed `ChapterProgress` when the chapter qualifies. Does
    /// not cascade.
    fn settle_chapter<S: ProgressStore>(
        &self,
        uow: &mut UnitOfWork<'_, S>,
        user_id: &str,
        tree: &ChapterTree,
        now: DateTime<Utc>,
    ) -> Result<bool, ProgressError> {
        let chapter_id = tree.chapter.id.as_str();
        let contents_done = all_contents_completed(uow, user_id, &tree.contents)?;
        let quiz_passed = match &tree.quiz {
            Some(quiz) => Some(
                uow.get::<QuizResult>(user_id, &quiz.id)?
                    .is_some_and(|r| r.passed),
            ),
            None => None,
        };
        tracing::debug!(user_id, chapter_id, contents_done, ?quiz_passed, "chapter evaluated");
        if !chapter_completed(contents_done, quiz_passed) {
            return Ok(false);
        }

        uow.upsert(&ChapterProgress {
            user_id: user_id.to_string(),
            chapter_id: chapter_id.to_string(),
            is_completed: true,
            completed_at: Some(now),
        })?;
        tracing::info!(user_id, chapter_id, "chapter completed");
        Ok(true)
    }
}
