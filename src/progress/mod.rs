//! Per-user completion records at content, chapter and module granularity.
//!
//! The three levels are deliberately separate types: content tracks partial
//! watch time, chapters and modules are binary. All three share the same
//! absorbing `Completed` state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Lifecycle of a progress row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentProgress {
    pub user_id: String,
    pub content_id: String,
    /// Seconds, clamped to `[0, duration]`. May move backwards between reports.
    pub watch_time: f64,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ContentProgress {
    pub fn new(user_id: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            content_id: content_id.into(),
            watch_time: 0.0,
            is_completed: false,
            completed_at: None,
        }
    }

    /// Apply a clamped observation. Completion is sticky: once set, neither
    /// `is_completed` nor `completed_at` change again.
    pub fn observe(&mut self, watch_time: f64, reached_threshold: bool, now: DateTime<Utc>) {
        self.watch_time = watch_time;
        if reached_threshold && !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(now);
        }
    }

    pub fn state(&self) -> ProgressState {
        if self.is_completed {
            ProgressState::Completed
        } else {
            ProgressState::InProgress
        }
    }
}

impl Record for ContentProgress {
    const COLLECTION: &'static str = "content_progress";

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn entity_id(&self) -> &str {
        &self.content_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterProgress {
    pub user_id: String,
    pub chapter_id: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChapterProgress {
    pub fn completed(user_id: impl Into<String>, chapter_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            chapter_id: chapter_id.into(),
            is_completed: true,
            completed_at: Some(Utc::now()),
        }
    }
}

impl Record for ChapterProgress {
    const COLLECTION: &'static str = "chapter_progress";

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn entity_id(&self) -> &str {
        &self.chapter_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub user_id: String,
    pub module_id: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ModuleProgress {
    pub fn completed(user_id: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            module_id: module_id.into(),
            is_completed: true,
            completed_at: Some(Utc::now()),
        }
    }
}

impl Record for ModuleProgress {
    const COLLECTION: &'static str = "module_progress";

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn entity_id(&self) -> &str {
        &self.module_id
    }
}

/// State of an optional content row; a missing row means nothing was watched.
pub fn content_state(progress: Option<&ContentProgress>) -> ProgressState {
    progress.map_or(ProgressState::NotStarted, ContentProgress::state)
}

/// State of a binary (chapter or module) row.
pub fn binary_state(is_completed: Option<bool>) -> ProgressState {
    match is_completed {
        Some(true) => ProgressState::Completed,
        _ => ProgressState::NotStarted,
    }
}
