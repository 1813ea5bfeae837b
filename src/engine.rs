//! ProgressEngine - the entry points the web layer calls.
//!
//! Every mutation takes the per-user lock, runs inside one [`UnitOfWork`]
//! and commits atomically; an error anywhere drops the unit of work and
//! nothing is written. Notifications staged by the commit are delivered
//! afterwards, best-effort, when a publisher is attached.
//!
//! ```
//! use formation_progress::engine::ProgressEngine;
//! use formation_progress::hierarchy::{Chapter, Content, InMemoryCatalog, Module};
//! use formation_progress::store::InMemoryProgressStore;
//!
//! let mut catalog = InMemoryCatalog::new();
//! catalog.insert_module(Module::new("m1", 1)).unwrap();
//! catalog.insert_chapter(Chapter::new("ch1", "m1", 1)).unwrap();
//! catalog.insert_content(Content::new("intro", "ch1", 1, 120)).unwrap();
//!
//! let engine = ProgressEngine::new(InMemoryProgressStore::new(), catalog);
//! let outcome = engine.record_watch_time("user-1", "intro", 118.0).unwrap();
//! assert!(outcome.progress.is_completed);
//! assert!(engine.is_module_unlocked("user-1", "m1").unwrap());
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::completion::{progress_percent, CompletionEngine, WatchTimeOutcome};
use crate::config::{ConfigError, EngineConfig};
use crate::error::ProgressError;
use crate::hierarchy::HierarchyStore;
use crate::lock::{InMemoryLockManager, LockManager};
use crate::outbox::{DrainResult, OutboxPublisher, OutboxStore, OutboxWorker};
use crate::progress::{
    binary_state, content_state, ChapterProgress, ContentProgress, ModuleProgress, ProgressState,
};
use crate::quiz::{AnswerSheet, QuizEngine, QuizResult, QuizSubmitResult};
use crate::store::{ProgressStore, UnitOfWork};
use crate::unlock::UnlockResolver;

type Notifier = Mutex<OutboxWorker<Box<dyn OutboxPublisher>>>;

pub struct ProgressEngine<S, H, L = InMemoryLockManager> {
    store: S,
    hierarchy: H,
    locks: L,
    config: EngineConfig,
    notifier: Option<Notifier>,
}

impl<S, H> ProgressEngine<S, H>
where
    S: ProgressStore + OutboxStore,
    H: HierarchyStore,
{
    pub fn new(store: S, hierarchy: H) -> Self {
        Self {
            store,
            hierarchy,
            locks: InMemoryLockManager::new(),
            config: EngineConfig::default(),
            notifier: None,
        }
    }

    /// Rejects a config that fails [`EngineConfig::validate`].
    pub fn with_config(store: S, hierarchy: H, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(store, hierarchy)
        })
    }
}

impl<S, H, L> ProgressEngine<S, H, L>
where
    S: ProgressStore + OutboxStore,
    H: HierarchyStore,
    L: LockManager,
{
    /// Swap the per-user lock manager, e.g. for a distributed one.
    pub fn with_lock_manager<M: LockManager>(self, locks: M) -> ProgressEngine<S, H, M> {
        ProgressEngine {
            store: self.store,
            hierarchy: self.hierarchy,
            locks,
            config: self.config,
            notifier: self.notifier,
        }
    }

    /// Deliver staged notifications right after each commit.
    pub fn with_notifications<P: OutboxPublisher + 'static>(mut self, publisher: P) -> Self {
        let publisher: Box<dyn OutboxPublisher> = Box::new(publisher);
        self.notifier = Some(Mutex::new(OutboxWorker::from_config(
            publisher,
            &self.config.outbox,
        )));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn record_watch_time(
        &self,
        user_id: &str,
        content_id: &str,
        observed_secs: f64,
    ) -> Result<WatchTimeOutcome, ProgressError> {
        self.mutate(user_id, |uow| {
            self.completion()
                .record_watch_time(uow, user_id, content_id, observed_secs, Utc::now())
        })
    }

    pub fn submit_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
        answers: AnswerSheet,
    ) -> Result<QuizSubmitResult, ProgressError> {
        self.mutate(user_id, |uow| {
            QuizEngine::new(&self.hierarchy, self.completion())
                .require_unlocked(self.config.quiz.require_unlocked)
                .submit(uow, user_id, quiz_id, answers, Utc::now())
        })
    }

    pub fn reevaluate_chapter(&self, user_id: &str, chapter_id: &str) -> Result<bool, ProgressError> {
        self.mutate(user_id, |uow| {
            self.completion()
                .reevaluate_chapter(uow, user_id, chapter_id, Utc::now())
        })
    }

    pub fn reevaluate_module(&self, user_id: &str, module_id: &str) -> Result<bool, ProgressError> {
        self.mutate(user_id, |uow| {
            self.completion()
                .reevaluate_module(uow, user_id, module_id, Utc::now())
        })
    }

    pub fn is_content_unlocked(&self, user_id: &str, content_id: &str) -> Result<bool, ProgressError> {
        self.resolver()
            .is_content_unlocked(&self.reader(), user_id, content_id)
    }

    pub fn is_chapter_quiz_unlocked(
        &self,
        user_id: &str,
        chapter_id: &str,
    ) -> Result<bool, ProgressError> {
        self.resolver()
            .is_chapter_quiz_unlocked(&self.reader(), user_id, chapter_id)
    }

    pub fn is_module_unlocked(&self, user_id: &str, module_id: &str) -> Result<bool, ProgressError> {
        self.resolver()
            .is_module_unlocked(&self.reader(), user_id, module_id)
    }

    // Record lookups fail with `NotFound` for ids outside the active catalog,
    // the same as the unlock checks.

    pub fn content_progress(
        &self,
        user_id: &str,
        content_id: &str,
    ) -> Result<Option<ContentProgress>, ProgressError> {
        self.hierarchy.content(content_id)?;
        Ok(self.reader().get(user_id, content_id)?)
    }

    pub fn chapter_progress(
        &self,
        user_id: &str,
        chapter_id: &str,
    ) -> Result<Option<ChapterProgress>, ProgressError> {
        self.hierarchy.chapter(chapter_id)?;
        Ok(self.reader().get(user_id, chapter_id)?)
    }

    pub fn module_progress(
        &self,
        user_id: &str,
        module_id: &str,
    ) -> Result<Option<ModuleProgress>, ProgressError> {
        self.hierarchy.module_with_children(module_id)?;
        Ok(self.reader().get(user_id, module_id)?)
    }

    pub fn quiz_result(&self, user_id: &str, quiz_id: &str) -> Result<Option<QuizResult>, ProgressError> {
        self.hierarchy.quiz(quiz_id)?;
        Ok(self.reader().get(user_id, quiz_id)?)
    }

    /// Unlock and completion badges for the whole active catalog.
    pub fn progress_overview(&self, user_id: &str) -> Result<Vec<ModuleOverview>, ProgressError> {
        let reader = self.reader();
        let resolver = self.resolver();

        let contents: HashMap<String, ContentProgress> = reader
            .for_user::<ContentProgress>(user_id)?
            .into_iter()
            .map(|p| (p.content_id.clone(), p))
            .collect();

        // one pass over the linear chain instead of a lookup per content
        let mut content_unlocked = HashMap::new();
        let mut previous_done = true;
        for content in self.hierarchy.list_active_contents_in_order()? {
            let done = contents.get(&content.id).is_some_and(|p| p.is_completed);
            content_unlocked.insert(content.id, previous_done);
            previous_done = done;
        }

        let mut modules = Vec::new();
        for module in self.hierarchy.list_active_modules_in_order()? {
            let tree = self.hierarchy.module_with_children(&module.id)?;
            let mut chapters = Vec::with_capacity(tree.chapters.len());
            for chapter in &tree.chapters {
                let chapter_tree = self.hierarchy.chapter_with_children(&chapter.id)?;
                let content_rows: Vec<ContentOverview> = chapter_tree
                    .contents
                    .iter()
                    .map(|content| {
                        let progress = contents.get(&content.id);
                        let watch_time = progress.map_or(0.0, |p| p.watch_time);
                        ContentOverview {
                            content_id: content.id.clone(),
                            order: content.order,
                            duration_secs: content.duration_secs,
                            unlocked: content_unlocked.get(&content.id).copied().unwrap_or(false),
                            state: content_state(progress),
                            watch_time,
                            progress_percent: progress_percent(watch_time, content.duration_secs),
                        }
                    })
                    .collect();
                let quiz_unlocked = content_rows.iter().all(|c| c.state == ProgressState::Completed);
                let quiz = match &chapter_tree.quiz {
                    Some(quiz) => {
                        let status = match reader.get::<QuizResult>(user_id, &quiz.id)? {
                            None => QuizStatus::NotAttempted,
                            Some(result) if result.passed => QuizStatus::Passed { score: result.score },
                            Some(result) => QuizStatus::Failed { score: result.score },
                        };
                        Some(QuizOverview {
                            quiz_id: quiz.id.clone(),
                            passing_score: quiz.passing_score,
                            unlocked: quiz_unlocked,
                            status,
                        })
                    }
                    None => None,
                };
                let completed = reader
                    .get::<ChapterProgress>(user_id, &chapter.id)?
                    .map(|p| p.is_completed);
                chapters.push(ChapterOverview {
                    chapter_id: chapter.id.clone(),
                    order: chapter.order,
                    state: binary_state(completed),
                    contents: content_rows,
                    quiz,
                });
            }

            let completed = reader
                .get::<ModuleProgress>(user_id, &module.id)?
                .map(|p| p.is_completed);
            modules.push(ModuleOverview {
                unlocked: resolver.is_module_unlocked(&reader, user_id, &module.id)?,
                module_id: module.id,
                order: module.order,
                state: binary_state(completed),
                chapters,
            });
        }

        tracing::debug!(user_id, modules = modules.len(), "progress overview built");
        Ok(modules)
    }

    /// Deliver pending notifications through the attached publisher.
    /// Returns `None` when no publisher is attached.
    pub fn dispatch_notifications(&self) -> Option<DrainResult> {
        let notifier = self.notifier.as_ref()?;
        // a publisher panic mid-drain leaves claimed rows leased; the worker
        // itself is still usable
        let mut worker = notifier.lock().unwrap_or_else(PoisonError::into_inner);
        match worker.drain(&self.store) {
            Ok(result) => Some(result),
            Err(error) => {
                tracing::warn!(%error, "notification dispatch failed, events stay pending");
                None
            }
        }
    }

    fn mutate<T, F>(&self, user_id: &str, operation: F) -> Result<T, ProgressError>
    where
        F: FnOnce(&mut UnitOfWork<'_, S>) -> Result<T, ProgressError>,
    {
        let guard = self.locks.acquire(&format!("user:{}", user_id))?;
        let mut uow = UnitOfWork::new(&self.store);
        let value = operation(&mut uow)?;
        let staged_events = uow.staged_outbox().len();
        uow.commit()?;
        drop(guard);

        if staged_events > 0 {
            self.dispatch_notifications();
        }
        Ok(value)
    }

    fn reader(&self) -> UnitOfWork<'_, S> {
        UnitOfWork::new(&self.store)
    }

    fn resolver(&self) -> UnlockResolver<'_, H> {
        UnlockResolver::new(&self.hierarchy)
    }

    fn completion(&self) -> CompletionEngine<'_, H> {
        CompletionEngine::new(&self.hierarchy, self.config.completion.threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOverview {
    pub module_id: String,
    pub order: u32,
    pub unlocked: bool,
    pub state: ProgressState,
    pub chapters: Vec<ChapterOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterOverview {
    pub chapter_id: String,
    pub order: u32,
    pub state: ProgressState,
    pub contents: Vec<ContentOverview>,
    pub quiz: Option<QuizOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentOverview {
    pub content_id: String,
    pub order: u32,
    pub duration_secs: u32,
    pub unlocked: bool,
    pub state: ProgressState,
    pub watch_time: f64,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOverview {
    pub quiz_id: String,
    pub passing_score: u8,
    pub unlocked: bool,
    pub status: QuizStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuizStatus {
    NotAttempted,
    Failed { score: u8 },
    Passed { score: u8 },
}
