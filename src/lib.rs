pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod hierarchy;
#[cfg(feature = "http")]
pub mod http;
pub mod lock;
pub mod outbox;
pub mod progress;
pub mod quiz;
pub mod store;
pub mod unlock;

pub use completion::{CompletionEngine, WatchTimeOutcome};
pub use config::{ConfigError, EngineConfig};
pub use engine::{ChapterOverview, ContentOverview, ModuleOverview, ProgressEngine, QuizOverview, QuizStatus};
pub use error::ProgressError;
pub use hierarchy::{
    Chapter, Content, EntityKind, HierarchyError, HierarchyStore, InMemoryCatalog, Module, Question,
    QuestionKind, Quiz,
};
pub use lock::{InMemoryLockManager, LockError, LockManager};
#[cfg(feature = "emitter")]
pub use outbox::LocalEmitterPublisher;
pub use outbox::{
    DrainResult, LogPublisher, ModuleCompleted, Notification, OutboxPublisher, OutboxStatus,
    OutboxStore, OutboxWorker, PublishError,
};
pub use progress::{ChapterProgress, ContentProgress, ModuleProgress, ProgressState};
pub use quiz::{Answer, AnswerSheet, QuizResult, QuizSubmitResult};
pub use store::{
    CachedProgressStore, InMemoryProgressStore, ProgressStore, RecordsExt, StoreError, UnitOfWork,
};
pub use unlock::UnlockResolver;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
