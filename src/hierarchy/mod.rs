//! Hierarchy Store - read-only structural tree of the learning catalog.
//!
//! Modules contain chapters, chapters contain content items and at most one
//! quiz. Every level carries an `order` used for unlock sequencing and an
//! `is_active` flag; a node is only visible to the engine when it and all of
//! its ancestors are active.
//!
//! ## Example
//!
//! ```
//! use formation_progress::hierarchy::{Chapter, Content, HierarchyStore, InMemoryCatalog, Module};
//!
//! let mut catalog = InMemoryCatalog::new();
//! catalog.insert_module(Module::new("m1", 1)).unwrap();
//! catalog.insert_chapter(Chapter::new("c1", "m1", 1)).unwrap();
//! catalog.insert_content(Content::new("v1", "c1", 1, 120)).unwrap();
//!
//! let sequence = catalog.list_active_contents_in_order().unwrap();
//! assert_eq!(sequence[0].id, "v1");
//! ```

mod in_memory;
mod quiz;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use in_memory::InMemoryCatalog;
pub use quiz::{Question, QuestionKind, Quiz};

/// The kinds of structural node a lookup can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Module,
    Chapter,
    Content,
    Quiz,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Module => "module",
            EntityKind::Chapter => "chapter",
            EntityKind::Content => "content",
            EntityKind::Quiz => "quiz",
        };
        f.write_str(name)
    }
}

/// Error type for hierarchy lookups and catalog maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// Absent, inactive, or reachable only through an inactive ancestor.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    /// A record rejected by catalog validation.
    #[error("invalid {kind} {id}: {reason}")]
    Invalid {
        kind: EntityKind,
        id: String,
        reason: String,
    },
    /// Backend failure.
    #[error("hierarchy storage error: {0}")]
    Storage(String),
}

impl HierarchyError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        HierarchyError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn invalid(kind: EntityKind, id: &str, reason: impl Into<String>) -> Self {
        HierarchyError::Invalid {
            kind,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level unit of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub order: u32,
    pub is_active: bool,
}

impl Module {
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub module_id: String,
    pub order: u32,
    pub is_active: bool,
}

impl Chapter {
    pub fn new(id: impl Into<String>, module_id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            module_id: module_id.into(),
            order,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A video or audio item. `duration_secs` is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub chapter_id: String,
    pub order: u32,
    pub duration_secs: u32,
    pub is_active: bool,
}

impl Content {
    pub fn new(
        id: impl Into<String>,
        chapter_id: impl Into<String>,
        order: u32,
        duration_secs: u32,
    ) -> Self {
        Self {
            id: id.into(),
            chapter_id: chapter_id.into(),
            order,
            duration_secs,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A chapter with its active contents (in order) and its quiz, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterTree {
    pub chapter: Chapter,
    pub contents: Vec<Content>,
    pub quiz: Option<Quiz>,
}

/// A module with its active chapters in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTree {
    pub module: Module,
    pub chapters: Vec<Chapter>,
}

/// Read access to the active structural tree, in stable order.
///
/// Implementations never expose inactive nodes: every lookup of an inactive
/// node (or of a node under an inactive ancestor) fails with
/// [`HierarchyError::NotFound`], exactly like a missing id.
pub trait HierarchyStore: Send + Sync {
    /// All active contents ordered by `(module.order, chapter.order, content.order)`.
    /// This is the universal unlock sequence.
    fn list_active_contents_in_order(&self) -> Result<Vec<Content>, HierarchyError>;

    /// All active modules ordered by `order`.
    fn list_active_modules_in_order(&self) -> Result<Vec<Module>, HierarchyError>;

    fn chapter_with_children(&self, chapter_id: &str) -> Result<ChapterTree, HierarchyError>;

    fn module_with_children(&self, module_id: &str) -> Result<ModuleTree, HierarchyError>;

    fn content(&self, content_id: &str) -> Result<Content, HierarchyError>;

    fn chapter(&self, chapter_id: &str) -> Result<Chapter, HierarchyError>;

    fn quiz(&self, quiz_id: &str) -> Result<Quiz, HierarchyError>;
}
