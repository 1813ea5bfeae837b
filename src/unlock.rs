//! Unlock Resolver - answers "may this user access X yet?".
//!
//! Every check is a pure read over a [`UnitOfWork`], so the same code answers
//! both standalone queries and the gates evaluated inside a mutation (where
//! staged writes must already count). A user with no progress rows simply
//! has nothing completed.

use crate::error::ProgressError;
use crate::hierarchy::{Content, EntityKind, HierarchyStore};
use crate::progress::{ContentProgress, ModuleProgress};
use crate::store::{ProgressStore, UnitOfWork};

pub struct UnlockResolver<'a, H: ?Sized> {
    hierarchy: &'a H,
}

impl<'a, H: HierarchyStore + ?Sized> UnlockResolver<'a, H> {
    pub fn new(hierarchy: &'a H) -> Self {
        Self { hierarchy }
    }

    /// Strict linear chain over the whole active catalog: the first content
    /// is always open, every other one needs its predecessor completed.
    pub fn is_content_unlocked<S: ProgressStore>(
        &self,
        uow: &UnitOfWork<'_, S>,
        user_id: &str,
        content_id: &str,
    ) -> Result<bool, ProgressError> {
        let sequence = self.hierarchy.list_active_contents_in_order()?;
        let index = sequence
            .iter()
            .position(|c| c.id == content_id)
            .ok_or_else(|| ProgressError::not_found(EntityKind::Content, content_id))?;

        let unlocked = match index.checked_sub(1) {
            None => true,
            Some(previous) => content_completed(uow, user_id, &sequence[previous].id)?,
        };
        tracing::debug!(user_id, content_id, unlocked, "content unlock check");
        Ok(unlocked)
    }

    /// The quiz opens once every active content of its chapter is completed.
    pub fn is_chapter_quiz_unlocked<S: ProgressStore>(
        &self,
        uow: &UnitOfWork<'_, S>,
        user_id: &str,
        chapter_id: &str,
    ) -> Result<bool, ProgressError> {
        let tree = self.hierarchy.chapter_with_children(chapter_id)?;
        all_contents_completed(uow, user_id, &tree.contents)
    }

    /// Module chain, independent of the content chain.
    pub fn is_module_unlocked<S: ProgressStore>(
        &self,
        uow: &UnitOfWork<'_, S>,
        user_id: &str,
        module_id: &str,
    ) -> Result<bool, ProgressError> {
        let modules = self.hierarchy.list_active_modules_in_order()?;
        let index = modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or_else(|| ProgressError::not_found(EntityKind::Module, module_id))?;

        match index.checked_sub(1) {
            None => Ok(true),
            Some(previous) => Ok(uow
                .get::<ModuleProgress>(user_id, &modules[previous].id)?
                .is_some_and(|p| p.is_completed)),
        }
    }
}

pub(crate) fn content_completed<S: ProgressStore>(
    uow: &UnitOfWork<'_, S>,
    user_id: &str,
    content_id: &str,
) -> Result<bool, ProgressError> {
    Ok(uow
        .get::<ContentProgress>(user_id, content_id)?
        .is_some_and(|p| p.is_completed))
}

/// Vacuously true for a chapter without active contents.
pub(crate) fn all_contents_completed<S: ProgressStore>(
    uow: &UnitOfWork<'_, S>,
    user_id: &str,
    contents: &[Content],
) -> Result<bool, ProgressError> {
    for content in contents {
        if !content_completed(uow, user_id, &content.id)? {
            return Ok(false);
        }
    }
    Ok(true)
}
