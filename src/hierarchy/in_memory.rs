//! InMemoryCatalog - HashMap-backed hierarchy for tests, fixtures and small deployments.

use std::collections::{HashMap, HashSet};

use super::{
    Chapter, ChapterTree, Content, EntityKind, HierarchyError, HierarchyStore, Module, ModuleTree,
    Quiz,
};
use crate::hierarchy::QuestionKind;

/// In-memory catalog, validated on insert.
///
/// Parents must be inserted before their children. Activation flags can be
/// toggled later, which is how the admin layer retires a node without
/// deleting it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    modules: HashMap<String, Module>,
    chapters: HashMap<String, Chapter>,
    contents: HashMap<String, Content>,
    quizzes: HashMap<String, Quiz>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_module(&mut self, module: Module) -> Result<(), HierarchyError> {
        if module.order == 0 {
            return Err(HierarchyError::invalid(
                EntityKind::Module,
                &module.id,
                "order must be at least 1",
            ));
        }
        if self
            .modules
            .values()
            .any(|m| m.id != module.id && m.order == module.order)
        {
            return Err(HierarchyError::invalid(
                EntityKind::Module,
                &module.id,
                format!("order {} already taken", module.order),
            ));
        }
        self.modules.insert(module.id.clone(), module);
        Ok(())
    }

    pub fn insert_chapter(&mut self, chapter: Chapter) -> Result<(), HierarchyError> {
        if !self.modules.contains_key(&chapter.module_id) {
            return Err(HierarchyError::invalid(
                EntityKind::Chapter,
                &chapter.id,
                format!("unknown module {}", chapter.module_id),
            ));
        }
        if self.chapters.values().any(|c| {
            c.id != chapter.id && c.module_id == chapter.module_id && c.order == chapter.order
        }) {
            return Err(HierarchyError::invalid(
                EntityKind::Chapter,
                &chapter.id,
                format!("order {} already taken in module {}", chapter.order, chapter.module_id),
            ));
        }
        self.chapters.insert(chapter.id.clone(), chapter);
        Ok(())
    }

    pub fn insert_content(&mut self, content: Content) -> Result<(), HierarchyError> {
        if !self.chapters.contains_key(&content.chapter_id) {
            return Err(HierarchyError::invalid(
                EntityKind::Content,
                &content.id,
                format!("unknown chapter {}", content.chapter_id),
            ));
        }
        if content.duration_secs == 0 {
            return Err(HierarchyError::invalid(
                EntityKind::Content,
                &content.id,
                "duration must be positive",
            ));
        }
        self.contents.insert(content.id.clone(), content);
        Ok(())
    }

    pub fn insert_quiz(&mut self, quiz: Quiz) -> Result<(), HierarchyError> {
        if !self.chapters.contains_key(&quiz.chapter_id) {
            return Err(HierarchyError::invalid(
                EntityKind::Quiz,
                &quiz.id,
                format!("unknown chapter {}", quiz.chapter_id),
            ));
        }
        if self
            .quizzes
            .values()
            .any(|q| q.id != quiz.id && q.chapter_id == quiz.chapter_id)
        {
            return Err(HierarchyError::invalid(
                EntityKind::Quiz,
                &quiz.id,
                format!("chapter {} already has a quiz", quiz.chapter_id),
            ));
        }
        if quiz.passing_score > 100 {
            return Err(HierarchyError::invalid(
                EntityKind::Quiz,
                &quiz.id,
                "passing score must be within 0-100",
            ));
        }

        let mut seen = HashSet::new();
        for question in &quiz.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(HierarchyError::invalid(
                    EntityKind::Quiz,
                    &quiz.id,
                    format!("duplicate question id {}", question.id),
                ));
            }
            if let QuestionKind::MultipleChoice { options } = &question.kind {
                if options.len() < 2 {
                    return Err(HierarchyError::invalid(
                        EntityKind::Quiz,
                        &quiz.id,
                        format!("question {} needs at least two options", question.id),
                    ));
                }
            }
            if !question.accepts(&question.correct_answer) {
                return Err(HierarchyError::invalid(
                    EntityKind::Quiz,
                    &quiz.id,
                    format!("question {} has an unusable correct answer", question.id),
                ));
            }
        }

        self.quizzes.insert(quiz.id.clone(), quiz);
        Ok(())
    }

    pub fn set_module_active(&mut self, id: &str, active: bool) -> Result<(), HierarchyError> {
        let module = self
            .modules
            .get_mut(id)
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Module, id))?;
        module.is_active = active;
        Ok(())
    }

    pub fn set_chapter_active(&mut self, id: &str, active: bool) -> Result<(), HierarchyError> {
        let chapter = self
            .chapters
            .get_mut(id)
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Chapter, id))?;
        chapter.is_active = active;
        Ok(())
    }

    pub fn set_content_active(&mut self, id: &str, active: bool) -> Result<(), HierarchyError> {
        let content = self
            .contents
            .get_mut(id)
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Content, id))?;
        content.is_active = active;
        Ok(())
    }

    fn active_module(&self, id: &str) -> Option<&Module> {
        self.modules.get(id).filter(|m| m.is_active)
    }

    fn active_chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters
            .get(id)
            .filter(|c| c.is_active && self.active_module(&c.module_id).is_some())
    }

    fn active_content(&self, id: &str) -> Option<&Content> {
        self.contents
            .get(id)
            .filter(|c| c.is_active && self.active_chapter(&c.chapter_id).is_some())
    }

    fn sorted_modules(&self) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self.modules.values().filter(|m| m.is_active).collect();
        modules.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        modules
    }

    fn sorted_chapters(&self, module_id: &str) -> Vec<&Chapter> {
        let mut chapters: Vec<&Chapter> = self
            .chapters
            .values()
            .filter(|c| c.is_active && c.module_id == module_id)
            .collect();
        chapters.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        chapters
    }

    fn sorted_contents(&self, chapter_id: &str) -> Vec<&Content> {
        let mut contents: Vec<&Content> = self
            .contents
            .values()
            .filter(|c| c.is_active && c.chapter_id == chapter_id)
            .collect();
        contents.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        contents
    }
}

impl HierarchyStore for InMemoryCatalog {
    fn list_active_contents_in_order(&self) -> Result<Vec<Content>, HierarchyError> {
        let mut sequence = Vec::new();
        for module in self.sorted_modules() {
            for chapter in self.sorted_chapters(&module.id) {
                sequence.extend(self.sorted_contents(&chapter.id).into_iter().cloned());
            }
        }
        Ok(sequence)
    }

    fn list_active_modules_in_order(&self) -> Result<Vec<Module>, HierarchyError> {
        Ok(self.sorted_modules().into_iter().cloned().collect())
    }

    fn chapter_with_children(&self, chapter_id: &str) -> Result<ChapterTree, HierarchyError> {
        let chapter = self
            .active_chapter(chapter_id)
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Chapter, chapter_id))?;
        let contents = self
            .sorted_contents(chapter_id)
            .into_iter()
            .cloned()
            .collect();
        let quiz = self
            .quizzes
            .values()
            .find(|q| q.chapter_id == chapter_id)
            .cloned();
        Ok(ChapterTree {
            chapter: chapter.clone(),
            contents,
            quiz,
        })
    }

    fn module_with_children(&self, module_id: &str) -> Result<ModuleTree, HierarchyError> {
        let module = self
            .active_module(module_id)
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Module, module_id))?;
        let chapters = self
            .sorted_chapters(module_id)
            .into_iter()
            .cloned()
            .collect();
        Ok(ModuleTree {
            module: module.clone(),
            chapters,
        })
    }

    fn content(&self, content_id: &str) -> Result<Content, HierarchyError> {
        self.active_content(content_id)
            .cloned()
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Content, content_id))
    }

    fn chapter(&self, chapter_id: &str) -> Result<Chapter, HierarchyError> {
        self.active_chapter(chapter_id)
            .cloned()
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Chapter, chapter_id))
    }

    fn quiz(&self, quiz_id: &str) -> Result<Quiz, HierarchyError> {
        self.quizzes
            .get(quiz_id)
            .filter(|q| self.active_chapter(&q.chapter_id).is_some())
            .cloned()
            .ok_or_else(|| HierarchyError::not_found(EntityKind::Quiz, quiz_id))
    }
}
