use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Answer, AnswerSheet};
use crate::store::Record;

/// Latest attempt of a user at a quiz. Immutable once `passed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub user_id: String,
    pub quiz_id: String,
    pub score: u8,
    pub answers: AnswerSheet,
    pub passed: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Record for QuizResult {
    const COLLECTION: &'static str = "quiz_result";

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn entity_id(&self) -> &str {
        &self.quiz_id
    }
}

/// Per-question feedback, returned to the submitter only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub submitted: Answer,
    pub correct_answer: Answer,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Response to a quiz submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmitResult {
    pub quiz_id: String,
    pub score: u8,
    pub passed: bool,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub per_question: Vec<QuestionOutcome>,
    /// Whether the pass completed the quiz's chapter.
    pub chapter_completed: bool,
}
