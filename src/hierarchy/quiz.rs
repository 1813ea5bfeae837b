use serde::{Deserialize, Serialize};

use crate::quiz::Answer;

/// What a question expects as an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice { options: Vec<String> },
    TrueFalse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub correct_answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    pub fn multiple_choice<I, S>(id: impl Into<String>, options: I, correct_index: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            kind: QuestionKind::MultipleChoice {
                options: options.into_iter().map(Into::into).collect(),
            },
            correct_answer: Answer::Choice(correct_index),
            explanation: None,
        }
    }

    pub fn true_false(id: impl Into<String>, correct: bool) -> Self {
        Self {
            id: id.into(),
            kind: QuestionKind::TrueFalse,
            correct_answer: Answer::Boolean(correct),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Whether `answer` has the shape this question accepts: a choice index
    /// inside the option list, or a boolean for true/false.
    pub fn accepts(&self, answer: &Answer) -> bool {
        match (&self.kind, answer) {
            (QuestionKind::MultipleChoice { options }, Answer::Choice(index)) => {
                (*index as usize) < options.len()
            }
            (QuestionKind::TrueFalse, Answer::Boolean(_)) => true,
            _ => false,
        }
    }
}

/// The single quiz attached to a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub chapter_id: String,
    /// Minimum score (0-100) for a pass.
    pub passing_score: u8,
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(id: impl Into<String>, chapter_id: impl Into<String>, passing_score: u8) -> Self {
        Self {
            id: id.into(),
            chapter_id: chapter_id.into(),
            passing_score,
            questions: Vec::new(),
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}
