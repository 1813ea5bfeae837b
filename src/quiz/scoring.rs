//! Strict scoring of an answer sheet against a quiz.

use super::{AnswerSheet, QuestionOutcome};
use crate::hierarchy::Quiz;

/// Outcome of scoring, before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    pub score: u8,
    pub passed: bool,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub per_question: Vec<QuestionOutcome>,
}

/// Validate and score `answers`.
///
/// Every question must be answered, no unknown question ids are allowed,
/// and each answer must have the question's shape (a choice index within
/// the options, or a boolean). Comparison is exact: no coercion between
/// answer kinds. A quiz without questions scores 100.
pub fn score_submission(quiz: &Quiz, answers: &AnswerSheet) -> Result<Scored, String> {
    if let Some(unknown) = answers.keys().find(|id| quiz.question(id).is_none()) {
        return Err(format!("unknown question id {}", unknown));
    }

    let mut per_question = Vec::with_capacity(quiz.questions.len());
    for question in &quiz.questions {
        let submitted = answers
            .get(&question.id)
            .copied()
            .ok_or_else(|| format!("missing answer for question {}", question.id))?;
        if !question.accepts(&submitted) {
            return Err(format!(
                "answer {} does not fit question {}",
                submitted, question.id
            ));
        }
        per_question.push(QuestionOutcome {
            question_id: question.id.clone(),
            submitted,
            correct_answer: question.correct_answer,
            correct: submitted == question.correct_answer,
            explanation: question.explanation.clone(),
        });
    }

    let total_questions = per_question.len();
    let correct_answers = per_question.iter().filter(|o| o.correct).count();
    let score = if total_questions == 0 {
        100
    } else {
        ((100 * correct_answers) as f64 / total_questions as f64).round() as u8
    };

    Ok(Scored {
        score,
        passed: score >= quiz.passing_score,
        correct_answers,
        total_questions,
        per_question,
    })
}
