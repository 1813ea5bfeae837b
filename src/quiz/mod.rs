//! Quiz Engine: answers, stored results, scoring and single-pass submission.

mod answer;
mod engine;
mod result;
mod scoring;

pub use answer::{Answer, AnswerSheet};
pub use engine::QuizEngine;
pub use result::{QuestionOutcome, QuizResult, QuizSubmitResult};
pub use scoring::{score_submission, Scored};
