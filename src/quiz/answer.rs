use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A submitted or correct answer.
///
/// On the wire a choice is a bare integer and a true/false answer a bare
/// boolean. Strings such as `"2"` or `"true"` do not deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Choice(u32),
    Boolean(bool),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Choice(index) => write!(f, "option {}", index),
            Answer::Boolean(value) => write!(f, "{}", value),
        }
    }
}

/// Answers keyed by question id.
pub type AnswerSheet = BTreeMap<String, Answer>;
