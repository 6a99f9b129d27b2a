//! Decode boundary for the AI mentor's answers.
//!
//! Whatever the mentor returns is converted here into typed values; malformed
//! grading output becomes a failed grade, never an error.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{LessonDefinition, LessonId, Week};
use crate::progression::Completion;

/// Id given to generated practice tasks. They never enter the progress store.
pub const PRACTICE_LESSON_ID: LessonId = LessonId::new(999);

pub const MAX_SCORE: u32 = 100;

const PARSE_FAILURE_FEEDBACK: &str = "Error parsing AI response. Please try again.";
const TRANSPORT_FAILURE_FEEDBACK: &str =
    "Failed to connect to the AI Mentor. Please check your connection or API key and try again.";

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

/// Everything the mentor needs to judge one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingRequest {
    pub lesson_title: String,
    pub task: String,
    pub grading_criteria: String,
    pub submission: String,
}

impl GradingRequest {
    #[must_use]
    pub fn for_lesson(lesson: &LessonDefinition, submission: impl Into<String>) -> Self {
        Self {
            lesson_title: lesson.title.clone(),
            task: lesson.task.clone(),
            grading_criteria: lesson.grading_criteria.clone(),
            submission: submission.into(),
        }
    }
}

/// The mentor's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingResult {
    pub passed: bool,
    pub feedback: String,
    pub score: u32,
}

impl GradingResult {
    #[must_use]
    pub fn new(passed: bool, feedback: impl Into<String>, score: u32) -> Self {
        Self {
            passed,
            feedback: feedback.into(),
            score: score.min(MAX_SCORE),
        }
    }

    /// Result reported when the mentor could not be reached.
    #[must_use]
    pub fn transport_failure() -> Self {
        Self::new(false, TRANSPORT_FAILURE_FEEDBACK, 0)
    }

    /// Result reported when the mentor answered with something unreadable.
    #[must_use]
    pub fn parse_failure() -> Self {
        Self::new(false, PARSE_FAILURE_FEEDBACK, 0)
    }

    /// Reads the mentor's JSON verdict.
    ///
    /// `passed` must be a boolean and `feedback` a string, otherwise the
    /// result is [`GradingResult::parse_failure`]. A missing or non-integer
    /// `score` reads as 0; scores are clamped to 0–100.
    #[must_use]
    pub fn from_model_output(text: &str) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(strip_code_fence(text))
        else {
            return Self::parse_failure();
        };

        let (Some(passed), Some(feedback)) = (
            fields.get("passed").and_then(Value::as_bool),
            fields.get("feedback").and_then(Value::as_str),
        ) else {
            return Self::parse_failure();
        };

        let score = fields
            .get("score")
            .and_then(Value::as_i64)
            .map_or(0, |raw| raw.clamp(0, i64::from(MAX_SCORE)));

        Self::new(passed, feedback, u32::try_from(score).unwrap_or(0))
    }

    /// Artifacts to record for a passed submission.
    #[must_use]
    pub fn completion(&self, submission: impl Into<String>) -> Completion {
        Completion::new(self.score, self.feedback.clone(), submission)
    }
}

//
// ─── GENERATED TASKS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeneratedTaskError {
    #[error("generated task is not a JSON object: {0}")]
    NotAnObject(String),
}

impl LessonDefinition {
    /// Reads a generated practice task, filling missing fields with
    /// placeholders.
    ///
    /// # Errors
    ///
    /// Returns `GeneratedTaskError::NotAnObject` when the text is not a JSON
    /// object at all.
    pub fn from_generated(text: &str) -> Result<Self, GeneratedTaskError> {
        let value: Value = serde_json::from_str(strip_code_fence(text))
            .map_err(|err| GeneratedTaskError::NotAnObject(err.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(GeneratedTaskError::NotAnObject("expected an object".into()));
        };

        Ok(LessonDefinition::new(
            PRACTICE_LESSON_ID,
            Week::Two,
            text_or(&fields, "title", "Daily Challenge"),
            text_or(&fields, "theory", "Practice your skills."),
            text_or(&fields, "example", "No example provided."),
            text_or(&fields, "task", "Complete the prompt."),
            text_or(&fields, "gradingCriteria", "Standard criteria."),
        ))
    }
}

fn text_or(fields: &Map<String, Value>, key: &str, fallback: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Models sometimes wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
