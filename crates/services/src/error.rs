//! Shared error types for the services crate.

use thiserror::Error;

use course_core::grading::GeneratedTaskError;
use course_core::model::LessonId;
use course_core::progression::ProgressionError;
use course_core::sync::DecodeError;
use storage::repository::StorageError;

/// Errors emitted while reading mentor configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid AI base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Errors emitted by the `Mentor` when generating practice tasks.
///
/// Grading never fails; see `Mentor::grade`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MentorError {
    #[error("AI mentor is not configured")]
    Disabled,
    #[error("AI mentor returned an empty response")]
    EmptyResponse,
    #[error("AI mentor request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    GeneratedTask(#[from] GeneratedTaskError),
}

/// Errors emitted by `LearnerSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearnerError {
    #[error("lesson {0} does not exist")]
    UnknownLesson(LessonId),
    #[error("lesson {0} is still locked")]
    LessonLocked(LessonId),
    #[error("lesson {0} requires premium access")]
    PremiumRequired(LessonId),
    #[error("submission is empty")]
    EmptySubmission,
    #[error("invalid sync code")]
    InvalidSyncCode(#[source] DecodeError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
