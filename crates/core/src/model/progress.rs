use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::model::ids::LessonId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural problems detected in a progress store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressInvariantError {
    #[error("more than one lesson is active: {0:?}")]
    MultipleActive(Vec<LessonId>),

    #[error("lesson {0} is not part of the catalog")]
    UnknownLesson(LessonId),
}

//
// ─── LESSON STATUS ─────────────────────────────────────────────────────────────
//

/// Lifecycle of a single lesson: `Locked -> Active -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    Locked,
    Active,
    Completed,
}

impl LessonStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Locked => "locked",
            LessonStatus::Active => "active",
            LessonStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Progress record for one lesson.
///
/// Grading artifacts (`score`, `feedback`, `submission`) are only carried by
/// completed lessons. Absent fields are omitted from the JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    status: LessonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feedback: Option<String>,
    #[serde(
        default,
        rename = "userSubmission",
        skip_serializing_if = "Option::is_none"
    )]
    submission: Option<String>,
}

impl LessonProgress {
    #[must_use]
    pub fn locked() -> Self {
        Self::bare(LessonStatus::Locked)
    }

    #[must_use]
    pub fn active() -> Self {
        Self::bare(LessonStatus::Active)
    }

    #[must_use]
    pub fn completed(
        score: u32,
        feedback: impl Into<String>,
        submission: impl Into<String>,
    ) -> Self {
        Self {
            status: LessonStatus::Completed,
            score: Some(score),
            feedback: Some(feedback.into()),
            submission: Some(submission.into()),
        }
    }

    fn bare(status: LessonStatus) -> Self {
        Self {
            status,
            score: None,
            feedback: None,
            submission: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> LessonStatus {
        self.status
    }

    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    #[must_use]
    pub fn submission(&self) -> Option<&str> {
        self.submission.as_deref()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.status == LessonStatus::Locked
    }
}

//
// ─── PROGRESS STORE ────────────────────────────────────────────────────────────
//

/// Progress of every lesson, keyed by lesson id.
///
/// Serialized transparently as a JSON object whose keys are the decimal ids,
/// e.g. `{"1":{"status":"completed",...},"2":{"status":"active"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressStore {
    lessons: BTreeMap<LessonId, LessonProgress>,
}

impl ProgressStore {
    /// Fresh store for a catalog: lesson 1 active, everything else locked.
    #[must_use]
    pub fn initial(catalog: &Catalog) -> Self {
        let lessons = catalog
            .lessons()
            .iter()
            .map(|lesson| {
                let progress = if lesson.id == LessonId::FIRST {
                    LessonProgress::active()
                } else {
                    LessonProgress::locked()
                };
                (lesson.id, progress)
            })
            .collect();
        Self { lessons }
    }

    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (LessonId, LessonProgress)>) -> Self {
        Self {
            lessons: entries.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: LessonId) -> Option<&LessonProgress> {
        self.lessons.get(&id)
    }

    /// Status of a lesson; ids without an entry read as locked.
    #[must_use]
    pub fn status_of(&self, id: LessonId) -> LessonStatus {
        self.lessons
            .get(&id)
            .map_or(LessonStatus::Locked, LessonProgress::status)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (LessonId, &LessonProgress)> {
        self.lessons.iter().map(|(id, progress)| (*id, progress))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.count_with(LessonStatus::Active)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.count_with(LessonStatus::Completed)
    }

    fn count_with(&self, status: LessonStatus) -> usize {
        self.lessons
            .values()
            .filter(|progress| progress.status == status)
            .count()
    }

    /// Check the store against the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ProgressInvariantError` when an entry is not in the catalog or
    /// when more than one lesson is active.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ProgressInvariantError> {
        if let Some(unknown) = self.lessons.keys().find(|id| !catalog.contains(**id)) {
            return Err(ProgressInvariantError::UnknownLesson(*unknown));
        }

        let active: Vec<LessonId> = self
            .iter()
            .filter(|(_, progress)| progress.status == LessonStatus::Active)
            .map(|(id, _)| id)
            .collect();
        if active.len() > 1 {
            return Err(ProgressInvariantError::MultipleActive(active));
        }
        Ok(())
    }

    pub(crate) fn set(&mut self, id: LessonId, progress: LessonProgress) {
        self.lessons.insert(id, progress);
    }
}
