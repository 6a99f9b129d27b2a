use thiserror::Error;

use crate::catalog::Catalog;
use crate::model::{LessonId, LessonProgress, LessonStatus, ProgressStore};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("lesson {0} is not part of the catalog")]
    UnknownLesson(LessonId),
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Grading artifacts recorded when a lesson is passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub score: u32,
    pub feedback: String,
    pub submission: String,
}

impl Completion {
    #[must_use]
    pub fn new(score: u32, feedback: impl Into<String>, submission: impl Into<String>) -> Self {
        Self {
            score,
            feedback: feedback.into(),
            submission: submission.into(),
        }
    }
}

//
// ─── PROGRESSION ───────────────────────────────────────────────────────────────
//

/// Unlock state machine over a catalog.
///
/// Every mutation of a [`ProgressStore`] goes through [`Progression::record_completion`],
/// which takes the store by value and hands back the next one. Persisting the
/// result is left to the caller.
///
/// ```
/// # use course_core::catalog::Catalog;
/// # use course_core::model::{LessonId, LessonStatus, ProgressStore};
/// # use course_core::progression::{Completion, Progression};
/// let catalog = Catalog::builtin();
/// let progression = Progression::new(&catalog);
/// let store = ProgressStore::initial(&catalog);
///
/// let store = progression
///     .record_completion(store, LessonId::new(1), Completion::new(90, "good", "x"))?;
/// assert_eq!(store.status_of(LessonId::new(2)), LessonStatus::Active);
/// # Ok::<(), course_core::progression::ProgressionError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Progression<'a> {
    catalog: &'a Catalog,
}

impl<'a> Progression<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Marks `lesson_id` completed and unlocks the following lesson if it is
    /// still locked.
    ///
    /// Replaying the same completion overwrites the recorded artifacts. The
    /// next lesson is never demoted, and completing the last lesson has no
    /// side effect beyond the lesson itself.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::UnknownLesson` if `lesson_id` is not in the
    /// catalog. The store is dropped unchanged in that case, so callers that
    /// need it should check [`Catalog::contains`] first.
    pub fn record_completion(
        &self,
        mut store: ProgressStore,
        lesson_id: LessonId,
        completion: Completion,
    ) -> Result<ProgressStore, ProgressionError> {
        if !self.catalog.contains(lesson_id) {
            return Err(ProgressionError::UnknownLesson(lesson_id));
        }

        store.set(
            lesson_id,
            LessonProgress::completed(completion.score, completion.feedback, completion.submission),
        );

        if let Some(next) = self.catalog.next_after(lesson_id) {
            if store.status_of(next) == LessonStatus::Locked {
                store.set(next, LessonProgress::active());
            }
        }

        Ok(store)
    }

    /// Whether navigation to the lesson may proceed.
    #[must_use]
    pub fn is_selectable(&self, store: &ProgressStore, lesson_id: LessonId) -> bool {
        store.status_of(lesson_id) != LessonStatus::Locked
    }

    /// Highest lesson that is not locked; the place to resume after loading.
    #[must_use]
    pub fn resume_target(&self, store: &ProgressStore) -> LessonId {
        store
            .iter()
            .rev()
            .find(|(_, progress)| !progress.is_locked())
            .map_or(LessonId::FIRST, |(id, _)| id)
    }

    /// Whether the final lesson of the course has been completed.
    #[must_use]
    pub fn is_finished(&self, store: &ProgressStore) -> bool {
        store.status_of(self.catalog.last_id()) == LessonStatus::Completed
    }
}
