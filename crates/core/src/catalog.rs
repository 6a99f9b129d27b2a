use thiserror::Error;

use crate::curriculum;
use crate::model::{LessonDefinition, LessonId, Week};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog must contain at least one lesson")]
    Empty,

    #[error("lesson ids must be contiguous from 1: expected {expected}, found {found}")]
    NonContiguous { expected: LessonId, found: LessonId },
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Ordered, read-only curriculum.
///
/// Ids are guaranteed to form the contiguous range `1..=N`, so the lesson
/// after `id` exists exactly when `id < N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    lessons: Vec<LessonDefinition>,
}

impl Catalog {
    /// Builds a catalog from lessons listed in course order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` for an empty list and
    /// `CatalogError::NonContiguous` when ids are not exactly `1..=N`.
    pub fn new(lessons: Vec<LessonDefinition>) -> Result<Self, CatalogError> {
        if lessons.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (index, lesson) in lessons.iter().enumerate() {
            let expected = u32::try_from(index + 1)
                .map(LessonId::new)
                .map_err(|_| CatalogError::NonContiguous {
                    expected: LessonId::new(u32::MAX),
                    found: lesson.id,
                })?;
            if lesson.id != expected {
                return Err(CatalogError::NonContiguous {
                    expected,
                    found: lesson.id,
                });
            }
        }

        Ok(Self { lessons })
    }

    /// The shipped fourteen-lesson prompt-engineering course.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            lessons: curriculum::lessons(),
        }
    }

    #[must_use]
    pub fn lessons(&self) -> &[LessonDefinition] {
        &self.lessons
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
    pub fn get(&self, id: LessonId) -> Option<&LessonDefinition> {
        let index = usize::try_from(id.value()).ok()?.checked_sub(1)?;
        self.lessons.get(index)
    }

    #[must_use]
    pub fn contains(&self, id: LessonId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn last_id(&self) -> LessonId {
        self.lessons
            .last()
            .map_or(LessonId::FIRST, |lesson| lesson.id)
    }

    /// The lesson that follows `id`, or `None` for the last lesson.
    #[must_use]
    pub fn next_after(&self, id: LessonId) -> Option<LessonId> {
        id.next().filter(|next| self.contains(*next))
    }

    pub fn week(&self, week: Week) -> impl Iterator<Item = &LessonDefinition> {
        self.lessons.iter().filter(move |lesson| lesson.week == week)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: u32) -> LessonDefinition {
        LessonDefinition::new(LessonId::new(id), Week::One, "t", "th", "ex", "task", "gc")
    }

    #[test]
    fn rejects_empty_catalog() {
        assert_eq!(Catalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);
    }

    #[test]
    fn rejects_gaps_and_wrong_start() {
        let err = Catalog::new(vec![lesson(1), lesson(3)]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::NonContiguous {
                expected: LessonId::new(2),
                found: LessonId::new(3)
            }
        );

        let err = Catalog::new(vec![lesson(2)]).unwrap_err();
        assert!(matches!(err, CatalogError::NonContiguous { .. }));
    }

    #[test]
    fn next_after_respects_the_catalog_end() {
        let catalog = Catalog::new(vec![lesson(1), lesson(2)]).unwrap();
        assert_eq!(catalog.next_after(LessonId::new(1)), Some(LessonId::new(2)));
        assert_eq!(catalog.next_after(LessonId::new(2)), None);
        assert_eq!(catalog.last_id(), LessonId::new(2));
    }

    #[test]
    fn get_handles_out_of_range_ids() {
        let catalog = Catalog::new(vec![lesson(1)]).unwrap();
        assert!(catalog.get(LessonId::new(0)).is_none());
        assert!(catalog.get(LessonId::new(2)).is_none());
        assert_eq!(catalog.get(LessonId::new(1)).unwrap().id, LessonId::new(1));
    }

    #[test]
    fn builtin_course_is_valid_and_split_in_two_weeks() {
        let builtin = Catalog::builtin();
        let rebuilt = Catalog::new(builtin.lessons().to_vec()).unwrap();
        assert_eq!(rebuilt.len(), 14);
        assert_eq!(builtin.week(Week::One).count(), 7);
        assert_eq!(builtin.week(Week::Two).count(), 7);
        assert_eq!(builtin.last_id(), LessonId::new(14));
    }
}
