use std::fmt;

use crate::catalog::Catalog;
use crate::model::{Entitlement, LessonId, LessonStatus, ProgressStore};
use crate::progression::Progression;

/// Lessons up to and including this id are free.
pub const FREE_LESSON_LIMIT: u32 = 3;

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// Screens a learner can navigate to.
///
/// Only `Lesson` is backed by the progress store. The practice generator and
/// the prompt library are standalone views gated by entitlement alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Lesson(LessonId),
    InfinitePractice,
    Library,
    Certificate,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Lesson(id) => write!(f, "lesson {id}"),
            View::InfinitePractice => f.write_str("infinite practice"),
            View::Library => f.write_str("prompt library"),
            View::Certificate => f.write_str("certificate"),
        }
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDecision {
    Show(View),
    /// The view exists but needs the premium tier.
    Paywall(View),
    /// The lesson has not been unlocked yet, or the course is unfinished.
    Locked(View),
    NotFound(View),
}

/// How much of the prompt library a learner may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryAccess {
    /// Browse and copy templates.
    Full,
    /// Browse titles and descriptions only.
    Preview,
}

#[must_use]
pub fn library_access(entitlement: Entitlement) -> LibraryAccess {
    if entitlement.is_premium() {
        LibraryAccess::Full
    } else {
        LibraryAccess::Preview
    }
}

/// Whether the lesson sits behind the paywall for this entitlement.
#[must_use]
pub fn requires_premium(lesson_id: LessonId, entitlement: Entitlement) -> bool {
    !entitlement.is_premium() && lesson_id.value() > FREE_LESSON_LIMIT
}

//
// ─── GATE ──────────────────────────────────────────────────────────────────────
//

/// Classifies navigation requests against progress and entitlement.
///
/// The gate never mutates anything; the caller decides how to present a
/// refused view.
#[derive(Debug, Clone, Copy)]
pub struct ViewGate<'a> {
    progression: Progression<'a>,
}

impl<'a> ViewGate<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            progression: Progression::new(catalog),
        }
    }

    #[must_use]
    pub fn resolve(
        &self,
        view: View,
        store: &ProgressStore,
        entitlement: Entitlement,
    ) -> ViewDecision {
        match view {
            View::Lesson(id) => {
                if !self.progression.catalog().contains(id) {
                    ViewDecision::NotFound(view)
                } else if store.status_of(id) == LessonStatus::Locked {
                    ViewDecision::Locked(view)
                } else if requires_premium(id, entitlement) {
                    ViewDecision::Paywall(view)
                } else {
                    ViewDecision::Show(view)
                }
            }
            View::InfinitePractice if !entitlement.is_premium() => ViewDecision::Paywall(view),
            View::InfinitePractice | View::Library => ViewDecision::Show(view),
            View::Certificate => {
                if self.progression.is_finished(store) {
                    ViewDecision::Show(view)
                } else {
                    ViewDecision::Locked(view)
                }
            }
        }
    }
}
