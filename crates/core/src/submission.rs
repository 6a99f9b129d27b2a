use std::collections::HashMap;

use crate::model::LessonId;

/// Handle for one in-flight grading request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTicket {
    lesson_id: LessonId,
    seq: u64,
}

impl SubmissionTicket {
    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Orders grading requests so a late answer to an older submission cannot
/// overwrite the result of a newer one.
///
/// Each dispatch gets a sequence number from a monotonic counter; only the
/// latest ticket per lesson is current.
#[derive(Debug, Clone, Default)]
pub struct SubmissionTracker {
    next_seq: u64,
    latest: HashMap<LessonId, u64>,
}

impl SubmissionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, lesson_id: LessonId) -> SubmissionTicket {
        self.next_seq += 1;
        self.latest.insert(lesson_id, self.next_seq);
        SubmissionTicket {
            lesson_id,
            seq: self.next_seq,
        }
    }

    #[must_use]
    pub fn is_current(&self, ticket: SubmissionTicket) -> bool {
        self.latest.get(&ticket.lesson_id) == Some(&ticket.seq)
    }

    /// Consumes a ticket. Returns `false` if it was superseded or already
    /// settled; its response should then be discarded.
    pub fn settle(&mut self, ticket: SubmissionTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.latest.remove(&ticket.lesson_id);
        true
    }

    /// Invalidate every outstanding ticket. Sequence numbers keep increasing,
    /// so old tickets never match a later dispatch.
    pub fn cancel_all(&mut self) {
        self.latest.clear();
    }
}
