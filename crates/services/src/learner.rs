use std::sync::Arc;

use tracing::{debug, info, warn};

use course_core::Clock;
use course_core::access::{View, ViewDecision, ViewGate};
use course_core::catalog::Catalog;
use course_core::grading::{GradingRequest, GradingResult};
use course_core::model::{Entitlement, LessonId, LessonStatus, ProgressStore};
use course_core::progression::Progression;
use course_core::submission::{SubmissionTicket, SubmissionTracker};
use course_core::sync;
use storage::repository::{SlotRepository, StateSlot, StorageError};

use crate::error::LearnerError;
use crate::mentor::Mentor;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Effect of recording a passed lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// The lesson that became active, if any.
    pub unlocked: Option<LessonId>,
    /// Whether the whole course is now complete.
    pub finished: bool,
}

/// A submission waiting for the mentor's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub ticket: SubmissionTicket,
    pub request: GradingRequest,
}

impl PendingSubmission {
    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.ticket.lesson_id()
    }
}

/// What happened to a graded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A newer submission for the same lesson was dispatched; this verdict
    /// was discarded.
    Stale,
    Failed(GradingResult),
    Passed {
        result: GradingResult,
        unlocked: Option<LessonId>,
        finished: bool,
    },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Live learner state with write-through persistence.
///
/// The session exclusively owns the progress store and entitlement. Every
/// event (grading verdict, purchase, import) is applied through `&mut self`,
/// so transitions never overlap.
pub struct LearnerSession {
    catalog: Arc<Catalog>,
    slots: Arc<dyn SlotRepository>,
    clock: Clock,
    progress: ProgressStore,
    entitlement: Entitlement,
    tracker: SubmissionTracker,
}

impl LearnerSession {
    /// Hydrate the session from durable storage.
    ///
    /// Never fails: a missing, unreadable or corrupt progress snapshot falls
    /// back to the initial store, and the entitlement defaults to free.
    pub async fn load(catalog: Arc<Catalog>, slots: Arc<dyn SlotRepository>, clock: Clock) -> Self {
        let progress = match read_slot(slots.as_ref(), StateSlot::Progress).await {
            Some(raw) => parse_progress(&raw, &catalog),
            None => None,
        }
        .unwrap_or_else(|| ProgressStore::initial(&catalog));

        let entitlement = Entitlement::from_persisted(
            read_slot(slots.as_ref(), StateSlot::Entitlement)
                .await
                .as_deref(),
        );

        debug!(
            completed = progress.completed_count(),
            premium = entitlement.is_premium(),
            "learner state loaded"
        );

        Self {
            catalog,
            slots,
            clock,
            progress,
            entitlement,
            tracker: SubmissionTracker::new(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    #[must_use]
    pub fn entitlement(&self) -> Entitlement {
        self.entitlement
    }

    fn progression(&self) -> Progression<'_> {
        Progression::new(&self.catalog)
    }

    /// Lesson to open after loading or importing.
    #[must_use]
    pub fn resume_target(&self) -> LessonId {
        self.progression().resume_target(&self.progress)
    }

    #[must_use]
    pub fn is_selectable(&self, lesson_id: LessonId) -> bool {
        self.progression().is_selectable(&self.progress, lesson_id)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progression().is_finished(&self.progress)
    }

    /// Classify a navigation request.
    #[must_use]
    pub fn view(&self, view: View) -> ViewDecision {
        ViewGate::new(&self.catalog).resolve(view, &self.progress, self.entitlement)
    }

    //
    // ─── COMPLETION ────────────────────────────────────────────────────────────
    //

    /// Record a grading verdict for a lesson.
    ///
    /// Failed verdicts leave the store untouched and return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::UnknownLesson` for ids outside the catalog, or
    /// `LearnerError::Storage` if the snapshot cannot be written. In the
    /// latter case the in-memory transition has already been applied.
    pub async fn complete_lesson(
        &mut self,
        lesson_id: LessonId,
        result: &GradingResult,
        submission: &str,
    ) -> Result<Option<CompletionOutcome>, LearnerError> {
        if !self.catalog.contains(lesson_id) {
            return Err(LearnerError::UnknownLesson(lesson_id));
        }
        if !result.passed {
            return Ok(None);
        }

        let next = self.catalog.next_after(lesson_id);
        let next_was_locked =
            next.is_some_and(|id| self.progress.status_of(id) == LessonStatus::Locked);

        let updated = self.progression().record_completion(
            self.progress.clone(),
            lesson_id,
            result.completion(submission),
        )?;
        self.progress = updated;

        let outcome = CompletionOutcome {
            unlocked: next.filter(|_| next_was_locked),
            finished: self.is_finished(),
        };
        debug!(
            lesson = %lesson_id,
            score = result.score,
            unlocked = ?outcome.unlocked,
            "lesson completed"
        );

        self.persist_progress().await?;
        Ok(Some(outcome))
    }

    /// Validate a submission and issue a ticket for the grading request.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::EmptySubmission` for blank text,
    /// `LearnerError::UnknownLesson`, `LearnerError::LessonLocked` or
    /// `LearnerError::PremiumRequired` when the lesson cannot be attempted.
    pub fn begin_submission(
        &mut self,
        lesson_id: LessonId,
        text: &str,
    ) -> Result<PendingSubmission, LearnerError> {
        if text.trim().is_empty() {
            return Err(LearnerError::EmptySubmission);
        }

        match self.view(View::Lesson(lesson_id)) {
            ViewDecision::Show(_) => {}
            ViewDecision::Locked(_) => return Err(LearnerError::LessonLocked(lesson_id)),
            ViewDecision::Paywall(_) => return Err(LearnerError::PremiumRequired(lesson_id)),
            ViewDecision::NotFound(_) => return Err(LearnerError::UnknownLesson(lesson_id)),
        }

        let lesson = self
            .catalog
            .get(lesson_id)
            .ok_or(LearnerError::UnknownLesson(lesson_id))?;
        let request = GradingRequest::for_lesson(lesson, text);
        let ticket = self.tracker.dispatch(lesson_id);
        debug!(lesson = %lesson_id, seq = ticket.seq(), "submission dispatched");

        Ok(PendingSubmission { ticket, request })
    }

    /// Apply the mentor's verdict for a pending submission.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::Storage` if a passed lesson cannot be persisted.
    pub async fn finish_submission(
        &mut self,
        pending: PendingSubmission,
        result: GradingResult,
    ) -> Result<SubmissionOutcome, LearnerError> {
        let lesson_id = pending.lesson_id();
        if !self.tracker.settle(pending.ticket) {
            debug!(lesson = %lesson_id, seq = pending.ticket.seq(), "stale verdict discarded");
            return Ok(SubmissionOutcome::Stale);
        }
        if !result.passed {
            return Ok(SubmissionOutcome::Failed(result));
        }

        let outcome = self
            .complete_lesson(lesson_id, &result, &pending.request.submission)
            .await?
            .unwrap_or(CompletionOutcome {
                unlocked: None,
                finished: self.is_finished(),
            });

        Ok(SubmissionOutcome::Passed {
            result,
            unlocked: outcome.unlocked,
            finished: outcome.finished,
        })
    }

    /// Submit text for grading and apply the verdict.
    ///
    /// # Errors
    ///
    /// See [`LearnerSession::begin_submission`] and
    /// [`LearnerSession::finish_submission`].
    pub async fn submit(
        &mut self,
        mentor: &dyn Mentor,
        lesson_id: LessonId,
        text: &str,
    ) -> Result<SubmissionOutcome, LearnerError> {
        let pending = self.begin_submission(lesson_id, text)?;
        let result = mentor.grade(&pending.request).await;
        self.finish_submission(pending, result).await
    }

    //
    // ─── ENTITLEMENT ───────────────────────────────────────────────────────────
    //

    /// Apply a successful purchase. Returns `true` if premium was newly granted.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::Storage` if the flag cannot be written.
    pub async fn grant_premium(&mut self) -> Result<bool, LearnerError> {
        if !self.entitlement.grant() {
            return Ok(false);
        }
        info!("premium access granted");
        self.persist_entitlement().await?;
        Ok(true)
    }

    //
    // ─── SYNC ──────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn export_code(&self) -> String {
        sync::encode(&self.progress, self.entitlement.is_premium())
    }

    /// Replace all local state with the contents of a sync code.
    ///
    /// Returns the lesson to resume at. Pending grading requests are dropped,
    /// so verdicts for the old state are discarded as stale. Both slots are
    /// written before the session adopts the new state.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::InvalidSyncCode` without touching any state when
    /// the code is rejected, or `LearnerError::Storage` if the new state cannot
    /// be written. On a storage error the session keeps its previous state and
    /// the progress slot is rolled back.
    pub async fn import_code(&mut self, code: &str) -> Result<LessonId, LearnerError> {
        let payload = sync::decode(code).map_err(LearnerError::InvalidSyncCode)?;
        if let Err(err) = payload.progress.validate(&self.catalog) {
            warn!(error = %err, "imported progress does not match the catalog");
        }
        let (progress, entitlement) = payload.into_parts();

        let previous = snapshot(&self.progress)?;
        let imported = snapshot(&progress)?;
        let now = self.clock.now();
        self.slots.write(StateSlot::Progress, &imported, now).await?;
        if let Err(err) = self
            .slots
            .write(StateSlot::Entitlement, entitlement.as_persisted(), now)
            .await
        {
            if let Err(rollback) = self.slots.write(StateSlot::Progress, &previous, now).await {
                warn!(error = %rollback, "failed to restore progress after a partial import");
            }
            return Err(err.into());
        }

        self.progress = progress;
        self.entitlement = entitlement;
        self.tracker.cancel_all();
        info!(
            completed = self.progress.completed_count(),
            premium = self.entitlement.is_premium(),
            "progress imported"
        );
        Ok(self.resume_target())
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────────
    //

    async fn persist_progress(&self) -> Result<(), StorageError> {
        let json = snapshot(&self.progress)?;
        self.slots
            .write(StateSlot::Progress, &json, self.clock.now())
            .await
    }

    async fn persist_entitlement(&self) -> Result<(), StorageError> {
        self.slots
            .write(
                StateSlot::Entitlement,
                self.entitlement.as_persisted(),
                self.clock.now(),
            )
            .await
    }
}

fn snapshot(progress: &ProgressStore) -> Result<String, StorageError> {
    serde_json::to_string(progress).map_err(|err| StorageError::Serialization(err.to_string()))
}

async fn read_slot(slots: &dyn SlotRepository, slot: StateSlot) -> Option<String> {
    match slots.read(slot).await {
        Ok(record) => record.map(|record| record.value),
        Err(err) => {
            warn!(%slot, error = %err, "failed to read slot, using defaults");
            None
        }
    }
}

fn parse_progress(raw: &str, catalog: &Catalog) -> Option<ProgressStore> {
    let store = match serde_json::from_str::<ProgressStore>(raw) {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "stored progress is unreadable, starting fresh");
            return None;
        }
    };
    if store.is_empty() {
        warn!("stored progress is empty, starting fresh");
        return None;
    }
    if let Err(err) = store.validate(catalog) {
        warn!(error = %err, "stored progress does not match the catalog");
    }
    Some(store)
}
