use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::Catalog;
use course_core::access::{View, ViewDecision};
use course_core::grading::{GradingRequest, GradingResult};
use course_core::model::{Entitlement, LessonDefinition, LessonId, LessonStatus, ProgressStore};
use course_core::sync;
use course_core::time::{fixed_clock, fixed_now};
use services::{LearnerError, LearnerSession, Mentor, MentorError, SubmissionOutcome};
use storage::{InMemoryRepository, SlotRecord, SlotRepository, StateSlot, StorageError};

fn id(value: u32) -> LessonId {
    LessonId::new(value)
}

fn pass(score: u32) -> GradingResult {
    GradingResult::new(true, "Well done", score)
}

fn fail() -> GradingResult {
    GradingResult::new(false, "Missing a role", 20)
}

async fn load(repo: &InMemoryRepository) -> LearnerSession {
    LearnerSession::load(
        Arc::new(Catalog::builtin()),
        Arc::new(repo.clone()),
        fixed_clock(),
    )
    .await
}

async fn stored(repo: &InMemoryRepository, slot: StateSlot) -> Option<String> {
    repo.read(slot).await.unwrap().map(|record| record.value)
}

/// Mentor that answers with a scripted queue of verdicts.
struct ScriptedMentor {
    verdicts: Mutex<VecDeque<GradingResult>>,
    seen: Mutex<Vec<GradingRequest>>,
}

impl ScriptedMentor {
    fn new(verdicts: impl IntoIterator<Item = GradingResult>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn always_pass() -> Self {
        Self::new(std::iter::repeat_n(pass(90), 32))
    }
}

#[async_trait]
impl Mentor for ScriptedMentor {
    async fn grade(&self, request: &GradingRequest) -> GradingResult {
        self.seen.lock().unwrap().push(request.clone());
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(GradingResult::transport_failure)
    }

    async fn generate_task(&self) -> Result<LessonDefinition, MentorError> {
        Err(MentorError::Disabled)
    }
}

/// Backend whose reads always fail.
struct UnreadableRepository;

#[async_trait]
impl SlotRepository for UnreadableRepository {
    async fn read(&self, _slot: StateSlot) -> Result<Option<SlotRecord>, StorageError> {
        Err(StorageError::Connection("disk unavailable".into()))
    }

    async fn write(
        &self,
        _slot: StateSlot,
        _value: &str,
        _at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Backend that accepts everything except entitlement writes.
struct EntitlementWritesFail {
    inner: InMemoryRepository,
}

#[async_trait]
impl SlotRepository for EntitlementWritesFail {
    async fn read(&self, slot: StateSlot) -> Result<Option<SlotRecord>, StorageError> {
        self.inner.read(slot).await
    }

    async fn write(
        &self,
        slot: StateSlot,
        value: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if slot == StateSlot::Entitlement {
            return Err(StorageError::Connection("disk full".into()));
        }
        self.inner.write(slot, value, at).await
    }
}

async fn finish_course(session: &mut LearnerSession, mentor: &ScriptedMentor) {
    session.grant_premium().await.unwrap();
    for n in 1..=14 {
        let outcome = session.submit(mentor, id(n), "Act as a tutor").await.unwrap();
        assert!(matches!(outcome, SubmissionOutcome::Passed { .. }), "lesson {n}");
    }
}

#[tokio::test]
async fn fresh_learner_starts_at_the_first_lesson() {
    let repo = InMemoryRepository::new();
    let session = load(&repo).await;

    assert_eq!(session.resume_target(), id(1));
    assert_eq!(session.progress().status_of(id(1)), LessonStatus::Active);
    assert_eq!(session.progress().status_of(id(2)), LessonStatus::Locked);
    assert_eq!(session.entitlement(), Entitlement::free());
    assert!(!session.is_finished());
    assert_eq!(repo.len().unwrap(), 0);
}

#[tokio::test]
async fn passing_submission_unlocks_next_lesson_and_writes_through() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let mentor = ScriptedMentor::new([pass(88)]);

    let outcome = session
        .submit(&mentor, id(1), "You are a travel agent.")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Passed {
            result: pass(88),
            unlocked: Some(id(2)),
            finished: false,
        }
    );

    let entry = session.progress().get(id(1)).unwrap();
    assert_eq!(entry.status(), LessonStatus::Completed);
    assert_eq!(entry.score(), Some(88));
    assert_eq!(entry.submission(), Some("You are a travel agent."));
    assert_eq!(session.progress().status_of(id(2)), LessonStatus::Active);

    let record = repo.read(StateSlot::Progress).await.unwrap().unwrap();
    assert_eq!(record.updated_at, fixed_now());
    let persisted: ProgressStore = serde_json::from_str(&record.value).unwrap();
    assert_eq!(&persisted, session.progress());

    let reloaded = load(&repo).await;
    assert_eq!(reloaded.progress(), session.progress());
    assert_eq!(reloaded.resume_target(), id(2));
}

#[tokio::test]
async fn grading_request_carries_lesson_context() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let mentor = ScriptedMentor::new([fail()]);

    session.submit(&mentor, id(1), "hello").await.unwrap();

    let seen = mentor.seen.lock().unwrap();
    let lesson = Catalog::builtin().get(id(1)).unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].lesson_title, lesson.title);
    assert_eq!(seen[0].task, lesson.task);
    assert_eq!(seen[0].grading_criteria, lesson.grading_criteria);
    assert_eq!(seen[0].submission, "hello");
}

#[tokio::test]
async fn failed_grade_leaves_progress_untouched() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let before = session.progress().clone();
    let mentor = ScriptedMentor::new([fail()]);

    let outcome = session.submit(&mentor, id(1), "Write a poem").await.unwrap();
    assert_eq!(outcome, SubmissionOutcome::Failed(fail()));
    assert_eq!(session.progress(), &before);
    assert_eq!(stored(&repo, StateSlot::Progress).await, None);
}

#[tokio::test]
async fn unreachable_mentor_reports_a_failed_grade() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let mentor = ScriptedMentor::new([]);

    let outcome = session.submit(&mentor, id(1), "Act as a chef").await.unwrap();
    assert_eq!(
        outcome,
        SubmissionOutcome::Failed(GradingResult::transport_failure())
    );
    assert_eq!(session.progress().status_of(id(1)), LessonStatus::Active);
}

#[tokio::test]
async fn superseded_verdict_is_discarded() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;

    let first = session.begin_submission(id(1), "draft one").unwrap();
    let second = session.begin_submission(id(1), "draft two").unwrap();

    let stale = session.finish_submission(first, pass(99)).await.unwrap();
    assert_eq!(stale, SubmissionOutcome::Stale);
    assert_eq!(session.progress().status_of(id(1)), LessonStatus::Active);

    let applied = session.finish_submission(second, pass(70)).await.unwrap();
    assert!(matches!(applied, SubmissionOutcome::Passed { .. }));
    let entry = session.progress().get(id(1)).unwrap();
    assert_eq!(entry.score(), Some(70));
    assert_eq!(entry.submission(), Some("draft two"));
}

#[tokio::test]
async fn submissions_are_refused_for_blank_locked_or_unknown_lessons() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;

    assert!(matches!(
        session.begin_submission(id(1), "   \n"),
        Err(LearnerError::EmptySubmission)
    ));
    assert!(matches!(
        session.begin_submission(id(2), "text"),
        Err(LearnerError::LessonLocked(lesson)) if lesson == id(2)
    ));
    assert!(matches!(
        session.begin_submission(id(42), "text"),
        Err(LearnerError::UnknownLesson(lesson)) if lesson == id(42)
    ));
}

#[tokio::test]
async fn lessons_past_the_free_tier_need_premium() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let mentor = ScriptedMentor::always_pass();

    for n in 1..=3 {
        session.submit(&mentor, id(n), "Act as a tutor").await.unwrap();
    }
    assert_eq!(session.progress().status_of(id(4)), LessonStatus::Active);
    assert_eq!(
        session.view(View::Lesson(id(4))),
        ViewDecision::Paywall(View::Lesson(id(4)))
    );
    assert!(matches!(
        session.begin_submission(id(4), "text"),
        Err(LearnerError::PremiumRequired(lesson)) if lesson == id(4)
    ));
    assert_eq!(
        session.view(View::InfinitePractice),
        ViewDecision::Paywall(View::InfinitePractice)
    );

    assert!(session.grant_premium().await.unwrap());
    assert!(!session.grant_premium().await.unwrap());
    assert_eq!(
        stored(&repo, StateSlot::Entitlement).await.as_deref(),
        Some("true")
    );
    assert_eq!(
        session.view(View::Lesson(id(4))),
        ViewDecision::Show(View::Lesson(id(4)))
    );
    assert!(session.begin_submission(id(4), "text").is_ok());

    let reloaded = load(&repo).await;
    assert!(reloaded.entitlement().is_premium());
}

#[tokio::test]
async fn completing_every_lesson_finishes_the_course() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let mentor = ScriptedMentor::always_pass();

    assert_eq!(
        session.view(View::Certificate),
        ViewDecision::Locked(View::Certificate)
    );
    finish_course(&mut session, &mentor).await;

    assert!(session.is_finished());
    assert_eq!(session.progress().completed_count(), 14);
    assert_eq!(session.progress().active_count(), 0);
    assert_eq!(session.resume_target(), id(14));
    assert_eq!(
        session.view(View::Certificate),
        ViewDecision::Show(View::Certificate)
    );
}

#[tokio::test]
async fn completed_lessons_can_be_resubmitted() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let mentor = ScriptedMentor::new([pass(60), pass(95)]);

    session.submit(&mentor, id(1), "first try").await.unwrap();
    let outcome = session.submit(&mentor, id(1), "second try").await.unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::Passed {
            result: pass(95),
            unlocked: None,
            finished: false,
        }
    );
    assert_eq!(session.progress().get(id(1)).unwrap().score(), Some(95));
    assert_eq!(session.progress().active_count(), 1);
}

#[tokio::test]
async fn corrupt_progress_snapshot_falls_back_to_initial_state() {
    let repo = InMemoryRepository::new();
    repo.write(StateSlot::Progress, "{not json", fixed_now())
        .await
        .unwrap();
    repo.write(StateSlot::Entitlement, "yes", fixed_now())
        .await
        .unwrap();

    let session = load(&repo).await;
    assert_eq!(
        session.progress(),
        &ProgressStore::initial(&Catalog::builtin())
    );
    assert_eq!(session.entitlement(), Entitlement::free());
}

#[tokio::test]
async fn unreadable_backend_falls_back_to_initial_state() {
    let session = LearnerSession::load(
        Arc::new(Catalog::builtin()),
        Arc::new(UnreadableRepository),
        fixed_clock(),
    )
    .await;

    assert_eq!(session.resume_target(), id(1));
    assert_eq!(session.entitlement(), Entitlement::free());
}

#[tokio::test]
async fn rejected_import_changes_nothing() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let before = session.progress().clone();

    for code in ["", "%%%not-base64%%%", "aGVsbG8=", "eyJwcm9ncmVzcyI6W119"] {
        let err = session.import_code(code).await.unwrap_err();
        assert!(matches!(err, LearnerError::InvalidSyncCode(_)), "{code}");
    }

    assert_eq!(session.progress(), &before);
    assert_eq!(session.entitlement(), Entitlement::free());
    assert_eq!(repo.len().unwrap(), 0);
}

#[tokio::test]
async fn export_then_import_moves_state_between_devices() {
    let phone = InMemoryRepository::new();
    let mut source = load(&phone).await;
    let mentor = ScriptedMentor::always_pass();
    source.grant_premium().await.unwrap();
    for n in 1..=5 {
        source.submit(&mentor, id(n), "Act as a tutor").await.unwrap();
    }
    let code = source.export_code();

    let laptop = InMemoryRepository::new();
    let mut target = load(&laptop).await;
    let resume = target.import_code(&format!("  {code}\n")).await.unwrap();

    assert_eq!(resume, id(6));
    assert_eq!(target.progress(), source.progress());
    assert!(target.entitlement().is_premium());
    assert_eq!(
        stored(&laptop, StateSlot::Entitlement).await.as_deref(),
        Some("true")
    );

    let reloaded = load(&laptop).await;
    assert_eq!(reloaded.progress(), source.progress());
    assert_eq!(reloaded.resume_target(), id(6));
}

#[tokio::test]
async fn import_replaces_state_and_drops_pending_verdicts() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let pending = session.begin_submission(id(1), "draft").unwrap();

    let code = sync::encode(&ProgressStore::initial(&Catalog::builtin()), false);
    session.import_code(&code).await.unwrap();

    let outcome = session.finish_submission(pending, pass(90)).await.unwrap();
    assert_eq!(outcome, SubmissionOutcome::Stale);
    assert_eq!(session.progress().status_of(id(1)), LessonStatus::Active);
}

#[tokio::test]
async fn sparse_import_reads_missing_lessons_as_locked() {
    let repo = InMemoryRepository::new();
    let mut session = load(&repo).await;
    let code = sync::encode(
        &serde_json::from_str::<ProgressStore>(
            r#"{"1":{"status":"completed","score":90},"2":{"status":"active"}}"#,
        )
        .unwrap(),
        false,
    );

    let resume = session.import_code(&code).await.unwrap();
    assert_eq!(resume, id(2));
    assert_eq!(session.progress().status_of(id(7)), LessonStatus::Locked);
    assert!(!session.is_selectable(id(3)));
    assert!(session.is_selectable(id(1)));
}

#[tokio::test]
async fn failed_import_write_keeps_previous_state() {
    let inner = InMemoryRepository::new();
    let mut session = LearnerSession::load(
        Arc::new(Catalog::builtin()),
        Arc::new(EntitlementWritesFail {
            inner: inner.clone(),
        }),
        fixed_clock(),
    )
    .await;
    let before = session.progress().clone();
    let pending = session.begin_submission(id(1), "draft").unwrap();

    let mut source = load(&InMemoryRepository::new()).await;
    finish_course(&mut source, &ScriptedMentor::always_pass()).await;
    let code = source.export_code();

    let err = session.import_code(&code).await.unwrap_err();
    assert!(matches!(err, LearnerError::Storage(_)));
    assert_eq!(session.progress(), &before);
    assert_eq!(session.entitlement(), Entitlement::free());

    let reloaded = load(&inner).await;
    assert_eq!(reloaded.progress(), &before);
    assert!(!reloaded.entitlement().is_premium());

    let outcome = session.finish_submission(pending, pass(80)).await.unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Passed { .. }));
}
