use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use quiz_core::model::{AttemptId, CourseCode, OptionLabel, Question, QuestionId};
use quiz_core::time::fixed_now;
use services::{
    AdvanceOutcome, AppServices, AttemptHistoryService, Clock, QuizConfig, QuizLoopService,
    SessionError, SessionPhase,
};
use storage::repository::{
    AttemptRecord, AttemptRepository, InMemoryRepository, QuestionRepository, Storage, StorageError,
};

const ARCH: &str = "IFT212.2";

fn code(raw: &str) -> CourseCode {
    CourseCode::new(raw).unwrap()
}

fn build_question(course: &str, n: usize, correct: OptionLabel) -> Question {
    Question::new(
        QuestionId::generate(),
        code(course),
        format!("Question {n}"),
        ["a".into(), "b".into(), "c".into(), "d".into()],
        correct,
        Some("Computer Systems".into()),
        Some("medium".into()),
    )
    .unwrap()
}

async fn seeded(course: &str, count: usize) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    for n in 0..count {
        repo.upsert_question(&build_question(course, n, OptionLabel::B))
            .await
            .unwrap();
    }
    repo
}

/// Repository whose every call fails, to exercise error paths.
struct Unreachable;

#[async_trait]
impl QuestionRepository for Unreachable {
    async fn questions_for_course(
        &self,
        _course: &CourseCode,
        _limit: usize,
    ) -> Result<Vec<Question>, StorageError> {
        Err(StorageError::Connection("connection refused".into()))
    }

    async fn upsert_question(&self, _question: &Question) -> Result<(), StorageError> {
        Err(StorageError::Connection("connection refused".into()))
    }
}

#[async_trait]
impl AttemptRepository for Unreachable {
    async fn append_attempt(&self, _attempt: &AttemptRecord) -> Result<AttemptId, StorageError> {
        Err(StorageError::Backend {
            status: 503,
            message: "unavailable".into(),
        })
    }

    async fn recent_attempts(
        &self,
        _course: &CourseCode,
        _limit: usize,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        Ok(Vec::new())
    }
}

/// Attempt log that stores the first append but reports a timeout for it.
struct LostReply {
    inner: InMemoryRepository,
    replied: AtomicBool,
}

#[async_trait]
impl AttemptRepository for LostReply {
    async fn append_attempt(&self, attempt: &AttemptRecord) -> Result<AttemptId, StorageError> {
        let id = self.inner.append_attempt(attempt).await?;
        if self.replied.swap(true, Ordering::SeqCst) {
            Ok(id)
        } else {
            Err(StorageError::Connection("timed out".into()))
        }
    }

    async fn recent_attempts(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        self.inner.recent_attempts(course, limit).await
    }
}

#[tokio::test]
async fn two_correct_answers_score_full_marks() {
    let repo = seeded(ARCH, 2).await;
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo));

    let mut session = svc.start_session(&code(ARCH)).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::InProgress);
    assert_eq!(session.questions().len(), 2);

    svc.select(&mut session, OptionLabel::B).unwrap();
    let first = svc.advance(&mut session).await.unwrap();
    assert!(matches!(first.outcome, AdvanceOutcome::Moved { position: 1, .. }));

    svc.select(&mut session, OptionLabel::B).unwrap();
    let last = svc.advance(&mut session).await.unwrap();
    let AdvanceOutcome::Submitted(snapshot) = last.outcome else {
        panic!("expected submission");
    };

    assert_eq!(snapshot.score(), 2);
    assert_eq!(snapshot.total(), 2);
    assert_eq!(snapshot.percentage(), 100);
    assert_eq!(snapshot.elapsed_seconds(), 0);
    assert_eq!(snapshot.course_name(), "Computer Architecture");
    assert_eq!(snapshot.topics().len(), 1);
    assert_eq!(last.attempt_id, None);
    assert_eq!(session.phase(), SessionPhase::Submitted);
}

#[tokio::test]
async fn large_pool_is_sampled_to_session_size() {
    let repo = seeded(ARCH, 60).await;
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo));

    let session = svc.start_session(&code(ARCH)).await.unwrap();

    assert_eq!(session.questions().len(), 30);
    let ids: HashSet<_> = session.questions().iter().map(Question::id).collect();
    assert_eq!(ids.len(), 30);
}

#[tokio::test]
async fn other_courses_questions_are_not_used() {
    let repo = seeded("IFT235.2", 5).await;
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo));

    let err = svc.start_session(&code(ARCH)).await.unwrap_err();
    assert!(matches!(err, SessionError::NoContent));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unknown_course_is_rejected() {
    let repo = seeded(ARCH, 3).await;
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo));

    let err = svc.start_session(&code("CSC101")).await.unwrap_err();
    assert!(matches!(err, SessionError::UnknownCourse(c) if c.as_str() == "CSC101"));
}

#[tokio::test]
async fn fetch_failure_is_retryable() {
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(Unreachable));

    let err = svc.start_session(&code(ARCH)).await.unwrap_err();

    assert!(matches!(err, SessionError::Fetch(StorageError::Connection(_))));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unanswered_advance_requires_selection() {
    let repo = seeded(ARCH, 3).await;
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo));
    let mut session = svc.start_session(&code(ARCH)).await.unwrap();

    let result = svc.advance(&mut session).await.unwrap();

    assert_eq!(result.outcome, AdvanceOutcome::SelectionRequired);
    assert_eq!(session.position(), 0);
    assert_eq!(svc.retreat(&mut session).unwrap(), 0);
}

#[tokio::test]
async fn submitted_attempt_is_logged_once() {
    let repo = seeded(ARCH, 2).await;
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()))
        .with_attempt_log(Arc::new(repo.clone()));

    let mut session = svc.start_session(&code(ARCH)).await.unwrap();
    svc.select(&mut session, OptionLabel::B).unwrap();
    svc.advance(&mut session).await.unwrap();
    svc.select(&mut session, OptionLabel::A).unwrap();
    let result = svc.advance(&mut session).await.unwrap();

    let id = result.attempt_id.expect("attempt logged");
    assert_eq!(svc.finalize_attempt(&mut session).await.unwrap(), id);

    let history = AttemptHistoryService::new(Arc::new(repo));
    let items = history.recent_attempts(&code(ARCH), 10).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].score, 1);
    assert_eq!(items[0].total, 2);
    assert_eq!(items[0].percentage, Some(50));
    assert_eq!(items[0].time_taken, Some(0));
}

#[tokio::test]
async fn failed_attempt_log_keeps_results() {
    let repo = seeded(ARCH, 1).await;
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo))
        .with_attempt_log(Arc::new(Unreachable));

    let mut session = svc.start_session(&code(ARCH)).await.unwrap();
    svc.select(&mut session, OptionLabel::C).unwrap();
    let result = svc.advance(&mut session).await.unwrap();

    assert!(matches!(result.outcome, AdvanceOutcome::Submitted(_)));
    assert_eq!(result.attempt_id, None);
    assert_eq!(session.results().map(|r| r.score()), Some(0));

    let err = svc.finalize_attempt(&mut session).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(StorageError::Backend { status: 503, .. })));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn retry_after_lost_reply_keeps_one_row() {
    let repo = seeded(ARCH, 1).await;
    let log = Arc::new(LostReply {
        inner: repo.clone(),
        replied: AtomicBool::new(false),
    });
    let svc = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()))
        .with_attempt_log(log.clone());

    let mut session = svc.start_session(&code(ARCH)).await.unwrap();
    svc.select(&mut session, OptionLabel::B).unwrap();
    let result = svc.advance(&mut session).await.unwrap();
    assert_eq!(result.attempt_id, None);
    let reserved = session.submission_id().expect("id reserved at submission");

    let id = svc.finalize_attempt(&mut session).await.unwrap();
    assert_eq!(id, reserved);
    assert_eq!(svc.finalize_attempt(&mut session).await.unwrap(), reserved);

    let rows = repo.recent_attempts(&code(ARCH), 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].attempt_id(), reserved);
}

#[tokio::test]
async fn finalize_requires_log_and_results() {
    let repo = seeded(ARCH, 2).await;
    let plain = QuizLoopService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
    let mut session = plain.start_session(&code(ARCH)).await.unwrap();
    assert!(matches!(
        plain.finalize_attempt(&mut session).await,
        Err(SessionError::AttemptLogDisabled)
    ));

    let logged = plain.clone().with_attempt_log(Arc::new(repo));
    assert!(matches!(
        logged.finalize_attempt(&mut session).await,
        Err(SessionError::NotSubmitted)
    ));
}

#[tokio::test]
async fn app_services_honour_config() {
    let storage = Storage::in_memory();
    for n in 0..12 {
        storage
            .questions
            .upsert_question(&build_question(ARCH, n, OptionLabel::A))
            .await
            .unwrap();
    }
    let config = QuizConfig {
        session_size: 5,
        pool_limit: 10,
        record_attempts: true,
        ..QuizConfig::default()
    };
    let app = AppServices::with_storage(storage, &config, Clock::fixed(fixed_now()));
    let svc = app.session_loop();
    assert_eq!(app.catalog().len(), 2);

    let mut session = svc.start_session(&code(ARCH)).await.unwrap();
    assert_eq!(session.questions().len(), 5);

    while session.phase() == SessionPhase::InProgress {
        svc.select(&mut session, OptionLabel::A).unwrap();
        svc.advance(&mut session).await.unwrap();
    }

    assert_eq!(session.results().map(|r| r.percentage()), Some(100));
    let items = app.history().recent_attempts(&code(ARCH), 5).await.unwrap();
    assert_eq!(items.len(), 1);
}
