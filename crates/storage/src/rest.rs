//! Adapter for a hosted table service speaking the PostgREST dialect
//! (`/rest/v1/<table>?column=eq.value`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use quiz_core::model::{AttemptId, CourseCode, Question};
use reqwest::{Client, RequestBuilder, Response};

use crate::repository::{
    AttemptRecord, AttemptRepository, QuestionRecord, QuestionRepository, Storage, StorageError,
    valid_questions,
};

const QUESTIONS_TABLE: &str = "questions";
const ATTEMPTS_TABLE: &str = "test_attempts";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl RestConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Clone)]
pub struct RestRepository {
    client: Client,
    config: RestConfig,
}

fn transport(err: reqwest::Error) -> StorageError {
    if err.is_decode() {
        StorageError::Serialization(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}

fn questions_query(course: &CourseCode, limit: usize) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_owned()),
        ("course_code", format!("eq.{course}")),
        ("limit", limit.to_string()),
    ]
}

fn attempts_query(course: &CourseCode, limit: usize) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_owned()),
        ("course_code", format!("eq.{course}")),
        ("order", "completed_at.desc.nullslast".to_owned()),
        ("limit", limit.to_string()),
    ]
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!("table service returned {status}: {message}");
    if status == reqwest::StatusCode::CONFLICT {
        return Err(StorageError::Conflict);
    }
    Err(StorageError::Backend {
        status: status.as_u16(),
        message,
    })
}

impl RestRepository {
    /// Build a client for the given service.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn new(config: RestConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }
}

#[async_trait]
impl QuestionRepository for RestRepository {
    async fn questions_for_course(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<Question>, StorageError> {
        debug!("fetching up to {limit} questions for {course}");
        let request = self
            .client
            .get(self.config.table_url(QUESTIONS_TABLE))
            .query(&questions_query(course, limit));
        let response = self.authorized(request).send().await.map_err(transport)?;
        let rows: Vec<QuestionRecord> = check_status(response)
            .await?
            .json()
            .await
            .map_err(transport)?;

        Ok(valid_questions(course, rows.into_iter().map(Ok)))
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let request = self
            .client
            .post(self.config.table_url(QUESTIONS_TABLE))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&QuestionRecord::from_question(question));
        let response = self.authorized(request).send().await.map_err(transport)?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for RestRepository {
    async fn append_attempt(&self, attempt: &AttemptRecord) -> Result<AttemptId, StorageError> {
        let request = self
            .client
            .post(self.config.table_url(ATTEMPTS_TABLE))
            .header("Prefer", "return=representation")
            .json(attempt);
        let response = self.authorized(request).send().await.map_err(transport)?;
        let stored: Vec<AttemptRecord> = check_status(response)
            .await?
            .json()
            .await
            .map_err(transport)?;

        Ok(stored
            .first()
            .map_or_else(|| attempt.attempt_id(), AttemptRecord::attempt_id))
    }

    async fn recent_attempts(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let request = self
            .client
            .get(self.config.table_url(ATTEMPTS_TABLE))
            .query(&attempts_query(course, limit));
        let response = self.authorized(request).send().await.map_err(transport)?;
        check_status(response).await?.json().await.map_err(transport)
    }
}

impl Storage {
    /// Build a `Storage` backed by the hosted table service.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn rest(config: RestConfig) -> Result<Self, StorageError> {
        let repo = RestRepository::new(config)?;
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Ok(Self {
            questions,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const VALID_ROW: &str = r#"{
        "id": "6f1c1a52-3a0e-4d0b-9a55-2d1f3c7e9b10",
        "course_code": "IFT212.2",
        "question_text": "Which flip-flop toggles on every clock edge when T=1?",
        "option_a": "SR",
        "option_b": "D",
        "option_c": "JK",
        "option_d": "T",
        "correct_answer": "D",
        "topic": "Flip-Flops",
        "difficulty_level": "medium"
    }"#;

    /// Answer one HTTP request with `status` and a JSON `body`, returning the base URL.
    async fn serve_once(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn fetch(status: &'static str, body: String) -> Result<Vec<Question>, StorageError> {
        let base = serve_once(status, body).await;
        let repo = RestRepository::new(RestConfig::new(base, "anon")).unwrap();
        let course = CourseCode::new("IFT212.2").unwrap();
        repo.questions_for_course(&course, 50).await
    }

    #[tokio::test]
    async fn fetch_skips_rows_with_bad_answer_labels() {
        let bad = VALID_ROW
            .replace("6f1c1a52", "7a2d2b63")
            .replace(r#""correct_answer": "D""#, r#""correct_answer": "b""#);
        let questions = fetch("200 OK", format!("[{VALID_ROW},{bad}]")).await.unwrap();

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct(), quiz_core::model::OptionLabel::D);
        assert_eq!(questions[0].topic(), "Flip-Flops");
    }

    #[tokio::test]
    async fn server_errors_map_to_backend() {
        let err = fetch("503 Service Unavailable", "\"upstream down\"".into())
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            StorageError::Backend { status: 503, message } if message.contains("upstream down")
        ));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn conflict_status_maps_to_conflict() {
        let err = fetch("409 Conflict", "{}".into()).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn client_errors_are_not_transient() {
        let err = fetch("401 Unauthorized", "{}".into()).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { status: 401, .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn table_url_strips_trailing_slash() {
        let config = RestConfig::new("https://example.supabase.co/", "key");
        assert_eq!(
            config.table_url(QUESTIONS_TABLE),
            "https://example.supabase.co/rest/v1/questions"
        );
    }

    #[test]
    fn questions_query_filters_by_course_and_limit() {
        let course = CourseCode::new("IFT212.2").unwrap();
        let query = questions_query(&course, 50);
        assert_eq!(
            query,
            vec![
                ("select", "*".to_owned()),
                ("course_code", "eq.IFT212.2".to_owned()),
                ("limit", "50".to_owned()),
            ]
        );
    }

    #[test]
    fn attempts_query_orders_newest_first() {
        let course = CourseCode::new("IFT235.2").unwrap();
        let query = attempts_query(&course, 5);
        assert!(query.contains(&("order", "completed_at.desc.nullslast".to_owned())));
        assert!(query.contains(&("limit", "5".to_owned())));
    }

    #[test]
    fn hosted_rows_deserialize() {
        let body = r#"[{
            "id": "6f1c1a52-3a0e-4d0b-9a55-2d1f3c7e9b10",
            "course_code": "IFT212.2",
            "created_at": "2024-05-01T10:00:00+00:00",
            "question_text": "Which flip-flop toggles on every clock edge when T=1?",
            "option_a": "SR",
            "option_b": "D",
            "option_c": "JK",
            "option_d": "T",
            "correct_answer": "D",
            "topic": null,
            "difficulty_level": "medium"
        }]"#;
        let rows: Vec<QuestionRecord> = serde_json::from_str(body).unwrap();
        let question = rows.into_iter().next().unwrap().into_question().unwrap();
        assert_eq!(question.option(question.correct()), "T");
        assert_eq!(question.course_code().as_str(), "IFT212.2");
    }

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RestRepository>();
    }
}
