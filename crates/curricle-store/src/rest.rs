//! REST store speaking a PostgREST-style row API.
//!
//! Every resource is a table endpoint filtered with `column=eq.value` query
//! parameters. Progress writes ride on the backend's conditional update: the
//! PATCH filters on the version the caller read, so zero updated rows means
//! the write lost a race. Submission inserts lean on the unique key over
//! (learner, exam, category); the backend answers 409 for the loser.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use curricle_core::error::StoreError;
use curricle_core::model::{
    Exam, ExamCategory, Learner, LearnerProgress, ProgressRecord, Submission,
};
use curricle_core::traits::CourseStore;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A `CourseStore` backed by a row-oriented REST API.
pub struct RestStore {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(api_key: &str, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }

    fn request(&self, method: reqwest::Method, path_and_query: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path_and_query))
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Network(format!("timed out after {DEFAULT_TIMEOUT_SECS}s"))
            } else {
                StoreError::Network(e.to_string())
            }
        })
    }

    /// Maps a non-success response to a `StoreError`. Statuses with a
    /// dedicated meaning (409 on inserts) are handled at the call sites.
    async fn fail(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status == 401 || status == 403 {
            return StoreError::AuthenticationFailed(body);
        }
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        StoreError::ApiError { status, message }
    }

    async fn rows<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, StoreError> {
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Flat progress row as the backend stores it.
#[derive(Serialize, Deserialize)]
struct ProgressRow {
    learner_id: String,
    version: u64,
    current_position: Option<usize>,
    final_exam_unlocked: bool,
    course_completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl ProgressRow {
    fn from_parts(learner_id: &str, version: u64, progress: &LearnerProgress) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            version,
            current_position: progress.current_position,
            final_exam_unlocked: progress.final_exam_unlocked,
            course_completed: progress.course_completed,
            completed_at: progress.completed_at,
        }
    }

    fn into_record(self) -> ProgressRecord {
        ProgressRecord {
            learner_id: self.learner_id,
            version: self.version,
            progress: LearnerProgress {
                current_position: self.current_position,
                final_exam_unlocked: self.final_exam_unlocked,
                course_completed: self.course_completed,
                completed_at: self.completed_at,
            },
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl CourseStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn load_progress(&self, learner_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
        let response = Self::send(self.request(
            reqwest::Method::GET,
            &format!("/progress?learner_id=eq.{learner_id}&limit=1"),
        ))
        .await?;
        let rows: Vec<ProgressRow> = Self::rows(response).await?;
        Ok(rows.into_iter().next().map(ProgressRow::into_record))
    }

    async fn init_progress(&self, learner_id: &str) -> Result<ProgressRecord, StoreError> {
        let row = ProgressRow::from_parts(learner_id, 1, &LearnerProgress::new());
        let response = Self::send(
            self.request(reqwest::Method::POST, "/progress")
                .header("prefer", "return=representation")
                .json(&row),
        )
        .await?;

        // 409 means another writer created the row first; read theirs.
        if response.status().as_u16() == 409 {
            return self
                .load_progress(learner_id)
                .await?
                .ok_or_else(|| StoreError::RecordNotFound(learner_id.to_string()));
        }

        let rows: Vec<ProgressRow> = Self::rows(response).await?;
        rows.into_iter()
            .next()
            .map(ProgressRow::into_record)
            .ok_or_else(|| StoreError::Serialization("insert returned no representation".into()))
    }

    #[instrument(skip(self, progress))]
    async fn save_progress(
        &self,
        learner_id: &str,
        progress: &LearnerProgress,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let row = ProgressRow::from_parts(learner_id, expected_version + 1, progress);
        let response = Self::send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/progress?learner_id=eq.{learner_id}&version=eq.{expected_version}"),
            )
            .header("prefer", "return=representation")
            .json(&row),
        )
        .await?;

        let rows: Vec<ProgressRow> = Self::rows(response).await?;
        match rows.into_iter().next() {
            // Zero matched rows: the version filter missed, so a concurrent
            // write moved the record.
            None => Err(StoreError::VersionConflict {
                expected: expected_version,
                found: None,
            }),
            Some(row) => Ok(row.version),
        }
    }

    async fn find_submission(
        &self,
        learner_id: &str,
        exam_id: &str,
        category: ExamCategory,
    ) -> Result<Option<Submission>, StoreError> {
        let response = Self::send(self.request(
            reqwest::Method::GET,
            &format!(
                "/submissions?learner_id=eq.{learner_id}&exam_id=eq.{exam_id}&category=eq.{category}&limit=1"
            ),
        ))
        .await?;
        let rows: Vec<Submission> = Self::rows(response).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, submission), fields(learner = %submission.learner_id, exam = %submission.exam_id))]
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let response = Self::send(
            self.request(reqwest::Method::POST, "/submissions")
                .json(submission),
        )
        .await?;

        if response.status().as_u16() == 409 {
            return Err(StoreError::DuplicateSubmission);
        }
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }

    async fn list_submissions(&self, learner_id: &str) -> Result<Vec<Submission>, StoreError> {
        let response = Self::send(self.request(
            reqwest::Method::GET,
            &format!("/submissions?learner_id=eq.{learner_id}&order=submitted_at.asc"),
        ))
        .await?;
        Self::rows(response).await
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>, StoreError> {
        let response = Self::send(self.request(
            reqwest::Method::GET,
            &format!("/exams?id=eq.{exam_id}&limit=1"),
        ))
        .await?;
        let rows: Vec<Exam> = Self::rows(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_learners(&self) -> Result<Vec<Learner>, StoreError> {
        let response = Self::send(self.request(reqwest::Method::GET, "/learners?order=id.asc")).await?;
        Self::rows(response).await
    }
}
