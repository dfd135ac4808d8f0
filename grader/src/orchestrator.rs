//! # Grading Orchestrator
//!
//! Single entry point that wires the cache, circuit breaker, retry executor,
//! inference client, and extraction chain into one grading pipeline.
//!
//! ## Flow per submission
//!
//! 1. Hash the submission content together with the assignment title.
//! 2. Serve a cache hit immediately, flagged as cached.
//! 3. Ask the circuit breaker for admission; an open breaker rejects the call
//!    without touching the model.
//! 4. Call the inference service under the retry policy. One exhausted call
//!    counts as one breaker failure regardless of how many attempts it made.
//! 5. Run the extraction chain over the reply, stamp the result, and cache it.
//!
//! Batches run sequentially; one item's failure becomes an [`ItemFailure`]
//! record and never aborts the rest of the batch.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::breaker::CircuitBreaker;
use crate::cache::GradeCache;
use crate::client::InferenceService;
use crate::error::GraderError;
use crate::extract;
use crate::prompt::grading_prompt;
use crate::retry::{self, RetryPolicy};
use crate::types::{
    Assignment, BatchReport, GradeResult, ItemFailure, StudentGrade, Submission,
};

/// Orchestrates grading across the cache, breaker, retry, and inference layers.
pub struct Grader {
    service: Arc<dyn InferenceService>,
    cache: GradeCache,
    breaker: CircuitBreaker,
}

/// Cache key for a submission: SHA-256 over the base64 content followed by the
/// assignment title, as lowercase hex. Binding the title in means the same
/// document graded under a different assignment is a distinct entry.
pub fn content_hash(content: &str, assignment_title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(assignment_title.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Grader {
    pub fn new(service: Arc<dyn InferenceService>, cache: GradeCache, breaker: CircuitBreaker) -> Self {
        Self {
            service,
            cache,
            breaker,
        }
    }

    /// Grades one submission, consulting the cache first.
    pub async fn grade_one(
        &self,
        submission: &Submission,
        assignment: &Assignment,
        policy: &RetryPolicy,
    ) -> Result<GradeResult, GraderError> {
        let hash = content_hash(&submission.content, &assignment.title);

        if let Some(mut hit) = self.cache.get(&hash).await {
            tracing::info!(
                "Cache hit for {} ({})",
                submission.student_name,
                &hash[..12]
            );
            hit.cached = true;
            return Ok(hit);
        }

        self.breaker.allow()?;

        let prompt = grading_prompt(assignment, &submission.student_name);

        tracing::info!("Grading {} via inference service", submission.student_name);
        let raw = match retry::invoke(policy, || self.service.generate(&prompt, submission)).await {
            Ok(raw) => {
                self.breaker.record_success();
                raw
            }
            Err(e) => {
                self.breaker.record_failure();
                return Err(e);
            }
        };

        let extracted = extract::extract(&raw, assignment.max_points);
        tracing::info!(
            "Graded {}: {}/{} via {}",
            submission.student_name,
            extracted.score,
            extracted.max_points,
            extracted.parse_method
        );

        let result = GradeResult {
            score: Some(extracted.score),
            max_points: extracted.max_points,
            letter_grade: Some(extracted.letter_grade),
            percentage: Some(extracted.percentage),
            parse_method: extracted.parse_method,
            content_hash: hash.clone(),
            raw_text: raw,
            cached: false,
            processed_at: chrono::Utc::now().to_rfc3339(),
        };

        self.cache.put(hash, result.clone()).await;
        Ok(result)
    }

    /// Grades a batch sequentially, recording per-item failures.
    pub async fn grade_batch(
        &self,
        submissions: &[Submission],
        assignment: &Assignment,
        policy: &RetryPolicy,
    ) -> BatchReport {
        let mut successful = Vec::new();
        let mut failed = Vec::new();

        for (i, submission) in submissions.iter().enumerate() {
            tracing::info!(
                "[{}/{}] Processing {}",
                i + 1,
                submissions.len(),
                submission.student_name
            );
            match self.grade_one(submission, assignment, policy).await {
                Ok(result) => successful.push(StudentGrade {
                    student_name: submission.student_name.clone(),
                    result,
                }),
                Err(e) => {
                    tracing::error!("Grading failed for {}: {e}", submission.student_name);
                    failed.push(ItemFailure {
                        student_name: submission.student_name.clone(),
                        category: e.category(),
                        detail: e.operator_detail(),
                    });
                }
            }
        }

        BatchReport {
            assignment_title: assignment.title.clone(),
            max_points: assignment.max_points,
            total: submissions.len(),
            successful,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, JsonFileStore};
    use crate::error::ErrorCategory;
    use crate::types::ParseMethod;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockService {
        reply: Result<String, u16>,
        calls: AtomicUsize,
    }

    impl MockService {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceService for MockService {
        async fn generate(
            &self,
            _prompt: &str,
            _submission: &Submission,
        ) -> Result<String, GraderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(GraderError::Service {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    fn assignment() -> Assignment {
        Assignment {
            title: "Essay 3".to_string(),
            max_points: 100,
            rubric: "Thesis, evidence, style.".to_string(),
        }
    }

    fn submission(name: &str, content: &str) -> Submission {
        Submission {
            student_name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            content: content.to_string(),
        }
    }

    async fn grader_with<S: InferenceService + 'static>(
        service: Arc<S>,
    ) -> (Grader, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CacheStore> =
            Arc::new(JsonFileStore::new(dir.path().join("grade_cache.json")));
        let cache = GradeCache::load(store).await;
        let grader = Grader::new(service, cache, CircuitBreaker::new(Duration::from_secs(60)));
        (grader, dir)
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_grade_one_parses_marker_block() {
        let service = Arc::new(MockService::replying(
            "GRADE_START\nPoints Earned: 85/100\nLetter Grade: B\nPercentage: 85%\nGRADE_END\nSolid work.",
        ));
        let (grader, _dir) = grader_with(Arc::clone(&service)).await;

        let result = grader
            .grade_one(&submission("Jordan", "cGRm"), &assignment(), &fast_policy())
            .await
            .unwrap();

        assert_eq!(result.score, Some(85));
        assert_eq!(result.max_points, 100);
        assert_eq!(result.letter_grade.as_deref(), Some("B"));
        assert_eq!(result.percentage, Some(85));
        assert_eq!(result.parse_method, ParseMethod::MarkerBased);
        assert!(!result.cached);
        assert!(!result.processed_at.is_empty());
        assert_eq!(result.content_hash, content_hash("cGRm", "Essay 3"));
    }

    #[tokio::test]
    async fn test_second_grade_is_served_from_cache() {
        let service = Arc::new(MockService::replying(
            "GRADE_START\nPoints Earned: 85/100\nLetter Grade: B\nPercentage: 85%\nGRADE_END",
        ));
        let (grader, _dir) = grader_with(Arc::clone(&service)).await;
        let sub = submission("Jordan", "cGRm");

        let first = grader
            .grade_one(&sub, &assignment(), &fast_policy())
            .await
            .unwrap();
        let second = grader
            .grade_one(&sub, &assignment(), &fast_policy())
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.score, first.score);
        assert_eq!(service.calls(), 1, "cache hit must not touch the service");
    }

    #[tokio::test]
    async fn test_same_content_different_assignment_misses_cache() {
        let service = Arc::new(MockService::replying(
            "GRADE_START\nPoints Earned: 40/50\nLetter Grade: B\nPercentage: 80%\nGRADE_END",
        ));
        let (grader, _dir) = grader_with(Arc::clone(&service)).await;
        let sub = submission("Jordan", "cGRm");

        let mut other = assignment();
        other.title = "Essay 4".to_string();

        grader
            .grade_one(&sub, &assignment(), &fast_policy())
            .await
            .unwrap();
        let result = grader.grade_one(&sub, &other, &fast_policy()).await.unwrap();

        assert!(!result.cached);
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn test_breaker_opens_after_threshold_and_rejects() {
        let service = Arc::new(MockService::failing(500));
        let (grader, _dir) = grader_with(Arc::clone(&service)).await;
        let assignment = assignment();

        for i in 0..5 {
            let sub = submission("Jordan", &format!("doc-{i}"));
            let err = grader
                .grade_one(&sub, &assignment, &fast_policy())
                .await
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Server);
        }
        assert_eq!(service.calls(), 5);

        let sub = submission("Jordan", "doc-final");
        let err = grader
            .grade_one(&sub, &assignment, &fast_policy())
            .await
            .unwrap_err();
        match err {
            GraderError::CircuitOpen { .. } => {}
            other => panic!("Expected CircuitOpen, got {other:?}"),
        }
        assert_eq!(service.calls(), 5, "open breaker must not invoke the service");
    }

    #[tokio::test]
    async fn test_exhausted_retries_count_as_one_breaker_failure() {
        let service = Arc::new(MockService::failing(500));
        let (grader, _dir) = grader_with(Arc::clone(&service)).await;

        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
        };
        let sub = submission("Jordan", "doc");
        grader
            .grade_one(&sub, &assignment(), &policy)
            .await
            .unwrap_err();

        assert_eq!(service.calls(), 3);
        assert!(!grader.breaker.is_open(), "one exhausted call is one failure");
    }

    #[tokio::test]
    async fn test_cached_hit_is_served_while_breaker_open() {
        let service = Arc::new(MockService::replying(
            "GRADE_START\nPoints Earned: 85/100\nLetter Grade: B\nPercentage: 85%\nGRADE_END",
        ));
        let (grader, _dir) = grader_with(Arc::clone(&service)).await;
        let sub = submission("Jordan", "cGRm");

        grader
            .grade_one(&sub, &assignment(), &fast_policy())
            .await
            .unwrap();
        for _ in 0..5 {
            grader.breaker.record_failure();
        }
        assert!(grader.breaker.is_open());

        let result = grader
            .grade_one(&sub, &assignment(), &fast_policy())
            .await
            .unwrap();
        assert!(result.cached);
    }

    #[tokio::test]
    async fn test_batch_records_per_item_failures() {
        let service = Arc::new(MockService::failing(429));
        let (grader, _dir) = grader_with(Arc::clone(&service)).await;

        let subs = vec![submission("Jordan", "a"), submission("Riley", "b")];
        let report = grader
            .grade_batch(&subs, &assignment(), &fast_policy())
            .await;

        assert_eq!(report.total, 2);
        assert!(report.successful.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].student_name, "Jordan");
        assert_eq!(report.failed[0].category, ErrorCategory::Quota);
        assert_eq!(report.failed[1].student_name, "Riley");
    }

    #[tokio::test]
    async fn test_batch_mixes_success_and_failure() {
        struct Flaky {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl InferenceService for Flaky {
            async fn generate(
                &self,
                _prompt: &str,
                _submission: &Submission,
            ) -> Result<String, GraderError> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Ok("GRADE_START\nPoints Earned: 90/100\nLetter Grade: A-\nPercentage: 90%\nGRADE_END".to_string())
                } else {
                    Err(GraderError::EmptyResponse)
                }
            }
        }

        let (grader, _dir) = grader_with(Arc::new(Flaky {
            calls: AtomicUsize::new(0),
        }))
        .await;

        let subs = vec![submission("Jordan", "a"), submission("Riley", "b")];
        let report = grader
            .grade_batch(&subs, &assignment(), &fast_policy())
            .await;

        assert_eq!(report.successful.len(), 1);
        assert_eq!(report.successful[0].student_name, "Jordan");
        assert_eq!(report.successful[0].result.score, Some(90));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].category, ErrorCategory::ContentProcessing);
    }

    #[test]
    fn test_content_hash_is_stable_hex() {
        let a = content_hash("cGRm", "Essay 3");
        let b = content_hash("cGRm", "Essay 3");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, content_hash("cGRm", "Essay 4"));
    }
}
