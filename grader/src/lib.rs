//! # Grader Library
//!
//! This module provides the core logic for turning an unreliable generative-AI grading
//! service into a dependable subsystem. It supports content-addressed caching of prior
//! results, circuit-breaker failure isolation, bounded retries with jittered backoff,
//! and a deterministic multi-stage extraction of a structured grade from the model's
//! free-text reply.
//!
//! ## Key Concepts
//! - **Grader**: The main struct composing the injected collaborators: hash the
//!   submission, consult the cache, gate the call behind the circuit breaker, retry
//!   the inference call, extract a grade, store it, return it.
//! - **Extraction stages**: An ordered fallback chain of pure parsers; the first stage
//!   to produce a structurally valid grade wins and stamps its provenance.
//! - **GradeCache**: Durable, content-addressed store that makes repeated grading of
//!   identical submissions idempotent and free of a second inference call.
//! - **CircuitBreaker / retry**: Process-wide failure accounting with a passive
//!   half-open reset, wrapped around bounded exponential backoff.

pub mod breaker;
pub mod cache;
pub mod client;
pub mod error;
pub mod extract;
pub mod letter;
pub mod orchestrator;
pub mod prompt;
pub mod retry;
pub mod types;

pub use breaker::CircuitBreaker;
pub use cache::{CacheStore, GradeCache, JsonFileStore};
pub use client::{GeminiClient, InferenceService};
pub use error::{ErrorCategory, GraderError};
pub use orchestrator::Grader;
pub use retry::RetryPolicy;
pub use types::{
    Assignment, BatchReport, GradeResult, ItemFailure, ParseMethod, StudentGrade, Submission,
};
