//! Storage collaborator.
//!
//! The dashboard only reads. A [`DataStore`] hands out the four catalogs as
//! already-shaped rows; the query helpers in [`queries`] combine them into the
//! collections served over HTTP.

pub mod memory;
pub mod queries;
pub mod snapshot;

pub use snapshot::SnapshotStore;

use crate::models::{DescriptiveCode, Participant, Question, RawCodedResponse};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading from a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table file not found: {}", .0.display())]
    MissingTable(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only access to the coded survey dataset.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn descriptive_codes(&self) -> StoreResult<Vec<DescriptiveCode>>;

    async fn participants(&self) -> StoreResult<Vec<Participant>>;

    async fn questions(&self) -> StoreResult<Vec<Question>>;

    /// All response rows, descriptive codes unresolved.
    async fn raw_responses(&self) -> StoreResult<Vec<RawCodedResponse>>;

    /// Response rows for one question, descriptive codes unresolved.
    async fn raw_responses_for_question(
        &self,
        question_id: &str,
    ) -> StoreResult<Vec<RawCodedResponse>> {
        let rows = self.raw_responses().await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.question_id == question_id)
            .collect())
    }

    /// A single question, or `None` when the id is unknown.
    async fn question(&self, question_id: &str) -> StoreResult<Option<Question>> {
        let questions = self.questions().await?;
        Ok(questions.into_iter().find(|q| q.question_id == question_id))
    }
}
