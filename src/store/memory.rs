//! In-memory store.

use super::{DataStore, StoreResult};
use crate::models::{DescriptiveCode, Participant, Question, RawCodedResponse};
use async_trait::async_trait;

/// Store holding the whole dataset in memory. Each call returns a copy.
#[allow(dead_code)] // In-process backend for embedders and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub descriptive_codes: Vec<DescriptiveCode>,
    pub participants: Vec<Participant>,
    pub questions: Vec<Question>,
    pub responses: Vec<RawCodedResponse>,
}

impl MemoryStore {
    #[allow(dead_code)] // Constructor for embedders and tests
    pub fn new(
        descriptive_codes: Vec<DescriptiveCode>,
        participants: Vec<Participant>,
        questions: Vec<Question>,
        responses: Vec<RawCodedResponse>,
    ) -> Self {
        Self {
            descriptive_codes,
            participants,
            questions,
            responses,
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn descriptive_codes(&self) -> StoreResult<Vec<DescriptiveCode>> {
        Ok(self.descriptive_codes.clone())
    }

    async fn participants(&self) -> StoreResult<Vec<Participant>> {
        Ok(self.participants.clone())
    }

    async fn questions(&self) -> StoreResult<Vec<Question>> {
        Ok(self.questions.clone())
    }

    async fn raw_responses(&self) -> StoreResult<Vec<RawCodedResponse>> {
        Ok(self.responses.clone())
    }
}
