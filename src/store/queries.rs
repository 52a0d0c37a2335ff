//! Composite reads over a [`DataStore`].
//!
//! Independent tables are fetched concurrently; resolution and aggregation
//! only start once every input has arrived.

use super::{DataStore, StoreResult};
use crate::analysis::{self, filter, AggregateOptions};
use crate::models::{CodeCatalogSummary, CodedResponse, ParticipantSummary, QuestionData};
use futures::try_join;

/// All responses with descriptive codes resolved.
pub async fn coded_responses<S>(store: &S) -> StoreResult<Vec<CodedResponse>>
where
    S: DataStore + ?Sized,
{
    let (catalog, raw) = try_join!(store.descriptive_codes(), store.raw_responses())?;
    Ok(analysis::resolve(&raw, &catalog))
}

/// Resolved responses given by one participant.
pub async fn coded_responses_for_participant<S>(
    store: &S,
    participant_id: &str,
) -> StoreResult<Vec<CodedResponse>>
where
    S: DataStore + ?Sized,
{
    let responses = coded_responses(store).await?;
    Ok(filter::responses_for_participant(responses, participant_id))
}

/// Per-question analytics over the current snapshot.
pub async fn question_data<S>(store: &S, options: &AggregateOptions) -> StoreResult<Vec<QuestionData>>
where
    S: DataStore + ?Sized,
{
    let (questions, responses, participants) =
        try_join!(store.questions(), coded_responses(store), store.participants())?;

    Ok(analysis::aggregate_with(
        &questions,
        &responses,
        &participants,
        options,
    ))
}

/// Catalog-wide descriptive code statistics.
pub async fn code_catalog_summary<S>(store: &S) -> StoreResult<CodeCatalogSummary>
where
    S: DataStore + ?Sized,
{
    let (catalog, raw) = try_join!(store.descriptive_codes(), store.raw_responses())?;
    let responses = analysis::resolve(&raw, &catalog);
    Ok(analysis::code_catalog_summary(&catalog, &responses))
}

/// Demographic overview of the participant catalog.
pub async fn participant_summary<S>(store: &S) -> StoreResult<ParticipantSummary>
where
    S: DataStore + ?Sized,
{
    let participants = store.participants().await?;
    Ok(analysis::participant_summary(&participants))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DescriptiveCode, Participant, Question, RawCodedResponse};
    use crate::store::memory::MemoryStore;
    use crate::store::{SnapshotStore, StoreError};

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![DescriptiveCode {
                category_id: "A".to_string(),
                category_plain_text: "Access".to_string(),
                category_description: String::new(),
            }],
            vec![Participant {
                participant_id: "P1".to_string(),
                participant_country: "Kenya".to_string(),
                participant_position: "Nurse".to_string(),
                participant_experience: "5".to_string(),
            }],
            vec![
                Question {
                    question_id: "Q1".to_string(),
                    question_text: "First".to_string(),
                },
                Question {
                    question_id: "Q2".to_string(),
                    question_text: "Second".to_string(),
                },
            ],
            vec![
                RawCodedResponse {
                    participant_id: "P1".to_string(),
                    question_id: "Q1".to_string(),
                    original_response: "yes".to_string(),
                    invivo_codes: Some("tired, tired".to_string()),
                    descriptive_ids: Some("A, X99".to_string()),
                },
                RawCodedResponse {
                    participant_id: "P2".to_string(),
                    question_id: "Q1".to_string(),
                    original_response: "no".to_string(),
                    invivo_codes: None,
                    descriptive_ids: None,
                },
            ],
        )
    }

    #[tokio::test]
    async fn test_coded_responses_resolves_codes() {
        let responses = coded_responses(&store()).await.unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].descriptive_codes.len(), 1);
        assert_eq!(responses[0].descriptive_codes[0].category_plain_text, "Access");
        assert!(responses[1].descriptive_codes.is_empty());
    }

    #[tokio::test]
    async fn test_question_data_end_to_end() {
        let data = question_data(&store(), &AggregateOptions::default())
            .await
            .unwrap();

        assert_eq!(data.len(), 2);
        let q1 = &data[0];
        assert_eq!(q1.total_responses, 2);
        assert_eq!(q1.responses_without_descriptive_codes, 1);
        assert_eq!(q1.avg_descriptive_codes_per_response, 0.5);
        assert_eq!(q1.descriptive_code_usage[0].response_percentage, 0.5);
        assert_eq!(q1.invivo_code_usage[0].occurrence_count, 2);
        assert_eq!(q1.invivo_code_usage[0].response_count, 1);
        assert_eq!(q1.participants.len(), 1);

        assert_eq!(data[1].total_responses, 0);
    }

    #[tokio::test]
    async fn test_coded_responses_for_participant() {
        let responses = coded_responses_for_participant(&store(), "p2").await.unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].original_response, "no");
    }

    #[tokio::test]
    async fn test_summaries() {
        let codes = code_catalog_summary(&store()).await.unwrap();
        assert_eq!(codes.total_codes, 1);
        assert_eq!(codes.participants_with_any_code, 1);

        let participants = participant_summary(&store()).await.unwrap();
        assert_eq!(participants.total_participants, 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        let err = question_data(&store, &AggregateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingTable(_)));
    }
}
