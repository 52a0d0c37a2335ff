//! JSON snapshot store.
//!
//! A dataset directory holds one JSON array per table. Files are read again
//! on every call, so each request aggregates over its own snapshot and edits
//! to the files show up without a restart.

use super::{DataStore, StoreError, StoreResult};
use crate::models::{DescriptiveCode, Participant, Question, RawCodedResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DESCRIPTIVE_CODES_FILE: &str = "descriptive_codes.json";
pub const PARTICIPANTS_FILE: &str = "participants.json";
pub const QUESTIONS_FILE: &str = "questions.json";
pub const RESPONSES_FILE: &str = "responses.json";

/// Every table file a dataset directory must contain.
pub const TABLE_FILES: [&str; 4] = [
    DESCRIPTIVE_CODES_FILE,
    PARTICIPANTS_FILE,
    QUESTIONS_FILE,
    RESPONSES_FILE,
];

/// Store backed by a directory of JSON table files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Table files missing from the dataset directory.
    pub fn missing_tables(&self) -> Vec<PathBuf> {
        TABLE_FILES
            .iter()
            .map(|file| self.root.join(file))
            .filter(|path| !path.is_file())
            .collect()
    }

    async fn read_table<T: DeserializeOwned + Send>(&self, file: &str) -> StoreResult<Vec<T>> {
        let path = self.root.join(file);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::MissingTable(path));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let rows: Vec<T> =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

#[async_trait]
impl DataStore for SnapshotStore {
    async fn descriptive_codes(&self) -> StoreResult<Vec<DescriptiveCode>> {
        self.read_table(DESCRIPTIVE_CODES_FILE).await
    }

    async fn participants(&self) -> StoreResult<Vec<Participant>> {
        self.read_table(PARTICIPANTS_FILE).await
    }

    async fn questions(&self) -> StoreResult<Vec<Question>> {
        self.read_table(QUESTIONS_FILE).await
    }

    async fn raw_responses(&self) -> StoreResult<Vec<RawCodedResponse>> {
        self.read_table(RESPONSES_FILE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(dir: &Path) {
        fs::write(
            dir.join(DESCRIPTIVE_CODES_FILE),
            r#"[{"categoryId": "A", "categoryPlainText": "Access", "categoryDescription": null}]"#,
        )
        .unwrap();
        fs::write(
            dir.join(PARTICIPANTS_FILE),
            r#"[{"participantId": "P1", "participantCountry": "Kenya",
                 "participantPosition": "Nurse", "participantExperience": "5"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join(QUESTIONS_FILE),
            r#"[{"questionId": "Q1", "questionText": "First"},
                {"questionId": "Q2", "questionText": "Second"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join(RESPONSES_FILE),
            r#"[{"participantId": "P1", "questionId": "Q1", "originalResponse": "yes",
                 "invivoCodes": "tired", "descriptiveIds": "A"},
                {"participantId": "P1", "questionId": "Q2", "originalResponse": "no",
                 "invivoCodes": null, "descriptiveIds": null}]"#,
        )
        .unwrap();
    }

    #[test]
    fn test_reads_all_tables() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let store = SnapshotStore::new(dir.path());

        let codes = tokio_test::block_on(store.descriptive_codes()).unwrap();
        assert_eq!(codes[0].category_description, "");

        let participants = tokio_test::block_on(store.participants()).unwrap();
        assert_eq!(participants[0].participant_country, "Kenya");

        let questions = tokio_test::block_on(store.questions()).unwrap();
        assert_eq!(questions.len(), 2);

        let rows = tokio_test::block_on(store.raw_responses()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(store.missing_tables().is_empty());
    }

    #[test]
    fn test_default_query_methods() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let store = SnapshotStore::new(dir.path());

        let rows = tokio_test::block_on(store.raw_responses_for_question("Q2")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].original_response, "no");

        let question = tokio_test::block_on(store.question("Q1")).unwrap();
        assert_eq!(question.unwrap().question_text, "First");

        let missing = tokio_test::block_on(store.question("Q404")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_missing_table_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        assert_eq!(store.missing_tables().len(), 4);
        let err = tokio_test::block_on(store.questions()).unwrap_err();
        assert!(matches!(err, StoreError::MissingTable(_)));
        assert!(err.to_string().contains(QUESTIONS_FILE));
    }

    #[test]
    fn test_malformed_table_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(QUESTIONS_FILE), "{not json").unwrap();
        let store = SnapshotStore::new(dir.path());

        let err = tokio_test::block_on(store.questions()).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_reads_fresh_snapshot_each_call() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let store = SnapshotStore::new(dir.path());

        assert_eq!(tokio_test::block_on(store.questions()).unwrap().len(), 2);
        fs::write(dir.path().join(QUESTIONS_FILE), "[]").unwrap();
        assert!(tokio_test::block_on(store.questions()).unwrap().is_empty());
    }

    #[test]
    fn test_sample_dataset_aggregates() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample");
        let store = SnapshotStore::new(root);
        assert!(store.missing_tables().is_empty());

        let data = tokio_test::block_on(crate::store::queries::question_data(
            &store,
            &crate::analysis::AggregateOptions::default(),
        ))
        .unwrap();
        assert_eq!(data.len(), 3);

        let q1 = &data[0];
        assert_eq!(q1.total_responses, 4);
        assert_eq!(q1.responses_without_descriptive_codes, 1);
        assert_eq!(q1.avg_descriptive_codes_per_response, 1.0);
        let most_used = q1.most_used_descriptive_code.as_ref().unwrap();
        assert_eq!(most_used.code.category_id, "WRK");
        assert_eq!(most_used.response_percentage, 0.5);
        assert_eq!(q1.top_invivo_codes[0].code_text, "too many patients");
        assert_eq!(q1.top_invivo_codes[0].response_count, 2);
        assert_eq!(q1.participant_breakdown.by_country.get("Kenya"), Some(&2));
        assert_eq!(q1.participant_breakdown.by_country.get(""), Some(&1));

        let q3 = &data[2];
        assert_eq!(q3.total_responses, 0);
        assert!(q3.most_used_descriptive_code.is_none());
    }
}
