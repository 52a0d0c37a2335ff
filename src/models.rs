//! Data models for the coding dashboard.
//!
//! This module contains the catalog entities read from storage (codes,
//! participants, questions, responses) and the per-question analytics
//! records produced by the aggregation engine. Every type serializes with
//! camelCase field names, which is the wire format the dashboard client
//! consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deserialize a nullable text column as an owned string, mapping `null` to `""`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A controlled-vocabulary entry assigned by a human coder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveCode {
    /// Unique category identifier (e.g. `"C12"`).
    pub category_id: String,
    /// Short human-readable label.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category_plain_text: String,
    /// Longer description of when the code applies.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category_description: String,
}

/// A survey participant and their demographic attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub participant_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participant_country: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participant_position: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participant_experience: String,
}

/// A survey question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question_text: String,
}

/// A response row as stored: descriptive codes are referenced by a
/// comma-separated id list and have not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCodedResponse {
    pub participant_id: String,
    pub question_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_response: String,
    /// Comma-separated free-text in-vivo tokens.
    #[serde(default)]
    pub invivo_codes: Option<String>,
    /// Comma-separated descriptive category ids.
    #[serde(default)]
    pub descriptive_ids: Option<String>,
}

/// A response whose descriptive codes have been resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodedResponse {
    pub participant_id: String,
    pub question_id: String,
    pub original_response: String,
    pub invivo_codes: Option<String>,
    /// Resolved codes in the order their ids appeared. Repeats are kept.
    pub descriptive_codes: Vec<DescriptiveCode>,
}

impl CodedResponse {
    /// Build a resolved response from its raw row and the already-resolved codes.
    pub fn from_raw(raw: &RawCodedResponse, descriptive_codes: Vec<DescriptiveCode>) -> Self {
        Self {
            participant_id: raw.participant_id.clone(),
            question_id: raw.question_id.clone(),
            original_response: raw.original_response.clone(),
            invivo_codes: raw.invivo_codes.clone(),
            descriptive_codes,
        }
    }

    /// Returns true if no descriptive code survived resolution.
    pub fn is_uncoded(&self) -> bool {
        self.descriptive_codes.is_empty()
    }
}

/// Demographic attribute used for participant breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemographicField {
    Country,
    Position,
    Experience,
}

impl DemographicField {
    /// All fields, in display order.
    pub const ALL: [DemographicField; 3] = [
        DemographicField::Country,
        DemographicField::Position,
        DemographicField::Experience,
    ];

    /// Returns the raw value of this field for a participant.
    pub fn value_of<'a>(&self, participant: &'a Participant) -> &'a str {
        match self {
            DemographicField::Country => &participant.participant_country,
            DemographicField::Position => &participant.participant_position,
            DemographicField::Experience => &participant.participant_experience,
        }
    }
}

impl fmt::Display for DemographicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemographicField::Country => write!(f, "Country"),
            DemographicField::Position => write!(f, "Position"),
            DemographicField::Experience => write!(f, "Experience"),
        }
    }
}

/// Usage statistics of one descriptive code within one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveCodeUsage {
    pub code: DescriptiveCode,
    /// Responses counted for this code. Under the default counting rule
    /// every occurrence counts, so a response repeating the code counts twice.
    pub response_count: usize,
    /// Total occurrences across all responses.
    pub occurrence_count: usize,
    /// `response_count / total_responses`, or 0 with no responses.
    pub response_percentage: f64,
}

/// Usage statistics of one in-vivo token within one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InVivoCodeUsage {
    pub code_text: String,
    /// Distinct responses containing the token.
    pub response_count: usize,
    pub occurrence_count: usize,
    pub response_percentage: f64,
}

/// Frequency of respondents per raw demographic value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantBreakdown {
    pub by_country: BTreeMap<String, usize>,
    pub by_position: BTreeMap<String, usize>,
    pub by_experience: BTreeMap<String, usize>,
}

impl ParticipantBreakdown {
    /// Count every participant under the literal value of each demographic field.
    pub fn from_participants<'a, I>(participants: I) -> Self
    where
        I: IntoIterator<Item = &'a Participant>,
    {
        let mut breakdown = Self::default();

        for participant in participants {
            for field in DemographicField::ALL {
                *breakdown
                    .table_mut(field)
                    .entry(field.value_of(participant).to_string())
                    .or_insert(0) += 1;
            }
        }

        breakdown
    }

    /// Returns the frequency table for a field.
    pub fn table(&self, field: DemographicField) -> &BTreeMap<String, usize> {
        match field {
            DemographicField::Country => &self.by_country,
            DemographicField::Position => &self.by_position,
            DemographicField::Experience => &self.by_experience,
        }
    }

    fn table_mut(&mut self, field: DemographicField) -> &mut BTreeMap<String, usize> {
        match field {
            DemographicField::Country => &mut self.by_country,
            DemographicField::Position => &mut self.by_position,
            DemographicField::Experience => &mut self.by_experience,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_country.is_empty() && self.by_position.is_empty() && self.by_experience.is_empty()
    }
}

/// Analytics summary for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionData {
    pub question: Question,
    /// All resolved responses for this question.
    pub coded_responses: Vec<CodedResponse>,
    pub total_responses: usize,
    /// Responses with no descriptive code at all.
    pub responses_without_descriptive_codes: usize,
    pub avg_descriptive_codes_per_response: f64,
    /// Per-code stats, most used first.
    pub descriptive_code_usage: Vec<DescriptiveCodeUsage>,
    pub most_used_descriptive_code: Option<DescriptiveCodeUsage>,
    /// Per-token stats, most used first.
    pub invivo_code_usage: Vec<InVivoCodeUsage>,
    /// Head of `invivo_code_usage` for quick display.
    pub top_invivo_codes: Vec<InVivoCodeUsage>,
    /// Participants who answered this question.
    pub participants: Vec<Participant>,
    pub participant_breakdown: ParticipantBreakdown,
}

/// Catalog-wide usage of one descriptive code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveCodeStats {
    #[serde(flatten)]
    pub code: DescriptiveCode,
    /// Distinct participants whose responses carry this code.
    pub response_count: usize,
    /// Distinct questions where this code was applied.
    pub question_count: usize,
}

/// Overview of the whole descriptive-code catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeCatalogSummary {
    pub total_codes: usize,
    pub participants_with_any_code: usize,
    pub most_used_code: Option<DescriptiveCodeStats>,
    pub codes: Vec<DescriptiveCodeStats>,
}

/// The most frequent country among participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

/// Demographic overview of the participant catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub total_participants: usize,
    pub country_count: usize,
    pub position_count: usize,
    pub most_common_country: Option<CountryCount>,
}

/// Metadata about an offline report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Dataset directory the report was computed from.
    pub data_source: String,
    pub generated_at: DateTime<Utc>,
    pub question_count: usize,
    /// Responses attached to a catalog question.
    pub response_count: usize,
    /// Distinct participants who answered at least one catalog question.
    pub participant_count: usize,
    pub duration_seconds: f64,
}

/// A complete offline report of the per-question statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metadata: ReportMetadata,
    pub questions: Vec<QuestionData>,
}
