//! Search predicates over already-fetched collections.
//!
//! These are independent of the aggregation engine: they narrow a catalog
//! the caller already holds.

use crate::models::{CodedResponse, DescriptiveCode, Participant};

/// Normalize a search term. Returns `None` when there is nothing to filter on.
pub fn normalize_term(raw: &str) -> Option<String> {
    let term = raw.trim().to_lowercase();
    if term.is_empty() {
        None
    } else {
        Some(term)
    }
}

/// Substring match on id, country, position or experience. `term` must be normalized.
pub fn participant_matches(participant: &Participant, term: &str) -> bool {
    [
        &participant.participant_id,
        &participant.participant_country,
        &participant.participant_position,
        &participant.participant_experience,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}

/// Substring match on id, label or description. `term` must be normalized.
pub fn descriptive_code_matches(code: &DescriptiveCode, term: &str) -> bool {
    [
        &code.category_id,
        &code.category_plain_text,
        &code.category_description,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}

/// Keep participants matching `query`; an empty query keeps everything.
pub fn filter_participants(participants: Vec<Participant>, query: Option<&str>) -> Vec<Participant> {
    match query.and_then(normalize_term) {
        Some(term) => participants
            .into_iter()
            .filter(|p| participant_matches(p, &term))
            .collect(),
        None => participants,
    }
}

/// Keep descriptive codes matching `query`; an empty query keeps everything.
pub fn filter_descriptive_codes(
    codes: Vec<DescriptiveCode>,
    query: Option<&str>,
) -> Vec<DescriptiveCode> {
    match query.and_then(normalize_term) {
        Some(term) => codes
            .into_iter()
            .filter(|c| descriptive_code_matches(c, &term))
            .collect(),
        None => codes,
    }
}

/// Participant id equality: trimmed and case-insensitive.
pub fn same_participant_id(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Keep responses given by one participant.
pub fn responses_for_participant(
    responses: Vec<CodedResponse>,
    participant_id: &str,
) -> Vec<CodedResponse> {
    responses
        .into_iter()
        .filter(|r| same_participant_id(&r.participant_id, participant_id))
        .collect()
}
