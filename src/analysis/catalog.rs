//! Catalog-wide statistics.
//!
//! Unlike the per-question aggregation, these figures span the whole
//! dataset: how widely each descriptive code is used across participants and
//! questions, and how the participant catalog is spread demographically.

use crate::models::{
    CodeCatalogSummary, CodedResponse, CountryCount, DescriptiveCode, DescriptiveCodeStats,
    Participant, ParticipantSummary,
};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct CodeReach<'a> {
    participants: HashSet<&'a str>,
    questions: HashSet<&'a str>,
}

/// Usage of every catalog code, most widely used first.
///
/// `response_count` counts distinct participants, `question_count` distinct
/// questions. Unused codes are kept with zero counts. Ties keep catalog order.
pub fn descriptive_code_stats(
    catalog: &[DescriptiveCode],
    responses: &[CodedResponse],
) -> Vec<DescriptiveCodeStats> {
    let mut reach: HashMap<&str, CodeReach> = HashMap::new();

    for response in responses {
        for code in &response.descriptive_codes {
            let entry = reach.entry(code.category_id.as_str()).or_default();
            entry.participants.insert(response.participant_id.as_str());
            entry.questions.insert(response.question_id.as_str());
        }
    }

    let mut stats: Vec<DescriptiveCodeStats> = catalog
        .iter()
        .map(|code| {
            let (response_count, question_count) = reach
                .get(code.category_id.as_str())
                .map(|r| (r.participants.len(), r.questions.len()))
                .unwrap_or((0, 0));

            DescriptiveCodeStats {
                code: code.clone(),
                response_count,
                question_count,
            }
        })
        .collect();

    stats.sort_by_key(|s| std::cmp::Reverse(s.response_count));
    stats
}

/// Distinct participants with at least one resolved descriptive code.
pub fn participants_with_any_code(responses: &[CodedResponse]) -> usize {
    responses
        .iter()
        .filter(|r| !r.is_uncoded())
        .map(|r| r.participant_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Summarize the descriptive-code catalog against all resolved responses.
pub fn code_catalog_summary(
    catalog: &[DescriptiveCode],
    responses: &[CodedResponse],
) -> CodeCatalogSummary {
    let codes = descriptive_code_stats(catalog, responses);

    CodeCatalogSummary {
        total_codes: catalog.len(),
        participants_with_any_code: participants_with_any_code(responses),
        most_used_code: codes.first().cloned(),
        codes,
    }
}

/// Demographic overview of the participant catalog.
pub fn participant_summary(participants: &[Participant]) -> ParticipantSummary {
    let countries: HashSet<&str> = participants
        .iter()
        .map(|p| p.participant_country.as_str())
        .collect();
    let positions: HashSet<&str> = participants
        .iter()
        .map(|p| p.participant_position.as_str())
        .collect();

    ParticipantSummary {
        total_participants: participants.len(),
        country_count: countries.len(),
        position_count: positions.len(),
        most_common_country: most_common_country(participants),
    }
}

/// The most frequent country value. Ties go to the first country encountered.
fn most_common_country(participants: &[Participant]) -> Option<CountryCount> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for participant in participants {
        let country = participant.participant_country.as_str();
        let slot = *slots.entry(country).or_insert_with(|| {
            counts.push((country, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (country, count) in counts {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((country, count)),
        }
    }

    best.map(|(country, count)| CountryCount {
        country: country.to_string(),
        count,
    })
}
