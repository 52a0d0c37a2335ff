//! Per-question aggregation of coded responses.
//!
//! This module turns the question catalog, the resolved responses and the
//! participant catalog into one [`QuestionData`] summary per question:
//! descriptive code usage, in-vivo token usage, participant breakdowns and a
//! few derived scalars. It is a pure pass over in-memory snapshots; all state
//! lives in locals and is dropped when the call returns.

use crate::models::{
    CodedResponse, DescriptiveCode, DescriptiveCodeUsage, InVivoCodeUsage, Participant,
    ParticipantBreakdown, Question, QuestionData,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default number of in-vivo tokens in the `top_invivo_codes` view.
pub const DEFAULT_TOP_INVIVO: usize = 5;

/// How descriptive code occurrences feed `response_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptiveCounting {
    /// Every occurrence increments `response_count`, so a response listing a
    /// code twice counts twice and the percentage can exceed 1.
    #[default]
    EveryOccurrence,
    /// A response contributes at most once per code to `response_count`.
    DistinctPerResponse,
}

/// Tuning knobs for [`aggregate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub top_invivo_limit: usize,
    pub descriptive_counting: DescriptiveCounting,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_invivo_limit: DEFAULT_TOP_INVIVO,
            descriptive_counting: DescriptiveCounting::default(),
        }
    }
}

/// Aggregate with default options. One entry per question, in input order.
#[allow(dead_code)] // Default-options entry point; the binary passes configured options
pub fn aggregate(
    questions: &[Question],
    responses: &[CodedResponse],
    participants: &[Participant],
) -> Vec<QuestionData> {
    aggregate_with(questions, responses, participants, &AggregateOptions::default())
}

/// Aggregate every question. One entry per question, in input order.
pub fn aggregate_with(
    questions: &[Question],
    responses: &[CodedResponse],
    participants: &[Participant],
    options: &AggregateOptions,
) -> Vec<QuestionData> {
    debug!(
        "Aggregating {} questions over {} responses and {} participants",
        questions.len(),
        responses.len(),
        participants.len()
    );

    let by_question = group_by_question(responses);

    questions
        .iter()
        .map(|question| {
            let for_question = by_question
                .get(question.question_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            summarize_question(question, for_question, participants, options)
        })
        .collect()
}

/// Group responses by question id, keeping input order within each group.
pub fn group_by_question(responses: &[CodedResponse]) -> HashMap<&str, Vec<&CodedResponse>> {
    let mut grouped: HashMap<&str, Vec<&CodedResponse>> = HashMap::new();

    for response in responses {
        grouped
            .entry(response.question_id.as_str())
            .or_default()
            .push(response);
    }

    grouped
}

/// Build the summary for a single question from its responses.
pub fn summarize_question(
    question: &Question,
    responses: &[&CodedResponse],
    participants: &[Participant],
    options: &AggregateOptions,
) -> QuestionData {
    let total_responses = responses.len();

    let descriptive_code_usage =
        descriptive_code_usage(responses, total_responses, options.descriptive_counting);
    let most_used_descriptive_code = descriptive_code_usage.first().cloned();

    let invivo_code_usage = invivo_code_usage(responses, total_responses);
    let top_invivo_codes: Vec<InVivoCodeUsage> = invivo_code_usage
        .iter()
        .take(options.top_invivo_limit)
        .cloned()
        .collect();

    let participants = participants_for_question(responses, participants);
    let participant_breakdown = ParticipantBreakdown::from_participants(&participants);

    let responses_without_descriptive_codes =
        responses.iter().filter(|r| r.is_uncoded()).count();
    let code_total: usize = responses.iter().map(|r| r.descriptive_codes.len()).sum();

    QuestionData {
        question: question.clone(),
        coded_responses: responses.iter().map(|r| (*r).clone()).collect(),
        total_responses,
        responses_without_descriptive_codes,
        avg_descriptive_codes_per_response: ratio(code_total, total_responses),
        descriptive_code_usage,
        most_used_descriptive_code,
        invivo_code_usage,
        top_invivo_codes,
        participants,
        participant_breakdown,
    }
}

/// `count / total`, or 0 when `total` is 0.
pub fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

struct DescriptiveTally<'a> {
    code: &'a DescriptiveCode,
    response_count: usize,
    occurrence_count: usize,
}

/// Count descriptive code usage, most used first. Ties keep first-seen order.
pub fn descriptive_code_usage(
    responses: &[&CodedResponse],
    total_responses: usize,
    counting: DescriptiveCounting,
) -> Vec<DescriptiveCodeUsage> {
    let mut tallies: Vec<DescriptiveTally> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for response in responses {
        let mut seen: HashSet<&str> = HashSet::new();

        for code in &response.descriptive_codes {
            let id = code.category_id.as_str();
            let slot = *slots.entry(id).or_insert_with(|| {
                tallies.push(DescriptiveTally {
                    code,
                    response_count: 0,
                    occurrence_count: 0,
                });
                tallies.len() - 1
            });

            let tally = &mut tallies[slot];
            tally.occurrence_count += 1;

            let first_in_response = seen.insert(id);
            if counting == DescriptiveCounting::EveryOccurrence || first_in_response {
                tally.response_count += 1;
            }
        }
    }

    let mut usage: Vec<DescriptiveCodeUsage> = tallies
        .into_iter()
        .map(|t| DescriptiveCodeUsage {
            code: t.code.clone(),
            response_count: t.response_count,
            occurrence_count: t.occurrence_count,
            response_percentage: ratio(t.response_count, total_responses),
        })
        .collect();

    usage.sort_by_key(|u| std::cmp::Reverse(u.response_count));
    usage
}

/// Split an in-vivo field into trimmed, non-empty tokens.
pub fn split_invivo_codes(invivo_codes: Option<&str>) -> Vec<&str> {
    match invivo_codes {
        Some(codes) => codes
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// Count in-vivo token usage, most used first. Ties keep first-seen order.
///
/// A response contributes at most once per distinct token to `response_count`
/// but every repeat to `occurrence_count`.
pub fn invivo_code_usage(responses: &[&CodedResponse], total_responses: usize) -> Vec<InVivoCodeUsage> {
    let mut usage: Vec<InVivoCodeUsage> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for response in responses {
        let mut seen: HashSet<&str> = HashSet::new();

        for token in split_invivo_codes(response.invivo_codes.as_deref()) {
            let slot = *slots.entry(token).or_insert_with(|| {
                usage.push(InVivoCodeUsage {
                    code_text: token.to_string(),
                    response_count: 0,
                    occurrence_count: 0,
                    response_percentage: 0.0,
                });
                usage.len() - 1
            });

            let entry = &mut usage[slot];
            entry.occurrence_count += 1;
            if seen.insert(token) {
                entry.response_count += 1;
            }
        }
    }

    for entry in &mut usage {
        entry.response_percentage = ratio(entry.response_count, total_responses);
    }

    usage.sort_by_key(|u| std::cmp::Reverse(u.response_count));
    usage
}

/// Catalog participants referenced by the responses, in catalog order.
pub fn participants_for_question(
    responses: &[&CodedResponse],
    participants: &[Participant],
) -> Vec<Participant> {
    let ids: HashSet<&str> = responses.iter().map(|r| r.participant_id.as_str()).collect();

    participants
        .iter()
        .filter(|p| ids.contains(p.participant_id.as_str()))
        .cloned()
        .collect()
}
