//! Offline report generation.
//!
//! This module renders the per-question statistics as a Markdown document
//! or as pretty-printed JSON.

use crate::config::ReportConfig;
use crate::models::{
    CodedResponse, DemographicField, DescriptiveCodeUsage, InVivoCodeUsage, ParticipantBreakdown,
    QuestionData, Report, ReportMetadata,
};
use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;

/// Assemble a report from computed question data.
pub fn build_report(data_source: &str, questions: Vec<QuestionData>, duration_seconds: f64) -> Report {
    let response_count = questions.iter().map(|q| q.total_responses).sum();
    let participant_count = questions
        .iter()
        .flat_map(|q| q.participants.iter().map(|p| p.participant_id.as_str()))
        .collect::<HashSet<_>>()
        .len();

    Report {
        metadata: ReportMetadata {
            data_source: data_source.to_string(),
            generated_at: Utc::now(),
            question_count: questions.len(),
            response_count,
            participant_count,
            duration_seconds,
        },
        questions,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, config: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Survey Coding Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    if report.questions.is_empty() {
        output.push_str("No questions were found in the dataset.\n\n");
    }

    for data in &report.questions {
        output.push_str(&generate_question_section(data, config));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Source:** `{}`\n", metadata.data_source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Questions:** {}\n", metadata.question_count));
    section.push_str(&format!("- **Responses:** {}\n", metadata.response_count));
    section.push_str(&format!("- **Participants:** {}\n", metadata.participant_count));
    section.push_str(&format!(
        "- **Computation Time:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    for data in &report.questions {
        toc.push_str(&format!(
            "- [{}](#{})\n",
            data.question.question_id,
            anchor(&data.question.question_id)
        ));
    }

    toc.push('\n');

    toc
}

/// Generate the section for one question.
fn generate_question_section(data: &QuestionData, config: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", data.question.question_id));
    if !data.question.question_text.is_empty() {
        section.push_str(&format!("> {}\n\n", data.question.question_text));
    }

    section.push_str(&generate_metrics_table(data));
    section.push_str(&generate_descriptive_usage_table(
        &data.descriptive_code_usage,
        config.max_rows,
    ));
    section.push_str(&generate_invivo_table(&data.top_invivo_codes));
    section.push_str(&generate_breakdown_section(&data.participant_breakdown));

    if config.include_responses {
        section.push_str(&generate_responses_section(&data.coded_responses));
    }

    section
}

/// Generate the headline metrics.
fn generate_metrics_table(data: &QuestionData) -> String {
    let most_used = match data.most_used_descriptive_code {
        Some(ref usage) => format!(
            "{} ({})",
            escape_cell(&usage.code.category_plain_text),
            usage.response_count
        ),
        None => "-".to_string(),
    };

    let mut table = String::new();
    table.push_str("| Total Responses | Avg. Codes / Response | Responses w/o Codes | Most Used Code |\n");
    table.push_str("|:---:|:---:|:---:|:---|\n");
    table.push_str(&format!(
        "| {} | {:.2} | {} | {} |\n\n",
        data.total_responses,
        data.avg_descriptive_codes_per_response,
        data.responses_without_descriptive_codes,
        most_used
    ));

    table
}

/// Generate the descriptive code usage table.
fn generate_descriptive_usage_table(usage: &[DescriptiveCodeUsage], max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("### Descriptive Code Usage\n\n");

    if usage.is_empty() {
        section.push_str("No descriptive codes for this question.\n\n");
        return section;
    }

    section.push_str("| Code | Label | Responses | Occurrences | % of Responses |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|\n");

    for entry in usage.iter().take(max_rows) {
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            entry.code.category_id,
            escape_cell(&entry.code.category_plain_text),
            entry.response_count,
            entry.occurrence_count,
            percent(entry.response_percentage)
        ));
    }

    if usage.len() > max_rows {
        section.push_str(&format!("\n*{} more codes not shown.*\n", usage.len() - max_rows));
    }
    section.push('\n');

    section
}

/// Generate the top in-vivo codes table.
fn generate_invivo_table(top: &[InVivoCodeUsage]) -> String {
    let mut section = String::new();

    section.push_str("### Top In-Vivo Codes\n\n");

    if top.is_empty() {
        section.push_str("No in-vivo codes.\n\n");
        return section;
    }

    section.push_str("| Code | Responses | Occurrences | % of Responses |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for entry in top {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&entry.code_text),
            entry.response_count,
            entry.occurrence_count,
            percent(entry.response_percentage)
        ));
    }
    section.push('\n');

    section
}

/// Generate the participant breakdown tables.
fn generate_breakdown_section(breakdown: &ParticipantBreakdown) -> String {
    let mut section = String::new();

    section.push_str("### Participant Breakdown\n\n");

    if breakdown.is_empty() {
        section.push_str("No participant data.\n\n");
        return section;
    }

    for field in DemographicField::ALL {
        let mut entries: Vec<_> = breakdown.table(field).iter().collect();
        entries.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        section.push_str(&format!("| {} | Participants |\n", field));
        section.push_str("|:---|:---:|\n");
        for (key, count) in entries {
            section.push_str(&format!("| {} | {} |\n", escape_cell(display_key(key)), count));
        }
        section.push('\n');
    }

    section
}

/// Generate the raw responses list.
fn generate_responses_section(responses: &[CodedResponse]) -> String {
    let mut section = String::new();

    section.push_str("### Responses\n\n");

    if responses.is_empty() {
        section.push_str("No responses.\n\n");
        return section;
    }

    for response in responses {
        let codes: Vec<&str> = response
            .descriptive_codes
            .iter()
            .map(|c| c.category_plain_text.as_str())
            .collect();

        section.push_str(&format!(
            "- **{}:** {}\n",
            response.participant_id,
            response.original_response.replace('\n', " ")
        ));
        if !codes.is_empty() {
            section.push_str(&format!("  - Codes: {}\n", codes.join(", ")));
        }
        if let Some(ref invivo) = response.invivo_codes {
            if !invivo.trim().is_empty() {
                section.push_str(&format!("  - In-vivo: {}\n", invivo.trim()));
            }
        }
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by codedash v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Empty demographic values are shown as `Unknown`.
fn display_key(key: &str) -> &str {
    if key.trim().is_empty() {
        "Unknown"
    } else {
        key
    }
}

/// GitHub-style heading anchor.
fn anchor(heading: &str) -> String {
    heading
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_' || *c == ' ')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::aggregate;
    use crate::models::{DescriptiveCode, Participant, Question};

    fn create_test_questions() -> Vec<QuestionData> {
        let code = DescriptiveCode {
            category_id: "WRK".to_string(),
            category_plain_text: "Workload".to_string(),
            category_description: String::new(),
        };
        let questions = vec![
            Question {
                question_id: "Q1".to_string(),
                question_text: "What is hardest?".to_string(),
            },
            Question {
                question_id: "Q2".to_string(),
                question_text: "Anything else?".to_string(),
            },
        ];
        let participants = vec![Participant {
            participant_id: "P1".to_string(),
            participant_country: String::new(),
            participant_position: "Nurse".to_string(),
            participant_experience: "5".to_string(),
        }];
        let responses = vec![CodedResponse {
            participant_id: "P1".to_string(),
            question_id: "Q1".to_string(),
            original_response: "Too many patients".to_string(),
            invivo_codes: Some("too many patients".to_string()),
            descriptive_codes: vec![code],
        }];

        aggregate(&questions, &responses, &participants)
    }

    #[test]
    fn test_build_report_metadata() {
        let report = build_report("data", create_test_questions(), 0.25);

        assert_eq!(report.metadata.question_count, 2);
        assert_eq!(report.metadata.response_count, 1);
        assert_eq!(report.metadata.participant_count, 1);
        assert_eq!(report.metadata.data_source, "data");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = build_report("data", create_test_questions(), 0.25);
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Survey Coding Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Q1"));
        assert!(markdown.contains("What is hardest?"));
        assert!(markdown.contains("| `WRK` | Workload | 1 | 1 | 100.0% |"));
        assert!(markdown.contains("too many patients"));
        assert!(markdown.contains("| Unknown | 1 |"));
        assert!(markdown.contains("No descriptive codes for this question."));
        assert!(!markdown.contains("### Responses"));
    }

    #[test]
    fn test_markdown_includes_responses_when_enabled() {
        let report = build_report("data", create_test_questions(), 0.0);
        let config = ReportConfig {
            include_responses: true,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&report, &config);

        assert!(markdown.contains("### Responses"));
        assert!(markdown.contains("- **P1:** Too many patients"));
        assert!(markdown.contains("  - Codes: Workload"));
    }

    #[test]
    fn test_descriptive_table_truncates_rows() {
        let code = |id: &str| DescriptiveCodeUsage {
            code: DescriptiveCode {
                category_id: id.to_string(),
                category_plain_text: id.to_string(),
                category_description: String::new(),
            },
            response_count: 1,
            occurrence_count: 1,
            response_percentage: 0.5,
        };
        let usage = vec![code("A"), code("B"), code("C")];

        let table = generate_descriptive_usage_table(&usage, 2);
        assert!(table.contains("`A`"));
        assert!(table.contains("`B`"));
        assert!(!table.contains("`C`"));
        assert!(table.contains("1 more codes not shown"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
        assert_eq!(display_key(""), "Unknown");
        assert_eq!(display_key("Kenya"), "Kenya");
    }

    #[test]
    fn test_generate_json_report() {
        let report = build_report("data", create_test_questions(), 0.25);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"questions\""));
        assert!(json.contains("\"descriptiveCodeUsage\""));
        assert!(json.contains("\"topInvivoCodes\""));
    }
}
