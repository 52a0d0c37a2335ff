//! Descriptive code resolution.
//!
//! Response rows reference descriptive codes by a comma-separated id list.
//! Resolution joins that list against the code catalog.
//!
//! The join is lenient: an id with no catalog entry is dropped from the
//! response without an error, so a stale or mistyped id never fails the
//! whole response.

use crate::models::{CodedResponse, DescriptiveCode, RawCodedResponse};
use std::collections::HashMap;
use tracing::debug;

/// Split a raw id list into tokens.
///
/// All whitespace is removed before splitting on commas. An absent or empty
/// list yields no tokens.
pub fn split_descriptive_ids(ids: Option<&str>) -> Vec<String> {
    let compact: String = match ids {
        Some(ids) => ids.chars().filter(|c| !c.is_whitespace()).collect(),
        None => return Vec::new(),
    };

    if compact.is_empty() {
        return Vec::new();
    }

    compact.split(',').map(String::from).collect()
}

/// Catalog lookup keyed by `category_id`. The first entry wins on duplicate ids.
pub struct CodeIndex<'a> {
    by_id: HashMap<&'a str, &'a DescriptiveCode>,
}

impl<'a> CodeIndex<'a> {
    pub fn new(catalog: &'a [DescriptiveCode]) -> Self {
        let mut by_id = HashMap::with_capacity(catalog.len());
        for code in catalog {
            by_id.entry(code.category_id.as_str()).or_insert(code);
        }
        Self { by_id }
    }

    pub fn get(&self, category_id: &str) -> Option<&'a DescriptiveCode> {
        self.by_id.get(category_id).copied()
    }

    /// Resolve one raw row. Returns the response and the number of dropped ids.
    pub fn resolve_one(&self, raw: &RawCodedResponse) -> (CodedResponse, usize) {
        let tokens = split_descriptive_ids(raw.descriptive_ids.as_deref());
        let mut dropped = 0;

        let codes: Vec<DescriptiveCode> = tokens
            .iter()
            .filter_map(|token| {
                let found = self.get(token).cloned();
                if found.is_none() {
                    dropped += 1;
                }
                found
            })
            .collect();

        (CodedResponse::from_raw(raw, codes), dropped)
    }
}

/// Resolve every raw response against the catalog, preserving input order.
pub fn resolve(raw_responses: &[RawCodedResponse], catalog: &[DescriptiveCode]) -> Vec<CodedResponse> {
    let index = CodeIndex::new(catalog);
    let mut dropped_total = 0;

    let resolved: Vec<CodedResponse> = raw_responses
        .iter()
        .map(|raw| {
            let (response, dropped) = index.resolve_one(raw);
            dropped_total += dropped;
            response
        })
        .collect();

    if dropped_total > 0 {
        debug!(
            "Dropped {} descriptive id(s) with no catalog entry across {} responses",
            dropped_total,
            raw_responses.len()
        );
    }

    resolved
}
