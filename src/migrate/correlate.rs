use super::rules::{MIN_SHARED_SUMMARY_WORDS, SUMMARY_STOPWORDS};
use crate::spec::{Operation, OperationCatalog};
use std::collections::BTreeSet;
use tracing::debug;

/// How a target operation was matched to a legacy one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    ExactId,
    Containment,
    SharedSummary,
}

fn normalize_path(path: &str) -> String {
    path.trim().trim_end_matches('/').to_lowercase()
}

fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn summary_words(op: &Operation) -> BTreeSet<String> {
    op.summary
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !SUMMARY_STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Legacy operation corresponding to `target`, with the rule that matched.
///
/// Rules, first hit wins, candidates in catalog order:
/// 1. same id;
/// 2. normalized path or lower-cased id of one contains the other's;
/// 3. at least two shared significant summary words.
pub fn correlate<'a>(legacy: &'a OperationCatalog, target: &Operation) -> Option<(&'a Operation, MatchKind)> {
    if let Some(op) = legacy.get(&target.id) {
        return Some((op, MatchKind::ExactId));
    }

    let target_path = normalize_path(&target.path);
    let target_id = target.id.to_lowercase();
    if let Some(op) = legacy.operations().iter().find(|op| {
        contains_either(&normalize_path(&op.path), &target_path)
            || contains_either(&op.id.to_lowercase(), &target_id)
    }) {
        return Some((op, MatchKind::Containment));
    }

    let target_words = summary_words(target);
    legacy
        .operations()
        .iter()
        .find(|op| summary_words(op).intersection(&target_words).count() >= MIN_SHARED_SUMMARY_WORDS)
        .map(|op| (op, MatchKind::SharedSummary))
}

/// Legacy counterpart of `target`; `None` is an expected outcome.
pub fn find_legacy_operation<'a>(legacy: &'a OperationCatalog, target: &Operation) -> Option<&'a Operation> {
    let found = correlate(legacy, target);
    match &found {
        Some((op, kind)) => debug!(target = %target.id, legacy = %op.id, ?kind, "correlated operation"),
        None => debug!(target = %target.id, "no legacy counterpart"),
    }
    found.map(|(op, _)| op)
}
