//! Diff & Impact Reporter (§4.10, C10).
//!
//! Turns a [`Journal`] into a pure, serializable [`Summary`] value: totals
//! by action and kind, a per-context breakdown, and the ordered list of
//! change-records the journal already holds. This crate never touches the
//! tree — external renderers (JSON/CSV/table/HTML, out of scope per §1)
//! format the `Summary` however they like; `serde_json::to_string` already
//! works on it unformatted.

use std::collections::BTreeMap;

use panflow_model::{Action, ChangeRecord, Journal};
use serde::{Deserialize, Serialize};

fn action_label(action: Action) -> &'static str {
    match action {
        Action::Add => "add",
        Action::Delete => "delete",
        Action::Update => "update",
        Action::Rename => "rename",
        Action::Move => "move",
        Action::ReplaceRef => "replace_ref",
        Action::Skipped => "skipped",
    }
}

/// Per-context rollup: how many change-records of each action touched this
/// context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextBreakdown {
    pub context: String,
    pub total: usize,
    pub by_action: BTreeMap<String, usize>,
}

/// A pure summary of a journal's contents (§4.10). Produced once per
/// invocation from the final journal; carries no reference back to the
/// tree or the journal it was built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub by_action: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
    pub by_context: Vec<ContextBreakdown>,
    pub records: Vec<ChangeRecord>,
}

impl Summary {
    /// Number of `skipped` records, i.e. per-entity recoverable failures
    /// (§7) the orchestrator logged rather than aborting on.
    pub fn skipped_count(&self) -> usize {
        self.by_action.get(action_label(Action::Skipped)).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Summarizes a journal. Pure: takes a reference, returns an owned value,
/// touches nothing else (§4.10 "the reporter never touches the tree").
pub fn summarize(journal: &Journal) -> Summary {
    let mut by_action: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    let mut contexts: Vec<String> = Vec::new();
    let mut by_context: BTreeMap<String, ContextBreakdown> = BTreeMap::new();

    for record in journal.entries() {
        let action = action_label(record.action).to_string();
        *by_action.entry(action.clone()).or_insert(0) += 1;
        *by_kind.entry(record.kind.clone()).or_insert(0) += 1;

        let entry = by_context.entry(record.context.clone()).or_insert_with(|| {
            contexts.push(record.context.clone());
            ContextBreakdown { context: record.context.clone(), total: 0, by_action: BTreeMap::new() }
        });
        entry.total += 1;
        *entry.by_action.entry(action).or_insert(0) += 1;
    }

    // Preserve first-seen order of contexts rather than the BTreeMap's
    // lexicographic one, so a reader sees containers in the order they were
    // touched (§4.10's "ordered list", extended to the per-context rollup).
    let by_context = contexts
        .into_iter()
        .map(|ctx| by_context.remove(&ctx).expect("just inserted"))
        .collect();

    Summary {
        total: journal.len(),
        by_action,
        by_kind,
        by_context,
        records: journal.entries().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panflow_model::Action;

    fn record(action: Action, kind: &str, name: &str, context: &str) -> ChangeRecord {
        ChangeRecord::new(action, kind, name, context)
    }

    #[test]
    fn empty_journal_summarizes_to_zero() {
        let journal = Journal::new();
        let summary = summarize(&journal);
        assert_eq!(summary.total, 0);
        assert!(summary.by_action.is_empty());
        assert!(summary.by_context.is_empty());
        assert!(summary.records.is_empty());
    }

    #[test]
    fn totals_by_action_and_kind() {
        let mut journal = Journal::new();
        journal.record(record(Action::Delete, "address", "H1_alt", "vsys:vsys1"));
        journal.record(record(Action::ReplaceRef, "address", "H1_alt", "vsys:vsys1"));
        journal.record(record(Action::Update, "security-rule", "R1", "vsys:vsys1"));

        let summary = summarize(&journal);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_action["delete"], 1);
        assert_eq!(summary.by_action["replace_ref"], 1);
        assert_eq!(summary.by_action["update"], 1);
        assert_eq!(summary.by_kind["address"], 2);
        assert_eq!(summary.by_kind["security-rule"], 1);
    }

    #[test]
    fn per_context_breakdown_preserves_first_seen_order() {
        let mut journal = Journal::new();
        journal.record(record(Action::Update, "security-rule", "R1", "vsys:vsys2"));
        journal.record(record(Action::Delete, "address", "H2", "vsys:vsys1"));
        journal.record(record(Action::Update, "security-rule", "R3", "vsys:vsys2"));

        let summary = summarize(&journal);
        assert_eq!(summary.by_context.len(), 2);
        assert_eq!(summary.by_context[0].context, "vsys:vsys2");
        assert_eq!(summary.by_context[0].total, 2);
        assert_eq!(summary.by_context[1].context, "vsys:vsys1");
        assert_eq!(summary.by_context[1].total, 1);
    }

    #[test]
    fn skipped_count_tracks_recoverable_failures() {
        let mut journal = Journal::new();
        journal.record(ChangeRecord::skipped("address", "A1", "shared", "still referenced"));
        journal.record(record(Action::Delete, "address", "A2", "shared"));

        let summary = summarize(&journal);
        assert_eq!(summary.skipped_count(), 1);
    }

    #[test]
    fn serializes_to_json() {
        let mut journal = Journal::new();
        journal.record(record(Action::Add, "tag", "reviewed", "local"));
        let summary = summarize(&journal);
        let json = summary.to_json().expect("serializes");
        assert!(json.contains("\"total\": 1"));
    }
}
