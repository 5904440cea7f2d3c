use serde::{Deserialize, Serialize};

/// The action a change-record describes (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Delete,
    Update,
    Rename,
    Move,
    ReplaceRef,
    /// An entity the orchestrator could not touch (per-entity recoverable
    /// failure, §7); `reason` carries the `PanflowError` display text.
    Skipped,
}

/// One entry in the in-memory journal. Produced by every mutation; pure
/// data, never touches the tree itself (§3, §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub action: Action,
    pub kind: String,
    pub name: String,
    pub context: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub reason: Option<String>,
}

impl ChangeRecord {
    pub fn new(action: Action, kind: impl Into<String>, name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            action,
            kind: kind.into(),
            name: name.into(),
            context: context.into(),
            before: None,
            after: None,
            reason: None,
        }
    }

    pub fn with_before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }

    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn skipped(kind: impl Into<String>, name: impl Into<String>, context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(Action::Skipped, kind, name, context).with_reason(reason)
    }
}

/// Accumulates change-records for the duration of one invocation. Discarded
/// at exit (§3 Lifecycle); `panflow-report` turns a `&Journal` into a
/// `Summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<ChangeRecord>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ChangeRecord) {
        self.entries.push(record);
    }

    pub fn entries(&self) -> &[ChangeRecord] {
        &self.entries
    }

    pub fn extend(&mut self, other: Journal) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
