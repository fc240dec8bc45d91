//! Results produced by the reconciliation engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fact::ExtractedFact;

/// Shooting timestamp currently stored for an item, as read from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum CurrentState {
    Unset,
    Set(ExtractedFact),
}

impl fmt::Display for CurrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("unset"),
            Self::Set(fact) => fact.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingFilename,
    UnrecognizedFilename,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Stored date/time is rendered in a form that could not be parsed.
    UnreadableCurrentState(String),
    CreateAffordanceMissing,
    EditAffordanceMissing,
    FieldMissing(String),
    SaveAffordanceMissing,
    /// Stale reference, non-interactable element, and similar UI hiccups.
    Transient(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreadableCurrentState(detail) => write!(f, "unreadable current state: {detail}"),
            Self::CreateAffordanceMissing => f.write_str("add date/time button not found"),
            Self::EditAffordanceMissing => f.write_str("edit button not found"),
            Self::FieldMissing(field) => write!(f, "input field not found: {field}"),
            Self::SaveAffordanceMissing => f.write_str("save button not found"),
            Self::Transient(detail) => write!(f, "transient UI error: {detail}"),
        }
    }
}

/// Terminal state of one item's reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ItemOutcome {
    Changed { action: WriteAction },
    Unchanged,
    Skipped { reason: SkipReason },
    Failed { reason: FailureReason, retryable: bool },
}

impl ItemOutcome {
    pub const fn is_retryable_failure(&self) -> bool {
        matches!(self, Self::Failed { retryable: true, .. })
    }

    pub fn failed(reason: FailureReason, retryable: bool) -> Self {
        Self::Failed { reason, retryable }
    }
}

/// Everything known about one visit to an item, kept for the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub url: String,
    pub filename: Option<String>,
    pub extracted: Option<ExtractedFact>,
    pub current: Option<CurrentState>,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    pub fn new(url: impl Into<String>, outcome: ItemOutcome) -> Self {
        Self {
            url: url.into(),
            filename: None,
            extracted: None,
            current: None,
            outcome,
        }
    }
}

/// Aggregate of one pass over the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassResult {
    pub pass: u32,
    pub item_count: usize,
    pub any_changed: bool,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub retryable_failures: usize,
}

impl PassResult {
    pub fn new(pass: u32) -> Self {
        Self {
            pass,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.item_count += 1;
        match outcome {
            ItemOutcome::Changed { action } => {
                self.any_changed = true;
                match action {
                    WriteAction::Created => self.created += 1,
                    WriteAction::Updated => self.updated += 1,
                }
            }
            ItemOutcome::Unchanged => self.unchanged += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { retryable, .. } => {
                self.failed += 1;
                if *retryable {
                    self.retryable_failures += 1;
                }
            }
        }
    }

    /// The collection could not be listed; counts as one retryable failure.
    pub fn record_unresolved(&mut self) {
        self.failed += 1;
        self.retryable_failures += 1;
    }

    pub const fn changed(&self) -> usize {
        self.created + self.updated
    }

    /// A pass that changed nothing and left nothing retryable is a fixed point.
    pub const fn needs_another_pass(&self) -> bool {
        self.any_changed || self.retryable_failures > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// A full pass produced no change and no retryable failure.
    FixedPoint,
    /// The collection view listed no items.
    EmptyCollection,
    /// `max_passes` was reached while work still remained.
    PassCap,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedPoint => f.write_str("fixed point reached"),
            Self::EmptyCollection => f.write_str("collection is empty"),
            Self::PassCap => f.write_str("pass limit reached"),
        }
    }
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub passes: Vec<PassResult>,
    pub halt: HaltReason,
}

impl RunSummary {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn total_changed(&self) -> usize {
        self.passes.iter().map(PassResult::changed).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.passes.iter().map(|p| p.failed).sum()
    }
}
