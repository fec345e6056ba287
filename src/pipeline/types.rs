//! Shared types for the classification pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel body text for messages with no decodable content.
pub const NO_CONTENT: &str = "No content";

// ── Message record ──────────────────────────────────────────────────

/// Normalized representation of a fetched message.
///
/// Constructed fresh from a remote fetch each cycle and discarded when the
/// cycle completes — nothing is cached or deduplicated across cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Opaque message id, unique per remote mailbox.
    pub id: String,
    /// Subject header value.
    pub subject: String,
    /// Raw `From` header — may contain display name + address.
    pub from: String,
    /// Raw `To` header.
    pub to: String,
    /// Decoded body text, best-effort. [`NO_CONTENT`] when absent.
    pub content: String,
    /// Ordered label ids as returned by the provider.
    pub label_ids: Vec<String>,
    /// Raw header mapping. Last-wins for duplicate header names.
    pub headers: HashMap<String, String>,
}

// ── Action ──────────────────────────────────────────────────────────

/// Outcome of classifying a message. Tag only, no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Remove INBOX/UNREAD labels for the message.
    Archive,
    /// Move the message to the trash.
    Delete,
    /// No remote mutation — leave for manual review.
    NoOp,
}

impl Action {
    /// Stable report label. Lexicographic order of these labels is the
    /// cycle's sort key: ARCHIVE < DELETE < NO_OP.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Archive => "ARCHIVE",
            Self::Delete => "DELETE",
            Self::NoOp => "NO_OP",
        }
    }
}

// ── Decision ────────────────────────────────────────────────────────

/// A (message, action) pair produced by classification. In-cycle only.
#[derive(Debug, Clone)]
pub struct Decision {
    pub message: MessageRecord,
    pub action: Action,
}

// ── Report ──────────────────────────────────────────────────────────

/// Result of applying (or not applying) an action to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Remote mutation succeeded.
    Applied,
    /// Remote mutation failed. The message stays in the candidate set and is
    /// retried via re-poll on the next cycle.
    Failed(String),
    /// No mutation attempted — the action was a recommendation only.
    Recommended,
}

/// One report entry per classified message.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub message_id: String,
    /// Label names resolved through the provider, raw ids where unresolved.
    pub labels: Vec<String>,
    /// Raw `From` header of the message.
    pub sender: String,
    pub action: Action,
    pub outcome: Outcome,
    /// Subject line, reported for manual-review entries only.
    pub subject: Option<String>,
    /// Content preview for manual-review entries, when a preview length is
    /// configured.
    pub preview: Option<String>,
}

/// Outcome of one full fetch → classify → act → report pass.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// Entries grouped by action: equal-action runs are contiguous, and
    /// records inside a run keep their original fetch order.
    pub entries: Vec<ReportEntry>,
    /// Messages whose detail fetch failed: (id, error).
    pub fetch_failures: Vec<(String, String)>,
}

impl CycleReport {
    /// Number of entries with the given action.
    pub fn action_count(&self, action: Action) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }
}
