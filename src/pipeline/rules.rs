//! Ordered substring rule set mapping senders to actions.
//!
//! Matching is deliberately a raw, case-sensitive substring containment test
//! against the unparsed `From` header: pattern `"spam.com"` matches
//! `"Name <user@spam.com>"` and also superstrings like `"notspam.com"`.
//! Widening this to structured address parsing would silently change matching
//! behavior; richer matching belongs in a new, explicit rule type.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::pipeline::types::{Action, MessageRecord};

/// Ordered, versioned rule set, loaded once per processing cycle and
/// immutable thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    /// Informational only — no behavior keys on this.
    pub rule_version: String,
    /// First containment match against `from` → Delete. All of these are
    /// checked before any archive pattern.
    pub from_domain_auto_delete: Vec<String>,
    /// First containment match against `from` → Archive. Checked only when no
    /// delete pattern matched.
    pub from_address_auto_archive: Vec<String>,
}

impl RuleSet {
    /// Load and validate a JSON rule file.
    ///
    /// Missing fields or wrong value types fail here, never at
    /// classification time.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::RulesIo {
            path: path.display().to_string(),
            source,
        })?;
        let rules: RuleSet =
            serde_json::from_str(&raw).map_err(|source| ConfigError::RulesParse {
                path: path.display().to_string(),
                source,
            })?;
        debug!(
            version = %rules.rule_version,
            delete_patterns = rules.from_domain_auto_delete.len(),
            archive_patterns = rules.from_address_auto_archive.len(),
            "Loaded rule set"
        );
        Ok(rules)
    }

    /// Classify one message.
    ///
    /// Pure: same (rules, message) always yields the same action, and
    /// classification itself never fails.
    pub fn classify(&self, message: &MessageRecord) -> Action {
        for pattern in &self.from_domain_auto_delete {
            if message.from.contains(pattern.as_str()) {
                debug!(id = %message.id, pattern = %pattern, "Delete pattern matched");
                return Action::Delete;
            }
        }
        for pattern in &self.from_address_auto_archive {
            if message.from.contains(pattern.as_str()) {
                debug!(id = %message.id, pattern = %pattern, "Archive pattern matched");
                return Action::Archive;
            }
        }
        Action::NoOp
    }
}
