//! Batch processor — runs one fetch → classify → act → report cycle.
//!
//! The only fatal failure in a cycle is a malformed rule file. Every remote
//! failure is caught at the item level and surfaced in the report: one bad
//! message never aborts the cycle.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{ProviderError, Result};
use crate::pipeline::rules::RuleSet;
use crate::pipeline::types::{Action, CycleReport, Decision, Outcome, ReportEntry};
use crate::provider::MailProvider;

/// Default candidate query when none is given.
const UNREAD_QUERY: &str = "is:unread";

/// Hard cap on candidate messages for an explicit query.
pub const MAX_QUERY_RESULTS: usize = 50;

/// Run exactly one processing cycle.
///
/// With no query, candidates are the unread messages (unbounded); an explicit
/// query is capped at [`MAX_QUERY_RESULTS`]. Rules are reloaded from
/// `rules_path` every cycle and are immutable within it.
pub async fn run_cycle(
    provider: &dyn MailProvider,
    rules_path: &Path,
    query: Option<&str>,
    preview_length: usize,
) -> Result<CycleReport> {
    let rules = RuleSet::load(rules_path)?;
    let started_at = Utc::now();

    let ids = list_candidates(provider, query).await;
    info!(
        count = ids.len(),
        query = query.unwrap_or(UNREAD_QUERY),
        "Found candidate messages"
    );

    // Fetch and classify in listing order. A failed fetch is recorded and
    // skipped; the rest of the batch proceeds.
    let mut decisions: Vec<Decision> = Vec::new();
    let mut fetch_failures: Vec<(String, String)> = Vec::new();
    for id in &ids {
        match provider.fetch_message(id).await {
            Ok(message) => {
                let action = rules.classify(&message);
                decisions.push(Decision { message, action });
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to fetch message, skipping");
                fetch_failures.push((id.clone(), e.to_string()));
            }
        }
    }

    // Stable sort groups equal actions contiguously while keeping fetch
    // order within each group.
    decisions.sort_by_key(|d| d.action.label());

    let labels = match provider.label_names().await {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Failed to resolve label names, falling back to raw ids");
            HashMap::new()
        }
    };

    let mut entries = Vec::with_capacity(decisions.len());
    for decision in decisions {
        entries.push(apply_decision(provider, &labels, decision, preview_length).await);
    }

    info!(
        archived = entries.iter().filter(|e| e.action == Action::Archive).count(),
        deleted = entries.iter().filter(|e| e.action == Action::Delete).count(),
        manual = entries.iter().filter(|e| e.action == Action::NoOp).count(),
        fetch_failures = fetch_failures.len(),
        "Cycle complete"
    );

    Ok(CycleReport {
        started_at,
        entries,
        fetch_failures,
    })
}

/// Resolve the candidate id list for this cycle.
///
/// A listing failure yields an empty cycle rather than a fatal error — the
/// loop retries on the next tick.
async fn list_candidates(provider: &dyn MailProvider, query: Option<&str>) -> Vec<String> {
    let result = match query {
        None => provider.list_message_ids(UNREAD_QUERY, None).await,
        Some(q) => provider.list_message_ids(q, Some(MAX_QUERY_RESULTS)).await,
    };
    match result {
        Ok(mut ids) => {
            // The provider already bounds the listing; truncate anyway so the
            // cap holds regardless of pagination behavior.
            if query.is_some() {
                ids.truncate(MAX_QUERY_RESULTS);
            }
            ids
        }
        Err(e) => {
            error!(error = %e, "Failed to list candidate messages");
            Vec::new()
        }
    }
}

/// Apply one decision and produce its report entry. Remote failures are
/// recorded in the entry, never propagated.
async fn apply_decision(
    provider: &dyn MailProvider,
    labels: &HashMap<String, String>,
    decision: Decision,
    preview_length: usize,
) -> ReportEntry {
    let Decision { message, action } = decision;

    let label_names = message
        .label_ids
        .iter()
        .map(|id| labels.get(id).cloned().unwrap_or_else(|| id.clone()))
        .collect();

    let (outcome, subject, preview) = match action {
        Action::Delete => {
            let outcome = mutation_outcome(provider.trash_message(&message.id).await, &message.id, action);
            (outcome, None, None)
        }
        Action::Archive => {
            let outcome =
                mutation_outcome(provider.archive_message(&message.id).await, &message.id, action);
            (outcome, None, None)
        }
        Action::NoOp => {
            debug!(id = %message.id, "Leaving message for manual review");
            let preview = (preview_length > 0)
                .then(|| message.content.chars().take(preview_length).collect());
            (Outcome::Recommended, Some(message.subject.clone()), preview)
        }
    };

    ReportEntry {
        message_id: message.id,
        labels: label_names,
        sender: message.from,
        action,
        outcome,
        subject,
        preview,
    }
}

fn mutation_outcome(
    result: std::result::Result<(), ProviderError>,
    id: &str,
    action: Action,
) -> Outcome {
    match result {
        Ok(()) => {
            info!(id = %id, action = action.label(), "Action applied");
            Outcome::Applied
        }
        Err(e) => {
            error!(id = %id, action = action.label(), error = %e, "Action failed");
            Outcome::Failed(e.to_string())
        }
    }
}
