//! Classification-and-dispatch pipeline.
//!
//! One processing cycle flows through:
//! 1. `RuleSet::load()` — rules from disk, fail-fast on malformed input
//! 2. `MailProvider::list_message_ids()` / `fetch_message()` — candidate fetch
//! 3. `RuleSet::classify()` — pure substring matching, first match wins
//! 4. Stable sort by action, grouping contiguous equal-action runs
//! 5. Action application with per-item success/failure accounting

pub mod processor;
pub mod rules;
pub mod types;
