//! End-to-end cycle tests against an in-memory mail provider.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use inbox_triage::error::{Error, ProviderError};
use inbox_triage::pipeline::processor::{MAX_QUERY_RESULTS, run_cycle};
use inbox_triage::pipeline::types::{Action, MessageRecord, Outcome};
use inbox_triage::provider::MailProvider;

/// In-memory mailbox with configurable failures and call recording.
#[derive(Default)]
struct MockProvider {
    ids: Vec<String>,
    messages: HashMap<String, MessageRecord>,
    labels: HashMap<String, String>,
    fail_fetch: HashSet<String>,
    fail_trash: bool,
    fail_labels: bool,
    listed_queries: Mutex<Vec<(String, Option<usize>)>>,
    trash_calls: Mutex<Vec<String>>,
    archive_calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn with_messages(messages: Vec<MessageRecord>) -> Self {
        Self {
            ids: messages.iter().map(|m| m.id.clone()).collect(),
            messages: messages.into_iter().map(|m| (m.id.clone(), m)).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MailProvider for MockProvider {
    async fn list_message_ids(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<String>, ProviderError> {
        self.listed_queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        // Deliberately ignores max_results: the processor owns the cap.
        Ok(self.ids.clone())
    }

    async fn fetch_message(&self, id: &str) -> Result<MessageRecord, ProviderError> {
        if self.fail_fetch.contains(id) {
            return Err(ProviderError::Api {
                endpoint: format!("messages/{id}"),
                status: 500,
            });
        }
        self.messages
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::MalformedMessage {
                id: id.to_string(),
                reason: "unknown id".into(),
            })
    }

    async fn trash_message(&self, id: &str) -> Result<(), ProviderError> {
        self.trash_calls.lock().unwrap().push(id.to_string());
        if self.fail_trash {
            return Err(ProviderError::Api {
                endpoint: format!("messages/{id}/trash"),
                status: 503,
            });
        }
        Ok(())
    }

    async fn archive_message(&self, id: &str) -> Result<(), ProviderError> {
        self.archive_calls.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn label_names(&self) -> Result<HashMap<String, String>, ProviderError> {
        if self.fail_labels {
            return Err(ProviderError::Api {
                endpoint: "labels".into(),
                status: 500,
            });
        }
        Ok(self.labels.clone())
    }
}

fn message(id: &str, from: &str, subject: &str) -> MessageRecord {
    MessageRecord {
        id: id.into(),
        subject: subject.into(),
        from: from.into(),
        to: "me@example.com".into(),
        content: "Hello there, this is the body.".into(),
        label_ids: vec!["INBOX".into()],
        headers: HashMap::new(),
    }
}

fn rules_file() -> NamedTempFile {
    write_rules(
        r#"{
            "rule_version": "2026-08-01",
            "from_domain_auto_delete": ["spam.net"],
            "from_address_auto_archive": ["newsletter@shop.com"]
        }"#,
    )
}

fn write_rules(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn end_to_end_classify_and_apply() {
    let provider = MockProvider::with_messages(vec![
        message("m1", "a@spam.net", "Win big"),
        message("m2", "newsletter@shop.com", "Weekly deals"),
        message("m3", "friend@home.org", "Lunch on Friday?"),
    ]);
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    // Sorted by action label: ARCHIVE < DELETE < NO_OP.
    let actions: Vec<Action> = report.entries.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![Action::Archive, Action::Delete, Action::NoOp]);
    assert_eq!(report.entries[0].message_id, "m2");
    assert_eq!(report.entries[1].message_id, "m1");
    assert_eq!(report.entries[2].message_id, "m3");

    // Each mutation collaborator invoked exactly once, with the right id.
    assert_eq!(*provider.trash_calls.lock().unwrap(), vec!["m1"]);
    assert_eq!(*provider.archive_calls.lock().unwrap(), vec!["m2"]);

    // Manual-review entry carries the subject and no remote mutation.
    let manual = &report.entries[2];
    assert_eq!(manual.outcome, Outcome::Recommended);
    assert_eq!(manual.subject.as_deref(), Some("Lunch on Friday?"));
    assert_eq!(manual.preview, None);
    assert_eq!(manual.sender, "friend@home.org");

    assert_eq!(report.entries[0].outcome, Outcome::Applied);
    assert_eq!(report.entries[1].outcome, Outcome::Applied);
    assert!(report.fetch_failures.is_empty());
}

#[tokio::test]
async fn default_query_is_unread_and_unbounded() {
    let provider = MockProvider::with_messages(vec![]);
    let rules = rules_file();

    run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    let listed = provider.listed_queries.lock().unwrap();
    assert_eq!(listed.as_slice(), &[("is:unread".to_string(), None)]);
}

#[tokio::test]
async fn explicit_query_is_capped_at_fifty() {
    let messages: Vec<MessageRecord> = (0..75)
        .map(|i| message(&format!("m{i:02}"), "friend@home.org", "hi"))
        .collect();
    let provider = MockProvider::with_messages(messages);
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), Some("in:inbox"), 0)
        .await
        .unwrap();

    // The mock ignores max_results; the processor truncates after retrieval.
    assert_eq!(report.entries.len(), MAX_QUERY_RESULTS);
    // Listing order preserved: the first 50 ids survive.
    assert_eq!(report.entries[0].message_id, "m00");
    assert_eq!(report.entries[49].message_id, "m49");

    let listed = provider.listed_queries.lock().unwrap();
    assert_eq!(
        listed.as_slice(),
        &[("in:inbox".to_string(), Some(MAX_QUERY_RESULTS))]
    );
}

#[tokio::test]
async fn fetch_failure_does_not_abort_the_cycle() {
    let mut provider = MockProvider::with_messages(vec![
        message("m1", "a@spam.net", "s1"),
        message("m2", "friend@home.org", "s2"),
        message("m3", "newsletter@shop.com", "s3"),
    ]);
    provider.fail_fetch.insert("m2".into());
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.fetch_failures.len(), 1);
    assert_eq!(report.fetch_failures[0].0, "m2");
    assert_eq!(*provider.trash_calls.lock().unwrap(), vec!["m1"]);
    assert_eq!(*provider.archive_calls.lock().unwrap(), vec!["m3"]);
}

#[tokio::test]
async fn grouping_is_stable_within_an_action() {
    let provider = MockProvider::with_messages(vec![
        message("a", "friend@home.org", "first noop"),
        message("b", "x@spam.net", "delete me"),
        message("c", "other@home.org", "second noop"),
    ]);
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    let noop_ids: Vec<&str> = report
        .entries
        .iter()
        .filter(|e| e.action == Action::NoOp)
        .map(|e| e.message_id.as_str())
        .collect();
    assert_eq!(noop_ids, vec!["a", "c"]);
}

#[tokio::test]
async fn trash_failure_is_reported_not_fatal() {
    let mut provider = MockProvider::with_messages(vec![
        message("m1", "a@spam.net", "s1"),
        message("m2", "friend@home.org", "s2"),
    ]);
    provider.fail_trash = true;
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    let delete_entry = report
        .entries
        .iter()
        .find(|e| e.action == Action::Delete)
        .unwrap();
    assert!(matches!(delete_entry.outcome, Outcome::Failed(_)));

    // The other message is still classified and reported.
    assert!(report.entries.iter().any(|e| e.action == Action::NoOp));
}

#[tokio::test]
async fn label_names_resolve_with_raw_id_fallback() {
    let mut msg = message("m1", "friend@home.org", "s");
    msg.label_ids = vec!["Label_7".into(), "INBOX".into()];
    let mut provider = MockProvider::with_messages(vec![msg]);
    provider.labels.insert("Label_7".into(), "Receipts".into());
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    // Resolved where known, raw id where not.
    assert_eq!(report.entries[0].labels, vec!["Receipts", "INBOX"]);
}

#[tokio::test]
async fn label_resolution_failure_falls_back_to_raw_ids() {
    let mut provider = MockProvider::with_messages(vec![message("m1", "friend@home.org", "s")]);
    provider.fail_labels = true;
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    assert_eq!(report.entries[0].labels, vec!["INBOX"]);
}

#[tokio::test]
async fn preview_is_truncated_to_configured_length() {
    let provider = MockProvider::with_messages(vec![message("m1", "friend@home.org", "s")]);
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 11).await.unwrap();

    assert_eq!(report.entries[0].preview.as_deref(), Some("Hello there"));
}

#[tokio::test]
async fn zero_preview_length_disables_preview() {
    let provider = MockProvider::with_messages(vec![message("m1", "friend@home.org", "s")]);
    let rules = rules_file();

    let report = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    assert_eq!(report.entries[0].preview, None);
}

#[tokio::test]
async fn malformed_rules_are_fatal() {
    let provider = MockProvider::with_messages(vec![message("m1", "a@spam.net", "s")]);
    let rules = write_rules(r#"{"rule_version": "1"}"#);

    let err = run_cycle(&provider, rules.path(), None, 0).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    // Nothing was listed or mutated.
    assert!(provider.listed_queries.lock().unwrap().is_empty());
    assert!(provider.trash_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn classification_is_repeatable_across_cycles() {
    let provider = MockProvider::with_messages(vec![message("m1", "newsletter@shop.com", "s")]);
    let rules = rules_file();

    let first = run_cycle(&provider, rules.path(), None, 0).await.unwrap();
    let second = run_cycle(&provider, rules.path(), None, 0).await.unwrap();

    assert_eq!(first.entries[0].action, Action::Archive);
    assert_eq!(second.entries[0].action, Action::Archive);
    // One archive call per cycle: no dedup across cycles, retry via re-poll.
    assert_eq!(*provider.archive_calls.lock().unwrap(), vec!["m1", "m1"]);
}
