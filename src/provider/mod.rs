//! Mail provider seam — pure I/O, no classification logic.
//!
//! The pipeline drives a [`MailProvider`] and never talks to a transport
//! directly. Implementations hold their own authenticated session; there is
//! no process-wide credential state.

pub mod gmail;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::pipeline::types::MessageRecord;

/// Abstract mailbox collaborator the pipeline consumes.
///
/// Every method is an independent remote call: it either completes or returns
/// an error the pipeline records for that one item. No retries, no
/// transactions around mutations.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// List candidate message ids matching `query`, in listing order.
    ///
    /// The listing may paginate internally; at most `max_results` ids are
    /// returned when set, unbounded otherwise.
    async fn list_message_ids(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<String>, ProviderError>;

    /// Fetch the full record for one message.
    async fn fetch_message(&self, id: &str) -> Result<MessageRecord, ProviderError>;

    /// Move one message to the trash.
    async fn trash_message(&self, id: &str) -> Result<(), ProviderError>;

    /// Archive one message by removing its INBOX and UNREAD labels.
    async fn archive_message(&self, id: &str) -> Result<(), ProviderError>;

    /// Map of label id → human-readable name.
    async fn label_names(&self) -> Result<HashMap<String, String>, ProviderError>;
}
