//! Gmail REST API provider.
//!
//! Implements [`MailProvider`] over the Gmail API v1:
//! - `users.messages.list` for candidate ids (paginated)
//! - `users.messages.get` (format=full) for message details
//! - `users.messages.trash` / `users.messages.modify` for actions
//! - `users.labels.list` for the label id → name map
//!
//! Authentication is a bearer access token supplied by the environment,
//! validated once at connect time against the profile endpoint. There is no
//! refresh flow: an expired token surfaces as an auth error and the program
//! exits rather than limping along unauthenticated.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::MailProvider;
use crate::error::{ConfigError, ProviderError};
use crate::pipeline::types::{MessageRecord, NO_CONTENT};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Label ids removed when archiving a message.
const ARCHIVE_REMOVE_LABELS: [&str; 2] = ["INBOX", "UNREAD"];

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<MessageRef>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    label_ids: Option<Vec<String>>,
    payload: Option<MessagePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload {
    headers: Option<Vec<Header>>,
    parts: Option<Vec<MessagePart>>,
    body: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct MessagePart {
    body: Option<MessageBody>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelsListResponse {
    labels: Option<Vec<GmailLabel>>,
}

#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    email_address: String,
}

// ── Auth ────────────────────────────────────────────────────────────

/// Credentials for the Gmail API.
#[derive(Clone)]
pub struct GmailAuth {
    access_token: SecretString,
}

impl GmailAuth {
    /// Read the access token from `GMAIL_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("GMAIL_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("GMAIL_ACCESS_TOKEN".into()))?;
        Ok(Self {
            access_token: SecretString::from(token),
        })
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Authenticated Gmail session. Constructed once and passed explicitly into
/// the pipeline — no global credential state.
pub struct GmailClient {
    http: reqwest::Client,
    auth: GmailAuth,
    base_url: String,
}

impl GmailClient {
    /// Authenticate against the Gmail API.
    ///
    /// Failure here is fatal to the whole program, not one cycle: the token
    /// is either valid now or the operator must renew it.
    pub async fn connect(auth: GmailAuth) -> Result<Self, ProviderError> {
        let client = Self {
            http: reqwest::Client::new(),
            auth,
            base_url: GMAIL_API_BASE.to_string(),
        };
        let profile: ProfileResponse = client
            .get_json("profile", &[])
            .await
            .map_err(|e| ProviderError::AuthFailed(e.to_string()))?;
        debug!(account = %profile.email_address, "Gmail session established");
        Ok(client)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.auth.access_token.expose_secret())
            .query(params)
            .send()
            .await?;
        check_status(endpoint, &response)?;
        Ok(response.json().await?)
    }

    async fn post_json(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.auth.access_token.expose_secret())
            .json(&body)
            .send()
            .await?;
        check_status(endpoint, &response)
    }
}

fn check_status(endpoint: &str, response: &Response) -> Result<(), ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ProviderError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn list_message_ids(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<String>, ProviderError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, String)> = vec![("q", query.to_string())];
            if let Some(max) = max_results {
                params.push(("maxResults", max.to_string()));
            }
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: MessageListResponse = self.get_json("messages", &params).await?;
            ids.extend(page.messages.unwrap_or_default().into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        // The pagination above can overshoot; the cap applies to the full
        // retrieved sequence.
        if let Some(max) = max_results {
            ids.truncate(max);
        }
        Ok(ids)
    }

    async fn fetch_message(&self, id: &str) -> Result<MessageRecord, ProviderError> {
        let message: GmailMessage = self
            .get_json(
                &format!("messages/{id}"),
                &[("format", "full".to_string())],
            )
            .await?;
        message_record_from(message)
    }

    async fn trash_message(&self, id: &str) -> Result<(), ProviderError> {
        self.post_json(&format!("messages/{id}/trash"), serde_json::json!({}))
            .await
    }

    async fn archive_message(&self, id: &str) -> Result<(), ProviderError> {
        self.post_json(
            &format!("messages/{id}/modify"),
            serde_json::json!({ "removeLabelIds": ARCHIVE_REMOVE_LABELS }),
        )
        .await
    }

    async fn label_names(&self) -> Result<HashMap<String, String>, ProviderError> {
        let response: LabelsListResponse = self.get_json("labels", &[]).await?;
        Ok(response
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|label| (label.id, label.name))
            .collect())
    }
}

// ── Message materialization ─────────────────────────────────────────

/// Build a [`MessageRecord`] from a full-format Gmail message.
fn message_record_from(message: GmailMessage) -> Result<MessageRecord, ProviderError> {
    let payload = message.payload.unwrap_or_default();
    let raw_headers = payload.headers.unwrap_or_default();

    let subject = required_header(&raw_headers, "subject", &message.id)?;
    let from = required_header(&raw_headers, "from", &message.id)?;
    let to = required_header(&raw_headers, "to", &message.id)?;

    // Multipart messages carry the text in the first part, single-part
    // messages in the payload body.
    let data = match &payload.parts {
        Some(parts) => parts
            .first()
            .and_then(|part| part.body.as_ref())
            .and_then(|body| body.data.clone()),
        None => payload.body.as_ref().and_then(|body| body.data.clone()),
    };
    let content = data
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(decode_body)
        .unwrap_or_else(|| NO_CONTENT.to_string());

    // Last-wins on duplicate header names.
    let mut headers = HashMap::new();
    for header in &raw_headers {
        headers.insert(header.name.clone(), header.value.clone());
    }

    Ok(MessageRecord {
        id: message.id,
        subject,
        from,
        to,
        content,
        label_ids: message.label_ids.unwrap_or_default(),
        headers,
    })
}

fn required_header(headers: &[Header], name: &str, id: &str) -> Result<String, ProviderError> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .ok_or_else(|| ProviderError::MalformedMessage {
            id: id.to_string(),
            reason: format!("missing {name} header"),
        })
}

/// URL-safe base64 → text, best effort. Undecodable data degrades to the
/// no-content sentinel instead of failing the fetch.
fn decode_body(data: &str) -> String {
    match URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => NO_CONTENT.to_string(),
    }
}
