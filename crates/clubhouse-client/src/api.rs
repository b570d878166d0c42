//! Access to the club backend's message and user endpoints.
//!
//! [`MessageApi`] is the seam between the session and the network; the
//! session is generic over it so tests can drive it with an in-memory fake.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use clubhouse_shared::protocol::{MessageRecord, SendMessageRequest, StatusUpdateRequest, UserRecord};
use clubhouse_shared::{Message, MessageStatus, User, UserId};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Every message where `viewer` is sender or recipient.
    async fn list_messages(&self, viewer: UserId) -> Result<Vec<Message>>;

    /// Messages exchanged between `a` and `b`.
    async fn thread(&self, a: UserId, b: UserId) -> Result<Vec<Message>> {
        let messages = self.list_messages(a).await?;
        Ok(messages
            .into_iter()
            .filter(|m| m.counterpart(a) == b)
            .collect())
    }

    /// Create a message; returns the server-assigned record.
    async fn send(&self, sender: UserId, recipient: UserId, content: &str) -> Result<Message>;

    /// Create a message answering server message `parent`.
    async fn reply(&self, sender: UserId, recipient: UserId, content: &str, parent: i64) -> Result<Message>;

    /// Persist the `sent -> seen` transition of message `id`.
    async fn mark_seen(&self, id: i64) -> Result<Message>;

    /// The user directory.
    async fn list_users(&self) -> Result<Vec<User>>;
}

/// [`MessageApi`] over the backend's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpMessageApi {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpMessageApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn create(&self, body: &SendMessageRequest) -> Result<Message> {
        let resp = self.request(Method::POST, "/messages").json(body).send().await?;
        let record: MessageRecord = read_json(resp).await?;
        record.into_message().ok_or(ClientError::IncompleteRecord)
    }

    async fn fetch_records(&self) -> Result<Vec<MessageRecord>> {
        let resp = self.request(Method::GET, "/messages").send().await?;
        read_json(resp).await
    }
}

#[async_trait]
impl MessageApi for HttpMessageApi {
    async fn list_messages(&self, viewer: UserId) -> Result<Vec<Message>> {
        let records = self.fetch_records().await?;
        let total = records.len();

        let messages: Vec<Message> = records
            .into_iter()
            .filter_map(|r| {
                let id = r.id;
                let message = r.into_message();
                if message.is_none() {
                    warn!(id = ?id, "skipping incomplete message record");
                }
                message
            })
            .filter(|m| m.involves(viewer))
            .collect();

        debug!(viewer = %viewer, total, kept = messages.len(), "fetched messages");
        Ok(messages)
    }

    async fn send(&self, sender: UserId, recipient: UserId, content: &str) -> Result<Message> {
        self.create(&SendMessageRequest::new(sender, recipient, content)).await
    }

    async fn reply(&self, sender: UserId, recipient: UserId, content: &str, parent: i64) -> Result<Message> {
        self.create(&SendMessageRequest::new(sender, recipient, content).replying_to(parent))
            .await
    }

    async fn mark_seen(&self, id: i64) -> Result<Message> {
        let resp = self
            .request(Method::PUT, &format!("/messages/{id}"))
            .json(&StatusUpdateRequest {
                statut: MessageStatus::Seen,
            })
            .send()
            .await?;
        let record: MessageRecord = read_json(resp).await?;
        record.into_message().ok_or(ClientError::IncompleteRecord)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let resp = self.request(Method::GET, "/users").send().await?;
        let records: Vec<UserRecord> = read_json(resp).await?;
        Ok(records.into_iter().map(User::from).collect())
    }
}

/// Decode a JSON body, turning non-success statuses into [`ClientError::Api`].
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp.json().await?)
}
