//! HttpChatApi - reqwest implementation of the chat backend contract.
//!
//! Routes (relative to the configured base URL):
//! - `GET  /messages/users`       directory
//! - `GET  /messages/{id}`        history with `{id}`, oldest first
//! - `POST /messages/send/{id}`   send to `{id}`

use std::time::Duration;

use async_trait::async_trait;
use chatsync_core::api::ChatApi;
use chatsync_core::config::ClientConfig;
use chatsync_core::error::{Result, SyncError};
use chatsync_core::message::{Message, MessageDraft};
use chatsync_core::user::{User, UserId};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::dto::{ErrorBody, MessageDTO, SendMessageRequest, UserDTO};

/// Chat backend client over HTTP.
#[derive(Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpChatApi {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a Config error if the URL cannot be used as a base or the
    /// underlying client cannot be built.
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::config(format!("Invalid api_base_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::config(format!(
                "api_base_url '{}' cannot be used as a base",
                base_url
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            "[HttpChatApi] Initialized with URL: {}, token: {}",
            base_url,
            if auth_token.is_some() { "present" } else { "none" }
        );

        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            config.auth_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Adds the bearer token when one is configured.
    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .auth_request(request)
            .send()
            .await
            .map_err(|e| SyncError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::transport(format!("Invalid response body: {}", e)))
    }
}

/// Maps a non-success response to the error taxonomy.
///
/// A JSON body with a `message` field is a server error; anything else is
/// treated as transport-level so the generic fallback text is shown.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> SyncError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
        }) => SyncError::server(Some(status.as_u16()), message),
        _ => SyncError::transport(format!("HTTP {}", status)),
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn fetch_directory(&self) -> Result<Vec<User>> {
        let url = self.endpoint(&["messages", "users"]);
        tracing::debug!("[HttpChatApi] GET {}", url);
        let users: Vec<UserDTO> = self.execute(self.client.get(url)).await?;
        Ok(users.into_iter().map(User::from).collect())
    }

    async fn fetch_history(&self, counterpart: &UserId) -> Result<Vec<Message>> {
        let url = self.endpoint(&["messages", counterpart.as_str()]);
        tracing::debug!("[HttpChatApi] GET {}", url);
        let messages: Vec<MessageDTO> = self.execute(self.client.get(url)).await?;
        Ok(messages.into_iter().map(Message::from).collect())
    }

    async fn send_message(&self, counterpart: &UserId, draft: &MessageDraft) -> Result<Message> {
        let url = self.endpoint(&["messages", "send", counterpart.as_str()]);
        tracing::debug!("[HttpChatApi] POST {}", url);
        let request = self.client.post(url).json(&SendMessageRequest::from(draft));
        let message: MessageDTO = self.execute(request).await?;
        Ok(message.into())
    }
}
