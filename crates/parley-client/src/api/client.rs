// HTTP client for the chat backend (reqwest direct, no SDK)

use async_trait::async_trait;
use parley_types::{
    AuthResponse, ChatSession, Message, ProfileUpdate, ThreadDeleted, ThreadRenamed, User,
};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::payloads::{EditRequest, LoginRequest, RenameRequest, SignupRequest, StreamRequest};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::streaming::{cancelled_stream, parse_event_stream, EventStream};
use crate::traits::{AccountClient, ChatBackend, HistoryClient, StreamingClient};

const REQUEST_FAILED: &str = "API Request Failed";
const STREAM_FAILED: &str = "Stream connection failed";

/// REST + streaming client for the chat backend
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder().build()?;

        Ok(Self {
            http_client,
            base_url: config.normalized_base_url().to_string(),
            access_token: RwLock::new(config.access_token),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/chat/history/{thread_id}` with the id percent-encoded
    fn thread_url(&self, thread_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("/chat/history"))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .push(thread_id);
        Ok(url)
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.access_token.read().await.as_deref() {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                Ok(request.header(AUTHORIZATION, value))
            }
            None => Ok(request),
        }
    }

    /// Send a request and decode its JSON body; `None` for empty responses
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = self.authorize(request).await?.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(api_error(response, REQUEST_FAILED).await);
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_required<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send_json(request)
            .await?
            .ok_or_else(|| ClientError::Decode("empty response body".to_string()))
    }

    /// Open a reply stream; the token aborts the connect as well as every read
    async fn open_stream<P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
        cancel: CancellationToken,
    ) -> Result<EventStream> {
        let request = self
            .authorize(self.http_client.post(self.url(path)).json(payload))
            .await?;

        let response = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::debug!(path, "stream request cancelled before response");
                return Ok(cancelled_stream());
            }
            response = request.send() => response?,
        };

        if !response.status().is_success() {
            return Err(api_error(response, STREAM_FAILED).await);
        }

        Ok(parse_event_stream(response.bytes_stream(), cancel))
    }
}

/// Build an API error from a failed response, reading its body once
async fn api_error(response: Response, fallback: &str) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    ClientError::Api {
        status,
        message: extract_detail(&body).unwrap_or_else(|| fallback.to_string()),
    }
}

/// `detail` field of an error body; non-string details are kept as JSON text
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl HistoryClient for ApiClient {
    async fn list_threads(&self) -> Result<Vec<ChatSession>> {
        let threads = self
            .send_json(self.http_client.get(self.url("/chat/history")))
            .await?;
        Ok(threads.unwrap_or_default())
    }

    async fn fetch_history(&self, thread_id: &str) -> Result<Vec<Message>> {
        let url = self.thread_url(thread_id)?;
        let messages = self.send_json(self.http_client.get(url)).await?;
        Ok(messages.unwrap_or_default())
    }

    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<ThreadRenamed> {
        let url = self.thread_url(thread_id)?;
        let renamed = self
            .send_json(self.http_client.patch(url).json(&RenameRequest { title }))
            .await?;

        Ok(renamed.unwrap_or_else(|| ThreadRenamed {
            id: thread_id.to_string(),
            title: title.to_string(),
        }))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<ThreadDeleted> {
        let url = self.thread_url(thread_id)?;
        let deleted: Option<ThreadDeleted> = self.send_json(self.http_client.delete(url)).await?;

        match deleted {
            Some(deleted) if !deleted.id.is_empty() && deleted.id != thread_id => {
                Err(ClientError::Decode(format!(
                    "delete of thread {} acknowledged thread {}",
                    thread_id, deleted.id
                )))
            }
            Some(deleted) if !deleted.id.is_empty() => Ok(deleted),
            Some(deleted) => Ok(ThreadDeleted {
                id: thread_id.to_string(),
                ..deleted
            }),
            None => Ok(ThreadDeleted::new(thread_id)),
        }
    }
}

#[async_trait]
impl StreamingClient for ApiClient {
    async fn start_stream(
        &self,
        prompt: &str,
        thread_id: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<EventStream> {
        let payload = StreamRequest {
            message: prompt,
            thread_id,
        };
        self.open_stream("/chat/message/stream", &payload, cancel).await
    }

    async fn start_edit_stream(
        &self,
        message_id: &str,
        new_content: &str,
        cancel: CancellationToken,
    ) -> Result<EventStream> {
        let payload = EditRequest {
            message_id,
            new_content,
        };
        self.open_stream("/chat/message/edit", &payload, cancel).await
    }
}

#[async_trait]
impl AccountClient for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let auth: AuthResponse = self
            .send_required(
                self.http_client
                    .post(self.url("/auth/login"))
                    .json(&LoginRequest { email, password }),
            )
            .await?;

        self.set_access_token(Some(auth.access_token.clone())).await;
        tracing::info!(user = %auth.user.email, "logged in");
        Ok(auth)
    }

    async fn signup(&self, full_name: &str, email: &str, password: &str) -> Result<User> {
        self.send_required(self.http_client.post(self.url("/auth/signup")).json(&SignupRequest {
            email,
            password,
            full_name,
        }))
        .await
    }

    async fn get_profile(&self) -> Result<Option<User>> {
        match self.send_json(self.http_client.get(self.url("/users/me"))).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        self.send_required(self.http_client.patch(self.url("/users/me")).json(&update))
            .await
    }

    async fn logout(&self) {
        self.set_access_token(None).await;
    }
}

impl ChatBackend for ApiClient {}
