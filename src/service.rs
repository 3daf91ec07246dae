//! Remote reply service client
//!
//! The service owns the language model and conversation storage; this crate
//! only talks to it over HTTP/JSON. [`ReplyService`] is the seam the
//! controller depends on, [`HttpReplyClient`] the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::session::SessionId;
use crate::{Error, Language, Result};

/// Successful chat exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Session the service filed the exchange under, if it said
    pub session_id: Option<SessionId>,
    /// Assistant text
    pub text: String,
}

/// A system prompt stored by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub id: i64,
    pub text: String,
    pub active: bool,
}

/// One stored exchange of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub user_input: String,
    pub assistant_response: String,
    /// Timestamp as the service formats it
    pub timestamp: String,
    pub language: String,
}

/// Operations of the remote reply service
#[async_trait]
pub trait ReplyService: Send + Sync {
    /// Open a fresh session
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or refuses
    async fn new_session(&self) -> Result<SessionId>;

    /// Send one user message and get the assistant's reply
    ///
    /// # Errors
    ///
    /// Returns error if the call fails or the service reports an error
    async fn chat(
        &self,
        message: &str,
        session: Option<&SessionId>,
        language: Language,
    ) -> Result<ChatReply>;

    /// Append text to the assistant's standing instructions
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses
    async fn add_system_prompt(&self, prompt: &str) -> Result<()>;

    /// Stored system prompts, newest first
    ///
    /// # Errors
    ///
    /// Returns error if the call fails
    async fn system_prompts(&self) -> Result<Vec<SystemPrompt>>;

    /// Flip a stored prompt between active and inactive
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses
    async fn toggle_system_prompt(&self, id: i64) -> Result<()>;

    /// Stored exchanges of `session`, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the call fails
    async fn history(&self, session: &SessionId) -> Result<Vec<HistoryItem>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: Option<&'a SessionId>,
    language: Language,
}

#[derive(Deserialize)]
struct ChatResponse {
    session_id: Option<SessionId>,
    response: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct NewSessionResponse {
    session_id: SessionId,
}

#[derive(Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the reply service
#[derive(Debug, Clone)]
pub struct HttpReplyClient {
    client: Client,
    base_url: Url,
}

impl HttpReplyClient {
    /// Create a client for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` is not an http(s) URL or the HTTP client
    /// cannot be built
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw)
            .map_err(|e| Error::Config(format!("invalid service URL {raw:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("service URL {raw:?} cannot carry a path")));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Endpoint URL; each segment is percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Decode a JSON body, turning non-success statuses into service errors
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or(body);
        tracing::warn!(status = %status, message = %message, "reply service error");
        return Err(Error::Service(format!("{status}: {message}")));
    }

    Ok(serde_json::from_str(&body)?)
}

fn acknowledged(ack: AckResponse, what: &str) -> Result<()> {
    match (ack.success, ack.error) {
        (_, Some(error)) => Err(Error::Service(error)),
        (true, None) => Ok(()),
        (false, None) => Err(Error::Service(format!("{what} not acknowledged"))),
    }
}

#[async_trait]
impl ReplyService for HttpReplyClient {
    async fn new_session(&self) -> Result<SessionId> {
        let response = self.client.post(self.url(&["new_session"])).send().await?;
        let created: NewSessionResponse = decode(response).await?;
        tracing::info!(session_id = %created.session_id, "session created");
        Ok(created.session_id)
    }

    async fn chat(
        &self,
        message: &str,
        session: Option<&SessionId>,
        language: Language,
    ) -> Result<ChatReply> {
        let request = ChatRequest {
            message,
            session_id: session,
            language,
        };
        tracing::debug!(language = %language, session_id = ?session, "sending chat");

        let response = self
            .client
            .post(self.url(&["chat"]))
            .json(&request)
            .send()
            .await?;
        let reply: ChatResponse = decode(response).await?;

        if let Some(error) = reply.error {
            return Err(Error::Service(error));
        }
        let text = reply
            .response
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Service("empty reply".to_string()))?;

        Ok(ChatReply {
            session_id: reply.session_id,
            text,
        })
    }

    async fn add_system_prompt(&self, prompt: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(&["add_system_prompt"]))
            .json(&PromptRequest { prompt })
            .send()
            .await?;
        acknowledged(decode(response).await?, "system prompt")
    }

    async fn system_prompts(&self) -> Result<Vec<SystemPrompt>> {
        let response = self.client.get(self.url(&["get_system_prompts"])).send().await?;
        decode(response).await
    }

    async fn toggle_system_prompt(&self, id: i64) -> Result<()> {
        let id = id.to_string();
        let response = self
            .client
            .post(self.url(&["toggle_prompt", id.as_str()]))
            .send()
            .await?;
        acknowledged(decode(response).await?, "prompt toggle")
    }

    async fn history(&self, session: &SessionId) -> Result<Vec<HistoryItem>> {
        let response = self
            .client
            .get(self.url(&["conversation_history", session.as_str()]))
            .send()
            .await?;
        decode(response).await
    }
}
