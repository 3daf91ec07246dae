//! Conversation session tracking

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::service::ReplyService;

/// Opaque session identifier issued by the reply service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds the id every reply call is made under
pub struct SessionManager {
    service: Arc<dyn ReplyService>,
    current: Option<SessionId>,
}

impl SessionManager {
    #[must_use]
    pub fn new(service: Arc<dyn ReplyService>) -> Self {
        Self {
            service,
            current: None,
        }
    }

    /// Id used for the next reply call
    #[must_use]
    pub const fn current(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    /// Ask the service for a fresh session and switch to it
    ///
    /// # Errors
    ///
    /// Returns error if the service call fails; the previous id is kept
    pub async fn create(&mut self) -> Result<SessionId> {
        let id = self.service.new_session().await?;
        self.adopt(id.clone());
        Ok(id)
    }

    /// Switch to an id the service assigned
    pub fn adopt(&mut self, id: SessionId) {
        if self.current.as_ref() != Some(&id) {
            tracing::debug!(session_id = %id, previous = ?self.current.as_ref().map(SessionId::as_str), "session id updated");
            self.current = Some(id);
        }
    }
}
