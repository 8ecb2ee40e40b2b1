//! Message transport: one request, one response batch.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use optimal_core::config::{ClientConfig, ClientRoute, OptimalConfig};
use optimal_core::error::OptimalError;

use crate::error::TransportError;
use crate::protocol::{MessageRequest, RawResponseRecord};
use crate::replayer::MockConversation;

/// Delivers a user turn to the agent and returns its raw response batch.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, request: &MessageRequest) -> Result<Vec<RawResponseRecord>, TransportError>;
}

// =============================================================================
// HTTP
// =============================================================================

/// Path shape of the message endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRoute {
    /// `POST {base}/{agent_id}/message`
    Agent(String),
    /// `POST {base}/messages`
    Messages,
}

impl MessageRoute {
    /// Route from client configuration. The agent route needs an agent id.
    pub fn from_config(client: &ClientConfig) -> Result<Self, OptimalError> {
        match client.route {
            ClientRoute::Messages => Ok(MessageRoute::Messages),
            ClientRoute::Agent => client
                .agent_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| MessageRoute::Agent(id.to_string()))
                .ok_or_else(|| {
                    OptimalError::Config("agent_id is required for the agent message route".to_string())
                }),
        }
    }

    pub fn url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            MessageRoute::Agent(id) => format!("{}/{}/message", base, id),
            MessageRoute::Messages => format!("{}/messages", base),
        }
    }
}

/// reqwest-backed transport. Single attempt, no retry.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, route: &MessageRoute) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: route.url(base_url),
        }
    }

    pub fn from_config(config: &OptimalConfig) -> Result<Self, OptimalError> {
        let base = config.require_api_url()?;
        let route = MessageRoute::from_config(&config.client)?;
        Ok(Self::new(base, &route))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MessageTransport for HttpTransport {
    async fn send(&self, request: &MessageRequest) -> Result<Vec<RawResponseRecord>, TransportError> {
        debug!(endpoint = %self.endpoint, sender = %request.name, "Sending message");

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = status.as_u16(), "Message rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let records = decode_batch(&body)?;
        debug!(records = records.len(), "Received response batch");
        Ok(records)
    }
}

/// Decode a response body record by record.
///
/// The body must be a JSON array. Elements that do not decode as a
/// record are dropped with a warning and the rest of the batch is kept.
pub fn decode_batch(body: &str) -> Result<Vec<RawResponseRecord>, TransportError> {
    let elements: Vec<Value> =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;

    let records = elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value(element) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Dropping undecodable response record");
                None
            }
        })
        .collect();
    Ok(records)
}

// =============================================================================
// Demo
// =============================================================================

/// Transport that answers from a scripted conversation. The request
/// content is ignored.
#[derive(Debug, Clone)]
pub struct MockTransport {
    conversation: Arc<MockConversation>,
}

impl MockTransport {
    pub fn new(conversation: Arc<MockConversation>) -> Self {
        Self { conversation }
    }

    pub fn conversation(&self) -> &Arc<MockConversation> {
        &self.conversation
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(&self, request: &MessageRequest) -> Result<Vec<RawResponseRecord>, TransportError> {
        debug!(sender = %request.name, "Answering from scripted conversation");
        Ok(self.conversation.next_batch().await)
    }
}
