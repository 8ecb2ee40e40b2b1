//! Chat orchestrator: validates a user turn, sends it, classifies the
//! reply, and records both in the view.

use tracing::{debug, info};

use crate::classifier::classify;
use crate::error::ChatError;
use crate::protocol::MessageRequest;
use crate::transport::MessageTransport;
use crate::view::{ChatEntry, ChatView};

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Drives one client conversation over a transport.
pub struct ChatOrchestrator<T: MessageTransport> {
    transport: T,
    sender: String,
    view: ChatView,
}

impl<T: MessageTransport> ChatOrchestrator<T> {
    /// `sender` is the `name` put on every outgoing request.
    pub fn new(transport: T, sender: impl Into<String>) -> Self {
        Self {
            transport,
            sender: sender.into(),
            view: ChatView::new(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a user turn.
    ///
    /// Returns the entries added by this turn, starting with the user's
    /// own message. On a transport error the user message stays recorded.
    pub async fn submit(&mut self, text: &str) -> Result<&[ChatEntry], ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
        }

        let start = self.view.len();
        self.view.push_user(text);

        let request = MessageRequest::new(self.sender.clone(), text);
        self.exchange(&request).await?;
        Ok(self.view.since(start))
    }

    /// Ask the agent to set up state for `wallet` on `chain`. The command
    /// is not echoed as a user message.
    pub async fn initialize(&mut self, wallet: &str, chain: &str) -> Result<&[ChatEntry], ChatError> {
        info!(wallet, chain, "Initializing user state");
        let start = self.view.len();
        let request = MessageRequest::initialize_user_state(wallet, chain);
        self.exchange(&request).await?;
        Ok(self.view.since(start))
    }

    async fn exchange(&mut self, request: &MessageRequest) -> Result<(), ChatError> {
        let records = self.transport.send(request).await?;
        let added = self.view.extend(classify(&records));
        debug!(records = records.len(), messages = added, "Applied response batch");
        Ok(())
    }
}
