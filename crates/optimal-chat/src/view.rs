//! Append-only chat history as the client renders it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::protocol::UiMessage;

/// A message placed in the history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEntry {
    pub id: Uuid,
    pub message: UiMessage,
    pub received_at: DateTime<Utc>,
}

impl ChatEntry {
    fn new(message: UiMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            received_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatView {
    entries: Vec<ChatEntry>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: UiMessage) -> &ChatEntry {
        self.entries.push(ChatEntry::new(message));
        &self.entries[self.entries.len() - 1]
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatEntry {
        self.push(UiMessage::User(text.into()))
    }

    /// Append classifier output in order. Returns the number appended.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = UiMessage>) -> usize {
        let before = self.entries.len();
        self.entries.extend(messages.into_iter().map(ChatEntry::new));
        self.entries.len() - before
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Entries from `index` onwards.
    pub fn since(&self, index: usize) -> &[ChatEntry] {
        &self.entries[index.min(self.entries.len())..]
    }

    pub fn messages(&self) -> impl Iterator<Item = &UiMessage> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }
}
