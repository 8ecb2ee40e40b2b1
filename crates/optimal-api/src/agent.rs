//! Demo agent behind the message endpoint.
//!
//! Each sender gets its own scripted conversation, created on first
//! contact, so concurrent users never share a cursor. At most
//! `max_sessions` conversations are kept; the least recently used one is
//! evicted to make room.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use optimal_chat::protocol::{MessageRequest, RawResponseRecord};
use optimal_chat::replayer::{ConversationScript, MockConversation, ReplayTiming};

struct Session {
    conversation: Arc<MockConversation>,
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    by_sender: HashMap<String, Session>,
    clock: u64,
}

impl Sessions {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .by_sender
            .iter()
            .min_by_key(|(_, session)| session.last_used)
            .map(|(sender, _)| sender.clone());
        if let Some(sender) = oldest {
            self.by_sender.remove(&sender);
            info!(sender = %sender, "Evicted demo conversation");
        }
    }
}

pub struct DemoAgent {
    script: Arc<ConversationScript>,
    timing: ReplayTiming,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

impl DemoAgent {
    pub fn new(script: ConversationScript, timing: ReplayTiming, max_sessions: usize) -> Self {
        Self {
            script: Arc::new(script),
            timing,
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(Sessions::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Conversation for `sender`, created on first use.
    pub fn session(&self, sender: &str) -> Arc<MockConversation> {
        let mut sessions = self.lock();
        let now = sessions.tick();

        if let Some(session) = sessions.by_sender.get_mut(sender) {
            session.last_used = now;
            return session.conversation.clone();
        }

        if sessions.by_sender.len() >= self.max_sessions {
            sessions.evict_least_recent();
        }

        info!(sender, "Starting demo conversation");
        let conversation = Arc::new(MockConversation::with_shared_script(
            self.script.clone(),
            self.timing,
        ));
        sessions.by_sender.insert(
            sender.to_string(),
            Session {
                conversation: conversation.clone(),
                last_used: now,
            },
        );
        conversation
    }

    /// Answer one message with the sender's next scripted batch.
    pub async fn respond(&self, request: &MessageRequest) -> Vec<RawResponseRecord> {
        let conversation = self.session(&request.name);
        let batch = conversation.next_batch().await;
        debug!(sender = %request.name, records = batch.len(), "Demo agent replied");
        batch
    }

    /// Rewind `sender`'s conversation to the start of the script.
    ///
    /// Returns false when the sender has no conversation.
    pub async fn reset(&self, sender: &str) -> bool {
        let conversation = self
            .lock()
            .by_sender
            .get(sender)
            .map(|session| session.conversation.clone());

        match conversation {
            Some(conversation) => {
                conversation.reset().await;
                info!(sender, "Demo conversation reset");
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.lock().by_sender.len()
    }

    pub fn has_session(&self, sender: &str) -> bool {
        self.lock().by_sender.contains_key(sender)
    }
}
