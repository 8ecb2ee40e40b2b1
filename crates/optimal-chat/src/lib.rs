//! Client side of the OptimalAI agent conversation.
//!
//! Provides the wire protocol, the classifier that turns raw agent
//! responses into typed chat messages, the demo-mode conversation
//! replayer, the message transport, and the chat view state.

pub mod classifier;
pub mod error;
pub mod orchestrator;
pub mod protocol;
pub mod replayer;
pub mod transport;
pub mod view;

pub use classifier::{classify, classify_one};
pub use error::{ChatError, TransportError};
pub use orchestrator::ChatOrchestrator;
pub use protocol::{MessageRequest, RawResponseRecord, ResponseAction, ResponseContent, UiMessage};
pub use replayer::{ConversationScript, MockConversation, ReplayTiming, ScriptTurn};
pub use transport::{decode_batch, HttpTransport, MessageRoute, MessageTransport, MockTransport};
pub use view::{ChatEntry, ChatView};
