//! Wire protocol between the chat client and the agent runtime.
//!
//! The client sends one [`MessageRequest`] per user turn and receives a
//! JSON array of [`RawResponseRecord`]s. Records are loosely shaped: the
//! action name decides which fields `content` carries, so action-specific
//! fields are kept as a JSON map until the classifier lifts them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use optimal_core::types::{OpportunityContent, Strategy, TransactionContent, VaultContent};

// =============================================================================
// Request
// =============================================================================

/// One user turn sent to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageRequest {
    /// Sender identity: wallet address or handle.
    pub name: String,
    pub text: String,
}

impl MessageRequest {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Command sentence asking the agent to set up state for a wallet.
    pub fn initialize_user_state(wallet: &str, chain: &str) -> Self {
        Self::new(
            wallet,
            format!(
                "Initialize user state {{walletAddress: {}, chain: {}}}",
                wallet, chain
            ),
        )
    }
}

// =============================================================================
// Response
// =============================================================================

/// Action tag on a raw response record.
///
/// Wire names are upper case and matched case-sensitively. Anything else
/// is preserved in `Unknown` so it round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseAction {
    Ignore,
    Agent,
    Strategy,
    Transaction,
    Opportunity,
    Vault,
    Unknown(String),
}

impl ResponseAction {
    pub fn as_str(&self) -> &str {
        match self {
            ResponseAction::Ignore => "IGNORE",
            ResponseAction::Agent => "AGENT",
            ResponseAction::Strategy => "STRATEGY",
            ResponseAction::Transaction => "TRANSACTION",
            ResponseAction::Opportunity => "OPPORTUNITY",
            ResponseAction::Vault => "VAULT",
            ResponseAction::Unknown(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ResponseAction::Unknown(_))
    }

    fn missing() -> Self {
        ResponseAction::Unknown(String::new())
    }

    fn or_missing<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?
            .map(ResponseAction::from)
            .unwrap_or_else(ResponseAction::missing))
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<&str> for ResponseAction {
    fn from(s: &str) -> Self {
        match s {
            "IGNORE" => ResponseAction::Ignore,
            "AGENT" => ResponseAction::Agent,
            "STRATEGY" => ResponseAction::Strategy,
            "TRANSACTION" => ResponseAction::Transaction,
            "OPPORTUNITY" => ResponseAction::Opportunity,
            "VAULT" => ResponseAction::Vault,
            other => ResponseAction::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ResponseAction {
    fn from(s: String) -> Self {
        match ResponseAction::from(s.as_str()) {
            ResponseAction::Unknown(_) => ResponseAction::Unknown(s),
            known => known,
        }
    }
}

impl From<ResponseAction> for String {
    fn from(action: ResponseAction) -> Self {
        match action {
            ResponseAction::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `content` of a raw record: a success flag plus action-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResponseContent {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            fields: Map::new(),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// One element of the agent's response array.
///
/// Every field may be absent or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RawResponseRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(
        default = "ResponseAction::missing",
        deserialize_with = "ResponseAction::or_missing"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "AGENT"))]
    pub action: ResponseAction,
    #[serde(default, deserialize_with = "null_as_default")]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub content: ResponseContent,
}

impl RawResponseRecord {
    pub fn new(
        user: impl Into<String>,
        action: ResponseAction,
        text: impl Into<String>,
        content: ResponseContent,
    ) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            action,
            content,
        }
    }

    /// Plain conversational reply.
    pub fn agent_text(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(user, ResponseAction::Agent, text, ResponseContent::succeeded())
    }
}

// =============================================================================
// Chat messages
// =============================================================================

/// Typed chat message rendered by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum UiMessage {
    User(String),
    Agent(String),
    Strategy { strategy: Strategy },
    Transaction(TransactionContent),
    Vault(VaultContent),
    Opportunity(OpportunityContent),
}

impl UiMessage {
    /// The `type` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            UiMessage::User(_) => "user",
            UiMessage::Agent(_) => "agent",
            UiMessage::Strategy { .. } => "strategy",
            UiMessage::Transaction(_) => "transaction",
            UiMessage::Vault(_) => "vault",
            UiMessage::Opportunity(_) => "opportunity",
        }
    }

    pub fn is_from_user(&self) -> bool {
        matches!(self, UiMessage::User(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimal_core::types::{Allocations, RiskLevel};
    use serde_json::json;

    #[test]
    fn test_initialize_user_state_sentence() {
        let req = MessageRequest::initialize_user_state("0xABC", "base-sepolia");
        assert_eq!(req.name, "0xABC");
        assert_eq!(
            req.text,
            "Initialize user state {walletAddress: 0xABC, chain: base-sepolia}"
        );
    }

    #[test]
    fn test_action_parsing_is_case_sensitive() {
        assert_eq!(ResponseAction::from("STRATEGY"), ResponseAction::Strategy);
        assert_eq!(
            ResponseAction::from("strategy"),
            ResponseAction::Unknown("strategy".to_string())
        );
        assert!(!ResponseAction::from("FOO").is_recognized());
        assert!(ResponseAction::Vault.is_recognized());
    }

    #[test]
    fn test_unknown_action_round_trips() {
        let record: RawResponseRecord = serde_json::from_value(json!({
            "user": "agent",
            "text": "",
            "action": "CONTINUE",
            "content": {"success": true}
        }))
        .unwrap();
        assert_eq!(record.action, ResponseAction::Unknown("CONTINUE".to_string()));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["action"], "CONTINUE");
    }

    #[test]
    fn test_record_defaults_for_missing_fields() {
        let record: RawResponseRecord = serde_json::from_value(json!({"action": "AGENT"})).unwrap();
        assert_eq!(record.user, "");
        assert_eq!(record.text, "");
        assert!(!record.content.success);
        assert!(record.content.fields.is_empty());

        let record: RawResponseRecord =
            serde_json::from_value(json!({"text": "hi", "content": {}})).unwrap();
        assert_eq!(record.action, ResponseAction::Unknown(String::new()));
        assert!(!record.content.success);
    }

    #[test]
    fn test_record_null_fields_take_defaults() {
        let record: RawResponseRecord = serde_json::from_value(json!({
            "user": null,
            "text": null,
            "action": null,
            "content": null
        }))
        .unwrap();
        assert_eq!(record.user, "");
        assert_eq!(record.text, "");
        assert_eq!(record.action, ResponseAction::Unknown(String::new()));
        assert_eq!(record.content, ResponseContent::default());

        let record: RawResponseRecord = serde_json::from_value(json!({
            "action": "IGNORE",
            "text": null,
            "content": {"success": null}
        }))
        .unwrap();
        assert_eq!(record.action, ResponseAction::Ignore);
        assert!(!record.content.success);
    }

    #[test]
    fn test_content_keeps_extra_fields() {
        let record: RawResponseRecord = serde_json::from_value(json!({
            "user": "agent",
            "text": "",
            "action": "VAULT",
            "content": {"success": true, "address": "0x1", "isActive": true}
        }))
        .unwrap();
        assert!(record.content.success);
        assert_eq!(record.content.get("address"), Some(&json!("0x1")));
        assert_eq!(record.content.get("isActive"), Some(&json!(true)));
        assert!(record.content.get("success").is_none());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["content"]["success"], true);
        assert_eq!(value["content"]["address"], "0x1");
    }

    #[test]
    fn test_ui_message_wire_shape() {
        let value = serde_json::to_value(UiMessage::Agent("hello".to_string())).unwrap();
        assert_eq!(value, json!({"type": "agent", "content": "hello"}));

        let strategy = Strategy {
            risk_level: RiskLevel::Aggressive,
            allocations: Allocations {
                lending: 20.0,
                liquidity: 80.0,
            },
            description: "LP heavy".to_string(),
        };
        let msg = UiMessage::Strategy {
            strategy: strategy.clone(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "strategy");
        assert_eq!(value["content"]["strategy"]["riskLevel"], "aggressive");
        assert_eq!(msg.kind(), "strategy");
        assert!(!msg.is_from_user());
        assert!(UiMessage::User("x".to_string()).is_from_user());
    }
}
