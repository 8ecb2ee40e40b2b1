//! Scripted conversation replay for demo mode.
//!
//! A [`MockConversation`] walks a [`ConversationScript`] and hands out the
//! agent turns between two user turns as one response batch, pacing the
//! entries with randomized delays the way a live agent streams them.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use optimal_core::config::DemoConfig;
use optimal_core::types::{
    Allocations, Balance, OpportunityContent, Protocol, RiskLevel, Strategy, TransactionContent,
    TransactionType, VaultContent, BASE_SEPOLIA_CHAIN_ID,
};

use crate::protocol::{RawResponseRecord, ResponseAction, ResponseContent};

/// Sender name stamped on replayed records.
pub const DEMO_AGENT_NAME: &str = "OptimalAI";

// =============================================================================
// Script
// =============================================================================

/// One entry of a scripted conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptTurn {
    User(String),
    Agent(String),
    Strategy(Strategy),
    Transaction(TransactionContent),
    Opportunity(OpportunityContent),
    Vault(VaultContent),
}

impl ScriptTurn {
    pub fn tag(&self) -> &'static str {
        match self {
            ScriptTurn::User(_) => "user",
            ScriptTurn::Agent(_) => "agent",
            ScriptTurn::Strategy(_) => "strategy",
            ScriptTurn::Transaction(_) => "transaction",
            ScriptTurn::Opportunity(_) => "opportunity",
            ScriptTurn::Vault(_) => "vault",
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, ScriptTurn::User(_))
    }

    /// Render an agent-side turn as the record the agent would have sent.
    ///
    /// User turns have no record.
    pub fn to_record(&self) -> Option<RawResponseRecord> {
        let action = ResponseAction::from(self.tag().to_uppercase());
        let mut content = ResponseContent::succeeded();
        let text = match self {
            ScriptTurn::User(_) => return None,
            ScriptTurn::Agent(text) => text.clone(),
            ScriptTurn::Strategy(strategy) => {
                content = content.with_field("strategy", Value::Object(object_fields(strategy)));
                String::new()
            }
            ScriptTurn::Transaction(tx) => {
                content.fields = object_fields(tx);
                String::new()
            }
            ScriptTurn::Opportunity(opp) => {
                content.fields = object_fields(opp);
                String::new()
            }
            ScriptTurn::Vault(vault) => {
                content.fields = object_fields(vault);
                String::new()
            }
        };
        Some(RawResponseRecord::new(DEMO_AGENT_NAME, action, text, content))
    }
}

fn object_fields<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// An ordered list of turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationScript {
    turns: Vec<ScriptTurn>,
}

impl ConversationScript {
    pub fn new(turns: Vec<ScriptTurn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[ScriptTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Built-in onboarding conversation: risk question, a conservative
    /// strategy, a lending opportunity, the deposit, and the vault summary.
    pub fn demo() -> Self {
        let strategy = Strategy {
            risk_level: RiskLevel::Conservative,
            allocations: Allocations {
                lending: 100.0,
                liquidity: 0.0,
            },
            description: "A conservative strategy focused solely on lending. This will \
                          prioritize stability and capital preservation."
                .to_string(),
        };

        Self::new(vec![
            ScriptTurn::Agent(
                "Hi, I'm OptimalAI. I manage a vault that puts your stablecoins to work \
                 across lending and liquidity protocols on Base."
                    .to_string(),
            ),
            ScriptTurn::Agent(
                "Before we start: how much risk are you comfortable with? Conservative, \
                 moderate, or aggressive?"
                    .to_string(),
            ),
            ScriptTurn::User("Let's keep it safe.".to_string()),
            ScriptTurn::Agent(
                "Understood. Here is a conservative strategy for your vault.".to_string(),
            ),
            ScriptTurn::Strategy(strategy.clone()),
            ScriptTurn::Opportunity(OpportunityContent {
                kind: TransactionType::Lending,
                protocol: Protocol::Aave.to_string(),
                token: "USDC".to_string(),
                pair_token: None,
                apy: 4.8,
            }),
            ScriptTurn::Agent("Shall I deposit your USDC into Aave?".to_string()),
            ScriptTurn::User("Yes, deposit 5000 USDC.".to_string()),
            ScriptTurn::Transaction(TransactionContent {
                kind: TransactionType::Lending,
                protocol: Protocol::Aave,
                token: "USDC".to_string(),
                pair_token: None,
                amount: "5000".to_string(),
                apy: 4.8,
                tx_hash: "0x8a3b5e2f9c1d4a7b6e0f3c2d1a9b8e7f6c5d4a3b2e1f0c9d8a7b6e5f4c3d2a1b"
                    .to_string(),
                chain_id: BASE_SEPOLIA_CHAIN_ID,
            }),
            ScriptTurn::Vault(VaultContent {
                address: "0xfB10339fA9eF9Ec7FB99f3393CEa13b5736bd061".to_string(),
                is_active: true,
                created_at: "1/2/2025".to_string(),
                last_update: "2/2/2025".to_string(),
                balances: vec![
                    Balance {
                        token: "USDC".to_string(),
                        amount: "5000".to_string(),
                        symbol: "USDC".to_string(),
                    },
                    Balance {
                        token: "USDT".to_string(),
                        amount: "5000".to_string(),
                        symbol: "USDT".to_string(),
                    },
                ],
                strategy,
            }),
        ])
    }
}

// =============================================================================
// Timing
// =============================================================================

/// Pacing of a replayed conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayTiming {
    /// Sleep before the first batch of a conversation.
    pub initial_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReplayTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(2000),
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(1500),
        }
    }
}

impl ReplayTiming {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Random delay in `[min_delay, max_delay]`.
    pub fn between_entries(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

// =============================================================================
// Session
// =============================================================================

/// One replay session over a script.
///
/// The cursor lock is held for a whole batch, so concurrent callers on the
/// same session get consecutive batches rather than interleaved entries.
#[derive(Debug)]
pub struct MockConversation {
    script: Arc<ConversationScript>,
    timing: ReplayTiming,
    cursor: Mutex<usize>,
}

impl MockConversation {
    pub fn new(script: ConversationScript, timing: ReplayTiming) -> Self {
        Self::with_shared_script(Arc::new(script), timing)
    }

    /// Session over a script shared with other sessions.
    pub fn with_shared_script(script: Arc<ConversationScript>, timing: ReplayTiming) -> Self {
        Self {
            script,
            timing,
            cursor: Mutex::new(0),
        }
    }

    pub fn timing(&self) -> ReplayTiming {
        self.timing
    }

    /// Next run of agent turns, up to the next user turn or the end of
    /// the script. Returns an empty batch once the script is exhausted.
    pub async fn next_batch(&self) -> Vec<RawResponseRecord> {
        let mut cursor = self.cursor.lock().await;
        let turns = self.script.turns();
        if *cursor >= turns.len() {
            return Vec::new();
        }

        if *cursor == 0 && !self.timing.initial_delay.is_zero() {
            tokio::time::sleep(self.timing.initial_delay).await;
        }

        let start = *cursor;
        let mut batch = Vec::new();
        while *cursor < turns.len() {
            let turn = &turns[*cursor];
            *cursor += 1;
            let Some(record) = turn.to_record() else {
                break;
            };
            if !batch.is_empty() {
                let delay = self.timing.between_entries();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            batch.push(record);
        }

        debug!(
            from = start,
            to = *cursor,
            entries = batch.len(),
            "Replayed conversation batch"
        );
        batch
    }

    /// Rewind to the start of the script.
    pub async fn reset(&self) {
        *self.cursor.lock().await = 0;
    }

    /// Index of the next unread turn.
    pub async fn position(&self) -> usize {
        *self.cursor.lock().await
    }

    pub async fn is_exhausted(&self) -> bool {
        self.position().await >= self.script.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::protocol::UiMessage;
    use tokio::time::Instant;

    fn agent(text: &str) -> ScriptTurn {
        ScriptTurn::Agent(text.to_string())
    }

    fn user(text: &str) -> ScriptTurn {
        ScriptTurn::User(text.to_string())
    }

    fn texts(batch: &[RawResponseRecord]) -> Vec<&str> {
        batch.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_agent_turn_to_record() {
        let record = agent("hello").to_record().unwrap();
        assert_eq!(record.action, ResponseAction::Agent);
        assert_eq!(record.text, "hello");
        assert_eq!(record.user, DEMO_AGENT_NAME);
        assert!(record.content.success);
        assert!(record.content.fields.is_empty());
    }

    #[test]
    fn test_user_turn_has_no_record() {
        assert!(user("hi").to_record().is_none());
    }

    #[test]
    fn test_structured_turns_classify_back() {
        let script = ConversationScript::demo();
        let records: Vec<_> = script.turns().iter().filter_map(ScriptTurn::to_record).collect();
        let messages = classify(&records);

        assert_eq!(messages.len(), records.len());
        let kinds: Vec<_> = messages.iter().map(UiMessage::kind).collect();
        assert_eq!(
            kinds,
            vec!["agent", "agent", "agent", "strategy", "opportunity", "agent", "transaction", "vault"]
        );

        let strategy_turn = script
            .turns()
            .iter()
            .find_map(|t| match t {
                ScriptTurn::Strategy(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(messages[3], UiMessage::Strategy { strategy: strategy_turn });
    }

    #[test]
    fn test_strategy_record_text_is_empty() {
        let record = ConversationScript::demo().turns()[4].to_record().unwrap();
        assert_eq!(record.action, ResponseAction::Strategy);
        assert_eq!(record.text, "");
        assert!(record.content.get("strategy").is_some());
    }

    #[test]
    fn test_timing_from_config() {
        let timing = ReplayTiming::from_config(&DemoConfig::default());
        assert_eq!(timing, ReplayTiming::default());
    }

    #[test]
    fn test_between_entries_within_bounds() {
        let timing = ReplayTiming::default();
        for _ in 0..100 {
            let d = timing.between_entries();
            assert!(d >= timing.min_delay && d <= timing.max_delay);
        }
        assert_eq!(ReplayTiming::instant().between_entries(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_batches_split_at_user_turns() {
        let convo = MockConversation::new(
            ConversationScript::new(vec![agent("a1"), agent("a2"), user("u1"), agent("a3")]),
            ReplayTiming::instant(),
        );

        assert_eq!(texts(&convo.next_batch().await), vec!["a1", "a2"]);
        assert_eq!(convo.position().await, 3);
        assert_eq!(texts(&convo.next_batch().await), vec!["a3"]);
        assert!(convo.is_exhausted().await);
        assert!(convo.next_batch().await.is_empty());
        assert!(convo.next_batch().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_replays_first_batch() {
        let convo = MockConversation::new(ConversationScript::demo(), ReplayTiming::instant());
        let first = convo.next_batch().await;
        while !convo.next_batch().await.is_empty() {}

        convo.reset().await;
        assert_eq!(convo.position().await, 0);
        assert_eq!(convo.next_batch().await, first);
    }

    #[tokio::test]
    async fn test_demo_script_batches() {
        let convo = MockConversation::new(ConversationScript::demo(), ReplayTiming::instant());
        assert_eq!(convo.next_batch().await.len(), 2);
        assert_eq!(convo.next_batch().await.len(), 4);
        assert_eq!(convo.next_batch().await.len(), 2);
        assert!(convo.next_batch().await.is_empty());
    }

    #[tokio::test]
    async fn test_leading_user_turn_yields_empty_batch() {
        let convo = MockConversation::new(
            ConversationScript::new(vec![user("u"), agent("a")]),
            ReplayTiming::instant(),
        );
        assert!(convo.next_batch().await.is_empty());
        assert!(!convo.is_exhausted().await);
        assert_eq!(texts(&convo.next_batch().await), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_only_on_first_batch() {
        let timing = ReplayTiming {
            initial_delay: Duration::from_millis(2000),
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };
        let convo = MockConversation::new(
            ConversationScript::new(vec![agent("a"), user("u"), agent("b")]),
            timing,
        );

        let start = Instant::now();
        convo.next_batch().await;
        assert!(start.elapsed() >= Duration::from_millis(2000));

        let start = Instant::now();
        convo.next_batch().await;
        assert!(start.elapsed() < Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_only_between_entries() {
        let timing = ReplayTiming {
            initial_delay: Duration::ZERO,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(500),
        };
        let convo = MockConversation::new(
            ConversationScript::new(vec![agent("a"), agent("b"), agent("c")]),
            timing,
        );

        let start = Instant::now();
        let batch = convo.next_batch().await;
        assert_eq!(batch.len(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_get_distinct_batches() {
        let timing = ReplayTiming {
            initial_delay: Duration::from_millis(100),
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        };
        let convo = Arc::new(MockConversation::new(
            ConversationScript::new(vec![agent("a1"), agent("a2"), user("u"), agent("b1"), agent("b2")]),
            timing,
        ));

        let (x, y) = tokio::join!(convo.next_batch(), convo.next_batch());
        let mut got = vec![texts(&x).join(","), texts(&y).join(",")];
        got.sort();
        assert_eq!(got, vec!["a1,a2", "b1,b2"]);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let script = Arc::new(ConversationScript::demo());
        let one = MockConversation::with_shared_script(script.clone(), ReplayTiming::instant());
        let two = MockConversation::with_shared_script(script, ReplayTiming::instant());

        one.next_batch().await;
        one.next_batch().await;
        assert_eq!(two.position().await, 0);
        assert_eq!(two.next_batch().await.len(), 2);
    }
}
