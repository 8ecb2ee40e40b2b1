//! Agent actions served by this backend.
//!
//! The generate-strategy action produces an allocation strategy for a user
//! who has none yet, persists it, and reports what happened as an explicit
//! [`ActionOutcome`] rather than swallowing failures.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use optimal_chat::protocol::{RawResponseRecord, ResponseAction, ResponseContent};
use optimal_core::error::OptimalError;
use optimal_core::types::{Allocations, RiskLevel, Strategy};
use optimal_storage::UserStateRepository;

/// Source of generated strategies. In production this is a language model.
#[async_trait]
pub trait StrategyModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Strategy, OptimalError>;
}

/// Maps risk words in the prompt to fixed allocations.
///
/// A prompt that names no risk level gets the conservative preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetStrategyModel;

impl PresetStrategyModel {
    pub fn preset(level: RiskLevel) -> Strategy {
        let (lending, liquidity, description) = match level {
            RiskLevel::Conservative => (
                100.0,
                0.0,
                "A conservative strategy focused solely on lending. This will prioritize \
                 stability and capital preservation.",
            ),
            RiskLevel::Moderate => (
                60.0,
                40.0,
                "A balanced strategy that keeps most funds in lending while earning \
                 additional yield from liquidity pools.",
            ),
            RiskLevel::Aggressive => (
                20.0,
                80.0,
                "An aggressive strategy weighted towards liquidity pools for higher yield \
                 at the cost of impermanent loss risk.",
            ),
        };
        Strategy {
            risk_level: level,
            allocations: Allocations { lending, liquidity },
            description: description.to_string(),
        }
    }

    /// First risk level named in `prompt`, if any.
    pub fn detect_risk_level(prompt: &str) -> Option<RiskLevel> {
        let prompt = prompt.to_lowercase();
        [
            ("aggressive", RiskLevel::Aggressive),
            ("high risk", RiskLevel::Aggressive),
            ("moderate", RiskLevel::Moderate),
            ("balanced", RiskLevel::Moderate),
            ("conservative", RiskLevel::Conservative),
            ("safe", RiskLevel::Conservative),
        ]
        .into_iter()
        .filter_map(|(word, level)| prompt.find(word).map(|pos| (pos, level)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, level)| level)
    }
}

#[async_trait]
impl StrategyModel for PresetStrategyModel {
    async fn generate(&self, prompt: &str) -> Result<Strategy, OptimalError> {
        let level = Self::detect_risk_level(prompt).unwrap_or(RiskLevel::Conservative);
        Ok(Self::preset(level))
    }
}

/// Result of running an action.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Completed { strategy: Strategy },
    Skipped { reason: String },
    Failed { reason: String },
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed { .. })
    }

    /// The response record a client would receive for this outcome.
    pub fn to_record(&self, agent_name: &str) -> RawResponseRecord {
        let (text, content) = match self {
            ActionOutcome::Completed { strategy } => (
                "Successfully generated strategy".to_string(),
                ResponseContent::succeeded().with_field("strategy", strategy_value(strategy)),
            ),
            ActionOutcome::Skipped { reason } | ActionOutcome::Failed { reason } => {
                (reason.clone(), ResponseContent::failed())
            }
        };
        RawResponseRecord::new(agent_name, ResponseAction::Strategy, text, content)
    }
}

fn strategy_value(strategy: &Strategy) -> serde_json::Value {
    serde_json::to_value(strategy).unwrap_or(serde_json::Value::Null)
}

/// Generates and stores a strategy for a user who has none.
pub struct GenerateStrategyAction {
    users: Arc<UserStateRepository>,
    model: Arc<dyn StrategyModel>,
}

impl GenerateStrategyAction {
    pub const NAME: &'static str = "GENERATE_STRATEGY";
    pub const SIMILES: [&'static str; 3] = ["CREATE_STRATEGY", "SETUP_STRATEGY", "START_STRATEGY"];

    pub fn new(users: Arc<UserStateRepository>, model: Arc<dyn StrategyModel>) -> Self {
        Self { users, model }
    }

    /// Whether `name` invokes this action.
    pub fn matches(name: &str) -> bool {
        name == Self::NAME || Self::SIMILES.contains(&name)
    }

    /// True only when the user has no strategy yet.
    pub fn validate(&self, user_id: &str) -> Result<bool, OptimalError> {
        let state = self.users.get_or_create_user_state(user_id)?;
        Ok(state.strategy.is_none())
    }

    pub async fn handle(&self, user_id: &str, prompt: &str) -> ActionOutcome {
        match self.validate(user_id) {
            Ok(true) => {}
            Ok(false) => {
                info!(user_id, "Skipping strategy generation: strategy already set");
                return ActionOutcome::Skipped {
                    reason: "User already has a strategy".to_string(),
                };
            }
            Err(e) => {
                warn!(user_id, error = %e, "Strategy generation precondition failed");
                return ActionOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }

        let strategy = match self.model.generate(prompt).await {
            Ok(strategy) => strategy,
            Err(e) => {
                error!(user_id, error = %e, "Strategy model failed");
                return ActionOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if !strategy.is_fully_allocated() {
            warn!(
                user_id,
                total = strategy.allocations.total(),
                "Generated strategy does not allocate 100%"
            );
        }

        if let Err(e) = self.users.update_user_strategy(user_id, &strategy) {
            error!(user_id, error = %e, "Failed to store generated strategy");
            return ActionOutcome::Failed {
                reason: e.to_string(),
            };
        }

        info!(user_id, risk_level = %strategy.risk_level, "Generated strategy");
        ActionOutcome::Completed { strategy }
    }
}
