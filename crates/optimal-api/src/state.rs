//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use optimal_chat::replayer::{ConversationScript, ReplayTiming};
use optimal_core::config::OptimalConfig;
use optimal_storage::{AccountRepository, Database, UserStateRepository};

use crate::actions::{GenerateStrategyAction, PresetStrategyModel, StrategyModel};
use crate::agent::DemoAgent;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OptimalConfig>,
    /// Account records; owned by the external account subsystem.
    pub accounts: Arc<AccountRepository>,
    pub users: Arc<UserStateRepository>,
    /// Scripted agent answering the message endpoint.
    pub agent: Arc<DemoAgent>,
    pub generate_strategy: Arc<GenerateStrategyAction>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Build state around an opened database, using the preset strategy model.
    pub fn new(config: OptimalConfig, database: Database) -> Self {
        Self::with_strategy_model(config, database, Arc::new(PresetStrategyModel))
    }

    pub fn with_strategy_model(
        config: OptimalConfig,
        database: Database,
        model: Arc<dyn StrategyModel>,
    ) -> Self {
        let database = Arc::new(database);
        let users = Arc::new(UserStateRepository::new(database.clone()));
        let agent = DemoAgent::new(
            ConversationScript::demo(),
            ReplayTiming::from_config(&config.demo),
            config.demo.max_sessions,
        );
        Self {
            accounts: Arc::new(AccountRepository::new(database)),
            generate_strategy: Arc::new(GenerateStrategyAction::new(users.clone(), model)),
            users,
            agent: Arc::new(agent),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}
