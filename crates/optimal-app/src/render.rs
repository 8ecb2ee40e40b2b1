//! Plain-text rendering of chat messages for the terminal.

use optimal_chat::protocol::UiMessage;
use optimal_core::types::{explorer_tx_url, supported_chain, Strategy};

/// Render one message as terminal text.
pub fn render(message: &UiMessage) -> String {
    match message {
        UiMessage::User(text) => format!("you> {}", text),
        UiMessage::Agent(text) => format!("agent> {}", text),
        UiMessage::Strategy { strategy } => format!("[strategy] {}", describe_strategy(strategy)),
        UiMessage::Opportunity(opp) => {
            let pair = opp
                .pair_token
                .as_ref()
                .map(|p| format!("/{}", p))
                .unwrap_or_default();
            format!(
                "[opportunity] {} {}{} on {} at {:.2}% APY",
                opp.kind, opp.token, pair, opp.protocol, opp.apy
            )
        }
        UiMessage::Transaction(tx) => {
            let pair = tx
                .pair_token
                .as_ref()
                .map(|p| format!("/{}", p))
                .unwrap_or_default();
            let chain = supported_chain(tx.chain_id)
                .map(|c| c.name.to_string())
                .unwrap_or_else(|| format!("chain {}", tx.chain_id));
            let mut out = format!(
                "[transaction] {} {} {}{} on {} at {:.2}% APY ({})",
                tx.kind, tx.amount, tx.token, pair, tx.protocol, tx.apy, chain
            );
            match explorer_tx_url(tx.chain_id, &tx.tx_hash) {
                Some(url) => out.push_str(&format!("\n  {}", url)),
                None => out.push_str(&format!("\n  tx {}", tx.tx_hash)),
            }
            out
        }
        UiMessage::Vault(vault) => {
            let status = if vault.is_active { "active" } else { "inactive" };
            let mut out = format!(
                "[vault] {} ({}, created {}, updated {})\n  {}",
                vault.address,
                status,
                vault.created_at,
                vault.last_update,
                describe_strategy(&vault.strategy)
            );
            for balance in &vault.balances {
                out.push_str(&format!("\n  {} {}", balance.amount, balance.symbol));
            }
            out
        }
    }
}

fn describe_strategy(strategy: &Strategy) -> String {
    format!(
        "{}: {}% lending / {}% liquidity. {}",
        strategy.risk_level,
        strategy.allocations.lending,
        strategy.allocations.liquidity,
        strategy.description
    )
}
