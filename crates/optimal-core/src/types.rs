use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Strategy
// =============================================================================

/// Risk appetite selected for a strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Aggressive,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Conservative => write!(f, "conservative"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::Aggressive => write!(f, "aggressive"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" => Ok(RiskLevel::Conservative),
            "moderate" => Ok(RiskLevel::Moderate),
            "aggressive" => Ok(RiskLevel::Aggressive),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Percentage split between lending and liquidity positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Allocations {
    pub lending: f64,
    pub liquidity: f64,
}

impl Allocations {
    pub fn total(&self) -> f64 {
        self.lending + self.liquidity
    }
}

/// A user's allocation policy across lending and liquidity positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub risk_level: RiskLevel,
    pub allocations: Allocations,
    pub description: String,
}

impl Strategy {
    /// Whether the allocations add up to 100%.
    ///
    /// This is a convention of the agent's output, not something the
    /// store enforces.
    pub fn is_fully_allocated(&self) -> bool {
        (self.allocations.total() - 100.0).abs() < 1e-9
    }
}

// =============================================================================
// Positions
// =============================================================================

/// Kind of DeFi position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Lending,
    Liquidity,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Lending => write!(f, "lending"),
            TransactionType::Liquidity => write!(f, "liquidity"),
        }
    }
}

/// Protocols a transaction can be executed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Aave,
    Compound,
    Aerodrome,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Aave => write!(f, "aave"),
            Protocol::Compound => write!(f, "compound"),
            Protocol::Aerodrome => write!(f, "aerodrome"),
        }
    }
}

/// Token balance held by a vault. `amount` is a decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Balance {
    pub token: String,
    pub amount: String,
    pub symbol: String,
}

/// An executed position-opening transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TransactionContent {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub protocol: Protocol,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_token: Option<String>,
    pub amount: String,
    pub apy: f64,
    pub tx_hash: String,
    pub chain_id: u64,
}

/// A yield opportunity surfaced by the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OpportunityContent {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub protocol: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_token: Option<String>,
    pub apy: f64,
}

/// Summary of a user's on-chain vault.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VaultContent {
    pub address: String,
    pub is_active: bool,
    pub created_at: String,
    pub last_update: String,
    pub balances: Vec<Balance>,
    pub strategy: Strategy,
}

// =============================================================================
// Persisted state
// =============================================================================

/// Per-user wallet/vault/strategy state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}

/// Account record owned by the account-management subsystem.
///
/// For wallet-based sign-in `name` carries the wallet address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Chains
// =============================================================================

/// A chain the wallet may connect to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SupportedChain {
    pub id: u64,
    pub name: &'static str,
    pub testnet: bool,
}

pub const BASE_MAINNET_CHAIN_ID: u64 = 8453;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

pub static SUPPORTED_CHAINS: [SupportedChain; 3] = [
    SupportedChain {
        id: BASE_SEPOLIA_CHAIN_ID,
        name: "Base Sepolia",
        testnet: true,
    },
    SupportedChain {
        id: 421614,
        name: "Arbitrum Sepolia",
        testnet: true,
    },
    SupportedChain {
        id: 43113,
        name: "Avalanche Fuji",
        testnet: true,
    },
];

/// Look up a supported chain by id.
pub fn supported_chain(id: u64) -> Option<&'static SupportedChain> {
    SUPPORTED_CHAINS.iter().find(|c| c.id == id)
}

/// Block explorer link for a transaction, when the chain has a known explorer.
pub fn explorer_tx_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    let base = match chain_id {
        BASE_MAINNET_CHAIN_ID => "https://basescan.org",
        BASE_SEPOLIA_CHAIN_ID => "https://sepolia.basescan.org",
        _ => return None,
    };
    Some(format!("{}/tx/{}", base, tx_hash))
}

/// Whether `s` is a `0x`-prefixed 20-byte hex address.
pub fn is_evm_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conservative() -> Strategy {
        Strategy {
            risk_level: RiskLevel::Conservative,
            allocations: Allocations {
                lending: 100.0,
                liquidity: 0.0,
            },
            description: "Lending only".to_string(),
        }
    }

    #[test]
    fn test_strategy_wire_shape() {
        let value = serde_json::to_value(conservative()).unwrap();
        assert_eq!(
            value,
            json!({
                "riskLevel": "conservative",
                "allocations": {"lending": 100.0, "liquidity": 0.0},
                "description": "Lending only"
            })
        );
    }

    #[test]
    fn test_strategy_accepts_integer_percentages() {
        let strategy: Strategy = serde_json::from_value(json!({
            "riskLevel": "moderate",
            "allocations": {"lending": 60, "liquidity": 40},
            "description": "x"
        }))
        .unwrap();
        assert_eq!(strategy.risk_level, RiskLevel::Moderate);
        assert!(strategy.is_fully_allocated());
    }

    #[test]
    fn test_strategy_allocation_total_not_enforced() {
        let mut strategy = conservative();
        strategy.allocations.liquidity = 20.0;
        assert_eq!(strategy.allocations.total(), 120.0);
        assert!(!strategy.is_fully_allocated());
    }

    #[test]
    fn test_risk_level_from_str() {
        assert_eq!("aggressive".parse::<RiskLevel>(), Ok(RiskLevel::Aggressive));
        assert!("reckless".parse::<RiskLevel>().is_err());
        assert_eq!(RiskLevel::Conservative.to_string(), "conservative");
    }

    #[test]
    fn test_transaction_content_wire_shape() {
        let tx: TransactionContent = serde_json::from_value(json!({
            "type": "liquidity",
            "protocol": "aerodrome",
            "token": "USDC",
            "pairToken": "WETH",
            "amount": "1000",
            "apy": 12.5,
            "txHash": "0xabc",
            "chainId": 84532
        }))
        .unwrap();
        assert_eq!(tx.kind, TransactionType::Liquidity);
        assert_eq!(tx.protocol, Protocol::Aerodrome);
        assert_eq!(tx.pair_token.as_deref(), Some("WETH"));
        assert_eq!(tx.chain_id, BASE_SEPOLIA_CHAIN_ID);
    }

    #[test]
    fn test_transaction_content_rejects_unknown_protocol() {
        let result = serde_json::from_value::<TransactionContent>(json!({
            "type": "lending",
            "protocol": "uniswap",
            "token": "USDC",
            "amount": "1",
            "apy": 1.0,
            "txHash": "0x1",
            "chainId": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_state_omits_absent_fields() {
        let state = UserState {
            wallet_address: Some("0xABC".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value, json!({"walletAddress": "0xABC"}));
    }

    #[test]
    fn test_supported_chain_lookup() {
        assert_eq!(supported_chain(84532).unwrap().name, "Base Sepolia");
        assert_eq!(supported_chain(43113).unwrap().name, "Avalanche Fuji");
        assert!(supported_chain(1).is_none());
        assert!(SUPPORTED_CHAINS.iter().all(|c| c.testnet));
    }

    #[test]
    fn test_explorer_tx_url() {
        assert_eq!(
            explorer_tx_url(8453, "0xdead").as_deref(),
            Some("https://basescan.org/tx/0xdead")
        );
        assert_eq!(
            explorer_tx_url(84532, "0xbeef").as_deref(),
            Some("https://sepolia.basescan.org/tx/0xbeef")
        );
        assert!(explorer_tx_url(43113, "0x1").is_none());
    }

    #[test]
    fn test_is_evm_address() {
        assert!(is_evm_address("0xfB10339fA9eF9Ec7FB99f3393CEa13b5736bd061"));
        assert!(!is_evm_address("fB10339fA9eF9Ec7FB99f3393CEa13b5736bd061"));
        assert!(!is_evm_address("0x1234"));
        assert!(!is_evm_address("0xZZ10339fA9eF9Ec7FB99f3393CEa13b5736bd061"));
    }
}
