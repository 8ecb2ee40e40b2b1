//! Repository implementations for SQLite-backed persistence.
//!
//! `AccountRepository` stands in for the account-management subsystem that
//! owns the `account` table; `UserStateRepository` owns the `user` table.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

use optimal_core::error::OptimalError;
use optimal_core::types::{is_evm_address, Account, Strategy, UserState};

use crate::db::Database;

/// Repository for account records.
pub struct AccountRepository {
    db: Arc<Database>,
}

impl AccountRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new account.
    pub fn create(&self, account: &Account) -> Result<(), OptimalError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO account (id, name, username, email, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    account.id,
                    account.name,
                    account.username,
                    account.email,
                    account.created_at.timestamp(),
                ],
            )
            .map_err(|e| OptimalError::Storage(format!("Failed to create account: {}", e)))?;
            Ok(())
        })
    }

    /// Find an account by ID.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Account>, OptimalError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, username, email, created_at FROM account WHERE id = ?1",
                rusqlite::params![id],
                |row| {
                    let created_at: i64 = row.get(4)?;
                    Ok(Account {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        username: row.get(2)?,
                        email: row.get(3)?,
                        created_at: Utc
                            .timestamp_opt(created_at, 0)
                            .single()
                            .unwrap_or_else(Utc::now),
                    })
                },
            )
            .optional()
            .map_err(|e| OptimalError::Storage(e.to_string()))
        })
    }
}

/// Repository for per-user wallet/vault/strategy state.
pub struct UserStateRepository {
    db: Arc<Database>,
}

impl UserStateRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Return the user's state, creating it from their account on first use.
    ///
    /// Creation is a single conditional insert inside a transaction, so two
    /// concurrent first requests for the same user both observe one row.
    /// Fails with `AccountNotFound` when no account exists for `user_id`.
    pub fn get_or_create_user_state(&self, user_id: &str) -> Result<UserState, OptimalError> {
        self.db.with_conn(|conn| {
            if let Some(state) = select_user(conn, user_id)? {
                return Ok(state);
            }

            let tx = conn
                .unchecked_transaction()
                .map_err(|e| OptimalError::Storage(e.to_string()))?;

            let account_name: Option<String> = tx
                .query_row(
                    "SELECT name FROM account WHERE id = ?1",
                    rusqlite::params![user_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| OptimalError::Storage(e.to_string()))?;

            let Some(name) = account_name else {
                return Err(OptimalError::AccountNotFound(user_id.to_string()));
            };
            if !is_evm_address(&name) {
                warn!(user_id, account_name = %name, "Account name is not a wallet address");
            }

            let inserted = tx
                .execute(
                    "INSERT OR IGNORE INTO \"user\" (userId, walletAddress)
                     SELECT id, name FROM account WHERE id = ?1",
                    rusqlite::params![user_id],
                )
                .map_err(|e| OptimalError::Storage(format!("Failed to create user state: {}", e)))?;

            let state = select_user(&tx, user_id)?
                .ok_or_else(|| OptimalError::UserNotFound(user_id.to_string()))?;

            tx.commit()
                .map_err(|e| OptimalError::Storage(e.to_string()))?;

            if inserted > 0 {
                debug!(user_id, "User state created from account");
            }
            Ok(state)
        })
    }

    /// Find a user's state by ID.
    pub fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserState>, OptimalError> {
        self.db.with_conn(|conn| select_user(conn, user_id))
    }

    /// Insert a user state row.
    pub fn create_user_state(&self, user_id: &str, state: &UserState) -> Result<(), OptimalError> {
        let strategy = state
            .strategy
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO \"user\" (userId, walletAddress, vaultAddress, strategy)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, state.wallet_address, state.vault_address, strategy],
            )
            .map_err(|e| OptimalError::Storage(format!("Failed to create user state: {}", e)))?;
            Ok(())
        })
    }

    /// Replace the user's strategy.
    pub fn update_user_strategy(&self, user_id: &str, strategy: &Strategy) -> Result<(), OptimalError> {
        let json = serde_json::to_string(strategy)?;
        self.update_column(user_id, "UPDATE \"user\" SET strategy = ?1 WHERE userId = ?2", &json)
    }

    /// Record the user's vault address.
    pub fn update_user_vault_address(&self, user_id: &str, vault_address: &str) -> Result<(), OptimalError> {
        self.update_column(
            user_id,
            "UPDATE \"user\" SET vaultAddress = ?1 WHERE userId = ?2",
            vault_address,
        )
    }

    fn update_column(&self, user_id: &str, sql: &str, value: &str) -> Result<(), OptimalError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(sql, rusqlite::params![value, user_id])
                .map_err(|e| OptimalError::Storage(format!("Failed to update user state: {}", e)))?;
            if changed == 0 {
                return Err(OptimalError::UserNotFound(user_id.to_string()));
            }
            Ok(())
        })
    }
}

/// Read one user row, deserializing the stored strategy JSON.
fn select_user(conn: &Connection, user_id: &str) -> Result<Option<UserState>, OptimalError> {
    let row = conn
        .query_row(
            "SELECT walletAddress, vaultAddress, strategy FROM \"user\" WHERE userId = ?1",
            rusqlite::params![user_id],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| OptimalError::Storage(e.to_string()))?;

    let Some((wallet_address, vault_address, strategy)) = row else {
        return Ok(None);
    };

    let strategy = match strategy {
        Some(json) => Some(serde_json::from_str::<Strategy>(&json)?),
        None => None,
    };

    Ok(Some(UserState {
        wallet_address,
        vault_address,
        strategy,
    }))
}
