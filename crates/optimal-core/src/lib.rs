pub mod config;
pub mod error;
pub mod types;

pub use config::OptimalConfig;
pub use error::{OptimalError, Result};
pub use types::*;
