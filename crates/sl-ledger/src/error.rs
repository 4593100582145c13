use thiserror::Error;

use sl_common::{Principal, TierId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Invalid tier: {0}")]
    InvalidTier(TierId),

    #[error("Invalid amount or months")]
    InvalidParameters,

    #[error("No active subscription for {0}")]
    NoActiveSubscription(Principal),

    #[error("No paused subscription for {0}")]
    NoPausedSubscription(Principal),

    #[error("Principal must not be empty")]
    InvalidPrincipal,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate tier id: {0}")]
    DuplicateTier(TierId),

    #[error("Tier {0} must have a positive price")]
    InvalidPrice(TierId),

    #[error("Tier {0} must have a positive duration")]
    InvalidDuration(TierId),
}

/// Failure to assemble a ledger from configuration
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] sl_config::ConfigError),

    #[error("Tier catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
