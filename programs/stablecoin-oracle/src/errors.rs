use anchor_lang::prelude::*;
use stablecoin_core::state::PendingAuthorityError;

#[error_code]
pub enum OracleError {
    #[msg("Price feed is stale")]
    PriceTooStale,

    #[msg("Price feed returned a non-positive price")]
    InvalidPrice,

    #[msg("Price confidence interval is too wide")]
    ConfidenceTooWide,

    #[msg("Price feed account is not readable")]
    FeedNotReady,

    #[msg("Quote has expired")]
    QuoteExpired,

    #[msg("Quote has already been used")]
    QuoteAlreadyUsed,

    #[msg("Output is below the requested minimum")]
    SlippageExceeded,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Computed output is zero")]
    ZeroOutput,

    #[msg("Feed symbol is already registered")]
    FeedAlreadyRegistered,

    #[msg("Feed not found in registry")]
    FeedNotFound,

    #[msg("Symbol exceeds maximum length")]
    SymbolTooLong,

    #[msg("Feed registry is full")]
    RegistryFull,

    #[msg("Oracle is paused")]
    OraclePaused,

    #[msg("Signer is not the oracle authority")]
    Unauthorized,

    #[msg("CPI multiplier update is too soon")]
    CpiUpdateTooSoon,

    #[msg("Arithmetic overflow")]
    MathOverflow,

    #[msg("Division by zero")]
    DivisionByZero,

    #[msg("Feed account does not match the registry entry")]
    FeedMismatch,

    #[msg("No authority transfer is pending")]
    NoPendingTransfer,

    #[msg("Signer is not the pending authority")]
    NotPendingAuthority,

    #[msg("CPI multiplier must be greater than zero")]
    InvalidCpiMultiplier,

    #[msg("Fee exceeds 10000 basis points")]
    InvalidFeeBps,

    #[msg("Oracle is not paused")]
    OracleNotPaused,

    #[msg("Quote direction does not match the instruction")]
    QuoteDirectionMismatch,

    #[msg("Quote has not expired yet")]
    QuoteStillLive,

    #[msg("Text field exceeds maximum length")]
    DescriptionTooLong,
}

impl From<PendingAuthorityError> for OracleError {
    fn from(err: PendingAuthorityError) -> Self {
        match err {
            PendingAuthorityError::NoPendingTransfer => OracleError::NoPendingTransfer,
            PendingAuthorityError::NotPendingAuthority => OracleError::NotPendingAuthority,
        }
    }
}
