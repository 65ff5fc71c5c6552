use anchor_lang::prelude::*;

#[error_code]
pub enum StablecoinError {
    // Access control
    #[msg("Caller is not the master authority")]
    NotMasterAuthority,

    #[msg("Caller is not an authorized minter")]
    NotMinter,

    #[msg("Caller is not the burner")]
    NotBurner,

    #[msg("Caller is not the blacklister")]
    NotBlacklister,

    #[msg("Caller is not the seizer")]
    NotSeizer,

    #[msg("Caller is not the pauser")]
    NotPauser,

    // Feature gating
    #[msg("Compliance module is not enabled for this stablecoin")]
    ComplianceNotEnabled,

    #[msg("Permanent delegate extension is not enabled")]
    PermanentDelegateNotEnabled,

    #[msg("Transfer hook is enabled but no hook program was registered")]
    HookNotRegistered,

    // State guards
    #[msg("Stablecoin is paused")]
    Paused,

    #[msg("Stablecoin is not paused")]
    NotPaused,

    #[msg("Address is already blacklisted")]
    AlreadyBlacklisted,

    #[msg("Address is not blacklisted")]
    NotBlacklisted,

    #[msg("Blacklist target must be a non-zero address")]
    InvalidBlacklistTarget,

    #[msg("Account must be frozen before seizure")]
    AccountNotFrozen,

    // Quotas
    #[msg("Minting quota exceeded for current period")]
    QuotaExceeded,

    #[msg("Minter is inactive")]
    MinterInactive,

    #[msg("Minter already exists")]
    MinterAlreadyExists,

    // Authority transfer
    #[msg("No authority transfer is pending")]
    NoPendingTransfer,

    #[msg("Signer is not the pending authority")]
    NotPendingAuthority,

    // Validation
    #[msg("Name exceeds maximum length of 32 characters")]
    NameTooLong,

    #[msg("Symbol exceeds maximum length of 10 characters")]
    SymbolTooLong,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Supply arithmetic overflow")]
    SupplyOverflow,

    #[msg("URI exceeds maximum length of 200 characters")]
    UriTooLong,

    #[msg("Reason exceeds maximum length of 128 characters")]
    ReasonTooLong,

    #[msg("Insufficient token balance")]
    InsufficientBalance,

    #[msg("Token account does not belong to this stablecoin")]
    InvalidTokenAccount,

    #[msg("Balances after seizure do not match the seized amount")]
    SeizureBalanceMismatch,
}
