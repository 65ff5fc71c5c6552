use anchor_lang::prelude::*;

#[error_code]
pub enum TransferHookError {
    #[msg("Sender is blacklisted")]
    SenderBlacklisted,

    #[msg("Recipient is blacklisted")]
    RecipientBlacklisted,

    #[msg("Transfer hook is disabled")]
    HookDisabled,

    #[msg("Mint does not match hook configuration")]
    InvalidMint,

    #[msg("Signer is not the hook authority")]
    InvalidAuthority,

    #[msg("Hook may only run during a token transfer")]
    NotTransferring,

    #[msg("Blacklist account does not match the transfer party")]
    InvalidBlacklistAccount,
}
