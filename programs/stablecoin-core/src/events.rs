use anchor_lang::prelude::*;

#[event]
pub struct Initialized {
    pub mint: Pubkey,
    pub master_authority: Pubkey,
    pub name: String,
    pub symbol: String,
    pub preset: String,
    pub decimals: u8,
    pub timestamp: i64,
}

#[event]
pub struct Minted {
    pub mint: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    pub minter: Pubkey,
    pub new_total_supply: u64,
    pub timestamp: i64,
}

#[event]
pub struct Burned {
    pub mint: Pubkey,
    pub burner: Pubkey,
    pub source: Pubkey,
    pub amount: u64,
    pub new_total_supply: u64,
    pub timestamp: i64,
}

#[event]
pub struct AccountFrozenEvent {
    pub mint: Pubkey,
    pub account: Pubkey,
    pub frozen_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct AccountThawedEvent {
    pub mint: Pubkey,
    pub account: Pubkey,
    pub thawed_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct PausedEvent {
    pub mint: Pubkey,
    pub paused_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct UnpausedEvent {
    pub mint: Pubkey,
    pub unpaused_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct RoleUpdated {
    pub mint: Pubkey,
    pub role: String,
    pub old_address: Pubkey,
    pub new_address: Pubkey,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct MinterAdded {
    pub mint: Pubkey,
    pub minter: Pubkey,
    pub quota_per_period: u64,
    pub period_seconds: i64,
    pub added_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct MinterRemoved {
    pub mint: Pubkey,
    pub minter: Pubkey,
    pub removed_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct MinterQuotaUpdated {
    pub mint: Pubkey,
    pub minter: Pubkey,
    pub quota_per_period: u64,
    pub period_seconds: i64,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct AuthorityTransferProposed {
    pub mint: Pubkey,
    pub current_authority: Pubkey,
    pub proposed_authority: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct AuthorityTransferred {
    pub mint: Pubkey,
    pub old_authority: Pubkey,
    pub new_authority: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct Blacklisted {
    pub mint: Pubkey,
    pub address: Pubkey,
    pub reason: String,
    pub blacklisted_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct RemovedFromBlacklist {
    pub mint: Pubkey,
    pub address: Pubkey,
    pub removed_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct Seized {
    pub mint: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
    pub reason: String,
    pub seized_by: Pubkey,
    pub sequence: u64,
    pub timestamp: i64,
}
