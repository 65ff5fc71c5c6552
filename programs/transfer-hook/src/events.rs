use anchor_lang::prelude::*;

#[event]
pub struct TransferBlocked {
    pub mint: Pubkey,
    pub blocked_address: Pubkey,
    pub reason: String,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct TransferValidated {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct HookStatusChanged {
    pub mint: Pubkey,
    pub enabled: bool,
    pub changed_by: Pubkey,
    pub timestamp: i64,
}
