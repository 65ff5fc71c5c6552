use anchor_lang::prelude::*;

#[event]
pub struct RegistryInitialized {
    pub registry: Pubkey,
    pub authority: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct FeedRegistered {
    pub symbol: String,
    pub feed_account: Pubkey,
    pub feed_type: String,
    pub slot_index: u8,
    pub registered_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct FeedDeactivated {
    pub symbol: String,
    pub deactivated_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct OracleInitialized {
    pub mint: Pubkey,
    pub authority: Pubkey,
    pub feed_symbol: String,
    pub mint_fee_bps: u16,
    pub redeem_fee_bps: u16,
    pub cpi_multiplier: u64,
    pub timestamp: i64,
}

#[event]
pub struct OracleParamsUpdated {
    pub mint: Pubkey,
    pub mint_fee_bps: u16,
    pub redeem_fee_bps: u16,
    pub max_staleness_secs: i64,
    pub max_confidence_bps: u16,
    pub quote_validity_secs: i64,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct QuoteGenerated {
    pub quote_id: Pubkey,
    pub mint: Pubkey,
    pub requester: Pubkey,
    pub feed_symbol: String,
    pub direction: String,
    pub input_amount: u64,
    pub output_amount: u64,
    pub fee_amount: u64,
    pub price_used: u64,
    pub valid_until: i64,
    pub timestamp: i64,
}

#[event]
pub struct OracleMint {
    pub mint: Pubkey,
    pub quote_id: Pubkey,
    pub requester: Pubkey,
    pub recipient: Pubkey,
    pub usd_amount: u64,
    pub token_amount: u64,
    pub fee_amount: u64,
    pub price_used: u64,
    pub timestamp: i64,
}

#[event]
pub struct OracleRedeem {
    pub mint: Pubkey,
    pub quote_id: Pubkey,
    pub requester: Pubkey,
    pub token_amount: u64,
    pub usd_amount: u64,
    pub fee_amount: u64,
    pub price_used: u64,
    pub timestamp: i64,
}

#[event]
pub struct QuoteClosed {
    pub quote_id: Pubkey,
    pub requester: Pubkey,
    pub used: bool,
    pub timestamp: i64,
}

#[event]
pub struct CpiMultiplierUpdated {
    pub mint: Pubkey,
    pub old_multiplier: u64,
    pub new_multiplier: u64,
    pub reference_month: String,
    pub data_source: String,
    pub updated_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct OraclePausedEvent {
    pub mint: Pubkey,
    pub reason: String,
    pub paused_by: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct OracleUnpausedEvent {
    pub mint: Pubkey,
    pub unpaused_by: Pubkey,
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
