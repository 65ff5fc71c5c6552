use anchor_lang::prelude::*;
use stablecoin_core::constants::CONFIG_SEED;
use stablecoin_core::state::{PendingAuthority, StablecoinConfig};

use crate::constants::{MAX_DATA_SOURCE_LEN, ORACLE_SEED, ORACLE_VERSION, REGISTRY_SEED};
use crate::errors::OracleError;
use crate::events::{
    AuthorityTransferProposed, AuthorityTransferred, OracleInitialized, OraclePausedEvent,
    OracleParamsUpdated, OracleUnpausedEvent,
};
use crate::state::{
    validate_description, validate_fee_bps, FeedRegistry, OracleConfig, OracleParamsUpdate,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct OracleInitParams {
    pub feed_symbol: String,
    pub description: String,
    pub max_staleness_secs: i64,
    pub mint_fee_bps: u16,
    pub redeem_fee_bps: u16,
    pub max_confidence_bps: u16,
    pub quote_validity_secs: i64,
    pub cpi_multiplier: u64,
    pub cpi_min_update_interval: i64,
    pub cpi_data_source: String,
}

impl OracleInitParams {
    fn validate(&self) -> Result<()> {
        validate_fee_bps(self.mint_fee_bps)?;
        validate_fee_bps(self.redeem_fee_bps)?;
        validate_fee_bps(self.max_confidence_bps)?;
        require!(self.cpi_multiplier > 0, OracleError::InvalidCpiMultiplier);
        validate_description(&self.description)?;
        require!(
            self.cpi_data_source.len() <= MAX_DATA_SOURCE_LEN,
            OracleError::DescriptionTooLong
        );
        Ok(())
    }
}

#[derive(Accounts)]
pub struct InitializeOracle<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [CONFIG_SEED, core_config.mint.as_ref()],
        bump = core_config.bump,
        seeds::program = stablecoin_core::ID
    )]
    pub core_config: Account<'info, StablecoinConfig>,

    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, FeedRegistry>>,

    #[account(
        init,
        payer = authority,
        space = 8 + OracleConfig::INIT_SPACE,
        seeds = [ORACLE_SEED, core_config.mint.as_ref()],
        bump
    )]
    pub oracle_config: Account<'info, OracleConfig>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateOracle<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [ORACLE_SEED, oracle_config.mint.as_ref()],
        bump = oracle_config.bump
    )]
    pub oracle_config: Account<'info, OracleConfig>,
}

#[derive(Accounts)]
pub struct AcceptOracleAuthority<'info> {
    pub new_authority: Signer<'info>,

    #[account(
        mut,
        seeds = [ORACLE_SEED, oracle_config.mint.as_ref()],
        bump = oracle_config.bump
    )]
    pub oracle_config: Account<'info, OracleConfig>,
}

/// Only the stablecoin's master authority can attach an oracle to it.
pub fn initialize_oracle_handler(
    ctx: Context<InitializeOracle>,
    params: OracleInitParams,
) -> Result<()> {
    let authority = ctx.accounts.authority.key();
    require_keys_eq!(
        authority,
        ctx.accounts.core_config.master_authority,
        OracleError::Unauthorized
    );
    params.validate()?;
    ctx.accounts.registry.require_feed(&params.feed_symbol)?;

    let now = Clock::get()?.unix_timestamp;
    let oracle = &mut ctx.accounts.oracle_config;
    oracle.version = ORACLE_VERSION;
    oracle.mint = ctx.accounts.core_config.mint;
    oracle.authority = authority;
    oracle.pending_authority = PendingAuthority::default();
    oracle.feed_symbol = params.feed_symbol;
    oracle.description = params.description;
    oracle.max_staleness_secs = params.max_staleness_secs;
    oracle.mint_fee_bps = params.mint_fee_bps;
    oracle.redeem_fee_bps = params.redeem_fee_bps;
    oracle.max_confidence_bps = params.max_confidence_bps;
    oracle.quote_validity_secs = params.quote_validity_secs;
    oracle.cpi_multiplier = params.cpi_multiplier;
    oracle.cpi_last_updated = now;
    oracle.cpi_min_update_interval = params.cpi_min_update_interval;
    oracle.cpi_data_source = params.cpi_data_source;
    oracle.paused = false;
    oracle.pause_reason = String::new();
    oracle.total_minted_usd = 0;
    oracle.total_redeemed_usd = 0;
    oracle.mint_fees_collected = 0;
    oracle.redeem_fees_collected_usd = 0;
    oracle.created_at = now;
    oracle.last_updated_at = now;
    oracle.bump = ctx.bumps.oracle_config;

    emit!(OracleInitialized {
        mint: oracle.mint,
        authority,
        feed_symbol: oracle.feed_symbol.clone(),
        mint_fee_bps: oracle.mint_fee_bps,
        redeem_fee_bps: oracle.redeem_fee_bps,
        cpi_multiplier: oracle.cpi_multiplier,
        timestamp: now,
    });
    Ok(())
}

pub fn update_oracle_params_handler(
    ctx: Context<UpdateOracle>,
    update: OracleParamsUpdate,
) -> Result<()> {
    let oracle = &mut ctx.accounts.oracle_config;
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    oracle.require_authority(&authority)?;
    oracle.apply_params(&update, now)?;

    emit!(OracleParamsUpdated {
        mint: oracle.mint,
        mint_fee_bps: oracle.mint_fee_bps,
        redeem_fee_bps: oracle.redeem_fee_bps,
        max_staleness_secs: oracle.max_staleness_secs,
        max_confidence_bps: oracle.max_confidence_bps,
        quote_validity_secs: oracle.quote_validity_secs,
        updated_by: authority,
        timestamp: now,
    });
    Ok(())
}

pub fn pause_oracle_handler(ctx: Context<UpdateOracle>, reason: String) -> Result<()> {
    let oracle = &mut ctx.accounts.oracle_config;
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    oracle.require_authority(&authority)?;
    oracle.pause(reason, now)?;

    emit!(OraclePausedEvent {
        mint: oracle.mint,
        reason: oracle.pause_reason.clone(),
        paused_by: authority,
        timestamp: now,
    });
    Ok(())
}

pub fn unpause_oracle_handler(ctx: Context<UpdateOracle>) -> Result<()> {
    let oracle = &mut ctx.accounts.oracle_config;
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    oracle.require_authority(&authority)?;
    oracle.unpause(now)?;

    emit!(OracleUnpausedEvent {
        mint: oracle.mint,
        unpaused_by: authority,
        timestamp: now,
    });
    Ok(())
}

pub fn propose_oracle_authority_handler(
    ctx: Context<UpdateOracle>,
    new_authority: Pubkey,
) -> Result<()> {
    let oracle = &mut ctx.accounts.oracle_config;
    let now = Clock::get()?.unix_timestamp;

    oracle.require_authority(&ctx.accounts.authority.key())?;
    oracle.pending_authority.propose(new_authority);
    oracle.last_updated_at = now;

    emit!(AuthorityTransferProposed {
        mint: oracle.mint,
        current_authority: oracle.authority,
        proposed_authority: new_authority,
        timestamp: now,
    });
    Ok(())
}

pub fn accept_oracle_authority_handler(ctx: Context<AcceptOracleAuthority>) -> Result<()> {
    let oracle = &mut ctx.accounts.oracle_config;
    let now = Clock::get()?.unix_timestamp;

    let new_authority = oracle
        .pending_authority
        .accept(ctx.accounts.new_authority.key())
        .map_err(OracleError::from)?;
    let old_authority = oracle.authority;
    oracle.authority = new_authority;
    oracle.last_updated_at = now;

    emit!(AuthorityTransferred {
        mint: oracle.mint,
        old_authority,
        new_authority,
        timestamp: now,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> OracleInitParams {
        OracleInitParams {
            feed_symbol: "EUR/USD".to_string(),
            description: "Euro stablecoin".to_string(),
            max_staleness_secs: 60,
            mint_fee_bps: 30,
            redeem_fee_bps: 30,
            max_confidence_bps: 100,
            quote_validity_secs: 30,
            cpi_multiplier: 1_000_000,
            cpi_min_update_interval: 0,
            cpi_data_source: String::new(),
        }
    }

    #[test]
    fn test_init_params_validation() {
        assert!(params().validate().is_ok());

        let mut zero_cpi = params();
        zero_cpi.cpi_multiplier = 0;
        assert_eq!(
            zero_cpi.validate().unwrap_err(),
            OracleError::InvalidCpiMultiplier.into()
        );

        let mut high_fee = params();
        high_fee.redeem_fee_bps = 10_001;
        assert_eq!(
            high_fee.validate().unwrap_err(),
            OracleError::InvalidFeeBps.into()
        );

        let mut long_description = params();
        long_description.description = "d".repeat(101);
        assert_eq!(
            long_description.validate().unwrap_err(),
            OracleError::DescriptionTooLong.into()
        );
    }
}
