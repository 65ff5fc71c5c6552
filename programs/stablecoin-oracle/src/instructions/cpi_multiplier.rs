use anchor_lang::prelude::*;

use crate::constants::ORACLE_SEED;
use crate::errors::OracleError;
use crate::events::CpiMultiplierUpdated;
use crate::state::OracleConfig;

/// "YYYY-MM"
const MAX_REFERENCE_MONTH_LEN: usize = 7;

#[derive(Accounts)]
pub struct UpdateCpiMultiplier<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [ORACLE_SEED, oracle_config.mint.as_ref()],
        bump = oracle_config.bump
    )]
    pub oracle_config: Account<'info, OracleConfig>,
}

pub fn update_cpi_multiplier_handler(
    ctx: Context<UpdateCpiMultiplier>,
    new_multiplier: u64,
    reference_month: String,
    data_source: String,
) -> Result<()> {
    require!(
        reference_month.len() <= MAX_REFERENCE_MONTH_LEN,
        OracleError::DescriptionTooLong
    );

    let oracle = &mut ctx.accounts.oracle_config;
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    oracle.require_authority(&authority)?;
    let old_multiplier = oracle.update_cpi(new_multiplier, data_source, now)?;
    msg!(
        "CPI multiplier {} -> {} for {}",
        old_multiplier,
        new_multiplier,
        reference_month
    );

    emit!(CpiMultiplierUpdated {
        mint: oracle.mint,
        old_multiplier,
        new_multiplier,
        reference_month,
        data_source: oracle.cpi_data_source.clone(),
        updated_by: authority,
        timestamp: now,
    });
    Ok(())
}
