use anchor_lang::prelude::*;

use crate::constants::{CONFIG_SEED, MINTER_SEED};
use crate::events::{MinterAdded, MinterQuotaUpdated, MinterRemoved};
use crate::state::{MinterConfig, StablecoinConfig};

#[derive(Accounts)]
#[instruction(minter: Pubkey)]
pub struct AddMinter<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [CONFIG_SEED, config.mint.as_ref()],
        bump = config.bump
    )]
    pub config: Account<'info, StablecoinConfig>,

    #[account(
        init_if_needed,
        payer = authority,
        space = 8 + MinterConfig::INIT_SPACE,
        seeds = [MINTER_SEED, config.mint.as_ref(), minter.as_ref()],
        bump
    )]
    pub minter_config: Account<'info, MinterConfig>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RemoveMinter<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [CONFIG_SEED, config.mint.as_ref()],
        bump = config.bump
    )]
    pub config: Account<'info, StablecoinConfig>,

    #[account(
        mut,
        close = authority,
        seeds = [MINTER_SEED, config.mint.as_ref(), minter_config.minter.as_ref()],
        bump = minter_config.bump
    )]
    pub minter_config: Account<'info, MinterConfig>,
}

#[derive(Accounts)]
pub struct UpdateMinterQuota<'info> {
    pub authority: Signer<'info>,

    #[account(
        seeds = [CONFIG_SEED, config.mint.as_ref()],
        bump = config.bump
    )]
    pub config: Account<'info, StablecoinConfig>,

    #[account(
        mut,
        seeds = [MINTER_SEED, config.mint.as_ref(), minter_config.minter.as_ref()],
        bump = minter_config.bump
    )]
    pub minter_config: Account<'info, MinterConfig>,
}

pub fn add_minter_handler(
    ctx: Context<AddMinter>,
    minter: Pubkey,
    quota_per_period: u64,
    period_seconds: i64,
) -> Result<()> {
    let config = &ctx.accounts.config;
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    config.require_minter_authority(&authority)?;
    ctx.accounts.minter_config.open(
        config.mint,
        minter,
        quota_per_period,
        period_seconds,
        now,
        ctx.bumps.minter_config,
    )?;

    emit!(MinterAdded {
        mint: config.mint,
        minter,
        quota_per_period,
        period_seconds: ctx.accounts.minter_config.period_seconds,
        added_by: authority,
        timestamp: now,
    });
    Ok(())
}

pub fn remove_minter_handler(ctx: Context<RemoveMinter>) -> Result<()> {
    let config = &ctx.accounts.config;
    let authority = ctx.accounts.authority.key();

    config.require_minter_authority(&authority)?;

    emit!(MinterRemoved {
        mint: config.mint,
        minter: ctx.accounts.minter_config.minter,
        removed_by: authority,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}

pub fn update_minter_quota_handler(
    ctx: Context<UpdateMinterQuota>,
    quota_per_period: u64,
    period_seconds: i64,
) -> Result<()> {
    let config = &ctx.accounts.config;
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    config.require_minter_authority(&authority)?;
    let minter_config = &mut ctx.accounts.minter_config;
    minter_config.reset_quota(quota_per_period, period_seconds, now);

    emit!(MinterQuotaUpdated {
        mint: config.mint,
        minter: minter_config.minter,
        quota_per_period,
        period_seconds: minter_config.period_seconds,
        updated_by: authority,
        timestamp: now,
    });
    Ok(())
}
