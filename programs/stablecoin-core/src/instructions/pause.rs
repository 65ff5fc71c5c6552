use anchor_lang::prelude::*;

use crate::constants::CONFIG_SEED;
use crate::events::{PausedEvent, UnpausedEvent};
use crate::state::StablecoinConfig;

#[derive(Accounts)]
pub struct SetPaused<'info> {
    pub pauser: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, config.mint.as_ref()],
        bump = config.bump
    )]
    pub config: Account<'info, StablecoinConfig>,
}

pub fn pause_handler(ctx: Context<SetPaused>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let now = Clock::get()?.unix_timestamp;

    config.require_pauser(&ctx.accounts.pauser.key())?;
    config.set_paused(true, now)?;

    emit!(PausedEvent {
        mint: config.mint,
        paused_by: ctx.accounts.pauser.key(),
        timestamp: now,
    });
    Ok(())
}

pub fn unpause_handler(ctx: Context<SetPaused>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let now = Clock::get()?.unix_timestamp;

    config.require_pauser(&ctx.accounts.pauser.key())?;
    config.set_paused(false, now)?;

    emit!(UnpausedEvent {
        mint: config.mint,
        unpaused_by: ctx.accounts.pauser.key(),
        timestamp: now,
    });
    Ok(())
}
