use anchor_lang::prelude::*;

use crate::constants::CONFIG_SEED;
use crate::errors::StablecoinError;
use crate::events::{AuthorityTransferProposed, AuthorityTransferred, RoleUpdated};
use crate::state::{RoleUpdate, StablecoinConfig};

#[derive(Accounts)]
pub struct UpdateRoles<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, config.mint.as_ref()],
        bump = config.bump
    )]
    pub config: Account<'info, StablecoinConfig>,
}

#[derive(Accounts)]
pub struct ProposeAuthority<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, config.mint.as_ref()],
        bump = config.bump
    )]
    pub config: Account<'info, StablecoinConfig>,
}

#[derive(Accounts)]
pub struct AcceptAuthority<'info> {
    pub new_authority: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, config.mint.as_ref()],
        bump = config.bump
    )]
    pub config: Account<'info, StablecoinConfig>,
}

pub fn update_roles_handler(ctx: Context<UpdateRoles>, update: RoleUpdate) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    config.require_master(&authority)?;
    let changes = config.apply_role_update(&update, now)?;

    for change in changes {
        emit!(RoleUpdated {
            mint: config.mint,
            role: change.role.to_string(),
            old_address: change.old_address,
            new_address: change.new_address,
            updated_by: authority,
            timestamp: now,
        });
    }
    Ok(())
}

pub fn propose_authority_handler(
    ctx: Context<ProposeAuthority>,
    new_authority: Pubkey,
) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let now = Clock::get()?.unix_timestamp;

    config.require_master(&ctx.accounts.authority.key())?;
    config.pending_authority.propose(new_authority);
    config.last_updated_at = now;

    emit!(AuthorityTransferProposed {
        mint: config.mint,
        current_authority: config.master_authority,
        proposed_authority: new_authority,
        timestamp: now,
    });
    Ok(())
}

pub fn accept_authority_handler(ctx: Context<AcceptAuthority>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let now = Clock::get()?.unix_timestamp;

    let new_authority = config
        .pending_authority
        .accept(ctx.accounts.new_authority.key())
        .map_err(StablecoinError::from)?;
    let old_authority = config.master_authority;
    config.master_authority = new_authority;
    config.last_updated_at = now;

    emit!(AuthorityTransferred {
        mint: config.mint,
        old_authority,
        new_authority,
        timestamp: now,
    });
    Ok(())
}

pub fn cancel_authority_handler(ctx: Context<ProposeAuthority>) -> Result<()> {
    let config = &mut ctx.accounts.config;

    config.require_master(&ctx.accounts.authority.key())?;
    let cancelled = config
        .pending_authority
        .cancel()
        .map_err(StablecoinError::from)?;
    config.last_updated_at = Clock::get()?.unix_timestamp;

    msg!("Cancelled authority transfer to {}", cancelled);
    Ok(())
}
