use anchor_lang::prelude::*;
use anchor_spl::token_2022::{self, Token2022};
use anchor_spl::token_interface::{Mint, TokenAccount};

use crate::constants::CONFIG_SEED;
use crate::events::{AccountFrozenEvent, AccountThawedEvent};
use crate::state::StablecoinConfig;

/// Shared by `freeze_account` and `thaw_account`.
#[derive(Accounts)]
pub struct SetAccountFrozen<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump = config.bump,
        has_one = mint
    )]
    pub config: Account<'info, StablecoinConfig>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        token::mint = mint,
        token::token_program = token_2022_program
    )]
    pub token_account: InterfaceAccount<'info, TokenAccount>,

    pub token_2022_program: Program<'info, Token2022>,
}

pub fn freeze_handler(ctx: Context<SetAccountFrozen>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    config.require_freeze_authority(&ctx.accounts.authority.key())?;

    let mint_key = ctx.accounts.mint.key();
    let signer_seeds: &[&[u8]] = &[CONFIG_SEED, mint_key.as_ref(), &[config.bump]];
    let signer_seeds_arr = [signer_seeds];
    let cpi_accounts = token_2022::FreezeAccount {
        account: ctx.accounts.token_account.to_account_info(),
        mint: ctx.accounts.mint.to_account_info(),
        authority: config.to_account_info(),
    };
    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_2022_program.to_account_info(),
        cpi_accounts,
        &signer_seeds_arr,
    );
    token_2022::freeze_account(cpi_ctx)?;

    let now = Clock::get()?.unix_timestamp;
    config.last_updated_at = now;

    emit!(AccountFrozenEvent {
        mint: mint_key,
        account: ctx.accounts.token_account.key(),
        frozen_by: ctx.accounts.authority.key(),
        timestamp: now,
    });
    Ok(())
}

pub fn thaw_handler(ctx: Context<SetAccountFrozen>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    config.require_freeze_authority(&ctx.accounts.authority.key())?;

    let mint_key = ctx.accounts.mint.key();
    let signer_seeds: &[&[u8]] = &[CONFIG_SEED, mint_key.as_ref(), &[config.bump]];
    let signer_seeds_arr = [signer_seeds];
    let cpi_accounts = token_2022::ThawAccount {
        account: ctx.accounts.token_account.to_account_info(),
        mint: ctx.accounts.mint.to_account_info(),
        authority: config.to_account_info(),
    };
    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_2022_program.to_account_info(),
        cpi_accounts,
        &signer_seeds_arr,
    );
    token_2022::thaw_account(cpi_ctx)?;

    let now = Clock::get()?.unix_timestamp;
    config.last_updated_at = now;

    emit!(AccountThawedEvent {
        mint: mint_key,
        account: ctx.accounts.token_account.key(),
        thawed_by: ctx.accounts.authority.key(),
        timestamp: now,
    });
    Ok(())
}
