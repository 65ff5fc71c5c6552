use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::{self, Token2022},
    token_interface::{Mint, TokenAccount},
};

use crate::constants::CONFIG_SEED;
use crate::errors::StablecoinError;
use crate::events::Burned;
use crate::state::StablecoinConfig;

#[derive(Accounts)]
pub struct BurnTokens<'info> {
    pub burner: Signer<'info>,

    /// Owner of `source`. May be the burner itself.
    pub source_authority: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump = config.bump,
        has_one = mint
    )]
    pub config: Account<'info, StablecoinConfig>,

    #[account(mut)]
    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        token::mint = mint,
        token::authority = source_authority,
        token::token_program = token_2022_program
    )]
    pub source: InterfaceAccount<'info, TokenAccount>,

    pub token_2022_program: Program<'info, Token2022>,
}

pub fn burn_handler(ctx: Context<BurnTokens>, amount: u64) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let now = Clock::get()?.unix_timestamp;

    config.require_burner(&ctx.accounts.burner.key())?;
    config.require_active()?;
    require!(amount > 0, StablecoinError::ZeroAmount);
    require!(
        ctx.accounts.source.amount >= amount,
        StablecoinError::InsufficientBalance
    );

    let new_total_supply = config.record_burn(amount, now)?;

    let cpi_accounts = token_2022::Burn {
        mint: ctx.accounts.mint.to_account_info(),
        from: ctx.accounts.source.to_account_info(),
        authority: ctx.accounts.source_authority.to_account_info(),
    };
    let cpi_ctx = CpiContext::new(
        ctx.accounts.token_2022_program.to_account_info(),
        cpi_accounts,
    );
    token_2022::burn(cpi_ctx, amount)?;

    emit!(Burned {
        mint: ctx.accounts.mint.key(),
        burner: ctx.accounts.burner.key(),
        source: ctx.accounts.source.key(),
        amount,
        new_total_supply,
        timestamp: now,
    });
    Ok(())
}
