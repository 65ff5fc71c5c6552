use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::{self, Token2022},
    token_interface::{Mint, TokenAccount},
};

use crate::constants::{CONFIG_SEED, MINTER_SEED};
use crate::errors::StablecoinError;
use crate::events::Minted;
use crate::state::{MinterConfig, StablecoinConfig};

#[derive(Accounts)]
pub struct MintTokens<'info> {
    pub minter: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump = config.bump,
        has_one = mint
    )]
    pub config: Account<'info, StablecoinConfig>,

    #[account(
        mut,
        seeds = [MINTER_SEED, mint.key().as_ref(), minter.key().as_ref()],
        bump = minter_config.bump
    )]
    pub minter_config: Account<'info, MinterConfig>,

    #[account(mut)]
    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        token::mint = mint,
        token::token_program = token_2022_program
    )]
    pub recipient_token_account: InterfaceAccount<'info, TokenAccount>,

    pub token_2022_program: Program<'info, Token2022>,
}

pub fn mint_handler(ctx: Context<MintTokens>, amount: u64) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let minter_config = &mut ctx.accounts.minter_config;
    let now = Clock::get()?.unix_timestamp;

    config.require_active()?;
    require!(amount > 0, StablecoinError::ZeroAmount);

    if minter_config.record_mint(amount, now)? {
        msg!(
            "Quota period rolled for minter {} at {}",
            minter_config.minter,
            now
        );
    }
    let new_total_supply = config.record_mint(amount, now)?;

    let mint_key = ctx.accounts.mint.key();
    let signer_seeds: &[&[u8]] = &[CONFIG_SEED, mint_key.as_ref(), &[config.bump]];
    let signer_seeds_arr = [signer_seeds];
    let cpi_accounts = token_2022::MintTo {
        mint: ctx.accounts.mint.to_account_info(),
        to: ctx.accounts.recipient_token_account.to_account_info(),
        authority: config.to_account_info(),
    };
    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_2022_program.to_account_info(),
        cpi_accounts,
        &signer_seeds_arr,
    );
    token_2022::mint_to(cpi_ctx, amount)?;

    emit!(Minted {
        mint: mint_key,
        recipient: ctx.accounts.recipient_token_account.owner,
        amount,
        minter: ctx.accounts.minter.key(),
        new_total_supply,
        timestamp: now,
    });
    Ok(())
}
