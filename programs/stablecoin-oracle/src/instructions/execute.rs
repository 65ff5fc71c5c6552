use anchor_lang::prelude::*;
use anchor_spl::{
    token_2022::Token2022,
    token_interface::{Mint, TokenAccount},
};
use stablecoin_core::cpi::accounts::{BurnTokens, MintTokens};
use stablecoin_core::program::StablecoinCore;

use crate::constants::{ORACLE_SEED, QUOTE_SEED};
use crate::errors::OracleError;
use crate::events::{OracleMint, OracleRedeem, QuoteClosed};
use crate::state::{OracleConfig, PendingQuote, QuoteDirection};

#[derive(Accounts)]
pub struct MintWithOracle<'info> {
    #[account(mut)]
    pub requester: Signer<'info>,

    #[account(
        mut,
        seeds = [ORACLE_SEED, mint.key().as_ref()],
        bump = oracle_config.bump,
        has_one = mint
    )]
    pub oracle_config: Account<'info, OracleConfig>,

    #[account(
        mut,
        seeds = [
            QUOTE_SEED,
            mint.key().as_ref(),
            requester.key().as_ref(),
            &quote.nonce.to_le_bytes(),
        ],
        bump = quote.bump
    )]
    pub quote: Account<'info, PendingQuote>,

    /// CHECK: Validated by the core program during the mint CPI.
    #[account(mut)]
    pub core_config: UncheckedAccount<'info>,

    /// CHECK: Minter account of the oracle PDA, validated by the core program.
    #[account(mut)]
    pub minter_config: UncheckedAccount<'info>,

    #[account(mut)]
    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        token::mint = mint,
        token::token_program = token_2022_program
    )]
    pub recipient_token_account: InterfaceAccount<'info, TokenAccount>,

    pub core_program: Program<'info, StablecoinCore>,

    pub token_2022_program: Program<'info, Token2022>,
}

#[derive(Accounts)]
pub struct RedeemWithOracle<'info> {
    #[account(mut)]
    pub requester: Signer<'info>,

    #[account(
        mut,
        seeds = [ORACLE_SEED, mint.key().as_ref()],
        bump = oracle_config.bump,
        has_one = mint
    )]
    pub oracle_config: Account<'info, OracleConfig>,

    #[account(
        mut,
        seeds = [
            QUOTE_SEED,
            mint.key().as_ref(),
            requester.key().as_ref(),
            &quote.nonce.to_le_bytes(),
        ],
        bump = quote.bump
    )]
    pub quote: Account<'info, PendingQuote>,

    /// CHECK: Validated by the core program during the burn CPI.
    #[account(mut)]
    pub core_config: UncheckedAccount<'info>,

    #[account(mut)]
    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        token::mint = mint,
        token::authority = requester,
        token::token_program = token_2022_program
    )]
    pub source: InterfaceAccount<'info, TokenAccount>,

    pub core_program: Program<'info, StablecoinCore>,

    pub token_2022_program: Program<'info, Token2022>,
}

#[derive(Accounts)]
pub struct CloseQuote<'info> {
    #[account(mut)]
    pub requester: Signer<'info>,

    #[account(
        mut,
        close = requester,
        seeds = [
            QUOTE_SEED,
            quote.mint.as_ref(),
            requester.key().as_ref(),
            &quote.nonce.to_le_bytes(),
        ],
        bump = quote.bump
    )]
    pub quote: Account<'info, PendingQuote>,
}

/// Mints the quoted net amount through the core program. The oracle PDA
/// signs as a registered minter, so its quota applies as usual.
pub fn mint_with_oracle_handler(ctx: Context<MintWithOracle>) -> Result<()> {
    ctx.accounts.oracle_config.require_active()?;
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.quote.consume(QuoteDirection::Mint, now)?;

    let quote = &ctx.accounts.quote;
    let mint_key = ctx.accounts.mint.key();
    let oracle_bump = ctx.accounts.oracle_config.bump;
    let signer_seeds: &[&[u8]] = &[ORACLE_SEED, mint_key.as_ref(), &[oracle_bump]];
    let signer_seeds_arr = [signer_seeds];

    stablecoin_core::cpi::mint(
        CpiContext::new_with_signer(
            ctx.accounts.core_program.to_account_info(),
            MintTokens {
                minter: ctx.accounts.oracle_config.to_account_info(),
                config: ctx.accounts.core_config.to_account_info(),
                minter_config: ctx.accounts.minter_config.to_account_info(),
                mint: ctx.accounts.mint.to_account_info(),
                recipient_token_account: ctx.accounts.recipient_token_account.to_account_info(),
                token_2022_program: ctx.accounts.token_2022_program.to_account_info(),
            },
            &signer_seeds_arr,
        ),
        quote.output_amount,
    )?;

    let event = OracleMint {
        mint: mint_key,
        quote_id: quote.key(),
        requester: quote.requester,
        recipient: ctx.accounts.recipient_token_account.owner,
        usd_amount: quote.input_amount,
        token_amount: quote.output_amount,
        fee_amount: quote.fee_amount,
        price_used: quote.price_snapshot,
        timestamp: now,
    };
    ctx.accounts
        .oracle_config
        .record_mint(event.usd_amount, event.fee_amount, now)?;

    emit!(event);
    Ok(())
}

/// Burns the quoted token amount from the requester's account. The oracle
/// PDA must be the configured burner; the USD payout settles off chain.
pub fn redeem_with_oracle_handler(ctx: Context<RedeemWithOracle>) -> Result<()> {
    ctx.accounts.oracle_config.require_active()?;
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.quote.consume(QuoteDirection::Redeem, now)?;

    let quote = &ctx.accounts.quote;
    let mint_key = ctx.accounts.mint.key();
    let oracle_bump = ctx.accounts.oracle_config.bump;
    let signer_seeds: &[&[u8]] = &[ORACLE_SEED, mint_key.as_ref(), &[oracle_bump]];
    let signer_seeds_arr = [signer_seeds];

    stablecoin_core::cpi::burn(
        CpiContext::new_with_signer(
            ctx.accounts.core_program.to_account_info(),
            BurnTokens {
                burner: ctx.accounts.oracle_config.to_account_info(),
                source_authority: ctx.accounts.requester.to_account_info(),
                config: ctx.accounts.core_config.to_account_info(),
                mint: ctx.accounts.mint.to_account_info(),
                source: ctx.accounts.source.to_account_info(),
                token_2022_program: ctx.accounts.token_2022_program.to_account_info(),
            },
            &signer_seeds_arr,
        ),
        quote.input_amount,
    )?;

    let gross_usd = quote
        .output_amount
        .checked_add(quote.fee_amount)
        .ok_or(OracleError::MathOverflow)?;
    let event = OracleRedeem {
        mint: mint_key,
        quote_id: quote.key(),
        requester: quote.requester,
        token_amount: quote.input_amount,
        usd_amount: quote.output_amount,
        fee_amount: quote.fee_amount,
        price_used: quote.price_snapshot,
        timestamp: now,
    };
    ctx.accounts
        .oracle_config
        .record_redeem(gross_usd, event.fee_amount, now)?;

    emit!(event);
    Ok(())
}

pub fn close_quote_handler(ctx: Context<CloseQuote>) -> Result<()> {
    let quote = &ctx.accounts.quote;
    let now = Clock::get()?.unix_timestamp;
    quote.ensure_closable(now)?;

    emit!(QuoteClosed {
        quote_id: quote.key(),
        requester: quote.requester,
        used: quote.used,
        timestamp: now,
    });
    Ok(())
}
