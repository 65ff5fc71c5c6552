use anchor_lang::prelude::*;

use crate::constants::{ORACLE_SEED, QUOTE_SEED, REGISTRY_SEED};
use crate::errors::OracleError;
use crate::events::QuoteGenerated;
use crate::math::{check_confidence, check_slippage, check_staleness, compute_quote};
use crate::state::{FeedRegistry, OracleConfig, PendingQuote, QuoteDirection};
use crate::switchboard;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct QuoteParams {
    /// USD cents for mint quotes, token base units for redeem quotes.
    pub input_amount: u64,
    pub min_output: u64,
    pub nonce: u64,
}

/// Returned to the caller through Anchor return data.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct QuoteResult {
    pub output_amount: u64,
    pub fee_amount: u64,
    pub price_used: u64,
    pub valid_until: i64,
    pub quote_account: Pubkey,
}

#[derive(Accounts)]
#[instruction(params: QuoteParams)]
pub struct GetQuote<'info> {
    #[account(mut)]
    pub requester: Signer<'info>,

    #[account(
        seeds = [ORACLE_SEED, oracle_config.mint.as_ref()],
        bump = oracle_config.bump
    )]
    pub oracle_config: Account<'info, OracleConfig>,

    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Box<Account<'info, FeedRegistry>>,

    /// CHECK: Compared against the registry entry before its data is read.
    pub feed: UncheckedAccount<'info>,

    #[account(
        init,
        payer = requester,
        space = 8 + PendingQuote::INIT_SPACE,
        seeds = [
            QUOTE_SEED,
            oracle_config.mint.as_ref(),
            requester.key().as_ref(),
            &params.nonce.to_le_bytes(),
        ],
        bump
    )]
    pub quote: Account<'info, PendingQuote>,

    pub system_program: Program<'info, System>,
}

pub fn get_mint_quote_handler(ctx: Context<GetQuote>, params: QuoteParams) -> Result<QuoteResult> {
    generate_quote(ctx, params, QuoteDirection::Mint)
}

pub fn get_redeem_quote_handler(
    ctx: Context<GetQuote>,
    params: QuoteParams,
) -> Result<QuoteResult> {
    generate_quote(ctx, params, QuoteDirection::Redeem)
}

fn generate_quote(
    ctx: Context<GetQuote>,
    params: QuoteParams,
    direction: QuoteDirection,
) -> Result<QuoteResult> {
    let oracle = &ctx.accounts.oracle_config;
    oracle.require_active()?;
    require!(params.input_amount > 0, OracleError::ZeroAmount);

    let feed = ctx.accounts.registry.require_feed(&oracle.feed_symbol)?;
    require_keys_eq!(
        ctx.accounts.feed.key(),
        feed.feed_account,
        OracleError::FeedMismatch
    );

    let now = Clock::get()?.unix_timestamp;
    let price = if feed.feed_type.uses_live_price() {
        let reading = switchboard::load_price(&ctx.accounts.feed.to_account_info())?;
        let price = reading.positive_price()?;
        check_staleness(now, reading.published_at, oracle.max_staleness_secs)?;
        check_confidence(price, reading.std_dev, oracle.max_confidence_bps)?;
        price
    } else {
        oracle.cpi_multiplier
    };

    let amounts = compute_quote(
        direction,
        params.input_amount,
        price,
        &feed.feed_type,
        oracle.cpi_multiplier,
        oracle.fee_bps(direction),
    )?;
    check_slippage(amounts.net, params.min_output)?;

    let valid_until = oracle.quote_valid_until(now)?;
    let mint = oracle.mint;
    let feed_symbol = oracle.feed_symbol.clone();
    let requester = ctx.accounts.requester.key();

    let quote_key = ctx.accounts.quote.key();
    let quote = &mut ctx.accounts.quote;
    quote.mint = mint;
    quote.requester = requester;
    quote.direction = direction;
    quote.feed_symbol = feed_symbol.clone();
    quote.input_amount = params.input_amount;
    quote.output_amount = amounts.net;
    quote.fee_amount = amounts.fee;
    quote.price_snapshot = price;
    quote.valid_until = valid_until;
    quote.min_output = params.min_output;
    quote.used = false;
    quote.created_at = now;
    quote.nonce = params.nonce;
    quote.bump = ctx.bumps.quote;

    emit!(QuoteGenerated {
        quote_id: quote_key,
        mint,
        requester,
        feed_symbol,
        direction: direction.as_str().to_string(),
        input_amount: params.input_amount,
        output_amount: amounts.net,
        fee_amount: amounts.fee,
        price_used: price,
        valid_until,
        timestamp: now,
    });

    Ok(QuoteResult {
        output_amount: amounts.net,
        fee_amount: amounts.fee,
        price_used: price,
        valid_until,
        quote_account: quote_key,
    })
}
