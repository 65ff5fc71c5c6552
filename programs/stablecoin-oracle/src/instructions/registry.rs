use anchor_lang::prelude::*;

use crate::constants::REGISTRY_SEED;
use crate::errors::OracleError;
use crate::events::{FeedDeactivated, FeedRegistered, RegistryInitialized};
use crate::state::{FeedEntry, FeedRegistry, FeedType};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct RegisterFeedParams {
    pub symbol: String,
    pub feed_account: Pubkey,
    pub feed_type: FeedType,
    pub base_currency: String,
    pub quote_currency: String,
    pub decimals: u8,
}

#[derive(Accounts)]
pub struct InitializeRegistry<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + FeedRegistry::INIT_SPACE,
        seeds = [REGISTRY_SEED],
        bump
    )]
    pub registry: Box<Account<'info, FeedRegistry>>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateRegistry<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
        has_one = authority @ OracleError::Unauthorized
    )]
    pub registry: Box<Account<'info, FeedRegistry>>,
}

pub fn initialize_registry_handler(ctx: Context<InitializeRegistry>) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.authority = ctx.accounts.authority.key();
    registry.feeds = Vec::new();
    registry.bump = ctx.bumps.registry;

    emit!(RegistryInitialized {
        registry: registry.key(),
        authority: registry.authority,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}

pub fn register_feed_handler(ctx: Context<UpdateRegistry>, params: RegisterFeedParams) -> Result<()> {
    let authority = ctx.accounts.authority.key();
    let now = Clock::get()?.unix_timestamp;

    let entry = FeedEntry {
        symbol: params.symbol,
        feed_account: params.feed_account,
        feed_type: params.feed_type,
        base_currency: params.base_currency,
        quote_currency: params.quote_currency,
        decimals: params.decimals,
        active: true,
        registered_at: now,
        registered_by: authority,
    };
    let symbol = entry.symbol.clone();
    let slot = ctx.accounts.registry.register(entry)?;
    msg!("Feed {} registered in slot {}", symbol, slot);

    emit!(FeedRegistered {
        symbol,
        feed_account: params.feed_account,
        feed_type: params.feed_type.label().to_string(),
        slot_index: slot as u8,
        registered_by: authority,
        timestamp: now,
    });
    Ok(())
}

pub fn deactivate_feed_handler(ctx: Context<UpdateRegistry>, symbol: String) -> Result<()> {
    let feed = ctx.accounts.registry.deactivate(&symbol)?;

    emit!(FeedDeactivated {
        symbol: feed.symbol,
        deactivated_by: ctx.accounts.authority.key(),
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}
