#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;

use instructions::*;
use state::RoleUpdate;

declare_id!("Cf95iBPyEQQm5tfLLF6F4b9h2RixUUoJiqfGfaYhtRgc");

#[program]
pub mod stablecoin_core {
    use super::*;

    /// Creates the Token-2022 mint with the extensions selected by the
    /// preset and the config PDA that owns every token authority.
    pub fn initialize(ctx: Context<Initialize>, params: InitializeParams) -> Result<()> {
        instructions::initialize::initialize_handler(ctx, params)
    }

    /// Mints to an existing token account, charged against the signer's
    /// minter quota.
    pub fn mint(ctx: Context<MintTokens>, amount: u64) -> Result<()> {
        instructions::mint::mint_handler(ctx, amount)
    }

    pub fn burn(ctx: Context<BurnTokens>, amount: u64) -> Result<()> {
        instructions::burn::burn_handler(ctx, amount)
    }

    pub fn freeze_account(ctx: Context<SetAccountFrozen>) -> Result<()> {
        instructions::freeze::freeze_handler(ctx)
    }

    pub fn thaw_account(ctx: Context<SetAccountFrozen>) -> Result<()> {
        instructions::freeze::thaw_handler(ctx)
    }

    pub fn pause(ctx: Context<SetPaused>) -> Result<()> {
        instructions::pause::pause_handler(ctx)
    }

    pub fn unpause(ctx: Context<SetPaused>) -> Result<()> {
        instructions::pause::unpause_handler(ctx)
    }

    pub fn add_minter(
        ctx: Context<AddMinter>,
        minter: Pubkey,
        quota_per_period: u64,
        period_seconds: i64,
    ) -> Result<()> {
        instructions::minters::add_minter_handler(ctx, minter, quota_per_period, period_seconds)
    }

    /// Closes the minter account. The minter can be added again later.
    pub fn remove_minter(ctx: Context<RemoveMinter>) -> Result<()> {
        instructions::minters::remove_minter_handler(ctx)
    }

    pub fn update_minter_quota(
        ctx: Context<UpdateMinterQuota>,
        quota_per_period: u64,
        period_seconds: i64,
    ) -> Result<()> {
        instructions::minters::update_minter_quota_handler(ctx, quota_per_period, period_seconds)
    }

    pub fn update_roles(ctx: Context<UpdateRoles>, update: RoleUpdate) -> Result<()> {
        instructions::roles::update_roles_handler(ctx, update)
    }

    pub fn propose_authority_transfer(
        ctx: Context<ProposeAuthority>,
        new_authority: Pubkey,
    ) -> Result<()> {
        instructions::roles::propose_authority_handler(ctx, new_authority)
    }

    pub fn accept_authority_transfer(ctx: Context<AcceptAuthority>) -> Result<()> {
        instructions::roles::accept_authority_handler(ctx)
    }

    pub fn cancel_authority_transfer(ctx: Context<ProposeAuthority>) -> Result<()> {
        instructions::roles::cancel_authority_handler(ctx)
    }

    /// Records the entry and freezes the address's token account in the
    /// same instruction.
    pub fn add_to_blacklist(
        ctx: Context<AddToBlacklist>,
        address: Pubkey,
        reason: String,
    ) -> Result<()> {
        instructions::blacklist::add_to_blacklist_handler(ctx, address, reason)
    }

    pub fn remove_from_blacklist(ctx: Context<RemoveFromBlacklist>) -> Result<()> {
        instructions::blacklist::remove_from_blacklist_handler(ctx)
    }

    /// Moves tokens out of a frozen account using the permanent delegate.
    /// Transfer hook extra accounts are passed as remaining accounts.
    pub fn seize<'info>(
        ctx: Context<'_, '_, 'info, 'info, Seize<'info>>,
        amount: u64,
        reason: String,
    ) -> Result<()> {
        instructions::seize::seize_handler(ctx, amount, reason)
    }
}
