use anchor_lang::prelude::*;
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use anchor_spl::token_2022::spl_token_2022::{
    extension::StateWithExtensions,
    state::{Account as Token2022Account, AccountState},
};
use anchor_spl::token_2022::{self, Token2022};
use anchor_spl::token_interface::Mint;

use crate::constants::{BLACKLIST_SEED, CONFIG_SEED};
use crate::errors::StablecoinError;
use crate::events::{Blacklisted, RemovedFromBlacklist};
use crate::state::{BlacklistEntry, StablecoinConfig};

#[derive(Accounts)]
#[instruction(address: Pubkey)]
pub struct AddToBlacklist<'info> {
    #[account(mut)]
    pub blacklister: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump = config.bump,
        has_one = mint
    )]
    pub config: Account<'info, StablecoinConfig>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        init_if_needed,
        payer = blacklister,
        space = 8 + BlacklistEntry::INIT_SPACE,
        seeds = [BLACKLIST_SEED, mint.key().as_ref(), address.as_ref()],
        bump
    )]
    pub blacklist_entry: Account<'info, BlacklistEntry>,

    /// CHECK: The address's associated token account. Frozen when it exists.
    #[account(
        mut,
        address = get_associated_token_address_with_program_id(
            &address,
            &mint.key(),
            &token_2022::ID
        ) @ StablecoinError::InvalidTokenAccount
    )]
    pub token_account: UncheckedAccount<'info>,

    pub token_2022_program: Program<'info, Token2022>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct RemoveFromBlacklist<'info> {
    pub blacklister: Signer<'info>,

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
        seeds = [BLACKLIST_SEED, mint.key().as_ref(), blacklist_entry.address.as_ref()],
        bump = blacklist_entry.bump
    )]
    pub blacklist_entry: Account<'info, BlacklistEntry>,

    /// CHECK: The address's associated token account. Thawed when frozen.
    #[account(
        mut,
        address = get_associated_token_address_with_program_id(
            &blacklist_entry.address,
            &mint.key(),
            &token_2022::ID
        ) @ StablecoinError::InvalidTokenAccount
    )]
    pub token_account: UncheckedAccount<'info>,

    pub token_2022_program: Program<'info, Token2022>,
}

/// What a blacklist change does to the holder's associated token account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderAccountAction {
    Freeze,
    Thaw,
    Leave,
}

/// `None` means the account does not exist yet.
pub fn on_blacklist_added(state: Option<AccountState>) -> HolderAccountAction {
    match state {
        Some(AccountState::Initialized) => HolderAccountAction::Freeze,
        _ => HolderAccountAction::Leave,
    }
}

pub fn on_blacklist_removed(state: Option<AccountState>) -> HolderAccountAction {
    match state {
        Some(AccountState::Frozen) => HolderAccountAction::Thaw,
        _ => HolderAccountAction::Leave,
    }
}

/// State of the holder's token account, or `None` while it is not created.
fn holder_account_state(
    info: &AccountInfo,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<Option<AccountState>> {
    if info.owner != &token_2022::ID || info.data_is_empty() {
        return Ok(None);
    }
    let data = info.try_borrow_data()?;
    let account = StateWithExtensions::<Token2022Account>::unpack(&data)
        .map_err(|_| error!(StablecoinError::InvalidTokenAccount))?;
    require_keys_eq!(account.base.mint, *mint, StablecoinError::InvalidTokenAccount);
    require_keys_eq!(account.base.owner, *owner, StablecoinError::InvalidTokenAccount);
    Ok(Some(account.base.state))
}

pub fn add_to_blacklist_handler(
    ctx: Context<AddToBlacklist>,
    address: Pubkey,
    reason: String,
) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let blacklister = ctx.accounts.blacklister.key();
    let mint_key = ctx.accounts.mint.key();
    let now = Clock::get()?.unix_timestamp;

    config.require_blacklister(&blacklister)?;
    ctx.accounts.blacklist_entry.activate(
        mint_key,
        address,
        reason,
        blacklister,
        now,
        ctx.bumps.blacklist_entry,
    )?;
    config.record_blacklist_added()?;
    config.last_updated_at = now;

    let token_account = ctx.accounts.token_account.to_account_info();
    let state = holder_account_state(&token_account, &mint_key, &address)?;
    match on_blacklist_added(state) {
        HolderAccountAction::Freeze => {
            let signer_seeds: &[&[u8]] = &[CONFIG_SEED, mint_key.as_ref(), &[config.bump]];
            let signer_seeds_arr = [signer_seeds];
            let cpi_accounts = token_2022::FreezeAccount {
                account: token_account,
                mint: ctx.accounts.mint.to_account_info(),
                authority: config.to_account_info(),
            };
            let cpi_ctx = CpiContext::new_with_signer(
                ctx.accounts.token_2022_program.to_account_info(),
                cpi_accounts,
                &signer_seeds_arr,
            );
            token_2022::freeze_account(cpi_ctx)?;
        }
        _ if state.is_none() => msg!("No token account for {}, nothing to freeze", address),
        _ => msg!("Token account {} already frozen", token_account.key()),
    }

    emit!(Blacklisted {
        mint: mint_key,
        address,
        reason: ctx.accounts.blacklist_entry.reason.clone(),
        blacklisted_by: blacklister,
        timestamp: now,
    });
    Ok(())
}

pub fn remove_from_blacklist_handler(ctx: Context<RemoveFromBlacklist>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let blacklister = ctx.accounts.blacklister.key();
    let mint_key = ctx.accounts.mint.key();
    let now = Clock::get()?.unix_timestamp;

    config.require_blacklister(&blacklister)?;
    require_keys_eq!(
        ctx.accounts.blacklist_entry.mint,
        mint_key,
        StablecoinError::NotBlacklisted
    );
    ctx.accounts.blacklist_entry.deactivate(blacklister, now)?;
    config.record_blacklist_removed();
    config.last_updated_at = now;

    let address = ctx.accounts.blacklist_entry.address;
    let token_account = ctx.accounts.token_account.to_account_info();
    let state = holder_account_state(&token_account, &mint_key, &address)?;
    if on_blacklist_removed(state) == HolderAccountAction::Thaw {
        let signer_seeds: &[&[u8]] = &[CONFIG_SEED, mint_key.as_ref(), &[config.bump]];
        let signer_seeds_arr = [signer_seeds];
        let cpi_accounts = token_2022::ThawAccount {
            account: token_account,
            mint: ctx.accounts.mint.to_account_info(),
            authority: config.to_account_info(),
        };
        let cpi_ctx = CpiContext::new_with_signer(
            ctx.accounts.token_2022_program.to_account_info(),
            cpi_accounts,
            &signer_seeds_arr,
        );
        token_2022::thaw_account(cpi_ctx)?;
    }

    emit!(RemovedFromBlacklist {
        mint: mint_key,
        address,
        removed_by: blacklister,
        timestamp: now,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklisting_freezes_live_account() {
        assert_eq!(
            on_blacklist_added(Some(AccountState::Initialized)),
            HolderAccountAction::Freeze
        );
        assert_eq!(
            on_blacklist_added(Some(AccountState::Frozen)),
            HolderAccountAction::Leave
        );
    }

    #[test]
    fn test_blacklisting_without_account_skips_freeze() {
        assert_eq!(on_blacklist_added(None), HolderAccountAction::Leave);
        assert_eq!(
            on_blacklist_added(Some(AccountState::Uninitialized)),
            HolderAccountAction::Leave
        );
    }

    #[test]
    fn test_removal_thaws_only_frozen_account() {
        assert_eq!(
            on_blacklist_removed(Some(AccountState::Frozen)),
            HolderAccountAction::Thaw
        );
        assert_eq!(
            on_blacklist_removed(Some(AccountState::Initialized)),
            HolderAccountAction::Leave
        );
        assert_eq!(on_blacklist_removed(None), HolderAccountAction::Leave);
    }

    #[test]
    fn test_missing_account_has_no_state() {
        let key = Pubkey::new_unique();
        let owner = Pubkey::default();
        let mut lamports = 0u64;
        let mut data: Vec<u8> = Vec::new();
        let info = AccountInfo::new(
            &key,
            false,
            true,
            &mut lamports,
            &mut data,
            &owner,
            false,
            0,
        );
        let state = holder_account_state(&info, &Pubkey::new_unique(), &Pubkey::new_unique());
        assert_eq!(state.unwrap(), None);
    }

    #[test]
    fn test_foreign_token_account_rejected() {
        use anchor_lang::solana_program::program_pack::Pack;

        let mint = Pubkey::new_unique();
        let holder = Pubkey::new_unique();
        let account = Token2022Account {
            mint,
            owner: Pubkey::new_unique(),
            amount: 5,
            state: AccountState::Initialized,
            ..Token2022Account::default()
        };
        let mut data = vec![0u8; Token2022Account::LEN];
        Token2022Account::pack(account, &mut data).unwrap();

        let key = Pubkey::new_unique();
        let token_program = token_2022::ID;
        let mut lamports = 1u64;
        let info = AccountInfo::new(
            &key,
            false,
            true,
            &mut lamports,
            &mut data,
            &token_program,
            false,
            0,
        );
        assert_eq!(
            holder_account_state(&info, &mint, &holder).unwrap_err(),
            StablecoinError::InvalidTokenAccount.into()
        );
    }
}
