#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token_2022::spl_token_2022::{
    extension::{transfer_hook::TransferHookAccount, BaseStateWithExtensions, StateWithExtensions},
    state::Account as Token2022Account,
};
use anchor_spl::token_interface::{Mint, TokenAccount};
use spl_discriminator::SplDiscriminate;
use spl_tlv_account_resolution::{
    account::ExtraAccountMeta, seeds::Seed, state::ExtraAccountMetaList,
};
use spl_transfer_hook_interface::instruction::ExecuteInstruction;
use stablecoin_core::constants::{BLACKLIST_SEED, CONFIG_SEED};
use stablecoin_core::state::{BlacklistEntry, StablecoinConfig};

pub mod errors;
pub mod events;
pub mod state;

use errors::TransferHookError;
use events::{HookStatusChanged, TransferBlocked, TransferValidated};
use state::{
    expected_blacklist_entry, hook_authority, is_hook_admin, is_seizure, HookConfig,
    TransferVerdict, EXTRA_ACCOUNT_METAS_SEED, HOOK_CONFIG_SEED,
};

declare_id!("3Q2u54seUZhCvGhFuT3CrLkuwq41xRksVk6Cn9fWxmHF");

const SOURCE_TOKEN_ACCOUNT_INDEX: u8 = 0;
const MINT_ACCOUNT_INDEX: u8 = 1;
const DESTINATION_TOKEN_ACCOUNT_INDEX: u8 = 2;
const CORE_PROGRAM_INDEX: u8 = 6;
const TOKEN_ACCOUNT_OWNER_OFFSET: u8 = 32;
const TOKEN_ACCOUNT_OWNER_LENGTH: u8 = 32;

#[program]
pub mod transfer_hook {
    use super::*;

    pub fn initialize_hook(ctx: Context<InitializeHook>, enabled: bool) -> Result<()> {
        let core_config = &ctx.accounts.core_config;
        require!(
            is_hook_admin(core_config, &ctx.accounts.authority.key()),
            TransferHookError::InvalidAuthority
        );
        require!(
            core_config.transfer_hook_program == Some(crate::ID),
            TransferHookError::InvalidMint
        );

        let hook_config = &mut ctx.accounts.hook_config;
        hook_config.mint = ctx.accounts.mint.key();
        hook_config.core_program = stablecoin_core::ID;
        hook_config.authority = hook_authority(core_config);
        hook_config.enabled = enabled;
        hook_config.transfer_count = 0;
        hook_config.blocked_count = 0;
        hook_config.bump = ctx.bumps.hook_config;
        Ok(())
    }

    pub fn initialize_extra_account_meta_list(
        ctx: Context<InitializeExtraAccountMetaList>,
    ) -> Result<()> {
        require!(
            is_hook_admin(&ctx.accounts.core_config, &ctx.accounts.authority.key()),
            TransferHookError::InvalidAuthority
        );
        let extra_account_metas = build_extra_account_metas()?;
        let account_size = ExtraAccountMetaList::size_of(extra_account_metas.len())?;
        let lamports = Rent::get()?.minimum_balance(account_size);

        let mint_key = ctx.accounts.mint.key();
        let signer_seeds: &[&[u8]] = &[
            EXTRA_ACCOUNT_METAS_SEED,
            mint_key.as_ref(),
            &[ctx.bumps.extra_account_meta_list],
        ];
        let signer_seeds_arr = [signer_seeds];
        let create_accounts = system_program::CreateAccount {
            from: ctx.accounts.authority.to_account_info(),
            to: ctx.accounts.extra_account_meta_list.to_account_info(),
        };
        let create_ctx = CpiContext::new_with_signer(
            ctx.accounts.system_program.to_account_info(),
            create_accounts,
            &signer_seeds_arr,
        );
        system_program::create_account(create_ctx, lamports, account_size as u64, &crate::ID)?;

        let mut data = ctx.accounts.extra_account_meta_list.try_borrow_mut_data()?;
        ExtraAccountMetaList::init::<ExecuteInstruction>(&mut data, &extra_account_metas)?;
        Ok(())
    }

    /// Invoked by Token-2022 on every transfer of the mint.
    #[instruction(discriminator = ExecuteInstruction::SPL_DISCRIMINATOR_SLICE)]
    pub fn execute(ctx: Context<Execute>, amount: u64) -> Result<()> {
        assert_is_transferring(&ctx.accounts.source_token.to_account_info())?;

        let mint_key = ctx.accounts.mint.key();
        require_keys_eq!(
            ctx.accounts.hook_config.mint,
            mint_key,
            TransferHookError::InvalidMint
        );

        let sender = ctx.accounts.source_token.owner;
        let recipient = ctx.accounts.destination_token.owner;
        let now = Clock::get()?.unix_timestamp;

        let (sender_blacklisted, recipient_blacklisted) = if ctx.accounts.hook_config.enabled {
            let seizure = is_seizure(&ctx.accounts.owner.key(), &ctx.accounts.core_config.key());
            let sender_blacklisted = !seizure
                && is_blacklisted(&ctx.accounts.sender_blacklist, &mint_key, &sender)?;
            let recipient_blacklisted =
                is_blacklisted(&ctx.accounts.recipient_blacklist, &mint_key, &recipient)?;
            (sender_blacklisted, recipient_blacklisted)
        } else {
            (false, false)
        };

        // Counter updates on a blocked transfer are rolled back with it; the
        // event stays visible in the failed transaction's logs.
        match ctx
            .accounts
            .hook_config
            .screen(sender_blacklisted, recipient_blacklisted)
        {
            TransferVerdict::SenderBlocked => {
                emit!(TransferBlocked {
                    mint: mint_key,
                    blocked_address: sender,
                    reason: "Sender is blacklisted".to_string(),
                    amount,
                    timestamp: now,
                });
                err!(TransferHookError::SenderBlacklisted)
            }
            TransferVerdict::RecipientBlocked => {
                emit!(TransferBlocked {
                    mint: mint_key,
                    blocked_address: recipient,
                    reason: "Recipient is blacklisted".to_string(),
                    amount,
                    timestamp: now,
                });
                err!(TransferHookError::RecipientBlacklisted)
            }
            TransferVerdict::Allowed => {
                emit!(TransferValidated {
                    mint: mint_key,
                    source: sender,
                    destination: recipient,
                    amount,
                    timestamp: now,
                });
                Ok(())
            }
        }
    }

    pub fn enable_hook(ctx: Context<AdminHook>) -> Result<()> {
        let core_config = &ctx.accounts.core_config;
        require!(
            is_hook_admin(core_config, &ctx.accounts.authority.key()),
            TransferHookError::InvalidAuthority
        );
        let hook_config = &mut ctx.accounts.hook_config;
        hook_config.authority = hook_authority(core_config);
        if hook_config.enabled {
            return Ok(());
        }
        hook_config.enabled = true;

        emit!(HookStatusChanged {
            mint: hook_config.mint,
            enabled: true,
            changed_by: ctx.accounts.authority.key(),
            timestamp: Clock::get()?.unix_timestamp,
        });
        Ok(())
    }

    pub fn disable_hook(ctx: Context<AdminHook>) -> Result<()> {
        let core_config = &ctx.accounts.core_config;
        require!(
            is_hook_admin(core_config, &ctx.accounts.authority.key()),
            TransferHookError::InvalidAuthority
        );
        let hook_config = &mut ctx.accounts.hook_config;
        hook_config.authority = hook_authority(core_config);
        require!(hook_config.enabled, TransferHookError::HookDisabled);
        hook_config.enabled = false;

        emit!(HookStatusChanged {
            mint: hook_config.mint,
            enabled: false,
            changed_by: ctx.accounts.authority.key(),
            timestamp: Clock::get()?.unix_timestamp,
        });
        Ok(())
    }
}

#[derive(Accounts)]
pub struct InitializeHook<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump = core_config.bump,
        seeds::program = stablecoin_core::ID
    )]
    pub core_config: Account<'info, StablecoinConfig>,

    #[account(
        init,
        payer = authority,
        space = 8 + HookConfig::INIT_SPACE,
        seeds = [HOOK_CONFIG_SEED, mint.key().as_ref()],
        bump
    )]
    pub hook_config: Account<'info, HookConfig>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct InitializeExtraAccountMetaList<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    /// CHECK: Created and laid out by this instruction.
    #[account(
        mut,
        seeds = [EXTRA_ACCOUNT_METAS_SEED, mint.key().as_ref()],
        bump
    )]
    pub extra_account_meta_list: UncheckedAccount<'info>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        seeds = [HOOK_CONFIG_SEED, mint.key().as_ref()],
        bump = hook_config.bump
    )]
    pub hook_config: Account<'info, HookConfig>,

    #[account(
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump = core_config.bump,
        seeds::program = stablecoin_core::ID
    )]
    pub core_config: Account<'info, StablecoinConfig>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct Execute<'info> {
    #[account(token::mint = mint)]
    pub source_token: InterfaceAccount<'info, TokenAccount>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(token::mint = mint)]
    pub destination_token: InterfaceAccount<'info, TokenAccount>,

    /// CHECK: Source owner or delegate, as passed by Token-2022.
    pub owner: UncheckedAccount<'info>,

    /// CHECK: Validated by seeds.
    #[account(
        seeds = [EXTRA_ACCOUNT_METAS_SEED, mint.key().as_ref()],
        bump
    )]
    pub extra_account_meta_list: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [HOOK_CONFIG_SEED, mint.key().as_ref()],
        bump = hook_config.bump
    )]
    pub hook_config: Account<'info, HookConfig>,

    /// CHECK: Address constraint.
    #[account(address = stablecoin_core::ID)]
    pub core_program: UncheckedAccount<'info>,

    /// CHECK: Core config PDA, only compared against the transfer authority.
    #[account(
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump,
        seeds::program = core_program.key()
    )]
    pub core_config: UncheckedAccount<'info>,

    /// CHECK: Blacklist PDA of the source owner. May be uninitialized.
    pub sender_blacklist: UncheckedAccount<'info>,

    /// CHECK: Blacklist PDA of the destination owner. May be uninitialized.
    pub recipient_blacklist: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct AdminHook<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [HOOK_CONFIG_SEED, hook_config.mint.as_ref()],
        bump = hook_config.bump
    )]
    pub hook_config: Account<'info, HookConfig>,

    #[account(
        seeds = [CONFIG_SEED, hook_config.mint.as_ref()],
        bump = core_config.bump,
        seeds::program = stablecoin_core::ID
    )]
    pub core_config: Account<'info, StablecoinConfig>,
}

/// Extra accounts appended to every transfer, in `Execute` order after the
/// extra-account-meta list itself.
pub fn build_extra_account_metas() -> Result<Vec<ExtraAccountMeta>> {
    let hook_config_meta = ExtraAccountMeta::new_with_seeds(
        &[
            Seed::Literal {
                bytes: HOOK_CONFIG_SEED.to_vec(),
            },
            Seed::AccountKey {
                index: MINT_ACCOUNT_INDEX,
            },
        ],
        false,
        true,
    )?;
    let core_program_meta = ExtraAccountMeta::new_with_pubkey(&stablecoin_core::ID, false, false)?;
    let core_config_meta = ExtraAccountMeta::new_external_pda_with_seeds(
        CORE_PROGRAM_INDEX,
        &[
            Seed::Literal {
                bytes: CONFIG_SEED.to_vec(),
            },
            Seed::AccountKey {
                index: MINT_ACCOUNT_INDEX,
            },
        ],
        false,
        false,
    )?;
    let sender_blacklist_meta = blacklist_meta(SOURCE_TOKEN_ACCOUNT_INDEX)?;
    let recipient_blacklist_meta = blacklist_meta(DESTINATION_TOKEN_ACCOUNT_INDEX)?;

    Ok(vec![
        hook_config_meta,
        core_program_meta,
        core_config_meta,
        sender_blacklist_meta,
        recipient_blacklist_meta,
    ])
}

fn blacklist_meta(token_account_index: u8) -> Result<ExtraAccountMeta> {
    ExtraAccountMeta::new_external_pda_with_seeds(
        CORE_PROGRAM_INDEX,
        &[
            Seed::Literal {
                bytes: BLACKLIST_SEED.to_vec(),
            },
            Seed::AccountKey {
                index: MINT_ACCOUNT_INDEX,
            },
            Seed::AccountData {
                account_index: token_account_index,
                data_index: TOKEN_ACCOUNT_OWNER_OFFSET,
                length: TOKEN_ACCOUNT_OWNER_LENGTH,
            },
        ],
        false,
        false,
    )
    .map_err(Into::into)
}

fn assert_is_transferring(source_token: &AccountInfo) -> Result<()> {
    let data = source_token.try_borrow_data()?;
    let account = StateWithExtensions::<Token2022Account>::unpack(&data)?;
    let extension = account.get_extension::<TransferHookAccount>()?;
    require!(
        bool::from(extension.transferring),
        TransferHookError::NotTransferring
    );
    Ok(())
}

fn is_blacklisted(entry_info: &AccountInfo, mint: &Pubkey, party: &Pubkey) -> Result<bool> {
    require_keys_eq!(
        entry_info.key(),
        expected_blacklist_entry(mint, party),
        TransferHookError::InvalidBlacklistAccount
    );
    if entry_info.data_is_empty() || entry_info.owner != &stablecoin_core::ID {
        return Ok(false);
    }

    let data = entry_info.try_borrow_data()?;
    let entry = BlacklistEntry::try_deserialize(&mut &data[..])?;
    Ok(entry.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_account_metas_layout() {
        let metas = build_extra_account_metas().unwrap();
        assert_eq!(metas.len(), 5);
        assert!(bool::from(metas[0].is_writable));
        assert!(metas[1..].iter().all(|meta| !bool::from(meta.is_writable)));
        assert!(metas.iter().all(|meta| !bool::from(meta.is_signer)));
        assert_eq!(metas[1].address_config, stablecoin_core::ID.to_bytes());
    }

    #[test]
    fn test_meta_list_fits_computed_size() {
        let metas = build_extra_account_metas().unwrap();
        let size = ExtraAccountMetaList::size_of(metas.len()).unwrap();
        let mut data = vec![0u8; size];
        ExtraAccountMetaList::init::<ExecuteInstruction>(&mut data, &metas).unwrap();
    }

    fn blacklist_entry_data(mint: Pubkey, address: Pubkey, removed: bool) -> Vec<u8> {
        let entry = BlacklistEntry {
            mint,
            address,
            reason: "sanctions".to_string(),
            added_by: Pubkey::new_unique(),
            added_at: 1,
            removed,
            removed_by: None,
            removed_at: None,
            bump: 255,
        };
        let mut data = Vec::new();
        entry.try_serialize(&mut data).unwrap();
        data
    }

    fn check(key: Pubkey, owner: Pubkey, data: &mut [u8], mint: &Pubkey, party: &Pubkey) -> Result<bool> {
        let mut lamports = 1u64;
        let info = AccountInfo::new(&key, false, false, &mut lamports, data, &owner, false, 0);
        is_blacklisted(&info, mint, party)
    }

    #[test]
    fn test_wrong_blacklist_account_rejected() {
        let mint = Pubkey::new_unique();
        let party = Pubkey::new_unique();
        let someone_else = expected_blacklist_entry(&mint, &Pubkey::new_unique());
        let mut data = blacklist_entry_data(mint, party, false);
        assert_eq!(
            check(someone_else, stablecoin_core::ID, &mut data, &mint, &party).unwrap_err(),
            TransferHookError::InvalidBlacklistAccount.into()
        );
    }

    #[test]
    fn test_uncreated_entry_is_not_blacklisted() {
        let mint = Pubkey::new_unique();
        let party = Pubkey::new_unique();
        let key = expected_blacklist_entry(&mint, &party);
        let mut data: Vec<u8> = Vec::new();
        assert!(!check(key, system_program::ID, &mut data, &mint, &party).unwrap());
    }

    #[test]
    fn test_active_and_removed_entries() {
        let mint = Pubkey::new_unique();
        let party = Pubkey::new_unique();
        let key = expected_blacklist_entry(&mint, &party);

        let mut active = blacklist_entry_data(mint, party, false);
        assert!(check(key, stablecoin_core::ID, &mut active, &mint, &party).unwrap());

        let mut removed = blacklist_entry_data(mint, party, true);
        assert!(!check(key, stablecoin_core::ID, &mut removed, &mint, &party).unwrap());
    }

    #[test]
    fn test_entry_owned_by_other_program_ignored() {
        let mint = Pubkey::new_unique();
        let party = Pubkey::new_unique();
        let key = expected_blacklist_entry(&mint, &party);
        let mut data = blacklist_entry_data(mint, party, false);
        assert!(!check(key, Pubkey::new_unique(), &mut data, &mint, &party).unwrap());
    }
}
