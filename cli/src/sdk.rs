//! Instruction builders over the three programs, grouped by capability.
//!
//! A [`Stablecoin`] is resolved from the on-chain config, so compliance and
//! hook builders only exist for mints that actually carry those modules.

use anchor_lang::{InstructionData, ToAccountMetas};
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use stablecoin_core::constants::{BLACKLIST_SEED, CONFIG_SEED, MINTER_SEED, SEIZURE_SEED};
use stablecoin_core::instructions::InitializeParams;
use stablecoin_core::state::{RoleUpdate, StablecoinConfig, TokenProfile};
use stablecoin_oracle::constants::{ORACLE_SEED, QUOTE_SEED, REGISTRY_SEED};
use stablecoin_oracle::instructions::{OracleInitParams, QuoteParams, RegisterFeedParams};
use stablecoin_oracle::state::{OracleParamsUpdate, QuoteDirection};
use transfer_hook::state::{EXTRA_ACCOUNT_METAS_SEED, HOOK_CONFIG_SEED};

const TOKEN_2022: Pubkey = anchor_spl::token_2022::ID;

fn build(program_id: Pubkey, accounts: impl ToAccountMetas, data: impl InstructionData) -> Instruction {
    Instruction {
        program_id,
        accounts: accounts.to_account_metas(None),
        data: data.data(),
    }
}

pub fn config_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[CONFIG_SEED, mint.as_ref()], &stablecoin_core::ID).0
}

pub fn minter_pda(mint: &Pubkey, minter: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[MINTER_SEED, mint.as_ref(), minter.as_ref()],
        &stablecoin_core::ID,
    )
    .0
}

pub fn blacklist_pda(mint: &Pubkey, address: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[BLACKLIST_SEED, mint.as_ref(), address.as_ref()],
        &stablecoin_core::ID,
    )
    .0
}

pub fn seizure_pda(mint: &Pubkey, sequence: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[SEIZURE_SEED, mint.as_ref(), &sequence.to_le_bytes()],
        &stablecoin_core::ID,
    )
    .0
}

pub fn hook_config_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[HOOK_CONFIG_SEED, mint.as_ref()], &transfer_hook::ID).0
}

pub fn extra_account_metas_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[EXTRA_ACCOUNT_METAS_SEED, mint.as_ref()],
        &transfer_hook::ID,
    )
    .0
}

pub fn registry_pda() -> Pubkey {
    Pubkey::find_program_address(&[REGISTRY_SEED], &stablecoin_oracle::ID).0
}

pub fn oracle_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[ORACLE_SEED, mint.as_ref()], &stablecoin_oracle::ID).0
}

pub fn quote_pda(mint: &Pubkey, requester: &Pubkey, nonce: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[
            QUOTE_SEED,
            mint.as_ref(),
            requester.as_ref(),
            &nonce.to_le_bytes(),
        ],
        &stablecoin_oracle::ID,
    )
    .0
}

pub fn initialize_ix(
    authority: Pubkey,
    mint: Pubkey,
    transfer_hook_program: Option<Pubkey>,
    params: InitializeParams,
) -> Instruction {
    build(
        stablecoin_core::ID,
        stablecoin_core::accounts::Initialize {
            authority,
            mint,
            config: config_pda(&mint),
            transfer_hook_program,
            token_2022_program: TOKEN_2022,
            system_program: system_program::id(),
        },
        stablecoin_core::instruction::Initialize { params },
    )
}

/// Operations every stablecoin supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreHandle {
    pub mint: Pubkey,
    pub config: Pubkey,
}

impl CoreHandle {
    pub fn new(mint: Pubkey) -> Self {
        Self {
            mint,
            config: config_pda(&mint),
        }
    }

    pub fn mint_ix(&self, minter: Pubkey, recipient_token_account: Pubkey, amount: u64) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::MintTokens {
                minter,
                config: self.config,
                minter_config: minter_pda(&self.mint, &minter),
                mint: self.mint,
                recipient_token_account,
                token_2022_program: TOKEN_2022,
            },
            stablecoin_core::instruction::Mint { amount },
        )
    }

    pub fn burn_ix(
        &self,
        burner: Pubkey,
        source_authority: Pubkey,
        source: Pubkey,
        amount: u64,
    ) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::BurnTokens {
                burner,
                source_authority,
                config: self.config,
                mint: self.mint,
                source,
                token_2022_program: TOKEN_2022,
            },
            stablecoin_core::instruction::Burn { amount },
        )
    }

    fn set_frozen_accounts(
        &self,
        authority: Pubkey,
        token_account: Pubkey,
    ) -> stablecoin_core::accounts::SetAccountFrozen {
        stablecoin_core::accounts::SetAccountFrozen {
            authority,
            config: self.config,
            mint: self.mint,
            token_account,
            token_2022_program: TOKEN_2022,
        }
    }

    pub fn freeze_ix(&self, authority: Pubkey, token_account: Pubkey) -> Instruction {
        build(
            stablecoin_core::ID,
            self.set_frozen_accounts(authority, token_account),
            stablecoin_core::instruction::FreezeAccount {},
        )
    }

    pub fn thaw_ix(&self, authority: Pubkey, token_account: Pubkey) -> Instruction {
        build(
            stablecoin_core::ID,
            self.set_frozen_accounts(authority, token_account),
            stablecoin_core::instruction::ThawAccount {},
        )
    }

    pub fn pause_ix(&self, pauser: Pubkey, paused: bool) -> Instruction {
        let accounts = stablecoin_core::accounts::SetPaused {
            pauser,
            config: self.config,
        };
        if paused {
            build(stablecoin_core::ID, accounts, stablecoin_core::instruction::Pause {})
        } else {
            build(stablecoin_core::ID, accounts, stablecoin_core::instruction::Unpause {})
        }
    }

    pub fn add_minter_ix(
        &self,
        authority: Pubkey,
        minter: Pubkey,
        quota_per_period: u64,
        period_seconds: i64,
    ) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::AddMinter {
                authority,
                config: self.config,
                minter_config: minter_pda(&self.mint, &minter),
                system_program: system_program::id(),
            },
            stablecoin_core::instruction::AddMinter {
                minter,
                quota_per_period,
                period_seconds,
            },
        )
    }

    pub fn remove_minter_ix(&self, authority: Pubkey, minter: Pubkey) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::RemoveMinter {
                authority,
                config: self.config,
                minter_config: minter_pda(&self.mint, &minter),
            },
            stablecoin_core::instruction::RemoveMinter {},
        )
    }

    pub fn update_minter_quota_ix(
        &self,
        authority: Pubkey,
        minter: Pubkey,
        quota_per_period: u64,
        period_seconds: i64,
    ) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::UpdateMinterQuota {
                authority,
                config: self.config,
                minter_config: minter_pda(&self.mint, &minter),
            },
            stablecoin_core::instruction::UpdateMinterQuota {
                quota_per_period,
                period_seconds,
            },
        )
    }

    pub fn update_roles_ix(&self, authority: Pubkey, update: RoleUpdate) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::UpdateRoles {
                authority,
                config: self.config,
            },
            stablecoin_core::instruction::UpdateRoles { update },
        )
    }

    pub fn propose_authority_ix(&self, authority: Pubkey, new_authority: Pubkey) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::ProposeAuthority {
                authority,
                config: self.config,
            },
            stablecoin_core::instruction::ProposeAuthorityTransfer { new_authority },
        )
    }

    pub fn accept_authority_ix(&self, new_authority: Pubkey) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::AcceptAuthority {
                new_authority,
                config: self.config,
            },
            stablecoin_core::instruction::AcceptAuthorityTransfer {},
        )
    }

    pub fn cancel_authority_ix(&self, authority: Pubkey) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::ProposeAuthority {
                authority,
                config: self.config,
            },
            stablecoin_core::instruction::CancelAuthorityTransfer {},
        )
    }
}

/// Blacklist and seizure. Only handed out for mints with compliance roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComplianceHandle {
    core: CoreHandle,
    hook: Option<HookHandle>,
}

impl ComplianceHandle {
    pub fn blacklist_entry(&self, address: &Pubkey) -> Pubkey {
        blacklist_pda(&self.core.mint, address)
    }

    /// The address's associated token account, frozen or thawed with the entry.
    pub fn holder_token_account(&self, address: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(address, &self.core.mint, &TOKEN_2022)
    }

    pub fn add_to_blacklist_ix(
        &self,
        blacklister: Pubkey,
        address: Pubkey,
        reason: String,
    ) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::AddToBlacklist {
                blacklister,
                config: self.core.config,
                mint: self.core.mint,
                blacklist_entry: self.blacklist_entry(&address),
                token_account: self.holder_token_account(&address),
                token_2022_program: TOKEN_2022,
                system_program: system_program::id(),
            },
            stablecoin_core::instruction::AddToBlacklist { address, reason },
        )
    }

    pub fn remove_from_blacklist_ix(&self, blacklister: Pubkey, address: Pubkey) -> Instruction {
        build(
            stablecoin_core::ID,
            stablecoin_core::accounts::RemoveFromBlacklist {
                blacklister,
                config: self.core.config,
                mint: self.core.mint,
                blacklist_entry: self.blacklist_entry(&address),
                token_account: self.holder_token_account(&address),
                token_2022_program: TOKEN_2022,
            },
            stablecoin_core::instruction::RemoveFromBlacklist {},
        )
    }

    /// `sequence` is the config's current `seizure_count`. Hook accounts are
    /// appended when the mint has a transfer hook.
    #[allow(clippy::too_many_arguments)]
    pub fn seize_ix(
        &self,
        seizer: Pubkey,
        source: Pubkey,
        source_owner: Pubkey,
        destination: Pubkey,
        destination_owner: Pubkey,
        amount: u64,
        reason: String,
        sequence: u64,
    ) -> Instruction {
        let mut ix = build(
            stablecoin_core::ID,
            stablecoin_core::accounts::Seize {
                seizer,
                config: self.core.config,
                mint: self.core.mint,
                source,
                destination,
                seizure_record: seizure_pda(&self.core.mint, sequence),
                token_2022_program: TOKEN_2022,
                system_program: system_program::id(),
            },
            stablecoin_core::instruction::Seize { amount, reason },
        );
        if let Some(hook) = &self.hook {
            ix.accounts
                .extend(hook.transfer_extra_accounts(&source_owner, &destination_owner));
        }
        ix
    }
}

/// Transfer hook administration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HookHandle {
    pub mint: Pubkey,
    pub hook_config: Pubkey,
    pub extra_account_metas: Pubkey,
}

impl HookHandle {
    fn new(mint: Pubkey) -> Self {
        Self {
            mint,
            hook_config: hook_config_pda(&mint),
            extra_account_metas: extra_account_metas_pda(&mint),
        }
    }

    pub fn initialize_hook_ix(&self, authority: Pubkey, enabled: bool) -> Instruction {
        build(
            transfer_hook::ID,
            transfer_hook::accounts::InitializeHook {
                authority,
                mint: self.mint,
                core_config: config_pda(&self.mint),
                hook_config: self.hook_config,
                system_program: system_program::id(),
            },
            transfer_hook::instruction::InitializeHook { enabled },
        )
    }

    pub fn initialize_extra_metas_ix(&self, authority: Pubkey) -> Instruction {
        build(
            transfer_hook::ID,
            transfer_hook::accounts::InitializeExtraAccountMetaList {
                authority,
                extra_account_meta_list: self.extra_account_metas,
                mint: self.mint,
                hook_config: self.hook_config,
                core_config: config_pda(&self.mint),
                system_program: system_program::id(),
            },
            transfer_hook::instruction::InitializeExtraAccountMetaList {},
        )
    }

    pub fn set_enabled_ix(&self, authority: Pubkey, enabled: bool) -> Instruction {
        let accounts = transfer_hook::accounts::AdminHook {
            authority,
            hook_config: self.hook_config,
            core_config: config_pda(&self.mint),
        };
        if enabled {
            build(transfer_hook::ID, accounts, transfer_hook::instruction::EnableHook {})
        } else {
            build(transfer_hook::ID, accounts, transfer_hook::instruction::DisableHook {})
        }
    }

    /// Accounts Token-2022 needs to invoke the hook on a transfer between
    /// the two owners: the resolved extra metas, the hook program and the
    /// meta list itself.
    pub fn transfer_extra_accounts(
        &self,
        source_owner: &Pubkey,
        destination_owner: &Pubkey,
    ) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.hook_config, false),
            AccountMeta::new_readonly(stablecoin_core::ID, false),
            AccountMeta::new_readonly(config_pda(&self.mint), false),
            AccountMeta::new_readonly(blacklist_pda(&self.mint, source_owner), false),
            AccountMeta::new_readonly(blacklist_pda(&self.mint, destination_owner), false),
            AccountMeta::new_readonly(transfer_hook::ID, false),
            AccountMeta::new_readonly(self.extra_account_metas, false),
        ]
    }
}

/// A stablecoin resolved by capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stablecoin {
    Sss1(CoreHandle),
    Sss2 {
        core: CoreHandle,
        compliance: ComplianceHandle,
        hook: HookHandle,
    },
    Custom {
        core: CoreHandle,
        compliance: Option<ComplianceHandle>,
        hook: Option<HookHandle>,
    },
}

impl Stablecoin {
    pub fn from_profile(mint: Pubkey, profile: &TokenProfile) -> Self {
        let core = CoreHandle::new(mint);
        match profile {
            TokenProfile::Sss1 => Stablecoin::Sss1(core),
            TokenProfile::Sss2 { .. } => {
                let hook = HookHandle::new(mint);
                Stablecoin::Sss2 {
                    core,
                    compliance: ComplianceHandle {
                        core,
                        hook: Some(hook),
                    },
                    hook,
                }
            }
            TokenProfile::Custom {
                extensions,
                compliance,
            } => {
                let hook = extensions.transfer_hook.then(|| HookHandle::new(mint));
                Stablecoin::Custom {
                    core,
                    compliance: compliance.map(|_| ComplianceHandle { core, hook }),
                    hook,
                }
            }
        }
    }

    pub fn from_config(config: &StablecoinConfig) -> Self {
        Self::from_profile(config.mint, &config.profile)
    }

    pub fn core(&self) -> &CoreHandle {
        match self {
            Stablecoin::Sss1(core) => core,
            Stablecoin::Sss2 { core, .. } => core,
            Stablecoin::Custom { core, .. } => core,
        }
    }

    pub fn compliance(&self) -> Option<&ComplianceHandle> {
        match self {
            Stablecoin::Sss1(_) => None,
            Stablecoin::Sss2 { compliance, .. } => Some(compliance),
            Stablecoin::Custom { compliance, .. } => compliance.as_ref(),
        }
    }

    pub fn hook(&self) -> Option<&HookHandle> {
        match self {
            Stablecoin::Sss1(_) => None,
            Stablecoin::Sss2 { hook, .. } => Some(hook),
            Stablecoin::Custom { hook, .. } => hook.as_ref(),
        }
    }
}

/// Feed registry and per-mint oracle instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleHandle {
    pub mint: Pubkey,
    pub oracle_config: Pubkey,
    pub registry: Pubkey,
}

impl OracleHandle {
    pub fn new(mint: Pubkey) -> Self {
        Self {
            mint,
            oracle_config: oracle_pda(&mint),
            registry: registry_pda(),
        }
    }

    pub fn initialize_registry_ix(authority: Pubkey) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::InitializeRegistry {
                authority,
                registry: registry_pda(),
                system_program: system_program::id(),
            },
            stablecoin_oracle::instruction::InitializeRegistry {},
        )
    }

    pub fn register_feed_ix(authority: Pubkey, params: RegisterFeedParams) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::UpdateRegistry {
                authority,
                registry: registry_pda(),
            },
            stablecoin_oracle::instruction::RegisterFeed { params },
        )
    }

    pub fn deactivate_feed_ix(authority: Pubkey, symbol: String) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::UpdateRegistry {
                authority,
                registry: registry_pda(),
            },
            stablecoin_oracle::instruction::DeactivateFeed { symbol },
        )
    }

    pub fn initialize_oracle_ix(&self, authority: Pubkey, params: OracleInitParams) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::InitializeOracle {
                authority,
                core_config: config_pda(&self.mint),
                registry: self.registry,
                oracle_config: self.oracle_config,
                system_program: system_program::id(),
            },
            stablecoin_oracle::instruction::InitializeOracle { params },
        )
    }

    fn update_accounts(&self, authority: Pubkey) -> stablecoin_oracle::accounts::UpdateOracle {
        stablecoin_oracle::accounts::UpdateOracle {
            authority,
            oracle_config: self.oracle_config,
        }
    }

    pub fn update_params_ix(&self, authority: Pubkey, update: OracleParamsUpdate) -> Instruction {
        build(
            stablecoin_oracle::ID,
            self.update_accounts(authority),
            stablecoin_oracle::instruction::UpdateOracleParams { update },
        )
    }

    pub fn pause_ix(&self, authority: Pubkey, reason: String) -> Instruction {
        build(
            stablecoin_oracle::ID,
            self.update_accounts(authority),
            stablecoin_oracle::instruction::PauseOracle { reason },
        )
    }

    pub fn unpause_ix(&self, authority: Pubkey) -> Instruction {
        build(
            stablecoin_oracle::ID,
            self.update_accounts(authority),
            stablecoin_oracle::instruction::UnpauseOracle {},
        )
    }

    pub fn propose_authority_ix(&self, authority: Pubkey, new_authority: Pubkey) -> Instruction {
        build(
            stablecoin_oracle::ID,
            self.update_accounts(authority),
            stablecoin_oracle::instruction::ProposeOracleAuthority { new_authority },
        )
    }

    pub fn accept_authority_ix(&self, new_authority: Pubkey) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::AcceptOracleAuthority {
                new_authority,
                oracle_config: self.oracle_config,
            },
            stablecoin_oracle::instruction::AcceptOracleAuthority {},
        )
    }

    pub fn update_cpi_ix(
        &self,
        authority: Pubkey,
        new_multiplier: u64,
        reference_month: String,
        data_source: String,
    ) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::UpdateCpiMultiplier {
                authority,
                oracle_config: self.oracle_config,
            },
            stablecoin_oracle::instruction::UpdateCpiMultiplier {
                new_multiplier,
                reference_month,
                data_source,
            },
        )
    }

    pub fn quote_ix(
        &self,
        requester: Pubkey,
        feed: Pubkey,
        direction: QuoteDirection,
        params: QuoteParams,
    ) -> Instruction {
        let accounts = stablecoin_oracle::accounts::GetQuote {
            requester,
            oracle_config: self.oracle_config,
            registry: self.registry,
            feed,
            quote: quote_pda(&self.mint, &requester, params.nonce),
            system_program: system_program::id(),
        };
        match direction {
            QuoteDirection::Mint => build(
                stablecoin_oracle::ID,
                accounts,
                stablecoin_oracle::instruction::GetMintQuote { params },
            ),
            QuoteDirection::Redeem => build(
                stablecoin_oracle::ID,
                accounts,
                stablecoin_oracle::instruction::GetRedeemQuote { params },
            ),
        }
    }

    pub fn mint_with_oracle_ix(
        &self,
        requester: Pubkey,
        nonce: u64,
        recipient_token_account: Pubkey,
    ) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::MintWithOracle {
                requester,
                oracle_config: self.oracle_config,
                quote: quote_pda(&self.mint, &requester, nonce),
                core_config: config_pda(&self.mint),
                minter_config: minter_pda(&self.mint, &self.oracle_config),
                mint: self.mint,
                recipient_token_account,
                core_program: stablecoin_core::ID,
                token_2022_program: TOKEN_2022,
            },
            stablecoin_oracle::instruction::MintWithOracle {},
        )
    }

    pub fn redeem_with_oracle_ix(&self, requester: Pubkey, nonce: u64, source: Pubkey) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::RedeemWithOracle {
                requester,
                oracle_config: self.oracle_config,
                quote: quote_pda(&self.mint, &requester, nonce),
                core_config: config_pda(&self.mint),
                mint: self.mint,
                source,
                core_program: stablecoin_core::ID,
                token_2022_program: TOKEN_2022,
            },
            stablecoin_oracle::instruction::RedeemWithOracle {},
        )
    }

    pub fn close_quote_ix(&self, requester: Pubkey, nonce: u64) -> Instruction {
        build(
            stablecoin_oracle::ID,
            stablecoin_oracle::accounts::CloseQuote {
                requester,
                quote: quote_pda(&self.mint, &requester, nonce),
            },
            stablecoin_oracle::instruction::CloseQuote {},
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stablecoin_core::state::{ComplianceRoles, Extensions};

    fn roles() -> ComplianceRoles {
        ComplianceRoles {
            blacklister: Pubkey::new_unique(),
            seizer: Pubkey::new_unique(),
            hook_authority: Pubkey::new_unique(),
        }
    }

    #[test]
    fn sss1_has_no_compliance_surface() {
        let coin = Stablecoin::from_profile(Pubkey::new_unique(), &TokenProfile::Sss1);
        assert!(coin.compliance().is_none());
        assert!(coin.hook().is_none());
    }

    #[test]
    fn sss2_carries_compliance_and_hook() {
        let mint = Pubkey::new_unique();
        let coin = Stablecoin::from_profile(
            mint,
            &TokenProfile::Sss2 {
                compliance: roles(),
            },
        );
        assert_eq!(coin.core().config, config_pda(&mint));
        assert!(coin.compliance().is_some());
        assert_eq!(coin.hook().unwrap().hook_config, hook_config_pda(&mint));
    }

    #[test]
    fn custom_without_hook_seizes_without_extra_accounts() {
        let mint = Pubkey::new_unique();
        let coin = Stablecoin::from_profile(
            mint,
            &TokenProfile::Custom {
                extensions: Extensions {
                    permanent_delegate: true,
                    transfer_hook: false,
                    default_frozen: false,
                },
                compliance: Some(roles()),
            },
        );
        assert!(coin.hook().is_none());
        let ix = coin.compliance().unwrap().seize_ix(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            10,
            "court order".to_string(),
            0,
        );
        assert_eq!(ix.accounts.len(), 8);
        assert_eq!(ix.accounts[5].pubkey, seizure_pda(&mint, 0));
    }

    #[test]
    fn hooked_seize_appends_transfer_accounts() {
        let mint = Pubkey::new_unique();
        let coin = Stablecoin::from_profile(
            mint,
            &TokenProfile::Sss2 {
                compliance: roles(),
            },
        );
        let source_owner = Pubkey::new_unique();
        let destination_owner = Pubkey::new_unique();
        let ix = coin.compliance().unwrap().seize_ix(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            source_owner,
            Pubkey::new_unique(),
            destination_owner,
            10,
            String::new(),
            3,
        );
        assert_eq!(ix.accounts.len(), 15);
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|meta| meta.pubkey).collect();
        assert!(keys.contains(&blacklist_pda(&mint, &source_owner)));
        assert!(keys.contains(&blacklist_pda(&mint, &destination_owner)));
        assert!(keys.contains(&transfer_hook::ID));
    }

    #[test]
    fn blacklist_changes_always_carry_holder_ata() {
        let mint = Pubkey::new_unique();
        let coin = Stablecoin::from_profile(
            mint,
            &TokenProfile::Sss2 {
                compliance: roles(),
            },
        );
        let compliance = coin.compliance().unwrap();
        let address = Pubkey::new_unique();
        let ata = get_associated_token_address_with_program_id(&address, &mint, &TOKEN_2022);

        let add = compliance.add_to_blacklist_ix(Pubkey::new_unique(), address, "ofac".to_string());
        assert_eq!(add.accounts[3].pubkey, blacklist_pda(&mint, &address));
        assert_eq!(add.accounts[4].pubkey, ata);
        assert!(add.accounts[4].is_writable);

        let remove = compliance.remove_from_blacklist_ix(Pubkey::new_unique(), address);
        assert_eq!(remove.accounts[4].pubkey, ata);
        assert!(remove.accounts[4].is_writable);
    }

    #[test]
    fn oracle_mint_uses_oracle_pda_as_minter() {
        let mint = Pubkey::new_unique();
        let oracle = OracleHandle::new(mint);
        let requester = Pubkey::new_unique();
        let ix = oracle.mint_with_oracle_ix(requester, 9, Pubkey::new_unique());
        assert_eq!(ix.program_id, stablecoin_oracle::ID);
        assert_eq!(ix.accounts[2].pubkey, quote_pda(&mint, &requester, 9));
        assert_eq!(
            ix.accounts[4].pubkey,
            minter_pda(&mint, &oracle_pda(&mint))
        );
    }

    #[test]
    fn quote_pdas_differ_by_nonce() {
        let mint = Pubkey::new_unique();
        let requester = Pubkey::new_unique();
        assert_ne!(
            quote_pda(&mint, &requester, 1),
            quote_pda(&mint, &requester, 2)
        );
    }
}
