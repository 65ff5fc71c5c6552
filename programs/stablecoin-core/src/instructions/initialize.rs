use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke;
use anchor_lang::system_program;
use anchor_spl::token_2022::spl_token_2022::{
    extension::{default_account_state, metadata_pointer, transfer_hook, ExtensionType},
    instruction as token_2022_instruction,
    state::{AccountState, Mint as Token2022Mint},
};
use anchor_spl::token_2022::Token2022;
use anchor_spl::token_interface::{token_metadata_initialize, TokenMetadataInitialize};

use crate::constants::{CONFIG_SEED, CONFIG_VERSION, MAX_NAME_LEN, MAX_SYMBOL_LEN, MAX_URI_LEN};
use crate::errors::StablecoinError;
use crate::events::Initialized;
use crate::state::{ComplianceRoles, Extensions, PendingAuthority, StablecoinConfig, TokenProfile};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub enum PresetParams {
    /// Minimal token: no extensions beyond freeze authority.
    Sss1,
    /// Compliance token. The hook authority starts as the master authority.
    Sss2 { blacklister: Pubkey, seizer: Pubkey },
    Custom {
        extensions: Extensions,
        compliance: Option<ComplianceRoles>,
    },
}

impl PresetParams {
    pub fn resolve(self, master_authority: Pubkey) -> Result<TokenProfile> {
        match self {
            PresetParams::Sss1 => Ok(TokenProfile::Sss1),
            PresetParams::Sss2 {
                blacklister,
                seizer,
            } => Ok(TokenProfile::Sss2 {
                compliance: ComplianceRoles {
                    blacklister,
                    seizer,
                    hook_authority: master_authority,
                },
            }),
            PresetParams::Custom {
                extensions,
                compliance,
            } => {
                if extensions.transfer_hook {
                    require!(compliance.is_some(), StablecoinError::ComplianceNotEnabled);
                }
                Ok(TokenProfile::Custom {
                    extensions,
                    compliance,
                })
            }
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitializeParams {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub decimals: u8,
    pub preset: PresetParams,
    pub pauser: Option<Pubkey>,
    pub minter_authority: Option<Pubkey>,
    pub burner: Option<Pubkey>,
}

impl InitializeParams {
    fn validate(&self) -> Result<()> {
        require!(
            self.name.len() <= MAX_NAME_LEN,
            StablecoinError::NameTooLong
        );
        require!(
            self.symbol.len() <= MAX_SYMBOL_LEN,
            StablecoinError::SymbolTooLong
        );
        require!(self.uri.len() <= MAX_URI_LEN, StablecoinError::UriTooLong);
        Ok(())
    }
}

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub mint: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + StablecoinConfig::INIT_SPACE,
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump
    )]
    pub config: Account<'info, StablecoinConfig>,

    /// CHECK: Only recorded as the mint's transfer hook program id.
    #[account(executable)]
    pub transfer_hook_program: Option<UncheckedAccount<'info>>,

    pub token_2022_program: Program<'info, Token2022>,

    pub system_program: Program<'info, System>,
}

/// Every mint carries a metadata pointer to itself; the token metadata TLV is
/// appended after `initialize_mint2`, so it is not part of the initial length.
fn mint_extension_types(extensions: &Extensions) -> Vec<ExtensionType> {
    let mut types = vec![ExtensionType::MetadataPointer];
    if extensions.permanent_delegate {
        types.push(ExtensionType::PermanentDelegate);
    }
    if extensions.transfer_hook {
        types.push(ExtensionType::TransferHook);
    }
    if extensions.default_frozen {
        types.push(ExtensionType::DefaultAccountState);
    }
    types
}

pub fn initialize_handler(ctx: Context<Initialize>, params: InitializeParams) -> Result<()> {
    params.validate()?;

    let master_authority = ctx.accounts.authority.key();
    let profile = params.preset.clone().resolve(master_authority)?;
    let extensions = profile.extensions();

    let hook_program_id = ctx
        .accounts
        .transfer_hook_program
        .as_ref()
        .map(|program| program.key());
    if extensions.transfer_hook {
        require!(
            hook_program_id.is_some(),
            StablecoinError::HookNotRegistered
        );
    }

    let mint_key = ctx.accounts.mint.key();
    let token_program_id = ctx.accounts.token_2022_program.key();
    let config_key = ctx.accounts.config.key();

    let mint_len =
        ExtensionType::try_calculate_account_len::<Token2022Mint>(&mint_extension_types(&extensions))?;
    let lamports = Rent::get()?.minimum_balance(mint_len);
    let create_accounts = system_program::CreateAccount {
        from: ctx.accounts.authority.to_account_info(),
        to: ctx.accounts.mint.to_account_info(),
    };
    let create_ctx = CpiContext::new(
        ctx.accounts.system_program.to_account_info(),
        create_accounts,
    );
    system_program::create_account(create_ctx, lamports, mint_len as u64, &token_program_id)?;

    let mint_info = ctx.accounts.mint.to_account_info();
    let token_program_info = ctx.accounts.token_2022_program.to_account_info();

    let pointer_ix = metadata_pointer::instruction::initialize(
        &token_program_id,
        &mint_key,
        Some(config_key),
        Some(mint_key),
    )?;
    invoke(&pointer_ix, &[mint_info.clone(), token_program_info.clone()])?;

    if extensions.permanent_delegate {
        let delegate_ix = token_2022_instruction::initialize_permanent_delegate(
            &token_program_id,
            &mint_key,
            &config_key,
        )?;
        invoke(
            &delegate_ix,
            &[mint_info.clone(), token_program_info.clone()],
        )?;
    }

    if extensions.transfer_hook {
        let hook_ix = transfer_hook::instruction::initialize(
            &token_program_id,
            &mint_key,
            Some(config_key),
            hook_program_id,
        )?;
        invoke(&hook_ix, &[mint_info.clone(), token_program_info.clone()])?;
    }

    if extensions.default_frozen {
        let default_state_ix =
            default_account_state::instruction::initialize_default_account_state(
                &token_program_id,
                &mint_key,
                &AccountState::Frozen,
            )?;
        invoke(
            &default_state_ix,
            &[mint_info.clone(), token_program_info.clone()],
        )?;
    }

    let mint_ix = token_2022_instruction::initialize_mint2(
        &token_program_id,
        &mint_key,
        &config_key,
        Some(&config_key),
        params.decimals,
    )?;
    invoke(
        &mint_ix,
        &[mint_info.clone(), token_program_info.clone()],
    )?;

    let config_bump = ctx.bumps.config;
    let signer_seeds: &[&[u8]] = &[CONFIG_SEED, mint_key.as_ref(), &[config_bump]];
    let config_info = ctx.accounts.config.to_account_info();
    token_metadata_initialize(
        CpiContext::new_with_signer(
            token_program_info.clone(),
            TokenMetadataInitialize {
                program_id: token_program_info,
                mint: mint_info.clone(),
                metadata: mint_info.clone(),
                mint_authority: config_info.clone(),
                update_authority: config_info,
            },
            &[signer_seeds],
        ),
        params.name.clone(),
        params.symbol.clone(),
        params.uri.clone(),
    )?;

    // The metadata TLV grows the mint past the rent paid at creation.
    let shortfall = Rent::get()?
        .minimum_balance(mint_info.data_len())
        .saturating_sub(mint_info.lamports());
    if shortfall > 0 {
        system_program::transfer(
            CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                system_program::Transfer {
                    from: ctx.accounts.authority.to_account_info(),
                    to: mint_info,
                },
            ),
            shortfall,
        )?;
    }

    let now = Clock::get()?.unix_timestamp;
    let config = &mut ctx.accounts.config;
    config.version = CONFIG_VERSION;
    config.mint = mint_key;
    config.name = params.name;
    config.symbol = params.symbol;
    config.uri = params.uri;
    config.decimals = params.decimals;
    config.profile = profile;
    config.transfer_hook_program = if extensions.transfer_hook {
        hook_program_id
    } else {
        None
    };
    config.master_authority = master_authority;
    config.pending_authority = PendingAuthority::default();
    config.pauser = params.pauser.unwrap_or(master_authority);
    config.minter_authority = params.minter_authority.unwrap_or(master_authority);
    config.burner = params.burner.unwrap_or(master_authority);
    config.paused = false;
    config.total_supply = 0;
    config.total_minted = 0;
    config.total_burned = 0;
    config.blacklist_count = 0;
    config.seizure_count = 0;
    config.created_at = now;
    config.last_updated_at = now;
    config.bump = config_bump;

    emit!(Initialized {
        mint: mint_key,
        master_authority,
        name: config.name.clone(),
        symbol: config.symbol.clone(),
        preset: config.profile.preset_name().to_string(),
        decimals: config.decimals,
        timestamp: now,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(preset: PresetParams) -> InitializeParams {
        InitializeParams {
            name: "Test USD".to_string(),
            symbol: "TUSD".to_string(),
            uri: "https://example.com/tusd.json".to_string(),
            decimals: 6,
            preset,
            pauser: None,
            minter_authority: None,
            burner: None,
        }
    }

    #[test]
    fn test_sss2_hook_authority_defaults_to_master() {
        let master = Pubkey::new_unique();
        let blacklister = Pubkey::new_unique();
        let seizer = Pubkey::new_unique();
        let profile = PresetParams::Sss2 {
            blacklister,
            seizer,
        }
        .resolve(master)
        .unwrap();
        let compliance = profile.compliance().unwrap();
        assert_eq!(compliance.hook_authority, master);
        assert_eq!(compliance.blacklister, blacklister);
        assert_eq!(profile.extensions(), Extensions::COMPLIANT);
    }

    #[test]
    fn test_custom_hook_requires_compliance() {
        let preset = PresetParams::Custom {
            extensions: Extensions {
                permanent_delegate: false,
                transfer_hook: true,
                default_frozen: false,
            },
            compliance: None,
        };
        assert_eq!(
            preset.resolve(Pubkey::new_unique()).unwrap_err(),
            StablecoinError::ComplianceNotEnabled.into()
        );
    }

    #[test]
    fn test_custom_without_hook_needs_no_compliance() {
        let preset = PresetParams::Custom {
            extensions: Extensions {
                permanent_delegate: true,
                transfer_hook: false,
                default_frozen: true,
            },
            compliance: None,
        };
        let profile = preset.resolve(Pubkey::new_unique()).unwrap();
        assert!(profile.compliance().is_none());
        assert!(profile.extensions().permanent_delegate);
    }

    #[test]
    fn test_metadata_length_limits() {
        assert!(params(PresetParams::Sss1).validate().is_ok());

        let mut long_name = params(PresetParams::Sss1);
        long_name.name = "n".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            long_name.validate().unwrap_err(),
            StablecoinError::NameTooLong.into()
        );

        let mut long_symbol = params(PresetParams::Sss1);
        long_symbol.symbol = "S".repeat(MAX_SYMBOL_LEN + 1);
        assert_eq!(
            long_symbol.validate().unwrap_err(),
            StablecoinError::SymbolTooLong.into()
        );

        let mut long_uri = params(PresetParams::Sss1);
        long_uri.uri = "u".repeat(MAX_URI_LEN + 1);
        assert_eq!(
            long_uri.validate().unwrap_err(),
            StablecoinError::UriTooLong.into()
        );
    }

    #[test]
    fn test_metadata_pointer_on_every_mint() {
        for extensions in [
            Extensions::NONE,
            Extensions::COMPLIANT,
            Extensions {
                permanent_delegate: true,
                transfer_hook: false,
                default_frozen: false,
            },
        ] {
            let types = mint_extension_types(&extensions);
            assert_eq!(types.first(), Some(&ExtensionType::MetadataPointer));
            assert!(
                ExtensionType::try_calculate_account_len::<Token2022Mint>(&types).is_ok()
            );
        }
    }

    #[test]
    fn test_extension_types_follow_flags() {
        assert_eq!(
            mint_extension_types(&Extensions::NONE),
            vec![ExtensionType::MetadataPointer]
        );
        assert_eq!(
            mint_extension_types(&Extensions::COMPLIANT),
            vec![
                ExtensionType::MetadataPointer,
                ExtensionType::PermanentDelegate,
                ExtensionType::TransferHook,
                ExtensionType::DefaultAccountState,
            ]
        );
    }
}
