use anchor_lang::prelude::*;
use stablecoin_core::state::StablecoinConfig;

pub const HOOK_CONFIG_SEED: &[u8] = b"hook-config";
pub const EXTRA_ACCOUNT_METAS_SEED: &[u8] = b"extra-account-metas";

#[account]
#[derive(InitSpace)]
pub struct HookConfig {
    pub mint: Pubkey,
    pub core_program: Pubkey,
    pub authority: Pubkey,
    pub enabled: bool,
    pub transfer_count: u64,
    pub blocked_count: u64,
    pub bump: u8,
}

/// Current hook authority of a mint. Read from the core config on every
/// admin call, so role updates there take effect immediately.
pub fn hook_authority(core_config: &StablecoinConfig) -> Pubkey {
    core_config
        .compliance()
        .map_or(core_config.master_authority, |roles| roles.hook_authority)
}

pub fn is_hook_admin(core_config: &StablecoinConfig, signer: &Pubkey) -> bool {
    *signer == hook_authority(core_config) || *signer == core_config.master_authority
}

/// The blacklist entry PDA the core program keeps for `party`.
pub fn expected_blacklist_entry(mint: &Pubkey, party: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[stablecoin_core::constants::BLACKLIST_SEED, mint.as_ref(), party.as_ref()],
        &stablecoin_core::ID,
    )
    .0
}

/// A transfer signed by the core config PDA is a seizure by the permanent
/// delegate, which may move funds out of a blacklisted account.
pub fn is_seizure(transfer_authority: &Pubkey, core_config: &Pubkey) -> bool {
    transfer_authority == core_config
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferVerdict {
    Allowed,
    SenderBlocked,
    RecipientBlocked,
}

impl HookConfig {
    /// Decides a transfer and updates the counters. The sender is checked
    /// before the recipient. A disabled hook lets everything through.
    pub fn screen(&mut self, sender_blacklisted: bool, recipient_blacklisted: bool) -> TransferVerdict {
        let verdict = if !self.enabled {
            TransferVerdict::Allowed
        } else if sender_blacklisted {
            TransferVerdict::SenderBlocked
        } else if recipient_blacklisted {
            TransferVerdict::RecipientBlocked
        } else {
            TransferVerdict::Allowed
        };

        match verdict {
            TransferVerdict::Allowed => {
                self.transfer_count = self.transfer_count.saturating_add(1);
            }
            TransferVerdict::SenderBlocked | TransferVerdict::RecipientBlocked => {
                self.blocked_count = self.blocked_count.saturating_add(1);
            }
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stablecoin_core::state::{ComplianceRoles, PendingAuthority, RoleUpdate, TokenProfile};

    fn create_core_config(profile: TokenProfile) -> StablecoinConfig {
        let master = Pubkey::new_unique();
        StablecoinConfig {
            version: 1,
            mint: Pubkey::new_unique(),
            name: "Test USD".to_string(),
            symbol: "TUSD".to_string(),
            uri: String::new(),
            decimals: 6,
            profile,
            transfer_hook_program: Some(crate::ID),
            master_authority: master,
            pending_authority: PendingAuthority::default(),
            pauser: master,
            minter_authority: master,
            burner: master,
            paused: false,
            total_supply: 0,
            total_minted: 0,
            total_burned: 0,
            blacklist_count: 0,
            seizure_count: 0,
            created_at: 0,
            last_updated_at: 0,
            bump: 255,
        }
    }

    fn sss2_profile(hook_authority: Pubkey) -> TokenProfile {
        TokenProfile::Sss2 {
            compliance: ComplianceRoles {
                blacklister: Pubkey::new_unique(),
                seizer: Pubkey::new_unique(),
                hook_authority,
            },
        }
    }

    fn create_test_hook(enabled: bool) -> HookConfig {
        HookConfig {
            mint: Pubkey::new_unique(),
            core_program: stablecoin_core::ID,
            authority: Pubkey::new_unique(),
            enabled,
            transfer_count: 0,
            blocked_count: 0,
            bump: 255,
        }
    }

    #[test]
    fn test_clean_transfer_allowed() {
        let mut hook = create_test_hook(true);
        assert_eq!(hook.screen(false, false), TransferVerdict::Allowed);
        assert_eq!(hook.transfer_count, 1);
        assert_eq!(hook.blocked_count, 0);
    }

    #[test]
    fn test_sender_checked_before_recipient() {
        let mut hook = create_test_hook(true);
        assert_eq!(hook.screen(true, true), TransferVerdict::SenderBlocked);
        assert_eq!(hook.screen(false, true), TransferVerdict::RecipientBlocked);
        assert_eq!(hook.blocked_count, 2);
        assert_eq!(hook.transfer_count, 0);
    }

    #[test]
    fn test_disabled_hook_allows_blacklisted_parties() {
        let mut hook = create_test_hook(false);
        assert_eq!(hook.screen(true, true), TransferVerdict::Allowed);
        assert_eq!(hook.transfer_count, 1);
        assert_eq!(hook.blocked_count, 0);
    }

    #[test]
    fn test_hook_admin_follows_core_role_update() {
        let old_authority = Pubkey::new_unique();
        let mut core = create_core_config(sss2_profile(old_authority));
        assert!(is_hook_admin(&core, &old_authority));

        let new_authority = Pubkey::new_unique();
        core.apply_role_update(
            &RoleUpdate {
                hook_authority: Some(new_authority),
                ..RoleUpdate::default()
            },
            10,
        )
        .unwrap();

        assert_eq!(hook_authority(&core), new_authority);
        assert!(is_hook_admin(&core, &new_authority));
        assert!(!is_hook_admin(&core, &old_authority));
    }

    #[test]
    fn test_master_always_administers_hook() {
        let core = create_core_config(sss2_profile(Pubkey::new_unique()));
        assert!(is_hook_admin(&core, &core.master_authority));
        assert!(!is_hook_admin(&core, &Pubkey::new_unique()));

        let plain = create_core_config(TokenProfile::Sss1);
        assert_eq!(hook_authority(&plain), plain.master_authority);
    }

    #[test]
    fn test_seizure_skips_sender_check() {
        let core_config = Pubkey::new_unique();
        let mut hook = create_test_hook(true);

        let sender_listed = true;

        let seizure = is_seizure(&core_config, &core_config);
        assert!(seizure);
        assert_eq!(
            hook.screen(sender_listed && !seizure, false),
            TransferVerdict::Allowed
        );

        let owner_transfer = is_seizure(&Pubkey::new_unique(), &core_config);
        assert!(!owner_transfer);
        assert_eq!(
            hook.screen(sender_listed && !owner_transfer, false),
            TransferVerdict::SenderBlocked
        );
    }

    #[test]
    fn test_seizure_into_blacklisted_account_still_blocked() {
        let core_config = Pubkey::new_unique();
        let mut hook = create_test_hook(true);
        let seizure = is_seizure(&core_config, &core_config);
        assert_eq!(hook.screen(!seizure, true), TransferVerdict::RecipientBlocked);
    }

    #[test]
    fn test_blacklist_entry_address_is_per_party() {
        let mint = Pubkey::new_unique();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        assert_eq!(
            expected_blacklist_entry(&mint, &alice),
            expected_blacklist_entry(&mint, &alice)
        );
        assert_ne!(
            expected_blacklist_entry(&mint, &alice),
            expected_blacklist_entry(&mint, &bob)
        );
    }
}
