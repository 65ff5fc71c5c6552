use anchor_lang::prelude::*;

use crate::constants::MAX_REASON_LEN;
use crate::errors::StablecoinError;

/// Roles that only exist on mints with the compliance module enabled.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub struct ComplianceRoles {
    pub blacklister: Pubkey,
    pub seizer: Pubkey,
    pub hook_authority: Pubkey,
}

#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace,
)]
pub struct Extensions {
    pub permanent_delegate: bool,
    pub transfer_hook: bool,
    pub default_frozen: bool,
}

impl Extensions {
    pub const NONE: Self = Self {
        permanent_delegate: false,
        transfer_hook: false,
        default_frozen: false,
    };

    pub const COMPLIANT: Self = Self {
        permanent_delegate: true,
        transfer_hook: true,
        default_frozen: true,
    };
}

/// Capability profile of a stablecoin. Compliance roles are carried only by
/// the variants that can use them, so an SSS-1 token has no blacklister to
/// consult in the first place.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum TokenProfile {
    Sss1,
    Sss2 {
        compliance: ComplianceRoles,
    },
    Custom {
        extensions: Extensions,
        compliance: Option<ComplianceRoles>,
    },
}

impl TokenProfile {
    pub fn preset_name(&self) -> &'static str {
        match self {
            TokenProfile::Sss1 => "SSS-1",
            TokenProfile::Sss2 { .. } => "SSS-2",
            TokenProfile::Custom { .. } => "CUSTOM",
        }
    }

    pub fn extensions(&self) -> Extensions {
        match self {
            TokenProfile::Sss1 => Extensions::NONE,
            TokenProfile::Sss2 { .. } => Extensions::COMPLIANT,
            TokenProfile::Custom { extensions, .. } => *extensions,
        }
    }

    pub fn compliance(&self) -> Option<&ComplianceRoles> {
        match self {
            TokenProfile::Sss1 => None,
            TokenProfile::Sss2 { compliance } => Some(compliance),
            TokenProfile::Custom { compliance, .. } => compliance.as_ref(),
        }
    }

    fn compliance_mut(&mut self) -> Option<&mut ComplianceRoles> {
        match self {
            TokenProfile::Sss1 => None,
            TokenProfile::Sss2 { compliance } => Some(compliance),
            TokenProfile::Custom { compliance, .. } => compliance.as_mut(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAuthorityError {
    NoPendingTransfer,
    NotPendingAuthority,
}

impl From<PendingAuthorityError> for StablecoinError {
    fn from(err: PendingAuthorityError) -> Self {
        match err {
            PendingAuthorityError::NoPendingTransfer => StablecoinError::NoPendingTransfer,
            PendingAuthorityError::NotPendingAuthority => StablecoinError::NotPendingAuthority,
        }
    }
}

/// Second half of a two-step authority handover. Only the proposed key may
/// complete it, and completing or cancelling always clears the slot.
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace,
)]
pub struct PendingAuthority {
    pub proposed: Option<Pubkey>,
}

impl PendingAuthority {
    pub fn propose(&mut self, new_authority: Pubkey) {
        self.proposed = Some(new_authority);
    }

    pub fn accept(&mut self, signer: Pubkey) -> std::result::Result<Pubkey, PendingAuthorityError> {
        let proposed = self
            .proposed
            .ok_or(PendingAuthorityError::NoPendingTransfer)?;
        if proposed != signer {
            return Err(PendingAuthorityError::NotPendingAuthority);
        }
        self.proposed = None;
        Ok(proposed)
    }

    pub fn cancel(&mut self) -> std::result::Result<Pubkey, PendingAuthorityError> {
        self.proposed
            .take()
            .ok_or(PendingAuthorityError::NoPendingTransfer)
    }
}

/// Partial role reassignment. `None` leaves a role untouched.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default)]
pub struct RoleUpdate {
    pub pauser: Option<Pubkey>,
    pub minter_authority: Option<Pubkey>,
    pub burner: Option<Pubkey>,
    pub blacklister: Option<Pubkey>,
    pub seizer: Option<Pubkey>,
    pub hook_authority: Option<Pubkey>,
}

impl RoleUpdate {
    fn touches_compliance(&self) -> bool {
        self.blacklister.is_some() || self.seizer.is_some() || self.hook_authority.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub role: &'static str,
    pub old_address: Pubkey,
    pub new_address: Pubkey,
}

#[account]
#[derive(InitSpace)]
pub struct StablecoinConfig {
    pub version: u8,
    pub mint: Pubkey,
    #[max_len(32)]
    pub name: String,
    #[max_len(10)]
    pub symbol: String,
    #[max_len(200)]
    pub uri: String,
    pub decimals: u8,
    pub profile: TokenProfile,
    pub transfer_hook_program: Option<Pubkey>,
    pub master_authority: Pubkey,
    pub pending_authority: PendingAuthority,
    pub pauser: Pubkey,
    pub minter_authority: Pubkey,
    pub burner: Pubkey,
    pub paused: bool,
    pub total_supply: u64,
    pub total_minted: u64,
    pub total_burned: u64,
    pub blacklist_count: u64,
    pub seizure_count: u64,
    pub created_at: i64,
    pub last_updated_at: i64,
    pub bump: u8,
}

impl StablecoinConfig {
    pub fn extensions(&self) -> Extensions {
        self.profile.extensions()
    }

    pub fn compliance(&self) -> Option<&ComplianceRoles> {
        self.profile.compliance()
    }

    pub fn require_compliance(&self) -> Result<&ComplianceRoles> {
        self.compliance()
            .ok_or_else(|| error!(StablecoinError::ComplianceNotEnabled))
    }

    pub fn require_master(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(
            *signer,
            self.master_authority,
            StablecoinError::NotMasterAuthority
        );
        Ok(())
    }

    pub fn require_pauser(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.pauser, StablecoinError::NotPauser);
        Ok(())
    }

    pub fn require_minter_authority(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.minter_authority, StablecoinError::NotMinter);
        Ok(())
    }

    pub fn require_burner(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.burner, StablecoinError::NotBurner);
        Ok(())
    }

    pub fn require_blacklister(&self, signer: &Pubkey) -> Result<()> {
        let compliance = self.require_compliance()?;
        require_keys_eq!(
            *signer,
            compliance.blacklister,
            StablecoinError::NotBlacklister
        );
        Ok(())
    }

    /// Seizure needs the permanent delegate, the compliance module and the
    /// seizer key, checked in that order.
    pub fn require_seizer(&self, signer: &Pubkey) -> Result<()> {
        require!(
            self.extensions().permanent_delegate,
            StablecoinError::PermanentDelegateNotEnabled
        );
        let compliance = self.require_compliance()?;
        require_keys_eq!(*signer, compliance.seizer, StablecoinError::NotSeizer);
        Ok(())
    }

    /// Master authority may always freeze. On compliance mints the
    /// blacklister may too.
    pub fn require_freeze_authority(&self, signer: &Pubkey) -> Result<()> {
        if *signer == self.master_authority {
            return Ok(());
        }
        match self.compliance() {
            Some(compliance) if compliance.blacklister == *signer => Ok(()),
            Some(_) => err!(StablecoinError::NotBlacklister),
            None => err!(StablecoinError::NotMasterAuthority),
        }
    }

    pub fn require_active(&self) -> Result<()> {
        require!(!self.paused, StablecoinError::Paused);
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool, now: i64) -> Result<()> {
        if paused {
            require!(!self.paused, StablecoinError::Paused);
        } else {
            require!(self.paused, StablecoinError::NotPaused);
        }
        self.paused = paused;
        self.last_updated_at = now;
        Ok(())
    }

    /// Returns the new total supply.
    pub fn record_mint(&mut self, amount: u64, now: i64) -> Result<u64> {
        require!(amount > 0, StablecoinError::ZeroAmount);
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(StablecoinError::SupplyOverflow)?;
        let total_minted = self
            .total_minted
            .checked_add(amount)
            .ok_or(StablecoinError::SupplyOverflow)?;
        self.total_supply = total_supply;
        self.total_minted = total_minted;
        self.last_updated_at = now;
        Ok(total_supply)
    }

    /// Returns the new total supply.
    pub fn record_burn(&mut self, amount: u64, now: i64) -> Result<u64> {
        require!(amount > 0, StablecoinError::ZeroAmount);
        let total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(StablecoinError::SupplyOverflow)?;
        let total_burned = self
            .total_burned
            .checked_add(amount)
            .ok_or(StablecoinError::SupplyOverflow)?;
        self.total_supply = total_supply;
        self.total_burned = total_burned;
        self.last_updated_at = now;
        Ok(total_supply)
    }

    /// Applies every provided role and reports the ones whose holder changed.
    /// Compliance roles are rejected up front on mints without compliance,
    /// leaving the config untouched.
    pub fn apply_role_update(&mut self, update: &RoleUpdate, now: i64) -> Result<Vec<RoleChange>> {
        if update.touches_compliance() {
            self.require_compliance()?;
        }

        let mut changes = Vec::new();
        let mut assign = |role: &'static str, slot: &mut Pubkey, new: Option<Pubkey>| {
            if let Some(new_address) = new {
                if *slot != new_address {
                    changes.push(RoleChange {
                        role,
                        old_address: *slot,
                        new_address,
                    });
                    *slot = new_address;
                }
            }
        };

        assign("pauser", &mut self.pauser, update.pauser);
        assign(
            "minter_authority",
            &mut self.minter_authority,
            update.minter_authority,
        );
        assign("burner", &mut self.burner, update.burner);
        if let Some(compliance) = self.profile.compliance_mut() {
            assign("blacklister", &mut compliance.blacklister, update.blacklister);
            assign("seizer", &mut compliance.seizer, update.seizer);
            assign(
                "hook_authority",
                &mut compliance.hook_authority,
                update.hook_authority,
            );
        }

        if !changes.is_empty() {
            self.last_updated_at = now;
        }
        Ok(changes)
    }

    pub fn record_blacklist_added(&mut self) -> Result<()> {
        self.blacklist_count = self
            .blacklist_count
            .checked_add(1)
            .ok_or(StablecoinError::SupplyOverflow)?;
        Ok(())
    }

    pub fn record_blacklist_removed(&mut self) {
        self.blacklist_count = self.blacklist_count.saturating_sub(1);
    }

    /// Hands out the sequence number for the next seizure record.
    pub fn next_seizure_sequence(&mut self) -> Result<u64> {
        let sequence = self.seizure_count;
        self.seizure_count = sequence
            .checked_add(1)
            .ok_or(StablecoinError::SupplyOverflow)?;
        Ok(sequence)
    }
}

#[account]
#[derive(InitSpace)]
pub struct MinterConfig {
    pub mint: Pubkey,
    pub minter: Pubkey,
    pub is_active: bool,
    /// Zero means unlimited.
    pub quota_per_period: u64,
    /// Zero means the quota never resets.
    pub period_seconds: i64,
    pub minted_this_period: u64,
    pub period_start: i64,
    pub total_minted: u64,
    pub mint_count: u64,
    pub created_at: i64,
    pub bump: u8,
}

impl MinterConfig {
    pub fn exists(&self) -> bool {
        self.created_at != 0 || self.mint != Pubkey::default()
    }

    pub fn open(
        &mut self,
        mint: Pubkey,
        minter: Pubkey,
        quota_per_period: u64,
        period_seconds: i64,
        now: i64,
        bump: u8,
    ) -> Result<()> {
        require!(!self.exists(), StablecoinError::MinterAlreadyExists);
        self.mint = mint;
        self.minter = minter;
        self.is_active = true;
        self.quota_per_period = quota_per_period;
        self.period_seconds = period_seconds.max(0);
        self.minted_this_period = 0;
        self.period_start = now;
        self.total_minted = 0;
        self.mint_count = 0;
        self.created_at = now;
        self.bump = bump;
        Ok(())
    }

    pub fn reset_quota(&mut self, quota_per_period: u64, period_seconds: i64, now: i64) {
        self.quota_per_period = quota_per_period;
        self.period_seconds = period_seconds.max(0);
        self.minted_this_period = 0;
        self.period_start = now;
    }

    fn period_elapsed(&self, now: i64) -> bool {
        self.period_seconds > 0
            && now >= self.period_start.saturating_add(self.period_seconds)
    }

    /// Rolls the period window if it has elapsed, then charges `amount`
    /// against the quota. Returns whether the window rolled.
    pub fn record_mint(&mut self, amount: u64, now: i64) -> Result<bool> {
        require!(self.is_active, StablecoinError::MinterInactive);

        let rolled = self.period_elapsed(now);
        if rolled {
            self.minted_this_period = 0;
            self.period_start = now;
        }

        let minted_this_period = self
            .minted_this_period
            .checked_add(amount)
            .ok_or(StablecoinError::SupplyOverflow)?;
        if self.quota_per_period > 0 {
            require!(
                minted_this_period <= self.quota_per_period,
                StablecoinError::QuotaExceeded
            );
        }

        self.minted_this_period = minted_this_period;
        self.total_minted = self
            .total_minted
            .checked_add(amount)
            .ok_or(StablecoinError::SupplyOverflow)?;
        self.mint_count = self.mint_count.saturating_add(1);
        Ok(rolled)
    }

    pub fn remaining_quota(&self, now: i64) -> Option<u64> {
        if self.quota_per_period == 0 {
            return None;
        }
        let used = if self.period_elapsed(now) {
            0
        } else {
            self.minted_this_period
        };
        Some(self.quota_per_period.saturating_sub(used))
    }
}

#[account]
#[derive(InitSpace)]
pub struct BlacklistEntry {
    pub mint: Pubkey,
    pub address: Pubkey,
    #[max_len(128)]
    pub reason: String,
    pub added_by: Pubkey,
    pub added_at: i64,
    pub removed: bool,
    pub removed_by: Option<Pubkey>,
    pub removed_at: Option<i64>,
    pub bump: u8,
}

impl BlacklistEntry {
    pub fn is_active(&self) -> bool {
        self.mint != Pubkey::default() && !self.removed
    }

    /// Creates the entry, or reactivates one that was previously removed.
    pub fn activate(
        &mut self,
        mint: Pubkey,
        address: Pubkey,
        reason: String,
        added_by: Pubkey,
        now: i64,
        bump: u8,
    ) -> Result<()> {
        require!(
            address != Pubkey::default(),
            StablecoinError::InvalidBlacklistTarget
        );
        require!(
            reason.len() <= MAX_REASON_LEN,
            StablecoinError::ReasonTooLong
        );
        require!(!self.is_active(), StablecoinError::AlreadyBlacklisted);

        self.mint = mint;
        self.address = address;
        self.reason = reason;
        self.added_by = added_by;
        self.added_at = now;
        self.removed = false;
        self.removed_by = None;
        self.removed_at = None;
        self.bump = bump;
        Ok(())
    }

    pub fn deactivate(&mut self, removed_by: Pubkey, now: i64) -> Result<()> {
        require!(self.is_active(), StablecoinError::NotBlacklisted);
        self.removed = true;
        self.removed_by = Some(removed_by);
        self.removed_at = Some(now);
        Ok(())
    }
}

#[account]
#[derive(InitSpace)]
pub struct SeizureRecord {
    pub mint: Pubkey,
    pub seized_from: Pubkey,
    pub seized_to: Pubkey,
    pub amount: u64,
    #[max_len(128)]
    pub reason: String,
    pub executed_by: Pubkey,
    pub executed_at: i64,
    pub slot: u64,
    pub sequence: u64,
    pub bump: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000;

    fn compliance_roles() -> ComplianceRoles {
        ComplianceRoles {
            blacklister: Pubkey::new_unique(),
            seizer: Pubkey::new_unique(),
            hook_authority: Pubkey::new_unique(),
        }
    }

    fn create_test_config(profile: TokenProfile) -> StablecoinConfig {
        let master = Pubkey::new_unique();
        StablecoinConfig {
            version: 1,
            mint: Pubkey::new_unique(),
            name: "Test USD".to_string(),
            symbol: "TUSD".to_string(),
            uri: String::new(),
            decimals: 6,
            profile,
            transfer_hook_program: None,
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
            created_at: NOW,
            last_updated_at: NOW,
            bump: 255,
        }
    }

    fn create_test_minter(quota: u64, period: i64) -> MinterConfig {
        let mut minter = MinterConfig {
            mint: Pubkey::default(),
            minter: Pubkey::default(),
            is_active: false,
            quota_per_period: 0,
            period_seconds: 0,
            minted_this_period: 0,
            period_start: 0,
            total_minted: 0,
            mint_count: 0,
            created_at: 0,
            bump: 0,
        };
        minter
            .open(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                quota,
                period,
                NOW,
                254,
            )
            .unwrap();
        minter
    }

    fn empty_blacklist_entry() -> BlacklistEntry {
        BlacklistEntry {
            mint: Pubkey::default(),
            address: Pubkey::default(),
            reason: String::new(),
            added_by: Pubkey::default(),
            added_at: 0,
            removed: false,
            removed_by: None,
            removed_at: None,
            bump: 0,
        }
    }

    #[test]
    fn test_profile_extensions() {
        assert_eq!(TokenProfile::Sss1.extensions(), Extensions::NONE);
        let sss2 = TokenProfile::Sss2 {
            compliance: compliance_roles(),
        };
        assert_eq!(sss2.extensions(), Extensions::COMPLIANT);
        assert!(sss2.compliance().is_some());
        assert!(TokenProfile::Sss1.compliance().is_none());
        assert_eq!(sss2.preset_name(), "SSS-2");
    }

    #[test]
    fn test_pause_transitions() {
        let mut config = create_test_config(TokenProfile::Sss1);
        assert_eq!(
            config.set_paused(false, NOW).unwrap_err(),
            StablecoinError::NotPaused.into()
        );
        config.set_paused(true, NOW).unwrap();
        assert!(config.paused);
        assert_eq!(
            config.require_active().unwrap_err(),
            StablecoinError::Paused.into()
        );
        assert_eq!(
            config.set_paused(true, NOW).unwrap_err(),
            StablecoinError::Paused.into()
        );
        config.set_paused(false, NOW + 1).unwrap();
        assert!(!config.paused);
        assert_eq!(config.last_updated_at, NOW + 1);
    }

    #[test]
    fn test_supply_counters() {
        let mut config = create_test_config(TokenProfile::Sss1);
        assert_eq!(config.record_mint(1_000, NOW).unwrap(), 1_000);
        assert_eq!(config.record_burn(400, NOW).unwrap(), 600);
        assert_eq!(config.total_minted, 1_000);
        assert_eq!(config.total_burned, 400);
        assert_eq!(
            config.record_mint(0, NOW).unwrap_err(),
            StablecoinError::ZeroAmount.into()
        );
        assert_eq!(
            config.record_burn(601, NOW).unwrap_err(),
            StablecoinError::SupplyOverflow.into()
        );
        assert_eq!(config.total_supply, 600);
    }

    #[test]
    fn test_mint_overflow_leaves_counters_unchanged() {
        let mut config = create_test_config(TokenProfile::Sss1);
        config.record_mint(u64::MAX, NOW).unwrap();
        assert_eq!(
            config.record_mint(1, NOW).unwrap_err(),
            StablecoinError::SupplyOverflow.into()
        );
        assert_eq!(config.total_supply, u64::MAX);
    }

    #[test]
    fn test_freeze_authority_without_compliance() {
        let config = create_test_config(TokenProfile::Sss1);
        assert!(config
            .require_freeze_authority(&config.master_authority)
            .is_ok());
        assert_eq!(
            config
                .require_freeze_authority(&Pubkey::new_unique())
                .unwrap_err(),
            StablecoinError::NotMasterAuthority.into()
        );
    }

    #[test]
    fn test_freeze_authority_with_compliance() {
        let roles = compliance_roles();
        let config = create_test_config(TokenProfile::Sss2 { compliance: roles });
        assert!(config.require_freeze_authority(&roles.blacklister).is_ok());
        assert!(config
            .require_freeze_authority(&config.master_authority)
            .is_ok());
        assert_eq!(
            config.require_freeze_authority(&roles.seizer).unwrap_err(),
            StablecoinError::NotBlacklister.into()
        );
    }

    #[test]
    fn test_seizer_checks_extension_then_compliance() {
        let roles = compliance_roles();
        let config = create_test_config(TokenProfile::Custom {
            extensions: Extensions {
                permanent_delegate: false,
                transfer_hook: true,
                default_frozen: false,
            },
            compliance: Some(roles),
        });
        assert_eq!(
            config.require_seizer(&roles.seizer).unwrap_err(),
            StablecoinError::PermanentDelegateNotEnabled.into()
        );

        let config = create_test_config(TokenProfile::Custom {
            extensions: Extensions {
                permanent_delegate: true,
                transfer_hook: false,
                default_frozen: false,
            },
            compliance: None,
        });
        assert_eq!(
            config.require_seizer(&Pubkey::new_unique()).unwrap_err(),
            StablecoinError::ComplianceNotEnabled.into()
        );

        let config = create_test_config(TokenProfile::Sss2 { compliance: roles });
        assert!(config.require_seizer(&roles.seizer).is_ok());
        assert_eq!(
            config.require_seizer(&roles.blacklister).unwrap_err(),
            StablecoinError::NotSeizer.into()
        );
    }

    #[test]
    fn test_role_update_reports_only_changes() {
        let roles = compliance_roles();
        let mut config = create_test_config(TokenProfile::Sss2 { compliance: roles });
        let new_pauser = Pubkey::new_unique();
        let update = RoleUpdate {
            pauser: Some(new_pauser),
            burner: Some(config.burner),
            seizer: Some(roles.blacklister),
            ..Default::default()
        };

        let changes = config.apply_role_update(&update, NOW + 5).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].role, "pauser");
        assert_eq!(changes[0].new_address, new_pauser);
        assert_eq!(changes[1].role, "seizer");
        assert_eq!(changes[1].old_address, roles.seizer);
        assert_eq!(config.pauser, new_pauser);
        assert_eq!(config.compliance().unwrap().seizer, roles.blacklister);
        assert_eq!(config.last_updated_at, NOW + 5);
    }

    #[test]
    fn test_role_update_rejects_compliance_roles_on_sss1() {
        let mut config = create_test_config(TokenProfile::Sss1);
        let original_pauser = config.pauser;
        let update = RoleUpdate {
            pauser: Some(Pubkey::new_unique()),
            blacklister: Some(Pubkey::new_unique()),
            ..Default::default()
        };
        assert_eq!(
            config.apply_role_update(&update, NOW).unwrap_err(),
            StablecoinError::ComplianceNotEnabled.into()
        );
        assert_eq!(config.pauser, original_pauser);
    }

    #[test]
    fn test_authority_transfer_two_step() {
        let mut pending = PendingAuthority::default();
        let signer = Pubkey::new_unique();
        assert_eq!(
            pending.accept(signer),
            Err(PendingAuthorityError::NoPendingTransfer)
        );

        let proposed = Pubkey::new_unique();
        pending.propose(proposed);
        assert_eq!(
            pending.accept(signer),
            Err(PendingAuthorityError::NotPendingAuthority)
        );
        assert_eq!(pending.proposed, Some(proposed));
        assert_eq!(pending.accept(proposed), Ok(proposed));
        assert_eq!(pending.proposed, None);
        assert_eq!(pending.cancel(), Err(PendingAuthorityError::NoPendingTransfer));
    }

    #[test]
    fn test_authority_transfer_cancel() {
        let mut pending = PendingAuthority::default();
        let proposed = Pubkey::new_unique();
        pending.propose(proposed);
        assert_eq!(pending.cancel(), Ok(proposed));
        assert_eq!(
            pending.accept(proposed),
            Err(PendingAuthorityError::NoPendingTransfer)
        );
    }

    #[test]
    fn test_minter_quota_boundary_and_rollover() {
        let mut minter = create_test_minter(1_000_000, 86_400);
        minter.record_mint(999_999, NOW).unwrap();
        minter.record_mint(1, NOW + 10).unwrap();
        assert_eq!(
            minter.record_mint(1, NOW + 20).unwrap_err(),
            StablecoinError::QuotaExceeded.into()
        );
        assert_eq!(minter.minted_this_period, 1_000_000);

        assert!(minter.record_mint(1, NOW + 86_400).unwrap());
        assert_eq!(minter.minted_this_period, 1);
        assert_eq!(minter.period_start, NOW + 86_400);
        assert_eq!(minter.total_minted, 1_000_001);
        assert_eq!(minter.mint_count, 3);
    }

    #[test]
    fn test_minter_lifetime_quota_never_resets() {
        let mut minter = create_test_minter(100, 0);
        minter.record_mint(100, NOW).unwrap();
        assert_eq!(
            minter.record_mint(1, NOW + 10 * 86_400).unwrap_err(),
            StablecoinError::QuotaExceeded.into()
        );
        assert_eq!(minter.remaining_quota(NOW + 10 * 86_400), Some(0));
    }

    #[test]
    fn test_minter_unlimited_quota() {
        let mut minter = create_test_minter(0, 3_600);
        minter.record_mint(u64::MAX / 2, NOW).unwrap();
        assert_eq!(minter.remaining_quota(NOW), None);
    }

    #[test]
    fn test_inactive_minter_rejected() {
        let mut minter = create_test_minter(0, 0);
        minter.is_active = false;
        assert_eq!(
            minter.record_mint(1, NOW).unwrap_err(),
            StablecoinError::MinterInactive.into()
        );
    }

    #[test]
    fn test_minter_cannot_be_opened_twice() {
        let mut minter = create_test_minter(10, 10);
        let result = minter.open(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            1,
            1,
            NOW,
            1,
        );
        assert_eq!(
            result.unwrap_err(),
            StablecoinError::MinterAlreadyExists.into()
        );
    }

    #[test]
    fn test_quota_reset_restarts_window() {
        let mut minter = create_test_minter(10, 100);
        minter.record_mint(10, NOW).unwrap();
        minter.reset_quota(50, 200, NOW + 1);
        assert_eq!(minter.remaining_quota(NOW + 1), Some(50));
        minter.record_mint(50, NOW + 2).unwrap();
    }

    #[test]
    fn test_blacklist_single_active_entry() {
        let mut entry = empty_blacklist_entry();
        let mint = Pubkey::new_unique();
        let address = Pubkey::new_unique();
        let blacklister = Pubkey::new_unique();
        assert!(!entry.is_active());

        entry
            .activate(mint, address, "OFAC".to_string(), blacklister, NOW, 1)
            .unwrap();
        assert!(entry.is_active());
        assert_eq!(
            entry
                .activate(mint, address, "again".to_string(), blacklister, NOW, 1)
                .unwrap_err(),
            StablecoinError::AlreadyBlacklisted.into()
        );

        entry.deactivate(blacklister, NOW + 1).unwrap();
        assert!(!entry.is_active());
        assert_eq!(entry.removed_at, Some(NOW + 1));
        assert_eq!(
            entry.deactivate(blacklister, NOW + 2).unwrap_err(),
            StablecoinError::NotBlacklisted.into()
        );

        entry
            .activate(mint, address, "relisted".to_string(), blacklister, NOW + 3, 1)
            .unwrap();
        assert!(entry.is_active());
        assert_eq!(entry.removed_by, None);
        assert_eq!(entry.reason, "relisted");
    }

    #[test]
    fn test_blacklist_rejects_zero_address_and_long_reason() {
        let mut entry = empty_blacklist_entry();
        let mint = Pubkey::new_unique();
        assert_eq!(
            entry
                .activate(mint, Pubkey::default(), String::new(), mint, NOW, 1)
                .unwrap_err(),
            StablecoinError::InvalidBlacklistTarget.into()
        );
        assert_eq!(
            entry
                .activate(
                    mint,
                    Pubkey::new_unique(),
                    "x".repeat(MAX_REASON_LEN + 1),
                    mint,
                    NOW,
                    1
                )
                .unwrap_err(),
            StablecoinError::ReasonTooLong.into()
        );
        assert!(!entry.is_active());
    }

    #[test]
    fn test_seizure_sequence_increments() {
        let mut config = create_test_config(TokenProfile::Sss1);
        assert_eq!(config.next_seizure_sequence().unwrap(), 0);
        assert_eq!(config.next_seizure_sequence().unwrap(), 1);
        assert_eq!(config.seizure_count, 2);
    }

    proptest! {
        #[test]
        fn prop_supply_equals_minted_minus_burned(
            ops in proptest::collection::vec((any::<bool>(), 1u64..1_000_000_000), 1..64)
        ) {
            let mut config = create_test_config(TokenProfile::Sss1);
            for (is_mint, amount) in ops {
                let _ = if is_mint {
                    config.record_mint(amount, NOW)
                } else {
                    config.record_burn(amount, NOW)
                };
                prop_assert_eq!(
                    config.total_supply,
                    config.total_minted - config.total_burned
                );
            }
        }

        #[test]
        fn prop_seizures_leave_supply_untouched(
            minted in 1u64..1_000_000_000,
            seizures in 1usize..32
        ) {
            let mut config = create_test_config(TokenProfile::Sss1);
            config.record_mint(minted, NOW).unwrap();
            for expected in 0..seizures as u64 {
                prop_assert_eq!(config.next_seizure_sequence().unwrap(), expected);
                prop_assert_eq!(config.total_supply, minted);
                prop_assert_eq!(config.total_minted, minted);
                prop_assert_eq!(config.total_burned, 0);
            }
        }

        #[test]
        fn prop_period_mints_never_exceed_quota(
            quota in 1u64..10_000,
            amounts in proptest::collection::vec(1u64..5_000, 1..32)
        ) {
            let mut minter = create_test_minter(quota, 0);
            for amount in amounts {
                let _ = minter.record_mint(amount, NOW);
                prop_assert!(minter.minted_this_period <= quota);
            }
        }
    }
}
