use anchor_lang::prelude::*;
use stablecoin_core::state::PendingAuthority;

use crate::constants::{
    BPS_DENOMINATOR, MAX_CURRENCY_LEN, MAX_DATA_SOURCE_LEN, MAX_DESCRIPTION_LEN, MAX_FEEDS,
    MAX_FEED_SYMBOL_LEN, MAX_PAUSE_REASON_LEN,
};
use crate::errors::OracleError;

/// How a feed's price converts between USD and tokens.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum FeedType {
    /// Price is USD per token (EUR/USD).
    Direct,
    /// Price is tokens per USD (USD/BRL).
    Inverse,
    /// Pegged to the stored CPI multiplier; the live feed is not read.
    CpiIndexed,
    Custom {
        numerator: u64,
        denominator: u64,
        base_type: u8,
    },
}

impl FeedType {
    pub fn uses_live_price(&self) -> bool {
        !matches!(self, FeedType::CpiIndexed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedType::Direct => "direct",
            FeedType::Inverse => "inverse",
            FeedType::CpiIndexed => "cpi-indexed",
            FeedType::Custom { .. } => "custom",
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq, InitSpace)]
pub struct FeedEntry {
    #[max_len(12)]
    pub symbol: String,
    pub feed_account: Pubkey,
    pub feed_type: FeedType,
    #[max_len(8)]
    pub base_currency: String,
    #[max_len(8)]
    pub quote_currency: String,
    pub decimals: u8,
    pub active: bool,
    pub registered_at: i64,
    pub registered_by: Pubkey,
}

impl FeedEntry {
    pub fn validate(&self) -> Result<()> {
        require!(
            !self.symbol.is_empty() && self.symbol.len() <= MAX_FEED_SYMBOL_LEN,
            OracleError::SymbolTooLong
        );
        require!(
            self.base_currency.len() <= MAX_CURRENCY_LEN
                && self.quote_currency.len() <= MAX_CURRENCY_LEN,
            OracleError::SymbolTooLong
        );
        if let FeedType::Custom { denominator, .. } = self.feed_type {
            require!(denominator > 0, OracleError::DivisionByZero);
        }
        Ok(())
    }
}

/// Global table of price feeds, shared by every oracle-enabled mint.
#[account]
#[derive(InitSpace)]
pub struct FeedRegistry {
    pub authority: Pubkey,
    #[max_len(64)]
    pub feeds: Vec<FeedEntry>,
    pub bump: u8,
}

impl FeedRegistry {
    pub fn find_active(&self, symbol: &str) -> Option<&FeedEntry> {
        self.feeds
            .iter()
            .find(|feed| feed.active && feed.symbol == symbol)
    }

    pub fn require_feed(&self, symbol: &str) -> Result<&FeedEntry> {
        self.find_active(symbol)
            .ok_or_else(|| error!(OracleError::FeedNotFound))
    }

    /// Stores `entry` in the first inactive slot, or appends while capacity
    /// remains. Returns the slot index.
    pub fn register(&mut self, entry: FeedEntry) -> Result<usize> {
        entry.validate()?;
        require!(
            self.find_active(&entry.symbol).is_none(),
            OracleError::FeedAlreadyRegistered
        );

        if let Some(index) = self.feeds.iter().position(|feed| !feed.active) {
            self.feeds[index] = entry;
            return Ok(index);
        }

        require!(self.feeds.len() < MAX_FEEDS, OracleError::RegistryFull);
        self.feeds.push(entry);
        Ok(self.feeds.len() - 1)
    }

    pub fn deactivate(&mut self, symbol: &str) -> Result<FeedEntry> {
        let feed = self
            .feeds
            .iter_mut()
            .find(|feed| feed.active && feed.symbol == symbol)
            .ok_or(OracleError::FeedNotFound)?;
        feed.active = false;
        Ok(feed.clone())
    }

    pub fn active_feeds(&self) -> impl Iterator<Item = &FeedEntry> {
        self.feeds.iter().filter(|feed| feed.active)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum QuoteDirection {
    Mint,
    Redeem,
}

impl QuoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteDirection::Mint => "mint",
            QuoteDirection::Redeem => "redeem",
        }
    }
}

/// Partial parameter update. `None` leaves a field untouched.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OracleParamsUpdate {
    pub mint_fee_bps: Option<u16>,
    pub redeem_fee_bps: Option<u16>,
    pub max_staleness_secs: Option<i64>,
    pub max_confidence_bps: Option<u16>,
    pub quote_validity_secs: Option<i64>,
    pub cpi_min_update_interval: Option<i64>,
}

pub fn validate_fee_bps(fee_bps: u16) -> Result<()> {
    require!(
        u64::from(fee_bps) <= BPS_DENOMINATOR,
        OracleError::InvalidFeeBps
    );
    Ok(())
}

#[account]
#[derive(InitSpace)]
pub struct OracleConfig {
    pub version: u8,
    pub mint: Pubkey,
    pub authority: Pubkey,
    pub pending_authority: PendingAuthority,
    #[max_len(12)]
    pub feed_symbol: String,
    #[max_len(100)]
    pub description: String,
    pub max_staleness_secs: i64,
    pub mint_fee_bps: u16,
    pub redeem_fee_bps: u16,
    pub max_confidence_bps: u16,
    pub quote_validity_secs: i64,
    /// 1_000_000 = 1.0
    pub cpi_multiplier: u64,
    pub cpi_last_updated: i64,
    pub cpi_min_update_interval: i64,
    #[max_len(50)]
    pub cpi_data_source: String,
    pub paused: bool,
    #[max_len(100)]
    pub pause_reason: String,
    pub total_minted_usd: u64,
    pub total_redeemed_usd: u64,
    /// Mint fees, in token base units.
    pub mint_fees_collected: u64,
    /// Redeem fees, in USD cents.
    pub redeem_fees_collected_usd: u64,
    pub created_at: i64,
    pub last_updated_at: i64,
    pub bump: u8,
}

impl OracleConfig {
    pub fn require_authority(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.authority, OracleError::Unauthorized);
        Ok(())
    }

    pub fn require_active(&self) -> Result<()> {
        require!(!self.paused, OracleError::OraclePaused);
        Ok(())
    }

    pub fn pause(&mut self, reason: String, now: i64) -> Result<()> {
        self.require_active()?;
        require!(
            reason.len() <= MAX_PAUSE_REASON_LEN,
            OracleError::DescriptionTooLong
        );
        self.paused = true;
        self.pause_reason = reason;
        self.last_updated_at = now;
        Ok(())
    }

    pub fn unpause(&mut self, now: i64) -> Result<()> {
        require!(self.paused, OracleError::OracleNotPaused);
        self.paused = false;
        self.pause_reason.clear();
        self.last_updated_at = now;
        Ok(())
    }

    /// Returns the previous multiplier.
    pub fn update_cpi(&mut self, new_multiplier: u64, data_source: String, now: i64) -> Result<u64> {
        require!(new_multiplier > 0, OracleError::InvalidCpiMultiplier);
        require!(
            data_source.len() <= MAX_DATA_SOURCE_LEN,
            OracleError::DescriptionTooLong
        );
        let elapsed = now.saturating_sub(self.cpi_last_updated);
        require!(
            elapsed >= self.cpi_min_update_interval,
            OracleError::CpiUpdateTooSoon
        );

        let old_multiplier = self.cpi_multiplier;
        self.cpi_multiplier = new_multiplier;
        self.cpi_data_source = data_source;
        self.cpi_last_updated = now;
        self.last_updated_at = now;
        Ok(old_multiplier)
    }

    pub fn apply_params(&mut self, update: &OracleParamsUpdate, now: i64) -> Result<()> {
        if let Some(fee_bps) = update.mint_fee_bps {
            validate_fee_bps(fee_bps)?;
        }
        if let Some(fee_bps) = update.redeem_fee_bps {
            validate_fee_bps(fee_bps)?;
        }
        if let Some(fee_bps) = update.max_confidence_bps {
            validate_fee_bps(fee_bps)?;
        }

        if let Some(fee_bps) = update.mint_fee_bps {
            self.mint_fee_bps = fee_bps;
        }
        if let Some(fee_bps) = update.redeem_fee_bps {
            self.redeem_fee_bps = fee_bps;
        }
        if let Some(secs) = update.max_staleness_secs {
            self.max_staleness_secs = secs;
        }
        if let Some(bps) = update.max_confidence_bps {
            self.max_confidence_bps = bps;
        }
        if let Some(secs) = update.quote_validity_secs {
            self.quote_validity_secs = secs;
        }
        if let Some(secs) = update.cpi_min_update_interval {
            self.cpi_min_update_interval = secs;
        }
        self.last_updated_at = now;
        Ok(())
    }

    pub fn fee_bps(&self, direction: QuoteDirection) -> u16 {
        match direction {
            QuoteDirection::Mint => self.mint_fee_bps,
            QuoteDirection::Redeem => self.redeem_fee_bps,
        }
    }

    pub fn quote_valid_until(&self, now: i64) -> Result<i64> {
        now.checked_add(self.quote_validity_secs)
            .ok_or_else(|| error!(OracleError::MathOverflow))
    }

    /// `fee_tokens` is the quote's fee in token base units.
    pub fn record_mint(&mut self, usd_cents: u64, fee_tokens: u64, now: i64) -> Result<()> {
        let total_minted_usd = self
            .total_minted_usd
            .checked_add(usd_cents)
            .ok_or(OracleError::MathOverflow)?;
        let mint_fees_collected = self
            .mint_fees_collected
            .checked_add(fee_tokens)
            .ok_or(OracleError::MathOverflow)?;
        self.total_minted_usd = total_minted_usd;
        self.mint_fees_collected = mint_fees_collected;
        self.last_updated_at = now;
        Ok(())
    }

    /// `fee_usd_cents` is the quote's fee in USD cents.
    pub fn record_redeem(&mut self, gross_usd_cents: u64, fee_usd_cents: u64, now: i64) -> Result<()> {
        let total_redeemed_usd = self
            .total_redeemed_usd
            .checked_add(gross_usd_cents)
            .ok_or(OracleError::MathOverflow)?;
        let redeem_fees_collected_usd = self
            .redeem_fees_collected_usd
            .checked_add(fee_usd_cents)
            .ok_or(OracleError::MathOverflow)?;
        self.total_redeemed_usd = total_redeemed_usd;
        self.redeem_fees_collected_usd = redeem_fees_collected_usd;
        self.last_updated_at = now;
        Ok(())
    }
}

/// A priced request waiting to be executed. Quotes stay on chain after use
/// so a replay finds `used == true`; `close_quote` reclaims the rent of
/// quotes that expired unused.
#[account]
#[derive(InitSpace)]
pub struct PendingQuote {
    pub mint: Pubkey,
    pub requester: Pubkey,
    pub direction: QuoteDirection,
    #[max_len(12)]
    pub feed_symbol: String,
    pub input_amount: u64,
    pub output_amount: u64,
    pub fee_amount: u64,
    pub price_snapshot: u64,
    pub valid_until: i64,
    pub min_output: u64,
    pub used: bool,
    pub created_at: i64,
    pub nonce: u64,
    pub bump: u8,
}

impl PendingQuote {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.valid_until
    }

    /// Only expired, unused quotes close. An executed quote stays as the
    /// record that its nonce was consumed, so the nonce can never be re-quoted.
    pub fn ensure_closable(&self, now: i64) -> Result<()> {
        require!(!self.used, OracleError::QuoteAlreadyUsed);
        require!(self.is_expired(now), OracleError::QuoteStillLive);
        Ok(())
    }

    pub fn consume(&mut self, direction: QuoteDirection, now: i64) -> Result<()> {
        require!(
            self.direction == direction,
            OracleError::QuoteDirectionMismatch
        );
        require!(!self.used, OracleError::QuoteAlreadyUsed);
        require!(!self.is_expired(now), OracleError::QuoteExpired);
        self.used = true;
        Ok(())
    }
}

pub fn validate_description(description: &str) -> Result<()> {
    require!(
        description.len() <= MAX_DESCRIPTION_LEN,
        OracleError::DescriptionTooLong
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed(symbol: &str) -> FeedEntry {
        FeedEntry {
            symbol: symbol.to_string(),
            feed_account: Pubkey::new_unique(),
            feed_type: FeedType::Direct,
            base_currency: "EUR".to_string(),
            quote_currency: "USD".to_string(),
            decimals: 6,
            active: true,
            registered_at: 0,
            registered_by: Pubkey::new_unique(),
        }
    }

    fn create_test_registry() -> FeedRegistry {
        FeedRegistry {
            authority: Pubkey::new_unique(),
            feeds: Vec::new(),
            bump: 255,
        }
    }

    fn create_test_oracle() -> OracleConfig {
        OracleConfig {
            version: 1,
            mint: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            pending_authority: PendingAuthority::default(),
            feed_symbol: "EUR/USD".to_string(),
            description: String::new(),
            max_staleness_secs: 60,
            mint_fee_bps: 30,
            redeem_fee_bps: 50,
            max_confidence_bps: 100,
            quote_validity_secs: 30,
            cpi_multiplier: 1_000_000,
            cpi_last_updated: 1_000,
            cpi_min_update_interval: 86_400,
            cpi_data_source: String::new(),
            paused: false,
            pause_reason: String::new(),
            total_minted_usd: 0,
            total_redeemed_usd: 0,
            mint_fees_collected: 0,
            redeem_fees_collected_usd: 0,
            created_at: 1_000,
            last_updated_at: 1_000,
            bump: 255,
        }
    }

    fn create_test_quote(direction: QuoteDirection, valid_until: i64) -> PendingQuote {
        PendingQuote {
            mint: Pubkey::new_unique(),
            requester: Pubkey::new_unique(),
            direction,
            feed_symbol: "EUR/USD".to_string(),
            input_amount: 10_800,
            output_amount: 99_700_000,
            fee_amount: 300_000,
            price_snapshot: 1_080_000,
            valid_until,
            min_output: 0,
            used: false,
            created_at: valid_until - 30,
            nonce: 7,
            bump: 255,
        }
    }

    #[test]
    fn test_register_rejects_duplicate_active_symbol() {
        let mut registry = create_test_registry();
        registry.register(feed("EUR/USD")).unwrap();
        assert_eq!(
            registry.register(feed("EUR/USD")).unwrap_err(),
            OracleError::FeedAlreadyRegistered.into()
        );
    }

    #[test]
    fn test_register_validates_symbol() {
        let mut registry = create_test_registry();
        assert_eq!(
            registry.register(feed("ABCDEFGHIJKLM")).unwrap_err(),
            OracleError::SymbolTooLong.into()
        );
        assert_eq!(
            registry.register(feed("")).unwrap_err(),
            OracleError::SymbolTooLong.into()
        );
    }

    #[test]
    fn test_deactivated_slot_is_reused() {
        let mut registry = create_test_registry();
        registry.register(feed("EUR/USD")).unwrap();
        registry.register(feed("USD/BRL")).unwrap();

        let removed = registry.deactivate("EUR/USD").unwrap();
        assert!(!removed.active);
        assert!(registry.find_active("EUR/USD").is_none());

        let slot = registry.register(feed("USD/MXN")).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(registry.feeds.len(), 2);

        let symbols: Vec<&str> = registry
            .active_feeds()
            .map(|feed| feed.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["USD/MXN", "USD/BRL"]);
    }

    #[test]
    fn test_deactivate_unknown_feed() {
        let mut registry = create_test_registry();
        assert_eq!(
            registry.deactivate("EUR/USD").unwrap_err(),
            OracleError::FeedNotFound.into()
        );
        assert_eq!(
            registry.require_feed("EUR/USD").unwrap_err(),
            OracleError::FeedNotFound.into()
        );
    }

    #[test]
    fn test_registry_full() {
        let mut registry = create_test_registry();
        for i in 0..MAX_FEEDS {
            registry.register(feed(&format!("F{i}"))).unwrap();
        }
        assert_eq!(
            registry.register(feed("EXTRA")).unwrap_err(),
            OracleError::RegistryFull.into()
        );

        registry.deactivate("F10").unwrap();
        assert_eq!(registry.register(feed("EXTRA")).unwrap(), 10);
    }

    #[test]
    fn test_custom_feed_requires_denominator() {
        let mut registry = create_test_registry();
        let mut entry = feed("XAU/USD");
        entry.feed_type = FeedType::Custom {
            numerator: 1,
            denominator: 0,
            base_type: 0,
        };
        assert_eq!(
            registry.register(entry).unwrap_err(),
            OracleError::DivisionByZero.into()
        );
    }

    #[test]
    fn test_oracle_pause_transitions() {
        let mut oracle = create_test_oracle();
        assert_eq!(
            oracle.unpause(2_000).unwrap_err(),
            OracleError::OracleNotPaused.into()
        );

        oracle.pause("feed outage".to_string(), 2_000).unwrap();
        assert!(oracle.paused);
        assert_eq!(
            oracle.require_active().unwrap_err(),
            OracleError::OraclePaused.into()
        );
        assert_eq!(
            oracle.pause("again".to_string(), 2_001).unwrap_err(),
            OracleError::OraclePaused.into()
        );

        oracle.unpause(2_002).unwrap();
        assert!(!oracle.paused);
        assert!(oracle.pause_reason.is_empty());
    }

    #[test]
    fn test_cpi_update_interval() {
        let mut oracle = create_test_oracle();
        assert_eq!(
            oracle
                .update_cpi(1_010_000, "BLS".to_string(), 1_000 + 86_399)
                .unwrap_err(),
            OracleError::CpiUpdateTooSoon.into()
        );

        let old = oracle
            .update_cpi(1_010_000, "BLS".to_string(), 1_000 + 86_400)
            .unwrap();
        assert_eq!(old, 1_000_000);
        assert_eq!(oracle.cpi_multiplier, 1_010_000);
        assert_eq!(oracle.cpi_last_updated, 87_400);

        assert_eq!(
            oracle
                .update_cpi(0, "BLS".to_string(), 1_000_000)
                .unwrap_err(),
            OracleError::InvalidCpiMultiplier.into()
        );
    }

    #[test]
    fn test_params_update_is_all_or_nothing() {
        let mut oracle = create_test_oracle();
        let update = OracleParamsUpdate {
            mint_fee_bps: Some(10),
            redeem_fee_bps: Some(10_001),
            ..Default::default()
        };
        assert_eq!(
            oracle.apply_params(&update, 2_000).unwrap_err(),
            OracleError::InvalidFeeBps.into()
        );
        assert_eq!(oracle.mint_fee_bps, 30);

        let update = OracleParamsUpdate {
            mint_fee_bps: Some(10),
            quote_validity_secs: Some(120),
            ..Default::default()
        };
        oracle.apply_params(&update, 2_000).unwrap();
        assert_eq!(oracle.mint_fee_bps, 10);
        assert_eq!(oracle.redeem_fee_bps, 50);
        assert_eq!(oracle.quote_validity_secs, 120);
        assert_eq!(oracle.fee_bps(QuoteDirection::Redeem), 50);
    }

    #[test]
    fn test_oracle_authority_check() {
        let oracle = create_test_oracle();
        assert!(oracle.require_authority(&oracle.authority).is_ok());
        assert_eq!(
            oracle.require_authority(&Pubkey::new_unique()).unwrap_err(),
            OracleError::Unauthorized.into()
        );
    }

    #[test]
    fn test_quote_executes_once() {
        let mut quote = create_test_quote(QuoteDirection::Mint, 2_000);
        quote.consume(QuoteDirection::Mint, 2_000).unwrap();
        assert!(quote.used);
        assert_eq!(
            quote.consume(QuoteDirection::Mint, 2_000).unwrap_err(),
            OracleError::QuoteAlreadyUsed.into()
        );
    }

    #[test]
    fn test_used_quote_never_closes() {
        let mut quote = create_test_quote(QuoteDirection::Mint, 2_000);
        quote.consume(QuoteDirection::Mint, 1_990).unwrap();
        for now in [1_995, 2_000, 2_001, 1_000_000] {
            assert_eq!(
                quote.ensure_closable(now).unwrap_err(),
                OracleError::QuoteAlreadyUsed.into()
            );
        }
    }

    #[test]
    fn test_quote_expiry_boundary() {
        let mut quote = create_test_quote(QuoteDirection::Redeem, 2_000);
        assert_eq!(
            quote.ensure_closable(2_000).unwrap_err(),
            OracleError::QuoteStillLive.into()
        );
        assert_eq!(
            quote.consume(QuoteDirection::Redeem, 2_001).unwrap_err(),
            OracleError::QuoteExpired.into()
        );
        assert!(!quote.used);
        assert!(quote.ensure_closable(2_001).is_ok());
    }

    #[test]
    fn test_quote_direction_mismatch() {
        let mut quote = create_test_quote(QuoteDirection::Redeem, 2_000);
        assert_eq!(
            quote.consume(QuoteDirection::Mint, 1_990).unwrap_err(),
            OracleError::QuoteDirectionMismatch.into()
        );
    }

    #[test]
    fn test_usd_counters() {
        let mut oracle = create_test_oracle();
        oracle.record_mint(10_800, 300_000, 2_000).unwrap();
        oracle.record_redeem(10_000, 30, 2_001).unwrap();
        assert_eq!(oracle.total_minted_usd, 10_800);
        assert_eq!(oracle.total_redeemed_usd, 10_000);
        assert_eq!(oracle.mint_fees_collected, 300_000);
        assert_eq!(oracle.redeem_fees_collected_usd, 30);

        oracle.mint_fees_collected = u64::MAX;
        assert_eq!(
            oracle.record_mint(1, 1, 2_002).unwrap_err(),
            OracleError::MathOverflow.into()
        );
        assert_eq!(oracle.total_minted_usd, 10_800);
    }

    #[test]
    fn test_fee_counters_keep_their_units() {
        // $100 minted at 1.0 with 30 bps, then the net tokens redeemed.
        let mut oracle = create_test_oracle();
        oracle.record_mint(10_000, 300_000, 2_000).unwrap();
        oracle.record_redeem(9_970, 29, 2_010).unwrap();
        assert_eq!(oracle.mint_fees_collected, 300_000);
        assert_eq!(oracle.redeem_fees_collected_usd, 29);

        oracle.record_redeem(100, 1, 2_020).unwrap();
        assert_eq!(oracle.mint_fees_collected, 300_000);
        assert_eq!(oracle.redeem_fees_collected_usd, 30);
    }

    proptest! {
        #[test]
        fn prop_quote_consumed_at_most_once(
            valid_until in 0i64..1_000_000,
            attempts in proptest::collection::vec(0i64..1_000_000, 1..20),
        ) {
            let mut quote = create_test_quote(QuoteDirection::Mint, valid_until);
            let successes = attempts
                .iter()
                .filter(|&&now| quote.consume(QuoteDirection::Mint, now).is_ok())
                .count();
            prop_assert!(successes <= 1);
            prop_assert_eq!(successes == 1, quote.used);
        }
    }
}
