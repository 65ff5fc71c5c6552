use anchor_lang::prelude::*;

use crate::constants::BPS_DENOMINATOR;
use crate::errors::OracleError;
use crate::state::{FeedType, QuoteDirection};

/// 1_000_000 = 1.0
pub const PRICE_SCALE: u64 = 1_000_000;
/// 1_000_000 = 1.0
pub const CPI_SCALE: u64 = 1_000_000;
/// Base units per whole token at 6 decimals.
pub const TOKEN_SCALE: u64 = 1_000_000;

const CENTS_PER_DOLLAR: u64 = 100;

/// floor(product(factors) / product(divisors)) with u128 intermediates.
fn mul_div(factors: &[u64], divisors: &[u64]) -> Result<u64> {
    let numerator = factors
        .iter()
        .try_fold(1u128, |acc, &factor| acc.checked_mul(factor as u128))
        .ok_or(OracleError::MathOverflow)?;
    let denominator = divisors
        .iter()
        .try_fold(1u128, |acc, &divisor| acc.checked_mul(divisor as u128))
        .ok_or(OracleError::MathOverflow)?;
    require!(denominator > 0, OracleError::DivisionByZero);
    u64::try_from(numerator / denominator).map_err(|_| error!(OracleError::MathOverflow))
}

/// Resolves a `Custom` feed to the base feed type and the adjusted price
/// that base type should see.
fn resolve_custom(feed_type: &FeedType, price: u64) -> Result<(FeedType, u64)> {
    match *feed_type {
        FeedType::Custom {
            numerator,
            denominator,
            base_type,
        } => {
            let adjusted = mul_div(&[price, numerator], &[denominator])?;
            let base = match base_type {
                0 => FeedType::Direct,
                1 => FeedType::Inverse,
                _ => return err!(OracleError::InvalidPrice),
            };
            Ok((base, adjusted))
        }
        other => Ok((other, price)),
    }
}

/// Token base units bought by `usd_cents`.
///
/// * `Direct`: price is USD per token.
/// * `Inverse`: price is tokens per USD.
/// * `CpiIndexed`: the live price is ignored in favour of `cpi_multiplier`.
/// * `Custom`: price is rescaled by numerator/denominator, then treated as
///   Direct (`base_type` 0) or Inverse (`base_type` 1).
pub fn tokens_for_usd(
    usd_cents: u64,
    price: u64,
    feed_type: &FeedType,
    cpi_multiplier: u64,
) -> Result<u64> {
    let (feed_type, price) = resolve_custom(feed_type, price)?;
    match feed_type {
        FeedType::Direct => {
            require!(price > 0, OracleError::InvalidPrice);
            mul_div(
                &[usd_cents, TOKEN_SCALE, PRICE_SCALE],
                &[price, CENTS_PER_DOLLAR],
            )
        }
        FeedType::Inverse => {
            require!(price > 0, OracleError::InvalidPrice);
            mul_div(
                &[usd_cents, price, TOKEN_SCALE],
                &[PRICE_SCALE, CENTS_PER_DOLLAR],
            )
        }
        FeedType::CpiIndexed => {
            require!(cpi_multiplier > 0, OracleError::InvalidCpiMultiplier);
            mul_div(
                &[usd_cents, TOKEN_SCALE, CPI_SCALE],
                &[cpi_multiplier, CENTS_PER_DOLLAR],
            )
        }
        FeedType::Custom { .. } => err!(OracleError::InvalidPrice),
    }
}

/// USD cents returned for `token_amount`. Inverse of [`tokens_for_usd`].
pub fn usd_for_tokens(
    token_amount: u64,
    price: u64,
    feed_type: &FeedType,
    cpi_multiplier: u64,
) -> Result<u64> {
    let (feed_type, price) = resolve_custom(feed_type, price)?;
    match feed_type {
        FeedType::Direct => {
            require!(price > 0, OracleError::InvalidPrice);
            mul_div(
                &[token_amount, price, CENTS_PER_DOLLAR],
                &[TOKEN_SCALE, PRICE_SCALE],
            )
        }
        FeedType::Inverse => {
            require!(price > 0, OracleError::InvalidPrice);
            mul_div(
                &[token_amount, PRICE_SCALE, CENTS_PER_DOLLAR],
                &[TOKEN_SCALE, price],
            )
        }
        FeedType::CpiIndexed => {
            require!(cpi_multiplier > 0, OracleError::InvalidCpiMultiplier);
            mul_div(
                &[token_amount, cpi_multiplier, CENTS_PER_DOLLAR],
                &[TOKEN_SCALE, CPI_SCALE],
            )
        }
        FeedType::Custom { .. } => err!(OracleError::InvalidPrice),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteAmounts {
    pub gross: u64,
    pub fee: u64,
    pub net: u64,
}

/// fee = floor(gross * fee_bps / 10000), net = gross - fee.
pub fn apply_fee(gross: u64, fee_bps: u16) -> Result<QuoteAmounts> {
    require!(
        u64::from(fee_bps) <= BPS_DENOMINATOR,
        OracleError::InvalidFeeBps
    );
    let fee = mul_div(&[gross, u64::from(fee_bps)], &[BPS_DENOMINATOR])?;
    let net = gross.checked_sub(fee).ok_or(OracleError::MathOverflow)?;
    Ok(QuoteAmounts { gross, fee, net })
}

/// Gross output for `direction`, then the fee split. A zero gross output is
/// rejected so dust inputs cannot produce empty quotes.
pub fn compute_quote(
    direction: QuoteDirection,
    input_amount: u64,
    price: u64,
    feed_type: &FeedType,
    cpi_multiplier: u64,
    fee_bps: u16,
) -> Result<QuoteAmounts> {
    require!(input_amount > 0, OracleError::ZeroAmount);
    let gross = match direction {
        QuoteDirection::Mint => tokens_for_usd(input_amount, price, feed_type, cpi_multiplier)?,
        QuoteDirection::Redeem => usd_for_tokens(input_amount, price, feed_type, cpi_multiplier)?,
    };
    require!(gross > 0, OracleError::ZeroOutput);
    apply_fee(gross, fee_bps)
}

pub fn check_staleness(now: i64, published_at: i64, max_staleness_secs: i64) -> Result<()> {
    require!(
        now.saturating_sub(published_at) <= max_staleness_secs,
        OracleError::PriceTooStale
    );
    Ok(())
}

/// Confidence as a share of price, in bps. Zero `max_confidence_bps`
/// disables the check.
pub fn check_confidence(price: u64, std_dev: u64, max_confidence_bps: u16) -> Result<()> {
    if max_confidence_bps == 0 {
        return Ok(());
    }
    require!(price > 0, OracleError::InvalidPrice);
    let confidence_bps = mul_div(&[std_dev, BPS_DENOMINATOR], &[price])?;
    require!(
        confidence_bps <= u64::from(max_confidence_bps),
        OracleError::ConfidenceTooWide
    );
    Ok(())
}

pub fn check_slippage(net: u64, min_output: u64) -> Result<()> {
    require!(net >= min_output, OracleError::SlippageExceeded);
    Ok(())
}

/// Off-chain preview of a quote, computed with the same functions the
/// program uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteSimulation {
    pub gross: u64,
    pub fee: u64,
    pub net: u64,
    pub price_human: f64,
}

impl QuoteSimulation {
    fn new(amounts: QuoteAmounts, price: u64) -> Self {
        Self {
            gross: amounts.gross,
            fee: amounts.fee,
            net: amounts.net,
            price_human: price as f64 / PRICE_SCALE as f64,
        }
    }
}

pub fn simulate_mint_quote(
    usd_cents: u64,
    price: u64,
    feed_type: &FeedType,
    cpi_multiplier: u64,
    fee_bps: u16,
) -> Result<QuoteSimulation> {
    let amounts = compute_quote(
        QuoteDirection::Mint,
        usd_cents,
        price,
        feed_type,
        cpi_multiplier,
        fee_bps,
    )?;
    Ok(QuoteSimulation::new(amounts, price))
}

pub fn simulate_redeem_quote(
    token_amount: u64,
    price: u64,
    feed_type: &FeedType,
    cpi_multiplier: u64,
    fee_bps: u16,
) -> Result<QuoteSimulation> {
    let amounts = compute_quote(
        QuoteDirection::Redeem,
        token_amount,
        price,
        feed_type,
        cpi_multiplier,
        fee_bps,
    )?;
    Ok(QuoteSimulation::new(amounts, price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_direct_mint_eur_usd() {
        // EUR/USD 1.08: $108.00 buys 100 tokens, 30 bps fee
        let sim = simulate_mint_quote(10_800, 1_080_000, &FeedType::Direct, 0, 30).unwrap();
        assert_eq!(sim.gross, 100_000_000);
        assert_eq!(sim.fee, 300_000);
        assert_eq!(sim.net, 99_700_000);
        assert!((sim.price_human - 1.08).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_mint_brl() {
        // USD/BRL 5.72: $100.00 buys 572 tokens, 50 bps fee
        let sim = simulate_mint_quote(10_000, 5_720_000, &FeedType::Inverse, 0, 50).unwrap();
        assert_eq!(sim.gross, 572_000_000);
        assert_eq!(sim.fee, 2_860_000);
        assert_eq!(sim.net, 569_140_000);
    }

    #[test]
    fn test_cpi_indexed_ignores_live_price() {
        let sim = simulate_mint_quote(10_830, 0, &FeedType::CpiIndexed, 1_083_000, 0).unwrap();
        assert_eq!(sim.gross, 100_000_000);
        assert_eq!(sim.net, 100_000_000);
        assert_eq!(sim.fee, 0);
    }

    #[test]
    fn test_inverse_redeem_brl() {
        let sim =
            simulate_redeem_quote(572_000_000, 5_720_000, &FeedType::Inverse, 0, 30).unwrap();
        assert_eq!(sim.gross, 10_000);
        assert_eq!(sim.fee, 30);
        assert_eq!(sim.net, 9_970);
    }

    #[test]
    fn test_custom_feed_rescales_price() {
        // Half of a 2.16 price is 1.08, treated as Direct.
        let custom = FeedType::Custom {
            numerator: 1,
            denominator: 2,
            base_type: 0,
        };
        assert_eq!(
            tokens_for_usd(10_800, 2_160_000, &custom, 0).unwrap(),
            100_000_000
        );

        let custom_inverse = FeedType::Custom {
            numerator: 2,
            denominator: 1,
            base_type: 1,
        };
        assert_eq!(
            tokens_for_usd(10_000, 2_860_000, &custom_inverse, 0).unwrap(),
            572_000_000
        );
    }

    #[test]
    fn test_custom_feed_zero_denominator() {
        let custom = FeedType::Custom {
            numerator: 1,
            denominator: 0,
            base_type: 0,
        };
        assert_eq!(
            tokens_for_usd(100, 1_000_000, &custom, 0).unwrap_err(),
            OracleError::DivisionByZero.into()
        );
    }

    #[test]
    fn test_custom_feed_unknown_base_type() {
        let custom = FeedType::Custom {
            numerator: 1,
            denominator: 1,
            base_type: 7,
        };
        assert_eq!(
            tokens_for_usd(100, 1_000_000, &custom, 0).unwrap_err(),
            OracleError::InvalidPrice.into()
        );
    }

    #[test]
    fn test_zero_price_rejected() {
        assert_eq!(
            tokens_for_usd(100, 0, &FeedType::Direct, 0).unwrap_err(),
            OracleError::InvalidPrice.into()
        );
        assert_eq!(
            usd_for_tokens(100, 0, &FeedType::Inverse, 0).unwrap_err(),
            OracleError::InvalidPrice.into()
        );
        assert_eq!(
            tokens_for_usd(100, 1, &FeedType::CpiIndexed, 0).unwrap_err(),
            OracleError::InvalidCpiMultiplier.into()
        );
    }

    #[test]
    fn test_dust_input_yields_zero_output() {
        // 1 base unit redeemed at 1.0 is worth less than a cent.
        assert_eq!(
            compute_quote(
                QuoteDirection::Redeem,
                1,
                1_000_000,
                &FeedType::Direct,
                0,
                0
            )
            .unwrap_err(),
            OracleError::ZeroOutput.into()
        );
        assert_eq!(
            compute_quote(QuoteDirection::Mint, 0, 1_000_000, &FeedType::Direct, 0, 0)
                .unwrap_err(),
            OracleError::ZeroAmount.into()
        );
    }

    #[test]
    fn test_fee_rounds_down() {
        let amounts = apply_fee(333, 30).unwrap();
        assert_eq!(amounts.fee, 0);
        assert_eq!(amounts.net, 333);

        let amounts = apply_fee(10_000, 10_000).unwrap();
        assert_eq!(amounts.fee, 10_000);
        assert_eq!(amounts.net, 0);

        assert_eq!(
            apply_fee(1, 10_001).unwrap_err(),
            OracleError::InvalidFeeBps.into()
        );
    }

    #[test]
    fn test_staleness_boundary() {
        assert!(check_staleness(1_000, 940, 60).is_ok());
        assert_eq!(
            check_staleness(1_000, 939, 60).unwrap_err(),
            OracleError::PriceTooStale.into()
        );
    }

    #[test]
    fn test_confidence_check() {
        // 0.5% spread on a 1.0 price
        assert!(check_confidence(1_000_000, 5_000, 50).is_ok());
        assert_eq!(
            check_confidence(1_000_000, 5_100, 50).unwrap_err(),
            OracleError::ConfidenceTooWide.into()
        );
        assert!(check_confidence(1_000_000, 900_000, 0).is_ok());
    }

    #[test]
    fn test_slippage_floor() {
        assert!(check_slippage(100, 100).is_ok());
        assert_eq!(
            check_slippage(99, 100).unwrap_err(),
            OracleError::SlippageExceeded.into()
        );
    }

    proptest! {
        #[test]
        fn prop_direct_round_trip_loses_at_most_one_cent(
            usd_cents in 1u64..1_000_000_000_000,
            price in 1u64..1_000_000_000,
        ) {
            let tokens = tokens_for_usd(usd_cents, price, &FeedType::Direct, 0).unwrap();
            let back = usd_for_tokens(tokens, price, &FeedType::Direct, 0).unwrap();
            prop_assert!(back <= usd_cents);
            prop_assert!(usd_cents - back <= 1);
        }

        #[test]
        fn prop_inverse_round_trip_loses_at_most_one_cent(
            usd_cents in 1u64..1_000_000_000_000,
            price in 1_000u64..1_000_000_000,
        ) {
            let tokens = tokens_for_usd(usd_cents, price, &FeedType::Inverse, 0).unwrap();
            let back = usd_for_tokens(tokens, price, &FeedType::Inverse, 0).unwrap();
            prop_assert!(back <= usd_cents);
            prop_assert!(usd_cents - back <= 1);
        }

        #[test]
        fn prop_fee_never_exceeds_gross(gross in any::<u64>(), fee_bps in 0u16..=10_000) {
            let amounts = apply_fee(gross, fee_bps).unwrap();
            prop_assert_eq!(amounts.fee + amounts.net, gross);
            prop_assert!(amounts.fee <= gross);
        }
    }
}
