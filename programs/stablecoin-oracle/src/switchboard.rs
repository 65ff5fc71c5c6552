//! Raw reader for Switchboard V2 aggregator accounts.
//!
//! Only the `latest_confirmed_round` fields needed for pricing are decoded,
//! straight from account data, so the program does not depend on the
//! Switchboard crates.

use anchor_lang::prelude::*;

use crate::errors::OracleError;

/// Smallest aggregator account that still holds a full confirmed round.
pub const MIN_AGGREGATOR_LEN: usize = 500;

const ROUND_OFFSET: usize = 208;
const ROUND_OPEN_TIMESTAMP: usize = ROUND_OFFSET + 17;
const ROUND_RESULT: usize = ROUND_OFFSET + 25;
const ROUND_STD_DEVIATION: usize = ROUND_OFFSET + 45;

/// Decimal precision of [`crate::math::PRICE_SCALE`].
const PRICE_DECIMALS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchboardPrice {
    /// Result rescaled to [`crate::math::PRICE_SCALE`].
    pub price: i128,
    /// Standard deviation rescaled to [`crate::math::PRICE_SCALE`].
    pub std_dev: u64,
    pub published_at: i64,
}

impl SwitchboardPrice {
    /// Price as a positive `u64`, rejecting zero and negative results.
    pub fn positive_price(&self) -> Result<u64> {
        require!(self.price > 0, OracleError::InvalidPrice);
        u64::try_from(self.price).map_err(|_| error!(OracleError::MathOverflow))
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| error!(OracleError::FeedNotReady))
}

/// Switchboard decimal: i128 mantissa followed by a u32 scale.
fn read_decimal(data: &[u8], offset: usize) -> Result<i128> {
    let mantissa = i128::from_le_bytes(read_array::<16>(data, offset)?);
    let scale = u32::from_le_bytes(read_array::<4>(data, offset + 16)?);
    rescale(mantissa, scale)
}

fn rescale(mantissa: i128, scale: u32) -> Result<i128> {
    if scale > PRICE_DECIMALS {
        let divisor = 10i128
            .checked_pow(scale - PRICE_DECIMALS)
            .ok_or(OracleError::FeedNotReady)?;
        Ok(mantissa / divisor)
    } else {
        let factor = 10i128
            .checked_pow(PRICE_DECIMALS - scale)
            .ok_or(OracleError::FeedNotReady)?;
        mantissa
            .checked_mul(factor)
            .ok_or_else(|| error!(OracleError::FeedNotReady))
    }
}

pub fn read_price(data: &[u8]) -> Result<SwitchboardPrice> {
    require!(data.len() >= MIN_AGGREGATOR_LEN, OracleError::FeedNotReady);

    let published_at = i64::from_le_bytes(read_array::<8>(data, ROUND_OPEN_TIMESTAMP)?);
    let price = read_decimal(data, ROUND_RESULT)?;
    let std_dev = read_decimal(data, ROUND_STD_DEVIATION)?.unsigned_abs();

    Ok(SwitchboardPrice {
        price,
        std_dev: u64::try_from(std_dev).map_err(|_| error!(OracleError::FeedNotReady))?,
        published_at,
    })
}

/// Reads the aggregator behind `feed`.
pub fn load_price(feed: &AccountInfo) -> Result<SwitchboardPrice> {
    let data = feed
        .try_borrow_data()
        .map_err(|_| error!(OracleError::FeedNotReady))?;
    read_price(&data)
}
