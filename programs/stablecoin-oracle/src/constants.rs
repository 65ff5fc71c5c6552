pub const REGISTRY_SEED: &[u8] = b"sss-feed-registry";
pub const ORACLE_SEED: &[u8] = b"sss-oracle";
pub const QUOTE_SEED: &[u8] = b"sss-quote";

pub const ORACLE_VERSION: u8 = 1;

pub const MAX_FEEDS: usize = 64;
pub const MAX_FEED_SYMBOL_LEN: usize = 12;
pub const MAX_CURRENCY_LEN: usize = 8;
pub const MAX_DESCRIPTION_LEN: usize = 100;
pub const MAX_PAUSE_REASON_LEN: usize = 100;
pub const MAX_DATA_SOURCE_LEN: usize = 50;

pub const BPS_DENOMINATOR: u64 = 10_000;
