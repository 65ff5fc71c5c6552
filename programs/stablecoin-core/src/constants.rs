pub const CONFIG_SEED: &[u8] = b"sss-config";
pub const MINTER_SEED: &[u8] = b"sss-minter";
pub const BLACKLIST_SEED: &[u8] = b"sss-blacklist";
pub const SEIZURE_SEED: &[u8] = b"sss-seizure";

pub const CONFIG_VERSION: u8 = 1;

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_URI_LEN: usize = 200;
pub const MAX_REASON_LEN: usize = 128;
