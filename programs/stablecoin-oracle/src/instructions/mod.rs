pub mod cpi_multiplier;
pub mod execute;
pub mod oracle_config;
pub mod quotes;
pub mod registry;

pub use cpi_multiplier::*;
pub use execute::*;
pub use oracle_config::*;
pub use quotes::*;
pub use registry::*;
