pub const BPS_DENOMINATOR: u16 = 10_000;

/// Decimals assumed for the non-stable side when `decimals()` cannot be read.
pub const DEFAULT_ASSET_DECIMALS: u8 = 18;
/// Decimals assumed for the stable side when `decimals()` cannot be read.
pub const DEFAULT_STABLE_DECIMALS: u8 = 6;
/// Fee applied to vault-shaped sources, which expose no fee accessor.
pub const DEFAULT_FEE_BPS: u16 = 30;

/// Never allocate more than this share of a pool's input-side reserve.
/// Also the ceiling for a configured cap: no entry may take more than half a reserve.
pub const DEFAULT_UTILIZATION_CAP_BPS: u16 = 5_000;
pub const DEFAULT_MAX_REMOTE_POOLS: usize = 8;

/// A constant-product quote below this percentage of the linear estimate is suspicious.
pub const SANITY_MIN_PERCENT_OF_LINEAR: u64 = 1;

pub const SYNTHETIC_ASSET_UNITS: u64 = 1_000;
pub const SYNTHETIC_STABLE_UNITS: u64 = 1_000;

pub const MAX_TOKEN_DECIMALS: u8 = 36;

pub const DEFAULT_STABLE_SYMBOL: &str = "USDC";

/// Hard ceiling on `max_remote_pools`; enumeration is exponential in it.
pub const MAX_REMOTE_POOLS_LIMIT: usize = 16;
