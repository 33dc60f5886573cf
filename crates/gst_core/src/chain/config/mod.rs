//! Chain-wide resource constants. Windows are expressed in milliseconds and
//! divided down to block intervals where a period count is needed.

pub const RATE_LIMITING_PRECISION: u64 = 1000 * 1000;

pub const BLOCK_INTERVAL_MS: u32 = 500;

pub const PERCENT_100: u64 = 10000; // basis points (10000 = 100%)
pub const PERCENT_1: u64 = 100; // basis points (100 = 1%)

pub const ACCOUNT_CPU_USAGE_AVERAGE_WINDOW_MS: u32 = 24 * 60 * 60 * 1000;
pub const ACCOUNT_NET_USAGE_AVERAGE_WINDOW_MS: u32 = 24 * 60 * 60 * 1000;
pub const BLOCK_CPU_USAGE_AVERAGE_WINDOW_MS: u32 = 60 * 1000;
pub const BLOCK_SIZE_AVERAGE_WINDOW_MS: u32 = 60 * 1000;
pub const MAXIMUM_ELASTIC_RESOURCE_MULTIPLIER: u32 = 1000;

pub const DEFAULT_MAX_BLOCK_NET_USAGE: u32 = 1024 * 1024;
pub const DEFAULT_TARGET_BLOCK_NET_USAGE_PCT: u32 = 10 * PERCENT_1 as u32; // 10%

pub const DEFAULT_MAX_BLOCK_CPU_USAGE: u32 = 200_000;
pub const DEFAULT_TARGET_BLOCK_CPU_USAGE_PCT: u32 = 10 * PERCENT_1 as u32; // 10%

/// Flat gas charge, in bytes, billed to the paying account once per
/// transaction. TODO: promote to a governance-settable config row field.
pub const GAS_TRANSACTION_TOLL: u64 = 100;

pub const fn gst_percent(value: u64, percentage: u32) -> u64 {
    (value * percentage as u64) / PERCENT_100
}
