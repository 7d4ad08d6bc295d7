//! Constants Module - Single Source of Truth
//!
//! Chain metadata, protocol/reputation address tables and numeric
//! thresholds shared across the engine. No other module hardcodes addresses.

use alloy_primitives::utils::format_ether;
use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use std::str::FromStr;

// ============================================
// APPLICATION CONSTANTS
// ============================================

pub const APP_NAME: &str = "TxSentinel";

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound oracle requests
pub const USER_AGENT: &str = "TxSentinel/0.1.0";

// ============================================
// ENGINE DEFAULTS
// ============================================

/// 1 native unit
pub const DEFAULT_HIGH_VALUE_WEI: u128 = 1_000_000_000_000_000_000;

/// 10 native units
pub const DEFAULT_MEV_VALUE_WEI: u128 = 10_000_000_000_000_000_000;

pub const DEFAULT_FACTOR_TIMEOUT_MS: u64 = 3_000;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Unknown selector payload above this many bytes: Medium complexity/risk
pub const MEDIUM_PAYLOAD_BYTES: usize = 200;

/// Unknown selector payload above this many bytes: Complex / High risk
pub const COMPLEX_PAYLOAD_BYTES: usize = 1_000;

/// 10^9 whole tokens at 18 decimals, practical-infinity approval sentinel
pub const PRACTICAL_UNLIMITED_WEI: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Example bounded approval offered as replacement (1,000 tokens at 18 decimals)
pub const SUGGESTED_APPROVAL_WEI: u128 = 1_000_000_000_000_000_000_000;

/// Slippage attached to swap recommendations (basis points, 100 = 1%)
pub const SUGGESTED_SLIPPAGE_BPS: u64 = 100;

// ============================================
// CHAIN IDS
// ============================================

pub const CHAIN_ID_ETHEREUM: u64 = 1;
pub const CHAIN_ID_BSC: u64 = 56;
pub const CHAIN_ID_POLYGON: u64 = 137;
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
pub const CHAIN_ID_OPTIMISM: u64 = 10;
pub const CHAIN_ID_AVALANCHE: u64 = 43114;
pub const CHAIN_ID_BASE: u64 = 8453;

/// Get chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_BSC => "BNB Smart Chain",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_AVALANCHE => "Avalanche C-Chain",
        CHAIN_ID_BASE => "Base",
        _ => "Unknown",
    }
}

/// Get native token symbol
pub fn get_native_symbol(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_BSC => "BNB",
        CHAIN_ID_POLYGON => "MATIC",
        CHAIN_ID_AVALANCHE => "AVAX",
        _ => "ETH",
    }
}

/// Average block time used to turn block distances into ages
pub fn get_block_time_secs(chain_id: u64) -> u64 {
    match chain_id {
        CHAIN_ID_BSC => 3,
        CHAIN_ID_POLYGON | CHAIN_ID_OPTIMISM | CHAIN_ID_AVALANCHE | CHAIN_ID_BASE => 2,
        CHAIN_ID_ARBITRUM => 1,
        _ => 12,
    }
}

// ============================================
// PROTOCOL ADDRESSES
// ============================================

const PROTOCOLS: &[(&str, &str)] = &[
    ("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D", "Uniswap V2"),
    ("0xE592427A0AEce92De3Edee1F18E0157C05861564", "Uniswap V3"),
    ("0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45", "Uniswap V3"),
    ("0x3fC91A3afd70395Cd496C647d5a6CC9D4B2b7FAD", "Uniswap Universal Router"),
    ("0xC36442b4a4522E871399CD717aBDD847Ab11FE88", "Uniswap V3 Positions"),
    ("0xd9e1cE17f2641f24aE83637ab66a2cca9C378B9F", "SushiSwap"),
    ("0x1111111254EEB25477B68fb85Ed929f73A960582", "1inch"),
    ("0xEfF92A263d31888d860bD50809A8D171709b7b1c", "PancakeSwap"),
    ("0x10ED43C718714eb63d5aA57B78B54704E256024E", "PancakeSwap V2"),
    ("0x7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9", "Aave V2"),
    ("0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2", "Aave V3"),
    ("0x3d9819210A31b4961b30EF54bE2aeD79B9c9Cd3B", "Compound"),
    ("0x00000000000000ADc04C56Bf30aC9d3c0aAF14dC", "OpenSea Seaport"),
];

// ============================================
// REPUTATION LISTS
// ============================================

/// Addresses publicly attributed to exploits and drainers
pub const KNOWN_SCAM_ADDRESSES: &[&str] = &[
    "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
    "0x0d043128146654c7683fbf30ac98d7b2285ded00",
    "0xb66cd966670d962c227b3eaba30a872dbfb995db",
];

/// Mixers and sanctioned-adjacent contracts
pub const KNOWN_SUSPICIOUS_ADDRESSES: &[&str] = &[
    "0xd90e2f925da726b50c4ed8d0fb90ad053324f31b",
    "0x12d66f87a04a9e220743712ce6d9bb1b5616b8fc",
    "0x47ce0c6ed5b0ce3d3a51fdb1c52dc66a7c3c2936",
];

/// Well-known tokens, routers and lending pools
pub const KNOWN_UTILITY_ADDRESSES: &[&str] = &[
    "0x7a250d5630b4cf539739df2c5dacb4c659f2488d",
    "0xe592427a0aece92de3edee1f18e0157c05861564",
    "0x68b3465833fb72a70ecdf485e0e4c7bd8665fc45",
    "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad",
    "0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f",
    "0x1111111254eeb25477b68fb85ed929f73a960582",
    "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
    "0xdac17f958d2ee523a2206206994597c13d831ec7",
    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
    "0x6b175474e89094c44da98b954eedeac495271d0f",
    "0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9",
    "0x87870bca3f3fd6335c3f4ce8392d69350b4fa4e2",
];

/// Vanity fragments common in spoofed addresses
pub const LEET_PATTERNS: &[&str] = &["dead", "beef", "bad", "1337", "face", "babe", "f00d"];

/// Minimum run of one repeated hex character that marks a vanity address
pub const REPEATED_CHAR_RUN: usize = 6;

lazy_static::lazy_static! {
    static ref PROTOCOL_NAMES: HashMap<Address, &'static str> = PROTOCOLS
        .iter()
        .filter_map(|(addr, name)| Address::from_str(addr).ok().map(|a| (a, *name)))
        .collect();
}

/// Protocol name for a known contract address
pub fn get_protocol_name(address: &Address) -> Option<&'static str> {
    PROTOCOL_NAMES.get(address).copied()
}

// ============================================
// CONVERSION UTILITIES
// ============================================

/// Approval amounts at or above this are "unlimited" in practice
#[inline]
pub fn practical_unlimited_threshold() -> U256 {
    U256::from(PRACTICAL_UNLIMITED_WEI)
}

/// Format a wei amount in whole native units (e.g. "1.500000000000000000")
#[inline]
pub fn format_native(wei: U256) -> String {
    format_ether(wei)
}

/// Convert wei to ETH (or native token), lossy
#[inline]
pub fn wei_to_eth(wei: U256) -> f64 {
    let wei_u128: u128 = wei.try_into().unwrap_or(u128::MAX);
    wei_u128 as f64 / 1e18
}
