use alloy_primitives::{Address, B256, U256};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    Active,
    Finalized,
}

impl LaunchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchStatus::Active => "ACTIVE",
            LaunchStatus::Finalized => "FINALIZED",
        }
    }
}

impl fmt::Display for LaunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown launch status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for LaunchStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(LaunchStatus::Active),
            "FINALIZED" => Ok(LaunchStatus::Finalized),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A launch as discovered from a `LaunchCreated` log, before it has a row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLaunch {
    pub token_address: Address,
    pub curve_address: Address,
    pub creator: Address,
    pub intent_id: B256,
    pub name: String,
    pub symbol: String,
    pub supply_cap: U256,
    pub base_price: U256,
    pub price_increment: U256,
    pub creator_fee_bps: u32,
    pub mode: u8,
    pub block_number: u64,
    pub tx_hash: B256,
    pub created_at: u64,
    pub metadata_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub id: i64,
    pub token_address: Address,
    pub curve_address: Address,
    pub creator: Address,
    pub intent_id: B256,
    pub name: String,
    pub symbol: String,
    pub supply_cap: U256,
    pub base_price: U256,
    pub price_increment: U256,
    pub creator_fee_bps: u32,
    pub mode: u8,
    pub status: LaunchStatus,
    pub block_number: u64,
    pub tx_hash: B256,
    pub created_at: u64,
    pub metadata_uri: Option<String>,
}

/// One `TokensPurchased` log. Unique on `(tx_hash, log_index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub launch_id: i64,
    pub token_address: Address,
    pub curve_address: Address,
    pub buyer: Address,
    pub intent_id: B256,
    pub btc_amount: U256,
    pub token_amount: U256,
    pub supply_before: U256,
    pub supply_after: U256,
    pub new_price: U256,
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
    pub timestamp: u64,
}

/// Off-chain metadata submitted ahead of the on-chain launch it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMetadata {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub content_id: String,
    pub applied: bool,
    pub created_at: u64,
}
