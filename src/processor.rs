//! Event processors.
//!
//! Each processor turns one decoded log, its position in the chain and the
//! persisted state it depends on into the writes to apply and the
//! notifications to publish. They perform no I/O; the scanner gathers the
//! state beforehand and applies the result inside the block's transaction.

use crate::events::{LaunchCreated, TokensPurchased};
use crate::notify::Notification;
use crate::repository::{Launch, LaunchStatus, NewLaunch, PendingMetadata, Purchase};
use alloy_primitives::{Address, B256, U256};
use std::fmt;

/// Position of a log in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMeta {
    pub block_number: u64,
    pub timestamp: u64,
    pub tx_hash: B256,
    pub log_index: u64,
}

/// Values read from the token and curve contracts when a launch is first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDetails {
    pub name: String,
    pub symbol: String,
    pub creator_fee_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    InsertLaunch(NewLaunch),
    MarkMetadataApplied { id: i64 },
    InsertPurchase(Purchase),
    FinalizeLaunch { launch_id: i64 },
    WatchCurve(Address),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub writes: Vec<Write>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// A purchase on a curve with no known launch.
    UnknownCurve(Address),
    /// The purchased amount exceeds the reported total supply.
    SupplyUnderflow {
        token_amount: U256,
        new_total_supply: U256,
    },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::UnknownCurve(curve) => {
                write!(f, "purchase on curve {curve:?} with no indexed launch")
            }
            DropReason::SupplyUnderflow {
                token_amount,
                new_total_supply,
            } => write!(
                f,
                "token amount {token_amount} exceeds new total supply {new_total_supply}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Apply(Effects),
    /// The event was applied before; nothing to write or publish.
    Duplicate,
    /// The event cannot be applied and retrying will not help.
    Dropped(DropReason),
}

/// What the store knows about the token of a `LaunchCreated` log.
#[derive(Debug, Clone, Copy)]
pub enum LaunchState<'a> {
    Indexed(&'a Launch),
    New {
        details: &'a TokenDetails,
        pending: Option<&'a PendingMetadata>,
    },
}

pub fn launch_created(event: &LaunchCreated, meta: &EventMeta, state: LaunchState<'_>) -> Outcome {
    let (details, pending) = match state {
        LaunchState::Indexed(_) => return Outcome::Duplicate,
        LaunchState::New { details, pending } => (details, pending),
    };

    let launch = NewLaunch {
        token_address: event.token,
        curve_address: event.curve,
        creator: event.creator,
        intent_id: event.intentId,
        name: details.name.clone(),
        symbol: details.symbol.clone(),
        supply_cap: event.supplyCap,
        base_price: event.basePrice,
        price_increment: event.priceIncrement,
        creator_fee_bps: details.creator_fee_bps,
        mode: event.mode,
        block_number: meta.block_number,
        tx_hash: meta.tx_hash,
        created_at: meta.timestamp,
        metadata_uri: pending.map(|p| p.content_id.clone()),
    };

    let mut writes = vec![Write::InsertLaunch(launch)];
    if let Some(pending) = pending {
        writes.push(Write::MarkMetadataApplied { id: pending.id });
    }
    writes.push(Write::WatchCurve(event.curve));

    Outcome::Apply(Effects {
        writes,
        notifications: vec![Notification::LaunchCreated {
            token_address: event.token,
            curve_address: event.curve,
            creator: event.creator,
            name: details.name.clone(),
            symbol: details.symbol.clone(),
            timestamp: meta.timestamp,
        }],
    })
}

pub fn tokens_purchased(
    event: &TokensPurchased,
    curve: Address,
    meta: &EventMeta,
    parent: Option<&Launch>,
    already_recorded: bool,
) -> Outcome {
    if already_recorded {
        return Outcome::Duplicate;
    }

    let Some(launch) = parent else {
        return Outcome::Dropped(DropReason::UnknownCurve(curve));
    };

    let Some(supply_before) = event
        .newTotalSupply
        .checked_sub(event.tokenAmountBaseUnits)
    else {
        return Outcome::Dropped(DropReason::SupplyUnderflow {
            token_amount: event.tokenAmountBaseUnits,
            new_total_supply: event.newTotalSupply,
        });
    };

    let purchase = Purchase {
        launch_id: launch.id,
        token_address: launch.token_address,
        curve_address: curve,
        buyer: event.buyer,
        intent_id: event.intentId,
        btc_amount: event.btcAmountSats,
        token_amount: event.tokenAmountBaseUnits,
        supply_before,
        supply_after: event.newTotalSupply,
        new_price: event.newPrice,
        block_number: meta.block_number,
        tx_hash: meta.tx_hash,
        log_index: meta.log_index,
        timestamp: meta.timestamp,
    };

    let mut effects = Effects {
        writes: vec![Write::InsertPurchase(purchase)],
        notifications: Vec::new(),
    };

    if event.newTotalSupply >= launch.supply_cap && launch.status == LaunchStatus::Active {
        effects.writes.push(Write::FinalizeLaunch {
            launch_id: launch.id,
        });
        effects.notifications.push(Notification::LaunchFinalized {
            token_address: launch.token_address,
            launch_id: launch.id,
        });
    }

    effects.notifications.push(Notification::TokensPurchased {
        token_address: launch.token_address,
        curve_address: curve,
        buyer: event.buyer,
        btc_amount: event.btcAmountSats.to_string(),
        token_amount: event.tokenAmountBaseUnits.to_string(),
        new_total_supply: event.newTotalSupply.to_string(),
        new_price: event.newPrice.to_string(),
        tx_hash: meta.tx_hash,
        timestamp: meta.timestamp,
    });
    effects.notifications.push(Notification::PriceUpdate {
        token_address: launch.token_address,
        price: event.newPrice.to_string(),
        total_supply: event.newTotalSupply.to_string(),
        buyer: event.buyer,
        btc_amount: event.btcAmountSats.to_string(),
        token_amount: event.tokenAmountBaseUnits.to_string(),
        timestamp: meta.timestamp,
    });

    Outcome::Apply(effects)
}
