// In-process stand-ins for the chain and the notification bus.

#![allow(dead_code)]

use alloy::rpc::types::Log;
use alloy::sol_types::{SolCall, SolEvent};
use alloy_primitives::{Address, B256, Bytes, U256, address};
use anyhow::Result;
use launch_indexer::config::Config;
use launch_indexer::events::{
    LaunchCreated, TokensPurchased, creatorFeeBpsCall, nameCall, symbolCall,
};
use launch_indexer::notify::{Notification, Notifier};
use launch_indexer::repository::Database;
use launch_indexer::rpc::ChainClient;
use launch_indexer::scanner::Scanner;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

pub const FACTORY: Address = address!("0x00000000000000000000000000000000000000fa");
pub const CREATOR: Address = address!("0x00000000000000000000000000000000000000ee");
pub const BUYER: Address = address!("0x00000000000000000000000000000000000000b0");

pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

#[derive(Default)]
struct ChainState {
    head: u64,
    logs: Vec<Log>,
    tokens: HashMap<Address, (String, String)>,
    fees: HashMap<Address, U256>,
    failing_blocks: HashSet<u64>,
    down: bool,
    calls: usize,
    head_requests: usize,
}

/// A scripted ledger. Clones share state so a test can keep a handle after
/// handing one to the scanner.
#[derive(Clone, Default)]
pub struct FakeChain {
    state: Rc<RefCell<ChainState>>,
}

impl FakeChain {
    pub fn new(head: u64) -> Self {
        let chain = Self::default();
        chain.state.borrow_mut().head = head;
        chain
    }

    pub fn set_head(&self, head: u64) {
        self.state.borrow_mut().head = head;
    }

    /// Makes every request touching `block` fail until `heal_block` is called.
    pub fn fail_block(&self, block: u64) {
        self.state.borrow_mut().failing_blocks.insert(block);
    }

    pub fn heal_block(&self, block: u64) {
        self.state.borrow_mut().failing_blocks.remove(&block);
    }

    pub fn set_down(&self, down: bool) {
        self.state.borrow_mut().down = down;
    }

    pub fn calls(&self) -> usize {
        self.state.borrow().calls
    }

    pub fn head_requests(&self) -> usize {
        self.state.borrow().head_requests
    }

    pub fn register_token(&self, token: Address, curve: Address, name: &str, symbol: &str, fee: u64) {
        let mut state = self.state.borrow_mut();
        state
            .tokens
            .insert(token, (name.to_string(), symbol.to_string()));
        state.fees.insert(curve, U256::from(fee));
    }

    pub fn push_launch(&self, block: u64, log_index: u64, event: &LaunchCreated) -> B256 {
        let tx_hash = tx_hash(block, log_index);
        self.push_log(FACTORY, event.encode_log_data(), block, tx_hash, log_index);
        tx_hash
    }

    pub fn push_purchase(
        &self,
        block: u64,
        log_index: u64,
        curve: Address,
        event: &TokensPurchased,
    ) -> B256 {
        let tx_hash = tx_hash(block, log_index);
        self.push_log(curve, event.encode_log_data(), block, tx_hash, log_index);
        tx_hash
    }

    /// A log whose topics match `topics` but whose data is cut short.
    pub fn push_truncated(&self, block: u64, log_index: u64, address: Address, topics: Vec<B256>) {
        let data = alloy_primitives::LogData::new_unchecked(topics, Bytes::from(vec![0u8; 7]));
        self.push_log(address, data, block, tx_hash(block, log_index), log_index);
    }

    fn push_log(
        &self,
        address: Address,
        data: alloy_primitives::LogData,
        block: u64,
        tx_hash: B256,
        log_index: u64,
    ) {
        self.state.borrow_mut().logs.push(Log {
            inner: alloy_primitives::Log { address, data },
            block_number: Some(block),
            transaction_hash: Some(tx_hash),
            log_index: Some(log_index),
            ..Default::default()
        });
    }

    fn begin(&self, block: Option<u64>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        if state.down {
            anyhow::bail!("connection refused");
        }
        if let Some(block) = block {
            if state.failing_blocks.contains(&block) {
                anyhow::bail!("upstream error for block {block}");
            }
        }
        Ok(())
    }
}

impl ChainClient for FakeChain {
    async fn block_number(&self) -> Result<u64> {
        self.begin(None)?;
        let mut state = self.state.borrow_mut();
        state.head_requests += 1;
        Ok(state.head)
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64> {
        self.begin(Some(number))?;
        Ok(GENESIS_TIMESTAMP + number * 12)
    }

    async fn get_logs(
        &self,
        addresses: Vec<Address>,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        for block in from_block..=to_block {
            self.begin(Some(block))?;
        }
        let state = self.state.borrow();
        Ok(state
            .logs
            .iter()
            .filter(|log| addresses.contains(&log.address()))
            .filter(|log| log.topics().first() == Some(&topic0))
            .filter(|log| {
                log.block_number
                    .is_some_and(|n| n >= from_block && n <= to_block)
            })
            .cloned()
            .collect())
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes> {
        self.begin(None)?;
        let state = self.state.borrow();
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| anyhow::anyhow!("call without selector"))?;

        let output = if selector == nameCall::SELECTOR {
            let (name, _) = state
                .tokens
                .get(&to)
                .ok_or_else(|| anyhow::anyhow!("execution reverted"))?;
            nameCall::abi_encode_returns(name)
        } else if selector == symbolCall::SELECTOR {
            let (_, symbol) = state
                .tokens
                .get(&to)
                .ok_or_else(|| anyhow::anyhow!("execution reverted"))?;
            symbolCall::abi_encode_returns(symbol)
        } else if selector == creatorFeeBpsCall::SELECTOR {
            let fee = state
                .fees
                .get(&to)
                .ok_or_else(|| anyhow::anyhow!("execution reverted"))?;
            creatorFeeBpsCall::abi_encode_returns(fee)
        } else {
            anyhow::bail!("unknown selector {selector:?}");
        };
        Ok(output.into())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.sent.borrow().iter().map(Notification::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.sent.borrow().iter().filter(|n| n.kind() == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        self.sent.borrow_mut().push(notification.clone());
        Ok(())
    }
}

pub fn tx_hash(block: u64, log_index: u64) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&block.to_be_bytes());
    bytes[24..].copy_from_slice(&log_index.to_be_bytes());
    B256::from(bytes)
}

pub fn test_config(start_block: u64) -> Config {
    let mut config = Config::new(vec!["http://127.0.0.1:8545".to_string()], FACTORY);
    config.start_block = start_block;
    config.block_delay = Duration::ZERO;
    config.rpc_max_retries = 0;
    config.rpc_retry_base_delay = Duration::ZERO;
    config.breaker_threshold = 3;
    config.breaker_cooldown = Duration::from_millis(50);
    config
}

pub fn launch(token: Address, curve: Address, supply_cap: u64) -> LaunchCreated {
    LaunchCreated {
        token,
        curve,
        creator: CREATOR,
        intentId: B256::repeat_byte(0x11),
        supplyCap: U256::from(supply_cap),
        basePrice: U256::from(1_000u64),
        priceIncrement: U256::from(10u64),
        mode: 0,
        modeMetadata: Bytes::new(),
    }
}

pub fn purchase(token_amount: u64, new_total_supply: u64, new_price: u64) -> TokensPurchased {
    TokensPurchased {
        buyer: BUYER,
        intentId: B256::repeat_byte(0x22),
        btcAmountSats: U256::from(token_amount * 2),
        tokenAmountBaseUnits: U256::from(token_amount),
        newTotalSupply: U256::from(new_total_supply),
        newPrice: U256::from(new_price),
    }
}

pub fn scanner(
    chain: &FakeChain,
    notifier: &RecordingNotifier,
    config: &Config,
) -> Scanner<FakeChain, RecordingNotifier> {
    let db = Database::in_memory().expect("Should open in-memory database");
    Scanner::new(chain.clone(), db, notifier.clone(), config).expect("Should create scanner")
}
