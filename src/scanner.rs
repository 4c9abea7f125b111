use crate::breaker::CircuitBreaker;
use crate::config::Config;
use crate::events::{
    LaunchCreated, TokensPurchased, creatorFeeBpsCall, decode_launch_created,
    decode_tokens_purchased, nameCall, symbolCall,
};
use crate::notify::{Notification, Notifier, publish_best_effort};
use crate::processor::{self, EventMeta, LaunchState, Outcome, TokenDetails, Write};
use crate::repository::{
    CursorRepository, Database, LaunchRepository, PendingMetadataRepository, PurchaseRepository,
};
use crate::retry::RetryPolicy;
use crate::rpc::ChainClient;
use crate::watched::WatchedAddresses;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The circuit breaker is open; no remote call was made.
    BreakerOpen,
    /// The chain head could not be read.
    HeadUnavailable,
    UpToDate { head: u64 },
    Advanced { from: u64, to: u64 },
    /// `block` failed and will be retried in full on the next tick.
    Failed { block: u64, last_processed: u64 },
}

struct BlockEvent {
    log_index: u64,
    tx_hash: B256,
    kind: BlockEventKind,
}

enum BlockEventKind {
    Launch(LaunchCreated),
    Purchase {
        curve: Address,
        event: TokensPurchased,
    },
}

impl BlockEvent {
    fn new(log: &Log, block_number: u64, kind: BlockEventKind) -> Result<Self> {
        let log_index = log
            .log_index
            .with_context(|| format!("Log in block {block_number} has no log index"))?;
        let tx_hash = log
            .transaction_hash
            .with_context(|| format!("Log in block {block_number} has no transaction hash"))?;
        Ok(Self {
            log_index,
            tx_hash,
            kind,
        })
    }
}

/// The indexer session: cursor, watched curves and breaker state live here
/// and are only touched by the tick that currently holds `&mut self`.
pub struct Scanner<C, N> {
    client: C,
    db: Database,
    notifier: N,
    factory_address: Address,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    watched: WatchedAddresses,
    last_processed_block: u64,
    /// Height that failed on the last attempt and how many times in a row.
    stalled: Option<(u64, u32)>,
    max_blocks_per_tick: u64,
    block_delay: Duration,
    poll_interval: Duration,
}

impl<C: ChainClient, N: Notifier> Scanner<C, N> {
    pub fn new(client: C, db: Database, notifier: N, config: &Config) -> Result<Self> {
        let last_processed_block = CursorRepository::new(&db.conn)
            .load_or_init(config.start_block.saturating_sub(1))
            .context("Failed to load indexer cursor")?;

        let watched: WatchedAddresses = LaunchRepository::new(&db.conn)
            .curve_addresses()
            .context("Failed to load watched curve addresses")?
            .into_iter()
            .collect();

        info!(
            "Resuming after block {} with {} watched curve(s)",
            last_processed_block,
            watched.len()
        );

        Ok(Scanner {
            client,
            db,
            notifier,
            factory_address: config.factory_address,
            retry: RetryPolicy::new(config.rpc_max_retries, config.rpc_retry_base_delay),
            breaker: CircuitBreaker::new(config.breaker_threshold, config.breaker_cooldown),
            watched,
            last_processed_block,
            stalled: None,
            max_blocks_per_tick: config.max_blocks_per_tick.max(1),
            block_delay: config.block_delay,
            poll_interval: config.poll_interval,
        })
    }

    pub fn last_processed_block(&self) -> u64 {
        self.last_processed_block
    }

    pub fn watched(&self) -> &WatchedAddresses {
        &self.watched
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Runs ticks on a fixed interval until ctrl-c.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Runs ticks on a fixed interval until `shutdown` resolves. A tick is
    /// always awaited to completion; interval fires that elapse meanwhile are
    /// skipped, and a shutdown raised during a tick stops the loop right after it.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) -> Result<()> {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping after block {}", self.last_processed_block);
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            let outcome = self.tick().await;
            debug!("Tick finished: {:?}", outcome);
        }
    }

    pub async fn tick(&mut self) -> TickOutcome {
        if !self.breaker.allow(Instant::now()) {
            debug!("Circuit breaker open, skipping tick");
            return TickOutcome::BreakerOpen;
        }

        let head = self
            .retry
            .run("eth_blockNumber", || self.client.block_number())
            .await;
        let head = match self.breaker.observe(head) {
            Ok(head) => head,
            Err(e) => {
                error!("Failed to fetch chain head: {:#}", e);
                self.breaker.record_failure(Instant::now());
                return TickOutcome::HeadUnavailable;
            }
        };

        if head <= self.last_processed_block {
            debug!("Up to date at block {}", head);
            return TickOutcome::UpToDate { head };
        }

        let from = self.last_processed_block + 1;
        let batch_end = head.min(self.last_processed_block + self.max_blocks_per_tick);
        info!("Processing blocks {} to {} (head {})", from, batch_end, head);

        for block_number in from..=batch_end {
            if block_number > from && !self.block_delay.is_zero() {
                sleep(self.block_delay).await;
            }

            if let Err(e) = self.process_block(block_number).await {
                error!("Failed to process block {}: {:#}", block_number, e);
                self.record_block_failure(block_number);
                return TickOutcome::Failed {
                    block: block_number,
                    last_processed: self.last_processed_block,
                };
            }
        }

        TickOutcome::Advanced {
            from,
            to: batch_end,
        }
    }

    /// Successful calls before the failing one clear the breaker's streak, so
    /// a block that keeps failing is counted per height as well.
    fn record_block_failure(&mut self, block_number: u64) {
        let attempts = match self.stalled {
            Some((height, attempts)) if height == block_number => attempts.saturating_add(1),
            _ => 1,
        };
        self.stalled = Some((block_number, attempts));

        let now = Instant::now();
        self.breaker.record_failure(now);
        if attempts >= self.breaker.threshold() {
            warn!("Block {} failed {} times in a row", block_number, attempts);
            self.breaker.trip(now);
        }
    }

    async fn process_block(&mut self, block_number: u64) -> Result<()> {
        let factory_logs = self
            .retry
            .run("eth_getLogs(LaunchCreated)", || {
                self.client.get_logs(
                    vec![self.factory_address],
                    LaunchCreated::SIGNATURE_HASH,
                    block_number,
                    block_number,
                )
            })
            .await;
        let factory_logs = self.breaker.observe(factory_logs)?;

        let mut events = Vec::new();
        let mut new_curves = Vec::new();
        for log in &factory_logs {
            match decode_launch_created(log) {
                Ok(event) => {
                    new_curves.push(event.curve);
                    events.push(BlockEvent::new(
                        log,
                        block_number,
                        BlockEventKind::Launch(event),
                    )?);
                }
                Err(e) => warn!(
                    "Skipping undecodable LaunchCreated log in block {}: {}",
                    block_number, e
                ),
            }
        }

        // Curves launched in this block are scanned too, so same-block
        // purchases are not missed.
        let curves = self.watched.query_addresses(&new_curves);
        if !curves.is_empty() {
            let purchase_logs = self
                .retry
                .run("eth_getLogs(TokensPurchased)", || {
                    self.client.get_logs(
                        curves.clone(),
                        TokensPurchased::SIGNATURE_HASH,
                        block_number,
                        block_number,
                    )
                })
                .await;
            let purchase_logs = self.breaker.observe(purchase_logs)?;

            for log in &purchase_logs {
                match decode_tokens_purchased(log) {
                    Ok(event) => events.push(BlockEvent::new(
                        log,
                        block_number,
                        BlockEventKind::Purchase {
                            curve: log.address(),
                            event,
                        },
                    )?),
                    Err(e) => warn!(
                        "Skipping undecodable TokensPurchased log in block {}: {}",
                        block_number, e
                    ),
                }
            }
        }

        if events.is_empty() {
            CursorRepository::new(&self.db.conn).advance(block_number)?;
            self.mark_processed(block_number);
            return Ok(());
        }

        events.sort_by_key(|event| event.log_index);

        let timestamp = self
            .retry
            .run("eth_getBlockByNumber", || self.client.block_timestamp(block_number))
            .await;
        let timestamp = self.breaker.observe(timestamp)?;

        let mut details = HashMap::new();
        for event in &events {
            if let BlockEventKind::Launch(launch) = &event.kind {
                let known = LaunchRepository::new(&self.db.conn).find_by_token(&launch.token)?;
                if known.is_none() && !details.contains_key(&launch.token) {
                    let fetched = self.fetch_token_details(launch).await?;
                    details.insert(launch.token, fetched);
                }
            }
        }

        let (notifications, curves) = self
            .apply_block(block_number, timestamp, &events, &details)
            .with_context(|| format!("Failed to apply block {block_number}"))?;

        self.mark_processed(block_number);
        for curve in curves {
            if self.watched.insert(curve) {
                info!("Watching curve {:?}", curve);
            }
        }

        info!("Applied {} event(s) from block {}", events.len(), block_number);

        for notification in &notifications {
            publish_best_effort(&self.notifier, notification).await;
        }

        Ok(())
    }

    fn mark_processed(&mut self, block_number: u64) {
        self.last_processed_block = block_number;
        if self.stalled.is_some_and(|(height, _)| height <= block_number) {
            self.stalled = None;
        }
    }

    async fn fetch_token_details(&mut self, launch: &LaunchCreated) -> Result<TokenDetails> {
        let curve = launch.curve;
        let token = launch.token;

        let fee = self
            .retry
            .run("creatorFeeBps", || self.client.call_contract(curve, creatorFeeBpsCall {}))
            .await;
        let fee = self.breaker.observe(fee)?;
        let creator_fee_bps = u32::try_from(fee).map_err(|_| {
            anyhow::anyhow!("Creator fee {} on curve {:?} is not a basis-point value", fee, curve)
        })?;

        let name = self
            .retry
            .run("name", || self.client.call_contract(token, nameCall {}))
            .await;
        let name = self.breaker.observe(name)?;

        let symbol = self
            .retry
            .run("symbol", || self.client.call_contract(token, symbolCall {}))
            .await;
        let symbol = self.breaker.observe(symbol)?;

        Ok(TokenDetails {
            name,
            symbol,
            creator_fee_bps,
        })
    }

    /// Applies every event of the block and advances the cursor in one
    /// transaction. Returns the notifications to publish and the curves to
    /// start watching once the transaction has committed.
    fn apply_block(
        &self,
        block_number: u64,
        timestamp: u64,
        events: &[BlockEvent],
        details: &HashMap<Address, TokenDetails>,
    ) -> Result<(Vec<Notification>, Vec<Address>)> {
        let tx = self.db.conn.unchecked_transaction()?;
        let launches = LaunchRepository::new(&tx);
        let purchases = PurchaseRepository::new(&tx);
        let pending = PendingMetadataRepository::new(&tx);

        let mut notifications = Vec::new();
        let mut curves = Vec::new();

        for event in events {
            let meta = EventMeta {
                block_number,
                timestamp,
                tx_hash: event.tx_hash,
                log_index: event.log_index,
            };

            let outcome = match &event.kind {
                BlockEventKind::Launch(launch) => match launches.find_by_token(&launch.token)? {
                    Some(existing) => {
                        processor::launch_created(launch, &meta, LaunchState::Indexed(&existing))
                    }
                    None => {
                        let token_details = details.get(&launch.token).with_context(|| {
                            format!("No token details fetched for {:?}", launch.token)
                        })?;
                        let matched = pending
                            .find_latest_unapplied(&token_details.name, &token_details.symbol)?;
                        processor::launch_created(
                            launch,
                            &meta,
                            LaunchState::New {
                                details: token_details,
                                pending: matched.as_ref(),
                            },
                        )
                    }
                },
                BlockEventKind::Purchase { curve, event } => {
                    let parent = launches.find_by_curve(curve)?;
                    let recorded = purchases.exists(&meta.tx_hash, meta.log_index)?;
                    processor::tokens_purchased(event, *curve, &meta, parent.as_ref(), recorded)
                }
            };

            match outcome {
                Outcome::Apply(effects) => {
                    let mut applied = true;
                    for write in effects.writes {
                        match write {
                            Write::InsertLaunch(launch) => {
                                applied = launches.insert(&launch)?.is_some();
                            }
                            Write::MarkMetadataApplied { id } => pending.mark_applied(id)?,
                            Write::InsertPurchase(purchase) => {
                                applied = purchases.insert(&purchase)?;
                            }
                            Write::FinalizeLaunch { launch_id } => {
                                if launches.finalize(launch_id)? {
                                    info!("Launch {} reached its supply cap", launch_id);
                                }
                            }
                            Write::WatchCurve(curve) => curves.push(curve),
                        }
                        if !applied {
                            break;
                        }
                    }
                    if applied {
                        notifications.extend(effects.notifications);
                    } else {
                        debug!(
                            "Log {} of tx {:?} was already stored",
                            meta.log_index, meta.tx_hash
                        );
                    }
                }
                Outcome::Duplicate => debug!(
                    "Skipping already indexed log {} of tx {:?}",
                    meta.log_index, meta.tx_hash
                ),
                Outcome::Dropped(reason) => error!(
                    "Dropping log {} of tx {:?} in block {}: {}",
                    meta.log_index, meta.tx_hash, block_number, reason
                ),
            }
        }

        CursorRepository::new(&tx).advance(block_number)?;
        tx.commit()?;

        Ok((notifications, curves))
    }
}
