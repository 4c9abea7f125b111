use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Flat event payloads pushed to downstream listeners. uint256 values are
/// carried as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Notification {
    LaunchCreated {
        token_address: Address,
        curve_address: Address,
        creator: Address,
        name: String,
        symbol: String,
        timestamp: u64,
    },
    TokensPurchased {
        token_address: Address,
        curve_address: Address,
        buyer: Address,
        btc_amount: String,
        token_amount: String,
        new_total_supply: String,
        new_price: String,
        tx_hash: B256,
        timestamp: u64,
    },
    PriceUpdate {
        token_address: Address,
        price: String,
        total_supply: String,
        buyer: Address,
        btc_amount: String,
        token_amount: String,
        timestamp: u64,
    },
    LaunchFinalized {
        token_address: Address,
        launch_id: i64,
    },
}

impl Notification {
    /// Channel name, identical to the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::LaunchCreated { .. } => "launch_created",
            Notification::TokensPurchased { .. } => "tokens_purchased",
            Notification::PriceUpdate { .. } => "price_update",
            Notification::LaunchFinalized { .. } => "launch_finalized",
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn publish(&self, notification: &Notification) -> Result<()>;
}

/// Delivery is best effort: failures are logged and never reach the caller.
pub async fn publish_best_effort<N: Notifier>(notifier: &N, notification: &Notification) {
    if let Err(e) = notifier.publish(notification).await {
        warn!("Dropped {} notification: {:#}", notification.kind(), e);
    }
}

#[derive(Clone)]
pub struct RedisNotifier {
    connection: ConnectionManager,
}

impl RedisNotifier {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let connection = ConnectionManager::new(client)
            .await
            .context("Failed to establish Redis connection")?;

        info!("Connected to Redis notification bus");

        Ok(Self { connection })
    }
}

impl Notifier for RedisNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        let json = serde_json::to_string(notification).context("Failed to serialize notification")?;
        let mut connection = self.connection.clone();

        match connection
            .publish::<_, _, ()>(notification.kind(), json)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.is_connection_dropped() || e.is_io_error() {
                    warn!("Redis connection lost, connection manager will reconnect");
                }
                Err(e.into())
            }
        }
    }
}

/// Used when no notification bus is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        let json = serde_json::to_string(notification).context("Failed to serialize notification")?;
        debug!("{}: {}", notification.kind(), json);
        Ok(())
    }
}

pub enum AnyNotifier {
    Redis(RedisNotifier),
    Log(LogNotifier),
}

impl AnyNotifier {
    pub async fn from_url(redis_url: Option<&str>) -> Result<Self> {
        match redis_url {
            Some(url) => Ok(AnyNotifier::Redis(RedisNotifier::new(url).await?)),
            None => {
                info!("REDIS_URL not set, notifications will only be logged");
                Ok(AnyNotifier::Log(LogNotifier))
            }
        }
    }
}

impl Notifier for AnyNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        match self {
            AnyNotifier::Redis(notifier) => notifier.publish(notification).await,
            AnyNotifier::Log(notifier) => notifier.publish(notification).await,
        }
    }
}
