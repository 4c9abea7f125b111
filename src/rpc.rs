use alloy::providers::fillers::FillProvider;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log, TransactionInput, TransactionRequest};
use alloy::sol_types::SolCall;
use alloy_primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use std::fmt::Display;
use std::future::IntoFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

type AlloyFullProvider = FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::Identity,
        alloy::providers::fillers::JoinFill<
            alloy::providers::fillers::GasFiller,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::BlobGasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::NonceFiller,
                    alloy::providers::fillers::ChainIdFiller,
                >,
            >,
        >,
    >,
    alloy::providers::RootProvider,
>;

/// The remote ledger operations the indexer depends on. Every method is a
/// single attempt; retrying is the caller's concern.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    async fn block_number(&self) -> Result<u64>;

    /// Unix timestamp (seconds) of the block at `number`.
    async fn block_timestamp(&self, number: u64) -> Result<u64>;

    async fn get_logs(
        &self,
        addresses: Vec<Address>,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>>;

    /// Raw read-only `eth_call` against the latest state.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes>;

    async fn call_contract<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return> {
        let output = self.call(to, call.abi_encode().into()).await?;
        C::abi_decode_returns(&output)
            .with_context(|| format!("Failed to decode {} return from {to:?}", C::SIGNATURE))
    }
}

#[derive(Clone)]
pub struct RpcClient {
    providers: Vec<AlloyFullProvider>,
    urls: Vec<String>,
    current_provider: Arc<AtomicUsize>,
    request_timeout: Duration,
}

impl RpcClient {
    pub fn new(rpc_urls: &[String], request_timeout: Duration) -> Result<Self> {
        if rpc_urls.is_empty() {
            return Err(anyhow::anyhow!("At least one RPC URL must be provided"));
        }

        let mut providers = Vec::new();
        for url in rpc_urls {
            let parsed_url = url
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid RPC URL: {}", url))?;
            let provider: AlloyFullProvider = ProviderBuilder::new().connect_http(parsed_url);
            providers.push(provider);
        }

        Ok(RpcClient {
            providers,
            urls: rpc_urls.to_vec(),
            current_provider: Arc::new(AtomicUsize::new(0)),
            request_timeout,
        })
    }

    fn get_provider(&self) -> &AlloyFullProvider {
        let index = self.current_provider.load(Ordering::Relaxed) % self.providers.len();
        &self.providers[index]
    }

    pub fn get_current_url(&self) -> &str {
        let index = self.current_provider.load(Ordering::Relaxed) % self.urls.len();
        &self.urls[index]
    }

    pub fn rotate_provider(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current_provider.store(next, Ordering::Relaxed);

        if self.providers.len() > 1 {
            debug!("Rotating to RPC provider #{}", next);
        }
    }

    fn handle_error(&self, method: &str, error_str: &str) {
        let current_url = self.get_current_url();
        warn!(
            "RPC error in {} on {}: {}, rotating provider",
            method, current_url, error_str
        );
        self.rotate_provider();
    }

    fn handle_timeout(&self, method: &str) -> anyhow::Error {
        let current_url = self.get_current_url();
        warn!(
            "{} timed out after {} seconds on {}, rotating provider",
            method,
            self.request_timeout.as_secs(),
            current_url
        );
        self.rotate_provider();
        anyhow::anyhow!(
            "{} timed out after {} seconds",
            method,
            self.request_timeout.as_secs()
        )
    }

    async fn request<T, E, F>(&self, method: &str, future: F) -> Result<T>
    where
        E: Display,
        F: IntoFuture<Output = std::result::Result<T, E>>,
    {
        match timeout(self.request_timeout, future).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let error_str = e.to_string();
                self.handle_error(method, &error_str);
                Err(anyhow::anyhow!("{} failed: {}", method, error_str))
            }
            Err(_) => Err(self.handle_timeout(method)),
        }
    }
}

impl ChainClient for RpcClient {
    async fn block_number(&self) -> Result<u64> {
        let provider = self.get_provider();
        self.request("eth_blockNumber", provider.get_block_number()).await
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64> {
        let provider = self.get_provider();
        let block = self
            .request(
                "eth_getBlockByNumber",
                provider.get_block_by_number(BlockNumberOrTag::Number(number)),
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("Block {} not found", number))?;
        Ok(block.header.timestamp)
    }

    async fn get_logs(
        &self,
        addresses: Vec<Address>,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        let provider = self.get_provider();
        let filter = Filter::new()
            .address(addresses)
            .event_signature(topic0)
            .from_block(from_block)
            .to_block(to_block);

        self.request("eth_getLogs", provider.get_logs(&filter)).await
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes> {
        let provider = self.get_provider();
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(input));

        self.request(
            "eth_call",
            provider.call(request).block(BlockNumberOrTag::Latest.into()),
        )
        .await
    }
}
