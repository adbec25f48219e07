use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::H256;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;
use crate::utils::strip_hex_prefix;

/// Etherscan v2 multichain endpoint
pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/v2/api";

/// Something that can look up the input data of a transaction by hash
#[async_trait]
pub trait CalldataSource: Send + Sync {
    /// Returns the `0x`-prefixed calldata, or `Ok(None)` if the transaction is unknown
    async fn fetch_input(&self, tx_hash: &str) -> Result<Option<String>, FetchError>;
}

/// Fetches the calldata of `tx_hash`, logging any failure and treating it as absent
pub async fn fetch_calldata<S: CalldataSource + ?Sized>(
    source: &S,
    tx_hash: &str,
) -> Option<String> {
    match source.fetch_input(tx_hash).await {
        Ok(Some(input)) => Some(input),
        Ok(None) => {
            warn!("Transaction {} not found", tx_hash);
            None
        }
        Err(e) => {
            warn!("Error fetching transaction {}: {}", tx_hash, e);
            None
        }
    }
}

/// Parses a 32 byte transaction hash, with or without the `0x` prefix
pub fn parse_tx_hash(tx_hash: &str) -> Result<H256, FetchError> {
    let mut tx_hash_bytes: [u8; 32] = [0; 32];
    hex::decode_to_slice(strip_hex_prefix(tx_hash), &mut tx_hash_bytes)
        .map_err(|_| FetchError::InvalidHash(tx_hash.to_string()))?;
    Ok(H256::from(tx_hash_bytes))
}

/// Backoff applied when the endpoint rate-limits us or fails transiently
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Factor applied to the delay after every retry
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Default backoff with `max_retries` retries
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Replaces the delay before the first retry
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Delay before attempt number `attempt` (0-indexed, the first attempt never waits)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32 - 1);
        std::cmp::min(Duration::from_millis(delay_ms as u64), self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails permanently or runs out of retries
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    tx_hash: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt);
            warn!(
                "Retry {}/{} for {} in {:?}",
                attempt, config.max_retries, tx_hash, delay
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    info!("Fetched {} after {} retries", tx_hash, attempt);
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                warn!(
                    "Fetching {} failed (attempt {}/{}): {}",
                    tx_hash,
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Looks transactions up through the Etherscan `proxy` module
pub struct EtherscanSource {
    client: Client,
    base_url: Url,
    api_key: String,
    chain_id: u64,
    retry: RetryConfig,
}

impl EtherscanSource {
    /// Client for `base_url` with the given per-request timeout and default retries
    pub fn new(
        base_url: &str,
        api_key: String,
        chain_id: u64,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            chain_id,
            retry: RetryConfig::default(),
        })
    }

    /// Replaces the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn request_url(&self, tx_hash: &H256) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("chainid", &self.chain_id.to_string())
            .append_pair("module", "proxy")
            .append_pair("action", "eth_getTransactionByHash")
            .append_pair("txhash", &format!("{:?}", tx_hash))
            .append_pair("apikey", &self.api_key);
        url
    }

    async fn request(&self, tx_hash: &H256) -> Result<Option<String>, FetchError> {
        // the api key is part of the query string, so only the base url is logged
        debug!("GET {} txhash={:?}", self.base_url, tx_hash);
        let response = self.client.get(self.request_url(tx_hash)).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body: Value = response.json().await?;
        parse_proxy_response(&body)
    }
}

#[async_trait]
impl CalldataSource for EtherscanSource {
    async fn fetch_input(&self, tx_hash: &str) -> Result<Option<String>, FetchError> {
        let hash = parse_tx_hash(tx_hash)?;
        with_retry(&self.retry, tx_hash, || self.request(&hash)).await
    }
}

/// Extracts `result.input` from an Etherscan proxy response envelope
pub fn parse_proxy_response(body: &Value) -> Result<Option<String>, FetchError> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(api_error(message));
    }

    match body.get("result") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(tx)) => match tx.get("input").and_then(Value::as_str) {
            Some(input) => Ok(Some(input.to_string())),
            None => Err(FetchError::Malformed(
                "transaction has no input field".to_string(),
            )),
        },
        // `status: "0"` envelopes carry the reason in `result`
        Some(Value::String(message)) => Err(api_error(message.clone())),
        Some(other) => Err(FetchError::Malformed(format!(
            "unexpected result: {}",
            other
        ))),
    }
}

fn api_error(message: String) -> FetchError {
    if message.to_lowercase().contains("rate limit") {
        FetchError::RateLimited
    } else {
        FetchError::Api(message)
    }
}

/// Looks transactions up directly on a JSON-RPC node
pub struct RpcNodeSource {
    provider: Provider<Http>,
    retry: RetryConfig,
}

impl RpcNodeSource {
    /// Provider for `rpc_url` with default retries
    pub fn new(rpc_url: &str) -> Result<Self, FetchError> {
        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            provider,
            retry: RetryConfig::default(),
        })
    }

    /// Replaces the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, tx_hash: H256) -> Result<Option<String>, FetchError> {
        debug!("eth_getTransactionByHash {:?}", tx_hash);
        let tx = self
            .provider
            .get_transaction(tx_hash)
            .await
            .map_err(|e| FetchError::Provider(e.to_string()))?;
        Ok(tx.map(|tx| format!("0x{}", hex::encode(tx.input.0))))
    }
}

#[async_trait]
impl CalldataSource for RpcNodeSource {
    async fn fetch_input(&self, tx_hash: &str) -> Result<Option<String>, FetchError> {
        let hash = parse_tx_hash(tx_hash)?;
        with_retry(&self.retry, tx_hash, || self.request(hash)).await
    }
}
