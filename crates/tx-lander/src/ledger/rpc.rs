//! JSON-RPC ledger client.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use solana_signature::Signature;
use tokio_util::sync::CancellationToken;

use super::{
    Commitment, ConfirmationWaitError, LedgerClient, LedgerError, RecordOptions, SendOptions,
    SignatureStatus, SimulateOptions, SimulationResult, StatusOptions, TransactionRecord, ws,
};
use crate::window::ValidityWindow;

/// Default cadence of block-height checks while waiting for a notification.
const DEFAULT_BLOCK_HEIGHT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Ledger client speaking Solana JSON-RPC over HTTP and pubsub over WebSocket.
#[derive(Debug, Clone)]
pub struct JsonRpcLedgerClient {
    /// HTTP client used for RPC calls.
    client: reqwest::Client,
    /// Target JSON-RPC endpoint URL.
    rpc_url: String,
    /// Pubsub endpoint URL.
    ws_url: String,
    /// Block-height check cadence used by the expiry watch.
    block_height_poll_interval: Duration,
}

impl JsonRpcLedgerClient {
    /// Creates a client; the pubsub URL is derived from `rpc_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] when the URL is invalid or HTTP client creation fails.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, LedgerError> {
        let rpc_url = rpc_url.into();
        let ws_url = websocket_url_for(&rpc_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|error| LedgerError::Config {
                message: error.to_string(),
            })?;
        Ok(Self {
            client,
            rpc_url,
            ws_url,
            block_height_poll_interval: DEFAULT_BLOCK_HEIGHT_POLL_INTERVAL,
        })
    }

    /// Overrides the derived pubsub URL.
    #[must_use]
    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = ws_url.into();
        self
    }

    /// Sets the block-height check cadence.
    #[must_use]
    pub fn with_block_height_poll_interval(mut self, interval: Duration) -> Self {
        self.block_height_poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Returns the pubsub URL in use.
    #[must_use]
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Returns the current cluster block height.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] on transport or RPC failure.
    pub async fn block_height(&self, commitment: Commitment) -> Result<u64, LedgerError> {
        self.call(
            "getBlockHeight",
            serde_json::json!([{ "commitment": commitment.as_str() }]),
        )
        .await
    }

    /// Issues one JSON-RPC call and decodes its `result`.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|error| LedgerError::Transport {
                method,
                message: error.to_string(),
            })?;
        let response = response
            .error_for_status()
            .map_err(|error| LedgerError::Transport {
                method,
                message: error.to_string(),
            })?;
        let parsed: JsonRpcResponse = response
            .json()
            .await
            .map_err(|error| LedgerError::InvalidResponse {
                method,
                message: error.to_string(),
            })?;
        decode_response(method, parsed)
    }

    /// Polls block height until the window is exceeded.
    ///
    /// Before reporting expiry the signature status is checked once more, so a confirmation
    /// that raced the height bump is not misreported.
    async fn watch_expiry(
        &self,
        signature: &Signature,
        window: &ValidityWindow,
        commitment: Commitment,
    ) -> Result<(), ConfirmationWaitError> {
        loop {
            match self.block_height(commitment).await {
                Ok(block_height) if window.is_expired_at(block_height) => {
                    let status = self
                        .signature_status(signature, &StatusOptions::default())
                        .await
                        .ok()
                        .flatten();
                    if status.is_some_and(|status| status.satisfies(commitment)) {
                        return Ok(());
                    }
                    return Err(ConfirmationWaitError::Expired {
                        last_valid_block_height: window.last_valid_block_height,
                        block_height,
                    });
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::debug!(
                        signature = %signature,
                        error = %error,
                        "block height check failed; retrying"
                    );
                }
            }
            tokio::time::sleep(self.block_height_poll_interval).await;
        }
    }
}

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    /// Result value; `null` and missing both decode to `Value::Null`.
    #[serde(default)]
    result: Value,
    /// Error payload for failed calls.
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    /// JSON-RPC error code.
    code: i64,
    /// Human-readable message.
    message: String,
}

/// Context-wrapped RPC result.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    /// Wrapped value.
    value: T,
}

/// Decodes a JSON-RPC envelope into the expected result type.
fn decode_response<T: DeserializeOwned>(
    method: &'static str,
    response: JsonRpcResponse,
) -> Result<T, LedgerError> {
    if let Some(error) = response.error {
        return Err(LedgerError::Rpc {
            method,
            code: error.code,
            message: error.message,
        });
    }
    serde_json::from_value(response.result).map_err(|error| LedgerError::InvalidResponse {
        method,
        message: error.to_string(),
    })
}

/// Derives the pubsub URL the way Solana clients do: `http`→`ws`, `https`→`wss`, and an
/// explicit port is bumped by one.
///
/// # Errors
///
/// Returns [`LedgerError::Config`] when the URL cannot be parsed or has a non-HTTP scheme.
pub fn websocket_url_for(rpc_url: &str) -> Result<String, LedgerError> {
    let mut url = reqwest::Url::parse(rpc_url).map_err(|error| LedgerError::Config {
        message: format!("invalid rpc url `{rpc_url}`: {error}"),
    })?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(LedgerError::Config {
                message: format!("unsupported rpc url scheme `{other}`"),
            });
        }
    };
    let explicit_port = url.port();
    url.set_scheme(scheme).map_err(|()| LedgerError::Config {
        message: format!("cannot derive websocket url from `{rpc_url}`"),
    })?;
    if let Some(port) = explicit_port {
        url.set_port(Some(port.saturating_add(1)))
            .map_err(|()| LedgerError::Config {
                message: format!("cannot set websocket port for `{rpc_url}`"),
            })?;
    }
    Ok(url.into())
}

#[async_trait]
impl LedgerClient for JsonRpcLedgerClient {
    async fn send_raw_transaction(
        &self,
        tx_bytes: &[u8],
        options: &SendOptions,
    ) -> Result<Signature, LedgerError> {
        #[derive(Debug, Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SendConfig {
            /// Transaction encoding format.
            encoding: &'static str,
            /// Preflight skip flag.
            skip_preflight: bool,
            /// Optional preflight commitment.
            #[serde(skip_serializing_if = "Option::is_none")]
            preflight_commitment: Option<&'static str>,
            /// Optional node-side retry limit.
            #[serde(skip_serializing_if = "Option::is_none")]
            max_retries: Option<usize>,
        }

        const METHOD: &str = "sendTransaction";
        let encoded_tx = BASE64_STANDARD.encode(tx_bytes);
        let config = SendConfig {
            encoding: "base64",
            skip_preflight: options.skip_preflight,
            preflight_commitment: options.preflight_commitment.map(Commitment::as_str),
            max_retries: options.max_retries,
        };
        let signature: String = self
            .call(METHOD, serde_json::json!([encoded_tx, config]))
            .await?;
        Signature::from_str(&signature).map_err(|error| LedgerError::InvalidResponse {
            method: METHOD,
            message: format!("invalid signature `{signature}`: {error}"),
        })
    }

    async fn await_confirmation(
        &self,
        signature: &Signature,
        window: &ValidityWindow,
        commitment: Commitment,
        cancel: &CancellationToken,
    ) -> Result<(), ConfirmationWaitError> {
        let notification = async {
            match ws::wait_for_signature(&self.ws_url, signature, commitment).await {
                Ok(()) => Ok::<(), ConfirmationWaitError>(()),
                Err(error) => {
                    // Expiry stays authoritative through the height watch.
                    tracing::warn!(
                        signature = %signature,
                        error = %error,
                        "signature subscription unavailable; relying on block height watch"
                    );
                    std::future::pending().await
                }
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ConfirmationWaitError::Cancelled),
            result = notification => result,
            result = self.watch_expiry(signature, window, commitment) => result,
        }
    }

    async fn signature_status(
        &self,
        signature: &Signature,
        options: &StatusOptions,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        let response: RpcResponse<Vec<Option<SignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                serde_json::json!([
                    [signature.to_string()],
                    { "searchTransactionHistory": options.search_transaction_history }
                ]),
            )
            .await?;
        Ok(response.value.into_iter().next().flatten())
    }

    async fn transaction_record(
        &self,
        signature: &Signature,
        options: &RecordOptions,
    ) -> Result<Option<TransactionRecord>, LedgerError> {
        #[derive(Debug, Serialize)]
        #[serde(rename_all = "camelCase")]
        struct RecordConfig {
            /// Response encoding.
            encoding: &'static str,
            /// Minimum commitment.
            commitment: &'static str,
            /// Highest decodable version.
            #[serde(skip_serializing_if = "Option::is_none")]
            max_supported_transaction_version: Option<u8>,
        }

        let config = RecordConfig {
            encoding: "json",
            commitment: options.commitment.as_str(),
            max_supported_transaction_version: options.max_supported_transaction_version,
        };
        self.call(
            "getTransaction",
            serde_json::json!([signature.to_string(), config]),
        )
        .await
    }

    async fn simulate_transaction(
        &self,
        tx_bytes: &[u8],
        options: &SimulateOptions,
    ) -> Result<SimulationResult, LedgerError> {
        let encoded_tx = BASE64_STANDARD.encode(tx_bytes);
        let response: RpcResponse<SimulationResult> = self
            .call(
                "simulateTransaction",
                serde_json::json!([
                    encoded_tx,
                    {
                        "encoding": "base64",
                        "replaceRecentBlockhash": options.replace_recent_blockhash,
                        "sigVerify": false,
                        "commitment": options.commitment.as_str(),
                    }
                ]),
            )
            .await?;
        Ok(response.value)
    }
}
