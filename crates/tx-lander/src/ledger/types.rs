//! Ledger client surface: request options, response records, errors, and the client trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_signature::Signature;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::window::ValidityWindow;

/// Cluster commitment level.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Processed by the connected node.
    Processed,
    /// Voted on by a supermajority.
    Confirmed,
    /// Rooted.
    Finalized,
}

impl Commitment {
    /// Returns the JSON-RPC spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

/// Consensus progress reported for one signature.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    /// Seen by the queried node.
    Processed,
    /// Optimistically confirmed.
    Confirmed,
    /// Finalized.
    Finalized,
}

impl ConfirmationStatus {
    /// Returns true when this status is at least as strong as `commitment`.
    #[must_use]
    pub const fn satisfies(self, commitment: Commitment) -> bool {
        match commitment {
            Commitment::Processed => true,
            Commitment::Confirmed => matches!(self, Self::Confirmed | Self::Finalized),
            Commitment::Finalized => matches!(self, Self::Finalized),
        }
    }
}

/// Options for `sendTransaction`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SendOptions {
    /// Skip preflight simulation when true.
    pub skip_preflight: bool,
    /// Optional preflight commitment.
    pub preflight_commitment: Option<Commitment>,
    /// Optional node-side rebroadcast limit.
    pub max_retries: Option<usize>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            skip_preflight: true,
            preflight_commitment: None,
            max_retries: None,
        }
    }
}

/// Options for signature status lookups.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct StatusOptions {
    /// Search the ledger history instead of only the recent status cache.
    pub search_transaction_history: bool,
}

/// Options for finalized record lookups.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RecordOptions {
    /// Minimum commitment of the returned record.
    pub commitment: Commitment,
    /// Highest transaction version the caller can decode.
    pub max_supported_transaction_version: Option<u8>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            commitment: Commitment::Confirmed,
            max_supported_transaction_version: Some(0),
        }
    }
}

/// Options for transaction simulation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SimulateOptions {
    /// Let the node substitute a fresh blockhash before simulating.
    pub replace_recent_blockhash: bool,
    /// Bank commitment used for simulation.
    pub commitment: Commitment,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            replace_recent_blockhash: true,
            commitment: Commitment::Processed,
        }
    }
}

/// Status entry returned by `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    /// Slot the transaction was processed in.
    pub slot: u64,
    /// Confirmations since processing; `None` once rooted.
    pub confirmations: Option<usize>,
    /// Execution error, when the transaction failed on chain.
    #[serde(default)]
    pub err: Option<Value>,
    /// Cluster confirmation status.
    #[serde(default)]
    pub confirmation_status: Option<ConfirmationStatus>,
}

impl SignatureStatus {
    /// Returns true when the status satisfies `commitment`.
    #[must_use]
    pub fn satisfies(&self, commitment: Commitment) -> bool {
        self.confirmation_status
            .is_some_and(|status| status.satisfies(commitment))
    }
}

/// Execution metadata attached to a finalized record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Execution error, when the transaction failed.
    #[serde(default)]
    pub err: Option<Value>,
    /// Fee charged in lamports.
    #[serde(default)]
    pub fee: u64,
    /// Program log output.
    #[serde(default)]
    pub log_messages: Option<Vec<String>>,
    /// Compute units consumed.
    #[serde(default)]
    pub compute_units_consumed: Option<u64>,
}

/// Finalized transaction record returned by `getTransaction`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Slot the transaction landed in.
    pub slot: u64,
    /// Estimated production time, unix seconds.
    #[serde(default)]
    pub block_time: Option<i64>,
    /// Execution metadata.
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    /// Encoded transaction as returned by the node.
    #[serde(default)]
    pub transaction: Value,
    /// Transaction version (`"legacy"` or a number).
    #[serde(default)]
    pub version: Option<Value>,
}

impl TransactionRecord {
    /// Returns the on-chain execution error, if the transaction landed but failed.
    #[must_use]
    pub fn execution_error(&self) -> Option<&Value> {
        self.meta.as_ref().and_then(|meta| meta.err.as_ref())
    }
}

/// Result of `simulateTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Simulation error, when execution would fail.
    #[serde(default)]
    pub err: Option<Value>,
    /// Program logs.
    #[serde(default)]
    pub logs: Option<Vec<String>>,
    /// Compute units consumed.
    #[serde(default)]
    pub units_consumed: Option<u64>,
}

/// Errors surfaced by ledger client backends.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum LedgerError {
    /// Invalid client configuration.
    #[error("ledger client configuration invalid: {message}")]
    Config {
        /// Human-readable description.
        message: String,
    },
    /// Request could not be delivered or its response read.
    #[error("rpc request `{method}` failed: {message}")]
    Transport {
        /// JSON-RPC method.
        method: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Node answered with a JSON-RPC error object.
    #[error("rpc method `{method}` error {code}: {message}")]
    Rpc {
        /// JSON-RPC method.
        method: &'static str,
        /// JSON-RPC error code.
        code: i64,
        /// Node-provided message.
        message: String,
    },
    /// Node answered with a payload that could not be interpreted.
    #[error("rpc method `{method}` returned an invalid response: {message}")]
    InvalidResponse {
        /// JSON-RPC method.
        method: &'static str,
        /// Human-readable description.
        message: String,
    },
    /// Pubsub subscription failed.
    #[error("signature subscription failed: {message}")]
    Subscription {
        /// Human-readable description.
        message: String,
    },
}

/// Failure modes of the event-driven confirmation wait.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ConfirmationWaitError {
    /// Block height passed the validity window before a notification arrived.
    #[error(
        "block height {block_height} exceeded last valid block height {last_valid_block_height}"
    )]
    Expired {
        /// Window ceiling.
        last_valid_block_height: u64,
        /// Observed height.
        block_height: u64,
    },
    /// Wait was cancelled by its owner.
    #[error("confirmation wait cancelled")]
    Cancelled,
    /// Underlying ledger failure.
    #[error("confirmation wait failed: {source}")]
    Ledger {
        /// Ledger error.
        source: LedgerError,
    },
}

/// Network surface consumed by the landing engine.
///
/// Implementations must allow concurrent in-flight calls from several tasks.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submits wire bytes and returns the signature reported by the node.
    async fn send_raw_transaction(
        &self,
        tx_bytes: &[u8],
        options: &SendOptions,
    ) -> Result<Signature, LedgerError>;

    /// Waits for a `commitment` notification for `signature`, bounded by `window`.
    ///
    /// Must return [`ConfirmationWaitError::Expired`] once the cluster block height passes the
    /// window, and should return promptly after `cancel` fires.
    async fn await_confirmation(
        &self,
        signature: &Signature,
        window: &ValidityWindow,
        commitment: Commitment,
        cancel: &CancellationToken,
    ) -> Result<(), ConfirmationWaitError>;

    /// Fetches the current status of one signature.
    async fn signature_status(
        &self,
        signature: &Signature,
        options: &StatusOptions,
    ) -> Result<Option<SignatureStatus>, LedgerError>;

    /// Fetches the finalized record of one signature; `None` while not yet visible.
    async fn transaction_record(
        &self,
        signature: &Signature,
        options: &RecordOptions,
    ) -> Result<Option<TransactionRecord>, LedgerError>;

    /// Simulates wire bytes without submitting them.
    async fn simulate_transaction(
        &self,
        tx_bytes: &[u8],
        options: &SimulateOptions,
    ) -> Result<SimulationResult, LedgerError>;
}
