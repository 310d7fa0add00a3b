//! Ledger network surface consumed by the landing engine.

/// JSON-RPC client implementation.
mod rpc;
/// Request options, records, errors, and the client trait.
mod types;
/// Pubsub signature subscription.
mod ws;

pub use rpc::{JsonRpcLedgerClient, websocket_url_for};
pub use types::{
    Commitment, ConfirmationStatus, ConfirmationWaitError, LedgerClient, LedgerError,
    RecordOptions, SendOptions, SignatureStatus, SimulateOptions, SimulationResult, StatusOptions,
    TransactionMeta, TransactionRecord,
};
