#![forbid(unsafe_code)]

//! Submit-and-confirm engine for signed, blockhash-bounded Solana transactions.
//!
//! [`TxLander`] broadcasts signed bytes, keeps re-sending them in the background, races a
//! window-bound pubsub wait against status polling, and fetches the finalized record while
//! tolerating RPC replication lag. Window expiry is an outcome, not an error.

/// Engine tuning and environment loading.
pub mod config;
/// Submit-and-confirm engine.
pub mod land;
/// Ledger client trait and JSON-RPC implementation.
pub mod ledger;
/// Lifecycle observer hooks.
pub mod observer;
/// Quote, build, and land pipeline.
pub mod swap;
/// Signed transaction payloads.
pub mod transaction;
/// Validity window.
pub mod window;

pub use config::{LandingConfig, RecordRetryPolicy};
pub use land::{
    Broadcaster, ConfirmationOutcome, ConfirmedBy, LandingError, LandingOutcome, ResendReport,
    TxLander,
};
pub use ledger::{
    Commitment, ConfirmationWaitError, JsonRpcLedgerClient, LedgerClient, LedgerError,
    TransactionRecord,
};
pub use observer::{LandingObserver, NoopObserver};
pub use swap::{
    CollaboratorError, QuoteProvider, QuoteRequest, RouteQuote, SignedSwap, SwapError,
    SwapPipeline, SwapReport, SwapTransactionBuilder,
};
pub use transaction::{SignatureError, SignedTransaction};
pub use window::ValidityWindow;
