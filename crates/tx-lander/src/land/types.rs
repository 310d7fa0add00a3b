//! Landing outcomes and errors.

use serde_json::Value;
use solana_signature::Signature;
use thiserror::Error;

use crate::{
    ledger::{ConfirmationWaitError, LedgerError, TransactionRecord},
    transaction::SignatureError,
};

/// Strategy that observed the confirmation first.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConfirmedBy {
    /// Pubsub notification bound to the validity window.
    Subscription,
    /// Signature status polling.
    StatusPoll,
}

/// Terminal result of the confirmation race.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConfirmationOutcome {
    /// The cluster confirmed the signature; the record still has to be fetched.
    Confirmed(ConfirmedBy),
    /// The validity window passed first. The transaction almost certainly did not land.
    Expired,
}

/// Terminal result of one landing.
#[derive(Debug, Clone, PartialEq)]
pub enum LandingOutcome {
    /// Confirmed and the finalized record was retrieved.
    ///
    /// The record may still carry an execution error in `meta.err`.
    Landed {
        /// Signature id.
        signature: Signature,
        /// Finalized record.
        record: Box<TransactionRecord>,
    },
    /// Confirmed by consensus, but the record was not visible within the retry budget.
    ConfirmedUnretrievable {
        /// Signature id.
        signature: Signature,
    },
    /// The validity window expired before any confirmation.
    Expired {
        /// Signature id.
        signature: Signature,
    },
}

impl LandingOutcome {
    /// Returns the signature id.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        match self {
            Self::Landed { signature, .. }
            | Self::ConfirmedUnretrievable { signature }
            | Self::Expired { signature } => signature,
        }
    }

    /// Returns true when consensus confirmed the transaction.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(
            self,
            Self::Landed { .. } | Self::ConfirmedUnretrievable { .. }
        )
    }

    /// Returns the finalized record when one was retrieved.
    #[must_use]
    pub fn record(&self) -> Option<&TransactionRecord> {
        match self {
            Self::Landed { record, .. } => Some(&**record),
            Self::ConfirmedUnretrievable { .. } | Self::Expired { .. } => None,
        }
    }

    /// Consumes the outcome into its finalized record, if any.
    #[must_use]
    pub fn into_record(self) -> Option<TransactionRecord> {
        match self {
            Self::Landed { record, .. } => Some(*record),
            Self::ConfirmedUnretrievable { .. } | Self::Expired { .. } => None,
        }
    }
}

/// Landing-level errors.
///
/// Expiry and an unretrievable record are outcomes, not errors.
#[derive(Debug, Error)]
pub enum LandingError {
    /// Signed bytes could not be turned into a signed transaction.
    #[error("invalid signed transaction: {source}")]
    Signature {
        /// Decode failure.
        source: SignatureError,
    },
    /// Preflight simulation request failed.
    #[error("simulation request failed: {source}")]
    Simulation {
        /// Ledger error.
        source: LedgerError,
    },
    /// Preflight simulation reported an execution error.
    #[error("simulation rejected transaction: {err}")]
    SimulationRejected {
        /// Execution error reported by the node.
        err: Value,
        /// Program logs from the simulation.
        logs: Vec<String>,
    },
    /// First broadcast failed.
    #[error("broadcast failed: {source}")]
    Broadcast {
        /// Ledger error.
        source: LedgerError,
    },
    /// Confirmation detection failed for a reason other than expiry.
    #[error("confirmation failed: {source}")]
    Confirmation {
        /// Wait error.
        source: ConfirmationWaitError,
    },
    /// Record lookup failed after confirmation.
    #[error("record lookup failed: {source}")]
    Record {
        /// Ledger error.
        source: LedgerError,
    },
}
