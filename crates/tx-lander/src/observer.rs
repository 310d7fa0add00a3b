//! Observability hooks for the landing engine.

use solana_signature::Signature;

use crate::{land::LandingOutcome, ledger::LedgerError};

/// Extension point for landing lifecycle events.
///
/// Callbacks run inline on the landing tasks. Keep them non-blocking; forward expensive work
/// to your own worker.
pub trait LandingObserver: Send + Sync + 'static {
    /// Called after each background re-submission that the node accepted.
    fn on_resend(&self, _signature: &Signature, _attempt: u64) {}

    /// Called when a background re-submission fails. The resend loop keeps going.
    fn on_resend_failed(&self, _signature: &Signature, _attempt: u64, _error: &LedgerError) {}

    /// Called once per landing with its terminal outcome.
    fn on_outcome(&self, _signature: &Signature, _outcome: &LandingOutcome) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LandingObserver for NoopObserver {}
