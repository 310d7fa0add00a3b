//! Detached best-effort resend loop.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::Broadcaster;
use crate::{observer::LandingObserver, transaction::SignedTransaction};

/// Counters reported by a finished resend loop.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ResendReport {
    /// Re-submissions started.
    pub attempts: u64,
    /// Re-submissions that failed.
    pub failures: u64,
}

/// Spawns the resend loop and returns immediately.
///
/// Every `interval` the loop re-submits `tx` unless `cancel` fired. Failures go to `tracing`
/// and `observer` and never stop the loop. No submission starts after cancellation.
///
/// The returned handle resolves to a [`ResendReport`] for diagnostics only; callers may drop
/// it, since cancellation alone stops the loop and the same counters are logged at `debug`
/// when it exits.
pub fn spawn_resender(
    broadcaster: Broadcaster,
    tx: Arc<SignedTransaction>,
    interval: Duration,
    cancel: CancellationToken,
    observer: Arc<dyn LandingObserver>,
) -> JoinHandle<ResendReport> {
    tokio::spawn(async move {
        let mut report = ResendReport::default();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
            if cancel.is_cancelled() {
                break;
            }
            report.attempts = report.attempts.saturating_add(1);
            match broadcaster.submit(&tx).await {
                Ok(_signature) => observer.on_resend(tx.signature(), report.attempts),
                Err(error) => {
                    report.failures = report.failures.saturating_add(1);
                    tracing::warn!(
                        signature = %tx.signature(),
                        attempt = report.attempts,
                        error = %error,
                        "failed to resend transaction"
                    );
                    observer.on_resend_failed(tx.signature(), report.attempts, &error);
                }
            }
        }
        tracing::debug!(
            signature = %tx.signature(),
            attempts = report.attempts,
            failures = report.failures,
            "resend loop stopped"
        );
        report
    })
}
