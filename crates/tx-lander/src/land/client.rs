//! Landing orchestrator.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{
    Broadcaster, ConfirmationOutcome, LandingError, LandingOutcome, fetch_record,
    race_confirmation, spawn_resender,
};
use crate::{
    config::LandingConfig,
    ledger::{LedgerClient, TransactionRecord},
    observer::{LandingObserver, NoopObserver},
    transaction::SignedTransaction,
    window::ValidityWindow,
};

/// Sends a signed transaction and follows it until a terminal outcome is known.
///
/// One call to [`TxLander::land`] owns one cancellation token and one validity window. It
/// broadcasts once, then runs the resend loop and the confirmation race side by side, cancels
/// both when the race settles, and finally fetches the finalized record.
pub struct TxLander {
    /// Shared ledger client.
    client: Arc<dyn LedgerClient>,
    /// Engine tuning.
    config: LandingConfig,
    /// Lifecycle sink.
    observer: Arc<dyn LandingObserver>,
}

impl TxLander {
    /// Creates a lander with default tuning.
    #[must_use]
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            client,
            config: LandingConfig::default(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Sets engine tuning.
    #[must_use]
    pub fn with_config(mut self, config: LandingConfig) -> Self {
        self.config = config.normalized();
        self
    }

    /// Sets the lifecycle observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LandingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the active tuning.
    #[must_use]
    pub const fn config(&self) -> &LandingConfig {
        &self.config
    }

    /// Lands `tx` and returns its finalized record.
    ///
    /// `None` means either the window expired or the transaction was confirmed but its record
    /// stayed invisible; use [`TxLander::land`] to tell them apart.
    ///
    /// # Errors
    ///
    /// See [`TxLander::land`].
    pub async fn send_and_confirm(
        &self,
        tx: SignedTransaction,
        window: ValidityWindow,
    ) -> Result<Option<TransactionRecord>, LandingError> {
        Ok(self.land(tx, window).await?.into_record())
    }

    /// Decodes signed wire bytes and lands them.
    ///
    /// # Errors
    ///
    /// Returns [`LandingError::Signature`] when the bytes carry no usable signature, otherwise
    /// see [`TxLander::land`].
    pub async fn send_and_confirm_bytes(
        &self,
        tx_bytes: Vec<u8>,
        window: ValidityWindow,
    ) -> Result<Option<TransactionRecord>, LandingError> {
        let tx = SignedTransaction::from_bytes(tx_bytes)
            .map_err(|source| LandingError::Signature { source })?;
        self.send_and_confirm(tx, window).await
    }

    /// Lands `tx` and reports the detailed outcome.
    ///
    /// # Errors
    ///
    /// Returns [`LandingError`] when simulation rejects the transaction, the first broadcast
    /// fails, confirmation detection fails for a reason other than expiry, or a record lookup
    /// fails.
    pub async fn land(
        &self,
        tx: SignedTransaction,
        window: ValidityWindow,
    ) -> Result<LandingOutcome, LandingError> {
        let tx = Arc::new(tx);
        let signature = *tx.signature();

        if self.config.simulate_before_send {
            self.simulate(&tx).await?;
        }

        let broadcaster = Broadcaster::new(self.client.clone(), self.config.send_options.clone());
        broadcaster
            .submit(&tx)
            .await
            .map_err(|source| LandingError::Broadcast { source })?;

        let cancel = CancellationToken::new();
        let race = {
            // Cancels the resend loop on every exit, including when this future is dropped.
            let _cancel_on_exit = cancel.clone().drop_guard();
            // Diagnostics only; the drop guard stops the loop.
            let _resender = spawn_resender(
                broadcaster,
                tx.clone(),
                self.config.resend_interval,
                cancel.clone(),
                self.observer.clone(),
            );
            race_confirmation(
                self.client.as_ref(),
                &signature,
                &window,
                &cancel,
                &self.config,
            )
            .await
        };

        let outcome = match race? {
            ConfirmationOutcome::Expired => LandingOutcome::Expired { signature },
            ConfirmationOutcome::Confirmed(_) => {
                let record = fetch_record(
                    self.client.as_ref(),
                    &signature,
                    &self.config.record_options,
                    self.config.record_retry,
                )
                .await
                .map_err(|source| LandingError::Record { source })?;
                match record {
                    Some(record) => {
                        if let Some(err) = record.execution_error() {
                            tracing::warn!(
                                signature = %signature,
                                slot = record.slot,
                                err = %err,
                                "transaction landed with an execution error"
                            );
                        }
                        LandingOutcome::Landed {
                            signature,
                            record: Box::new(record),
                        }
                    }
                    None => LandingOutcome::ConfirmedUnretrievable { signature },
                }
            }
        };
        self.observer.on_outcome(&signature, &outcome);
        Ok(outcome)
    }

    /// Runs preflight simulation and rejects transactions that would fail.
    pub(crate) async fn simulate(&self, tx: &SignedTransaction) -> Result<(), LandingError> {
        let result = self
            .client
            .simulate_transaction(tx.bytes(), &self.config.simulate_options)
            .await
            .map_err(|source| LandingError::Simulation { source })?;
        if let Some(err) = result.err {
            let logs = result.logs.unwrap_or_default();
            tracing::warn!(
                signature = %tx.signature(),
                err = %err,
                logs = ?logs,
                "simulation rejected transaction"
            );
            return Err(LandingError::SimulationRejected { err, logs });
        }
        tracing::debug!(
            signature = %tx.signature(),
            units_consumed = ?result.units_consumed,
            "simulation passed"
        );
        Ok(())
    }
}
