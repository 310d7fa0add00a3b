//! Confirmation race between the pubsub wait and status polling.

use solana_signature::Signature;
use tokio_util::sync::CancellationToken;

use super::{ConfirmationOutcome, ConfirmedBy, LandingError};
use crate::{
    config::LandingConfig,
    ledger::{ConfirmationWaitError, LedgerClient},
    window::ValidityWindow,
};

/// Races the window-bound subscription against status polling.
///
/// The first strategy to resolve wins and the other is dropped. Expiry reported by the
/// subscription becomes [`ConfirmationOutcome::Expired`]; any other failure from either side
/// is returned as [`LandingError::Confirmation`].
///
/// # Errors
///
/// Returns [`LandingError::Confirmation`] on non-expiry failures.
pub async fn race_confirmation(
    client: &dyn LedgerClient,
    signature: &Signature,
    window: &ValidityWindow,
    cancel: &CancellationToken,
    config: &LandingConfig,
) -> Result<ConfirmationOutcome, LandingError> {
    let subscription =
        client.await_confirmation(signature, window, config.confirm_commitment, cancel);
    let polling = poll_until_confirmed(client, signature, cancel, config);

    let outcome = tokio::select! {
        biased;
        result = subscription => match result {
            Ok(()) => ConfirmationOutcome::Confirmed(ConfirmedBy::Subscription),
            Err(ConfirmationWaitError::Expired {
                last_valid_block_height,
                block_height,
            }) => {
                tracing::info!(
                    signature = %signature,
                    last_valid_block_height,
                    block_height,
                    "validity window expired before confirmation"
                );
                ConfirmationOutcome::Expired
            }
            Err(source) => return Err(LandingError::Confirmation { source }),
        },
        result = polling => match result {
            Ok(()) => ConfirmationOutcome::Confirmed(ConfirmedBy::StatusPoll),
            Err(source) => return Err(LandingError::Confirmation { source }),
        },
    };
    if let ConfirmationOutcome::Confirmed(confirmed_by) = outcome {
        tracing::info!(signature = %signature, confirmed_by = ?confirmed_by, "transaction confirmed");
    }
    Ok(outcome)
}

/// Polls the signature status until it reaches the configured commitment.
async fn poll_until_confirmed(
    client: &dyn LedgerClient,
    signature: &Signature,
    cancel: &CancellationToken,
    config: &LandingConfig,
) -> Result<(), ConfirmationWaitError> {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ConfirmationWaitError::Cancelled),
            () = tokio::time::sleep(config.status_poll_interval) => {}
        }
        let status = client
            .signature_status(signature, &config.status_options)
            .await
            .map_err(|source| ConfirmationWaitError::Ledger { source })?;
        if let Some(status) = status {
            if status.err.is_some() {
                tracing::debug!(
                    signature = %signature,
                    err = ?status.err,
                    "transaction processed with an execution error"
                );
            }
            if status.satisfies(config.confirm_commitment) {
                return Ok(());
            }
        }
    }
}
