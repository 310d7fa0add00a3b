//! Lag-tolerant finalized record retrieval.

use solana_signature::Signature;

use crate::{
    config::RecordRetryPolicy,
    ledger::{LedgerClient, LedgerError, RecordOptions, TransactionRecord},
};

/// Fetches the record of a confirmed signature, retrying while it is not yet visible.
///
/// An absent record triggers the next attempt after [`RecordRetryPolicy::delay_after`]. When
/// every attempt comes back empty the result is `Ok(None)`.
///
/// # Errors
///
/// Returns the client's [`LedgerError`] when a lookup itself fails.
pub async fn fetch_record(
    client: &dyn LedgerClient,
    signature: &Signature,
    options: &RecordOptions,
    policy: RecordRetryPolicy,
) -> Result<Option<TransactionRecord>, LedgerError> {
    let policy = policy.normalized();
    for attempt in 1..=policy.max_attempts {
        if let Some(record) = client.transaction_record(signature, options).await? {
            return Ok(Some(record));
        }
        if attempt < policy.max_attempts {
            let delay = policy.delay_after(attempt);
            tracing::debug!(
                signature = %signature,
                attempt,
                delay = ?delay,
                "confirmed record not visible yet"
            );
            tokio::time::sleep(delay).await;
        }
    }
    tracing::warn!(
        signature = %signature,
        attempts = policy.max_attempts,
        "confirmed record still not visible; giving up"
    );
    Ok(None)
}
