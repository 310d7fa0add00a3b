//! One-shot submission of signed bytes.

use std::sync::Arc;

use solana_signature::Signature;

use crate::{
    ledger::{LedgerClient, LedgerError, SendOptions},
    transaction::SignedTransaction,
};

/// Submits signed bytes through a [`LedgerClient`].
///
/// Re-submitting identical bytes is safe: the cluster de-duplicates by signature.
#[derive(Clone)]
pub struct Broadcaster {
    /// Shared ledger client.
    client: Arc<dyn LedgerClient>,
    /// Options for every submission.
    options: SendOptions,
}

impl Broadcaster {
    /// Creates a broadcaster.
    #[must_use]
    pub fn new(client: Arc<dyn LedgerClient>, options: SendOptions) -> Self {
        Self { client, options }
    }

    /// Performs exactly one network write of `tx`.
    ///
    /// # Errors
    ///
    /// Returns the client's [`LedgerError`] unchanged.
    pub async fn submit(&self, tx: &SignedTransaction) -> Result<Signature, LedgerError> {
        let signature = self
            .client
            .send_raw_transaction(tx.bytes(), &self.options)
            .await?;
        if signature != *tx.signature() {
            tracing::warn!(
                expected = %tx.signature(),
                reported = %signature,
                "node reported a different signature than the fee payer signature"
            );
        }
        tracing::debug!(signature = %signature, "transaction broadcast");
        Ok(signature)
    }
}
