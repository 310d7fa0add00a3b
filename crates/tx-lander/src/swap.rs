//! Quote → build/sign → land pipeline over external quoting and signing collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::{
    land::{LandingError, LandingOutcome, TxLander},
    transaction::SignedTransaction,
    window::ValidityWindow,
};

/// Parameters of one route request.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QuoteRequest {
    /// Mint debited by the swap.
    pub input_mint: String,
    /// Mint credited by the swap.
    pub output_mint: String,
    /// Input amount in base units.
    pub amount: u64,
    /// Maximum slippage in basis points.
    pub slippage_bps: u16,
}

/// Priced route returned by a [`QuoteProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuote {
    /// Input amount in base units.
    pub in_amount: u64,
    /// Expected output amount in base units.
    pub out_amount: u64,
    /// Provider payload, handed back unchanged to the builder.
    pub raw: Value,
}

/// Signed swap transaction plus its validity window.
#[derive(Debug, Clone)]
pub struct SignedSwap {
    /// Signed transaction.
    pub transaction: SignedTransaction,
    /// Window the transaction was built against.
    pub window: ValidityWindow,
}

/// Collaborator errors, reported as text so implementations stay free to choose their types.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{message}")]
pub struct CollaboratorError {
    /// Human-readable description.
    pub message: String,
}

impl CollaboratorError {
    /// Creates a collaborator error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Source of priced routes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Returns a route for `request`.
    async fn quote(&self, request: &QuoteRequest) -> Result<RouteQuote, CollaboratorError>;
}

/// Turns a route into a signed transaction.
#[async_trait]
pub trait SwapTransactionBuilder: Send + Sync {
    /// Builds and signs the swap for `quote`.
    async fn build_signed(&self, quote: &RouteQuote) -> Result<SignedSwap, CollaboratorError>;
}

/// Swap pipeline errors.
#[derive(Debug, Error)]
pub enum SwapError {
    /// Quote lookup failed.
    #[error("failed to fetch quote: {source}")]
    Quote {
        /// Provider error.
        source: CollaboratorError,
    },
    /// Provider returned a route with no output.
    #[error("quote for {input_mint} -> {output_mint} has no output amount")]
    EmptyQuote {
        /// Requested input mint.
        input_mint: String,
        /// Requested output mint.
        output_mint: String,
    },
    /// Building or signing failed.
    #[error("failed to build swap transaction: {source}")]
    Build {
        /// Builder error.
        source: CollaboratorError,
    },
    /// Landing failed.
    #[error(transparent)]
    Landing(#[from] LandingError),
}

/// Result of an executed swap.
#[derive(Debug, Clone)]
pub struct SwapReport {
    /// Route that was executed.
    pub quote: RouteQuote,
    /// Landing outcome.
    pub outcome: LandingOutcome,
}

/// Glue between a quote provider, a transaction builder, and a [`TxLander`].
pub struct SwapPipeline {
    /// Route source.
    quotes: Arc<dyn QuoteProvider>,
    /// Transaction builder/signer.
    builder: Arc<dyn SwapTransactionBuilder>,
    /// Landing engine.
    lander: TxLander,
    /// Simulate each swap before its first broadcast.
    simulate: bool,
}

impl SwapPipeline {
    /// Creates a pipeline.
    ///
    /// Swaps are simulated before the first broadcast even when `lander` has simulation
    /// disabled; see [`SwapPipeline::with_simulation`].
    #[must_use]
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        builder: Arc<dyn SwapTransactionBuilder>,
        lander: TxLander,
    ) -> Self {
        Self {
            quotes,
            builder,
            lander,
            simulate: true,
        }
    }

    /// Enables or disables preflight simulation of built swaps.
    #[must_use]
    pub const fn with_simulation(mut self, enabled: bool) -> Self {
        self.simulate = enabled;
        self
    }

    /// Fetches a route without executing it.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Quote`] or [`SwapError::EmptyQuote`].
    pub async fn quote_only(&self, request: &QuoteRequest) -> Result<RouteQuote, SwapError> {
        let quote = self
            .quotes
            .quote(request)
            .await
            .map_err(|source| SwapError::Quote { source })?;
        if quote.out_amount == 0 {
            return Err(SwapError::EmptyQuote {
                input_mint: request.input_mint.clone(),
                output_mint: request.output_mint.clone(),
            });
        }
        tracing::info!(
            input_mint = %request.input_mint,
            output_mint = %request.output_mint,
            in_amount = quote.in_amount,
            out_amount = quote.out_amount,
            "quote received"
        );
        Ok(quote)
    }

    /// Quotes, builds, signs, and lands one swap.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError`] when any stage fails, including a rejected simulation. An expired window is reported through
    /// [`SwapReport::outcome`], not as an error.
    pub async fn execute(&self, request: &QuoteRequest) -> Result<SwapReport, SwapError> {
        let quote = self.quote_only(request).await?;
        let swap = self
            .builder
            .build_signed(&quote)
            .await
            .map_err(|source| SwapError::Build { source })?;
        let signature = *swap.transaction.signature();
        tracing::info!(
            signature = %signature,
            last_valid_block_height = swap.window.last_valid_block_height,
            "swap transaction signed"
        );
        // The lander simulates on its own when configured to.
        if self.simulate && !self.lander.config().simulate_before_send {
            self.lander.simulate(&swap.transaction).await?;
        }
        let outcome = self.lander.land(swap.transaction, swap.window).await?;
        match &outcome {
            LandingOutcome::Landed { record, .. } if record.execution_error().is_some() => {
                tracing::warn!(signature = %signature, "swap landed but failed on chain");
            }
            LandingOutcome::Landed { .. } | LandingOutcome::ConfirmedUnretrievable { .. } => {
                tracing::info!(signature = %signature, "swap confirmed");
            }
            LandingOutcome::Expired { .. } => {
                tracing::info!(signature = %signature, "swap not confirmed before expiry");
            }
        }
        Ok(SwapReport { quote, outcome })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use solana_hash::Hash;
    use solana_signature::Signature;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::ledger::{
        Commitment, ConfirmationWaitError, LedgerClient, LedgerError, RecordOptions,
        SendOptions, SignatureStatus, SimulateOptions, SimulationResult, StatusOptions,
        TransactionRecord,
    };

    /// Provider with a fixed answer.
    struct FixedQuotes {
        /// Answer to return.
        result: Result<RouteQuote, CollaboratorError>,
    }

    #[async_trait]
    impl QuoteProvider for FixedQuotes {
        async fn quote(&self, _request: &QuoteRequest) -> Result<RouteQuote, CollaboratorError> {
            self.result.clone()
        }
    }

    /// Builder that counts calls and signs nothing.
    struct FixedBuilder {
        /// Number of build calls.
        calls: Mutex<u64>,
    }

    #[async_trait]
    impl SwapTransactionBuilder for FixedBuilder {
        async fn build_signed(&self, _quote: &RouteQuote) -> Result<SignedSwap, CollaboratorError> {
            if let Ok(mut calls) = self.calls.lock() {
                *calls = calls.saturating_add(1);
            }
            Ok(SignedSwap {
                transaction: SignedTransaction::from_parts(
                    vec![7_u8; 8],
                    Signature::from([6_u8; 64]),
                ),
                window: ValidityWindow::new(Hash::new_from_array([2_u8; 32]), 500),
            })
        }
    }

    /// Ledger that confirms immediately and returns one record.
    #[derive(Default)]
    struct InstantLedger {
        /// Simulation error to report, if any.
        simulation_err: Option<Value>,
        /// Number of simulations.
        simulations: Mutex<u64>,
        /// Number of sends.
        sends: Mutex<u64>,
    }

    #[async_trait]
    impl LedgerClient for InstantLedger {
        async fn send_raw_transaction(
            &self,
            _tx_bytes: &[u8],
            _options: &SendOptions,
        ) -> Result<Signature, LedgerError> {
            if let Ok(mut sends) = self.sends.lock() {
                *sends = sends.saturating_add(1);
            }
            Ok(Signature::from([6_u8; 64]))
        }

        async fn await_confirmation(
            &self,
            _signature: &Signature,
            _window: &ValidityWindow,
            _commitment: Commitment,
            _cancel: &CancellationToken,
        ) -> Result<(), ConfirmationWaitError> {
            Ok(())
        }

        async fn signature_status(
            &self,
            _signature: &Signature,
            _options: &StatusOptions,
        ) -> Result<Option<SignatureStatus>, LedgerError> {
            Ok(None)
        }

        async fn transaction_record(
            &self,
            _signature: &Signature,
            _options: &RecordOptions,
        ) -> Result<Option<TransactionRecord>, LedgerError> {
            Ok(Some(TransactionRecord {
                slot: 9,
                block_time: None,
                meta: None,
                transaction: Value::Null,
                version: None,
            }))
        }

        async fn simulate_transaction(
            &self,
            _tx_bytes: &[u8],
            _options: &SimulateOptions,
        ) -> Result<SimulationResult, LedgerError> {
            if let Ok(mut simulations) = self.simulations.lock() {
                *simulations = simulations.saturating_add(1);
            }
            Ok(SimulationResult {
                err: self.simulation_err.clone(),
                ..SimulationResult::default()
            })
        }
    }

    fn request() -> QuoteRequest {
        QuoteRequest {
            input_mint: "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB".to_owned(),
            output_mint: "So11111111111111111111111111111111111111112".to_owned(),
            amount: 100_000_000,
            slippage_bps: 100,
        }
    }

    fn quote(out_amount: u64) -> RouteQuote {
        RouteQuote {
            in_amount: 100_000_000,
            out_amount,
            raw: serde_json::json!({ "routePlan": [] }),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn execute_lands_quoted_swap() {
        let builder = Arc::new(FixedBuilder {
            calls: Mutex::new(0),
        });
        let pipeline = SwapPipeline::new(
            Arc::new(FixedQuotes {
                result: Ok(quote(640_000)),
            }),
            builder.clone(),
            TxLander::new(Arc::new(InstantLedger::default())),
        );

        let report = pipeline.execute(&request()).await;

        assert!(report.is_ok());
        if let Ok(report) = report {
            assert_eq!(report.quote.out_amount, 640_000);
            assert_eq!(report.outcome.record().map(|record| record.slot), Some(9));
        }
        let calls = builder.calls.lock().map(|calls| *calls).unwrap_or_default();
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn empty_quote_stops_before_building() {
        let builder = Arc::new(FixedBuilder {
            calls: Mutex::new(0),
        });
        let pipeline = SwapPipeline::new(
            Arc::new(FixedQuotes {
                result: Ok(quote(0)),
            }),
            builder.clone(),
            TxLander::new(Arc::new(InstantLedger::default())),
        );

        let result = pipeline.execute(&request()).await;

        assert!(matches!(result, Err(SwapError::EmptyQuote { .. })));
        let calls = builder.calls.lock().map(|calls| *calls).unwrap_or_default();
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn quote_failure_is_typed() {
        let pipeline = SwapPipeline::new(
            Arc::new(FixedQuotes {
                result: Err(CollaboratorError::new("rate limited")),
            }),
            Arc::new(FixedBuilder {
                calls: Mutex::new(0),
            }),
            TxLander::new(Arc::new(InstantLedger::default())),
        );

        let result = pipeline.quote_only(&request()).await;

        assert!(matches!(
            result,
            Err(SwapError::Quote { ref source }) if source.message == "rate limited"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn execute_simulates_before_landing_by_default() {
        let ledger = Arc::new(InstantLedger::default());
        let pipeline = SwapPipeline::new(
            Arc::new(FixedQuotes {
                result: Ok(quote(640_000)),
            }),
            Arc::new(FixedBuilder {
                calls: Mutex::new(0),
            }),
            TxLander::new(ledger.clone()),
        );

        let report = pipeline.execute(&request()).await;

        assert!(report.is_ok());
        let simulations = ledger
            .simulations
            .lock()
            .map(|simulations| *simulations)
            .unwrap_or_default();
        assert_eq!(simulations, 1);
    }

    #[tokio::test]
    async fn rejected_swap_simulation_is_never_broadcast() {
        let ledger = Arc::new(InstantLedger {
            simulation_err: Some(serde_json::json!({ "InstructionError": [2, { "Custom": 6001 }] })),
            ..InstantLedger::default()
        });
        let pipeline = SwapPipeline::new(
            Arc::new(FixedQuotes {
                result: Ok(quote(640_000)),
            }),
            Arc::new(FixedBuilder {
                calls: Mutex::new(0),
            }),
            TxLander::new(ledger.clone()),
        );

        let result = pipeline.execute(&request()).await;

        assert!(matches!(
            result,
            Err(SwapError::Landing(LandingError::SimulationRejected { .. }))
        ));
        let sends = ledger.sends.lock().map(|sends| *sends).unwrap_or_default();
        assert_eq!(sends, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_swap_simulation_is_skipped() {
        let ledger = Arc::new(InstantLedger {
            simulation_err: Some(serde_json::json!("AccountNotFound")),
            ..InstantLedger::default()
        });
        let pipeline = SwapPipeline::new(
            Arc::new(FixedQuotes {
                result: Ok(quote(640_000)),
            }),
            Arc::new(FixedBuilder {
                calls: Mutex::new(0),
            }),
            TxLander::new(ledger.clone()),
        )
        .with_simulation(false);

        let report = pipeline.execute(&request()).await;

        assert!(report.is_ok());
        let simulations = ledger
            .simulations
            .lock()
            .map(|simulations| *simulations)
            .unwrap_or_default();
        assert_eq!(simulations, 0);
    }
}
