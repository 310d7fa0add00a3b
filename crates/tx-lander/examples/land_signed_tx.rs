//! Lands one externally signed transaction and prints its outcome.
#![doc(hidden)]

use std::{str::FromStr, sync::Arc};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use solana_hash::Hash;
use thiserror::Error;
use tx_lander::{
    JsonRpcLedgerClient, LandingConfig, LandingError, LandingOutcome, LedgerError,
    SignatureError, SignedTransaction, TxLander, ValidityWindow,
};

#[derive(Debug, Error)]
enum LandSignedTxExampleError {
    #[error("missing environment variable `{name}`")]
    MissingEnv { name: &'static str },
    #[error("invalid value for `{name}`: {message}")]
    InvalidEnv { name: &'static str, message: String },
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Landing(#[from] LandingError),
}

fn init_tracing() {
    if tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_err()
    {
        // Tracing was already initialized.
    }
}

fn required_env(name: &'static str) -> Result<String, LandSignedTxExampleError> {
    std::env::var(name).map_err(|_| LandSignedTxExampleError::MissingEnv { name })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), LandSignedTxExampleError> {
    init_tracing();

    let rpc_url = std::env::var("TX_LANDER_RPC_URL")
        .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_owned());
    let tx_bytes = BASE64_STANDARD
        .decode(required_env("TX_LANDER_SIGNED_TX_BASE64")?)
        .map_err(|error| LandSignedTxExampleError::InvalidEnv {
            name: "TX_LANDER_SIGNED_TX_BASE64",
            message: error.to_string(),
        })?;
    let recent_blockhash = Hash::from_str(&required_env("TX_LANDER_RECENT_BLOCKHASH")?)
        .map_err(|error| LandSignedTxExampleError::InvalidEnv {
            name: "TX_LANDER_RECENT_BLOCKHASH",
            message: error.to_string(),
        })?;
    let last_valid_block_height = required_env("TX_LANDER_LAST_VALID_BLOCK_HEIGHT")?
        .parse::<u64>()
        .map_err(|error| LandSignedTxExampleError::InvalidEnv {
            name: "TX_LANDER_LAST_VALID_BLOCK_HEIGHT",
            message: error.to_string(),
        })?;

    let tx = SignedTransaction::from_bytes(tx_bytes)?;
    let window = ValidityWindow::new(recent_blockhash, last_valid_block_height);
    let client = JsonRpcLedgerClient::new(rpc_url)?;
    let lander = TxLander::new(Arc::new(client)).with_config(LandingConfig::from_env());

    match lander.land(tx, window).await? {
        LandingOutcome::Landed { signature, record } => {
            if let Some(err) = record.execution_error() {
                tracing::error!(signature = %signature, err = %err, "transaction failed on chain");
            } else {
                tracing::info!(signature = %signature, slot = record.slot, "transaction landed");
            }
        }
        LandingOutcome::ConfirmedUnretrievable { signature } => {
            tracing::warn!(signature = %signature, "confirmed, record not yet retrievable");
        }
        LandingOutcome::Expired { signature } => {
            tracing::warn!(signature = %signature, "transaction not confirmed before expiry");
        }
    }
    Ok(())
}
