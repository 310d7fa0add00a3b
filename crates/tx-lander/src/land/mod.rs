//! Submit-and-confirm engine.

/// One-shot submission.
mod broadcast;
/// Landing orchestrator.
mod client;
/// Lag-tolerant record retrieval.
mod fetch;
/// Confirmation race.
mod race;
/// Background resend loop.
mod resend;
/// Outcomes and errors.
mod types;

pub use broadcast::Broadcaster;
pub use client::TxLander;
pub use fetch::fetch_record;
pub use race::race_confirmation;
pub use resend::{ResendReport, spawn_resender};
pub use types::{ConfirmationOutcome, ConfirmedBy, LandingError, LandingOutcome};
