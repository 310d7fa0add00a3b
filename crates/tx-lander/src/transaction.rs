//! Signed transaction payloads and signature-id derivation.

use std::fmt;

use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use thiserror::Error;

/// Errors raised while deriving a [`SignedTransaction`] from caller input.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Bytes are not a bincode-encoded `VersionedTransaction`.
    #[error("failed to decode signed transaction bytes: {source}")]
    Decode {
        /// Bincode decode error.
        source: Box<bincode::ErrorKind>,
    },
    /// Transaction could not be encoded to wire bytes.
    #[error("failed to encode transaction: {source}")]
    Encode {
        /// Bincode encode error.
        source: Box<bincode::ErrorKind>,
    },
    /// Transaction carries no fee-payer signature.
    #[error("transaction is missing its fee payer signature")]
    MissingSignature,
}

/// Immutable signed transaction wire bytes with their derived signature id.
///
/// The signature id is the first (fee payer) signature. It is stable for the lifetime of the
/// payload and is used for every status and record query after submission.
#[derive(Clone, Eq, PartialEq)]
pub struct SignedTransaction {
    /// Wire-format transaction bytes.
    bytes: Vec<u8>,
    /// Fee payer signature.
    signature: Signature,
}

impl SignedTransaction {
    /// Decodes wire bytes and derives the signature id.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Decode`] for malformed bytes and
    /// [`SignatureError::MissingSignature`] when the fee payer did not sign.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SignatureError> {
        let tx: VersionedTransaction =
            bincode::deserialize(&bytes).map_err(|source| SignatureError::Decode { source })?;
        let signature = fee_payer_signature(&tx)?;
        Ok(Self { bytes, signature })
    }

    /// Encodes an already-signed transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingSignature`] when the fee payer did not sign, or
    /// [`SignatureError::Encode`] when serialization fails.
    pub fn from_transaction(tx: &VersionedTransaction) -> Result<Self, SignatureError> {
        let signature = fee_payer_signature(tx)?;
        let bytes = bincode::serialize(tx).map_err(|source| SignatureError::Encode { source })?;
        Ok(Self { bytes, signature })
    }

    /// Wraps bytes whose signature id is already known to the caller.
    ///
    /// The bytes are not decoded; callers are responsible for the pairing.
    #[must_use]
    pub const fn from_parts(bytes: Vec<u8>, signature: Signature) -> Self {
        Self { bytes, signature }
    }

    /// Returns the wire bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the signature id.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedTransaction")
            .field("signature", &self.signature)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Returns the first signature, rejecting unsigned placeholders.
fn fee_payer_signature(tx: &VersionedTransaction) -> Result<Signature, SignatureError> {
    match tx.signatures.first() {
        Some(signature) if *signature != Signature::default() => Ok(*signature),
        _ => Err(SignatureError::MissingSignature),
    }
}
