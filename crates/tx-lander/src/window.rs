//! Blockhash-bounded validity window of a signed transaction.

use solana_hash::Hash;

/// Reference blockhash plus the last block height at which the transaction can still land.
///
/// Cluster block height never decreases, so once it passes `last_valid_block_height` the
/// window is expired for good.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ValidityWindow {
    /// Recent blockhash the transaction was signed against.
    pub recent_blockhash: Hash,
    /// Last block height at which the blockhash is still accepted.
    pub last_valid_block_height: u64,
}

impl ValidityWindow {
    /// Creates a validity window.
    #[must_use]
    pub const fn new(recent_blockhash: Hash, last_valid_block_height: u64) -> Self {
        Self {
            recent_blockhash,
            last_valid_block_height,
        }
    }

    /// Returns true when `block_height` is past the window.
    #[must_use]
    pub const fn is_expired_at(&self, block_height: u64) -> bool {
        block_height > self.last_valid_block_height
    }
}
