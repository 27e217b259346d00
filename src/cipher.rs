//! AES-128 block cipher with a backend fixed at construction.

use core::fmt;

use crate::error::Result;
use crate::intrinsics::{self, Backend};
use crate::key_schedule::RoundKeys;
use crate::utils::Block;

/// An AES-128 encryption context: a derived key schedule plus the backend
/// that runs it.
///
/// The schedule is immutable once built and wiped on drop. `Aes128` holds
/// no interior state, so a shared reference can be used from any number of
/// threads at once.
#[derive(Clone)]
pub struct Aes128 {
    round_keys: RoundKeys,
    backend: Backend,
}

impl Aes128 {
    /// Derives the key schedule and selects the fastest available backend.
    ///
    /// # Example
    ///
    /// ```rust
    /// use aes_blockhash::Aes128;
    ///
    /// let cipher = Aes128::new(&[0u8; 16])?;
    /// let ciphertext = cipher.encrypt_block(&[0u8; 16]);
    /// assert_eq!(ciphertext[0], 0x66);
    /// # Ok::<(), aes_blockhash::Error>(())
    /// ```
    pub fn new(key: &[u8]) -> Result<Self> {
        Ok(Self::from_round_keys(RoundKeys::derive(key)?))
    }

    /// Derives the key schedule and encrypts with the requested backend.
    ///
    /// Fails with [`crate::Error::HardwareUnavailable`] if `Backend::Hardware` is
    /// requested on a CPU without AES instructions.
    pub fn with_backend(key: &[u8], backend: Backend) -> Result<Self> {
        Ok(Self {
            round_keys: RoundKeys::derive_with(key, backend)?,
            backend,
        })
    }

    /// Wraps an already derived schedule, selecting the backend by detection.
    pub fn from_round_keys(round_keys: RoundKeys) -> Self {
        Self {
            round_keys,
            backend: Backend::detect(),
        }
    }

    /// The backend chosen for this cipher.
    #[inline]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The expanded key schedule.
    #[inline]
    pub fn round_keys(&self) -> &RoundKeys {
        &self.round_keys
    }

    /// Encrypts a single 16-byte block.
    #[inline]
    pub fn encrypt_block(&self, block: &Block) -> Block {
        intrinsics::encrypt_block(self.backend, block, &self.round_keys)
    }

    /// Encrypts two independent blocks.
    ///
    /// The result is identical to two `encrypt_block` calls, but both blocks
    /// advance through the ten rounds together so that each round's latency
    /// is paid once for the pair.
    #[inline]
    pub fn encrypt_pair(&self, a: &Block, b: &Block) -> (Block, Block) {
        intrinsics::encrypt_pair(self.backend, a, b, &self.round_keys)
    }

    /// Encrypts two blocks strictly one after the other.
    ///
    /// Exists only as the baseline that benchmarks compare `encrypt_pair`
    /// against. Use `encrypt_pair` instead.
    #[doc(hidden)]
    pub fn encrypt_pair_unpipelined(&self, a: &Block, b: &Block) -> (Block, Block) {
        intrinsics::encrypt_pair_unpipelined(self.backend, a, b, &self.round_keys)
    }
}

impl fmt::Debug for Aes128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aes128")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}
