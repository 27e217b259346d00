//! # aes-blockhash - AES-128 block engine and fixed-key block hash
//!
//! This crate provides a single-block AES-128 engine with hardware
//! acceleration, a pipelined two-block variant, and a Davies–Meyer block hash
//! built on top of it.
//!
//! ## Features
//!
//! - **Hardware Acceleration**: AES-NI on x86-64 and the ARMv8 Cryptography
//!   Extensions on AArch64, detected at runtime
//! - **Portable Fallback**: byte-identical software implementation for other CPUs
//! - **Pipelining**: two-block encryption that overlaps the rounds of both blocks
//! - **Block Hash**: `H(x) = AES-128_K(x) XOR IV` with a fixed public key and IV,
//!   with optional truncation
//! - **Memory Hygiene**: key schedules are zeroized on drop
//!
//! ## Cargo features
//!
//! - `std` (default): runtime CPU detection, and the block hash (`hash`,
//!   `hash_truncated`, `hash_into`, `init`), whose shared key schedule lives
//!   in a `std::sync::OnceLock`. Without `std` the hash functions are not
//!   compiled and hardware support is decided at compile time from the
//!   enabled target features.
//! - `force-software`: never use AES instructions.
//!
//! ## Usage
//!
//! ```rust
//! use aes_blockhash::{derive_schedule, encrypt_block, encrypt_pair, hash_truncated};
//!
//! let schedule = derive_schedule(&[0u8; 16])?;
//! let block = [0u8; 16];
//!
//! let ciphertext = encrypt_block(&block, &schedule);
//! let (first, second) = encrypt_pair(&block, &[1u8; 16], &schedule);
//! assert_eq!(first, ciphertext);
//! assert_ne!(first, second);
//!
//! let tag = hash_truncated(&block, 8)?;
//! assert_eq!(tag.len(), 8);
//! # Ok::<(), aes_blockhash::Error>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

#[cfg(feature = "std")]
mod block_hash;
mod cipher;
mod error;
mod intrinsics;
mod key_schedule;
mod utils;

#[cfg(test)]
mod tests;

#[cfg(feature = "std")]
pub use block_hash::{hash, hash_into, hash_truncated, init, HashOutput, HASH_IV, HASH_KEY};
pub use cipher::Aes128;
pub use error::{Error, Result};
pub use intrinsics::Backend;
pub use key_schedule::{RoundKeys, KEY_SIZE, ROUNDS, SCHEDULE_SIZE};
pub use utils::{Block, BLOCK_SIZE};

/// Expands a 16-byte key into the 11 AES-128 round keys.
///
/// Uses `aeskeygenassist` or `aese` when available, the portable expansion
/// otherwise; the schedule is the same either way.
///
/// Fails with [`Error::InvalidKeyLength`] if `key` is not exactly 16 bytes.
pub fn derive_schedule(key: &[u8]) -> Result<RoundKeys> {
    RoundKeys::derive(key)
}

/// Returns `true` if the CPU supports the hardware AES backend.
///
/// Detection runs once; later calls read a cached flag.
#[inline]
pub fn hardware_acceleration_available() -> bool {
    intrinsics::hardware_available()
}

/// Encrypts one block with the fastest available backend.
///
/// A convenience wrapper that consults the cached CPU detection on each
/// call. Code that encrypts repeatedly under one key should build an
/// [`Aes128`], which fixes its backend once at construction.
///
/// # Example
///
/// ```rust
/// use aes_blockhash::{derive_schedule, encrypt_block};
///
/// let key = [
///     0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
///     0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
/// ];
/// let plaintext = [
///     0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
///     0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
/// ];
///
/// let schedule = derive_schedule(&key)?;
/// let ciphertext = encrypt_block(&plaintext, &schedule);
/// assert_eq!(ciphertext[..4], [0x69, 0xc4, 0xe0, 0xd8]);
/// # Ok::<(), aes_blockhash::Error>(())
/// ```
#[inline]
pub fn encrypt_block(block: &Block, schedule: &RoundKeys) -> Block {
    intrinsics::encrypt_block(Backend::detect(), block, schedule)
}

/// Encrypts two independent blocks with their rounds interleaved.
///
/// Always equal to `(encrypt_block(a, schedule), encrypt_block(b, schedule))`.
/// Like [`encrypt_block`], this picks the backend per call; see
/// [`Aes128::encrypt_pair`] for the construction-time path.
#[inline]
pub fn encrypt_pair(a: &Block, b: &Block, schedule: &RoundKeys) -> (Block, Block) {
    intrinsics::encrypt_pair(Backend::detect(), a, b, schedule)
}

/// Encrypts one block directly from a 16-byte key.
///
/// Round keys are derived as the rounds run and never stored, which suits
/// keys that are used for a single block.
///
/// ```rust
/// use aes_blockhash::{derive_schedule, encrypt_block, encrypt_block_with_key};
///
/// let key = [0x2bu8; 16];
/// let block = [0x6bu8; 16];
/// assert_eq!(
///     encrypt_block_with_key(&block, &key),
///     encrypt_block(&block, &derive_schedule(&key)?)
/// );
/// # Ok::<(), aes_blockhash::Error>(())
/// ```
#[inline]
pub fn encrypt_block_with_key(block: &Block, key: &[u8; KEY_SIZE]) -> Block {
    intrinsics::encrypt_block_with_key(Backend::detect(), block, key)
}

/// Encrypts two blocks directly from a 16-byte key, interleaving the rounds
/// of both blocks with the on-the-fly key expansion.
#[inline]
pub fn encrypt_pair_with_key(a: &Block, b: &Block, key: &[u8; KEY_SIZE]) -> (Block, Block) {
    intrinsics::encrypt_pair_with_key(Backend::detect(), a, b, key)
}

/// Encrypts two blocks from a raw key one after the other.
///
/// Benchmark baseline for [`encrypt_pair_with_key`].
#[doc(hidden)]
pub fn encrypt_pair_with_key_unpipelined(
    a: &Block,
    b: &Block,
    key: &[u8; KEY_SIZE],
) -> (Block, Block) {
    intrinsics::encrypt_pair_with_key_unpipelined(Backend::detect(), a, b, key)
}

/// Encrypts one block with the portable implementation, regardless of CPU.
#[inline]
pub fn software_encrypt_block(block: &Block, schedule: &RoundKeys) -> Block {
    intrinsics::encrypt_block(Backend::Software, block, schedule)
}
