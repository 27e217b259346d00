//! Fixed-key block hash: `H(x) = AES-128_K(x) XOR IV`.
//!
//! This is a Davies–Meyer-style compression of a single 16-byte block. The
//! key and IV are public constants, so the output is a deterministic,
//! one-way function of the input and carries no secret.
//!
//! The key schedule for `K` is derived on first use and shared read-only by
//! every later call, from any thread.

use core::ops::Deref;
use std::sync::OnceLock;

use zeroize::Zeroize;

use crate::cipher::Aes128;
use crate::error::{Error, Result};
use crate::utils::{validate_output_len, xor_block, Block, BLOCK_SIZE};

/// The fixed hash key (all zero, the same buffer as the IV).
pub const HASH_KEY: [u8; 16] = [0u8; 16];

/// The fixed value XORed into every cipher output.
pub const HASH_IV: Block = [0u8; BLOCK_SIZE];

/// Process-wide cipher keyed with `HASH_KEY`.
static HASH_CIPHER: OnceLock<Result<Aes128>> = OnceLock::new();

/// Returns the cipher stored in `cell`, deriving it if this is the first call.
fn cipher_in(cell: &OnceLock<Result<Aes128>>) -> Result<&Aes128> {
    cell.get_or_init(|| Aes128::new(&HASH_KEY))
        .as_ref()
        .map_err(|_| Error::InitializationFailure)
}

#[inline]
fn hash_cipher() -> Result<&'static Aes128> {
    cipher_in(&HASH_CIPHER)
}

/// Encrypts `input` and XORs `iv` into the result byte by byte.
#[inline]
fn compress(cipher: &Aes128, iv: &Block, input: &Block) -> Block {
    xor_block(&cipher.encrypt_block(input), iv)
}

/// A hash output of 1 to 16 bytes.
///
/// Dereferences to the leading bytes of the full 16-byte compression output.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashOutput {
    bytes: [u8; BLOCK_SIZE],
    len: u8,
}

impl HashOutput {
    /// Keeps the first `len` bytes of `full` and wipes the rest.
    fn truncate(mut full: Block, len: usize) -> Self {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[..len].copy_from_slice(&full[..len]);
        full.zeroize();
        Self {
            bytes,
            len: len as u8,
        }
    }

    /// The output bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl Deref for HashOutput {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for HashOutput {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl core::fmt::Debug for HashOutput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "HashOutput(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Derives the global hash key schedule now instead of on the first hash.
///
/// Calling this before spawning workers keeps the one-time derivation off
/// their hot path. Calling it more than once is harmless.
pub fn init() -> Result<()> {
    hash_cipher().map(|_| ())
}

/// Hashes one block to a full 16-byte output.
///
/// # Example
///
/// ```rust
/// use aes_blockhash::hash;
///
/// let digest = hash(&[0u8; 16])?;
/// assert_eq!(digest, hash(&[0u8; 16])?);
/// # Ok::<(), aes_blockhash::Error>(())
/// ```
pub fn hash(input: &Block) -> Result<Block> {
    Ok(compress(hash_cipher()?, &HASH_IV, input))
}

/// Hashes one block and keeps the first `len` bytes.
///
/// Fails with [`Error::InvalidOutputLength`] unless `1 <= len <= 16`.
pub fn hash_truncated(input: &Block, len: usize) -> Result<HashOutput> {
    validate_output_len(len)?;
    let full = hash(input)?;
    Ok(HashOutput::truncate(full, len))
}

/// Hashes a 16-byte slice into `out`, truncating to `out.len()` bytes.
///
/// `out` is left untouched on error.
pub fn hash_into(input: &[u8], out: &mut [u8]) -> Result<()> {
    let input: &Block = input.try_into().map_err(|_| Error::InvalidInputLength)?;
    validate_output_len(out.len())?;

    let mut full = hash(input)?;
    out.copy_from_slice(&full[..out.len()]);
    full.zeroize();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intrinsics::Backend;
    use std::sync::{Arc, Barrier};
    use std::thread;

    /// AES-128 of the zero block under the zero key.
    const ZERO_DIGEST: [u8; 16] = [
        0x66, 0xe9, 0x4b, 0xd4, 0xef, 0x8a, 0x2c, 0x3b, 0x88, 0x4c, 0xfa, 0x59, 0xca, 0x34, 0x2b,
        0x2e,
    ];

    #[test]
    fn test_zero_block_digest() {
        assert_eq!(hash(&[0u8; 16]).unwrap(), ZERO_DIGEST);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let input = [0x3cu8; 16];
        assert_eq!(hash(&input).unwrap(), hash(&input).unwrap());
        assert_ne!(hash(&input).unwrap(), hash(&[0x3d; 16]).unwrap());
    }

    #[test]
    fn test_truncation_is_prefix() {
        let input = [0x42u8; 16];
        let full = hash(&input).unwrap();
        for len in 1..=16 {
            let truncated = hash_truncated(&input, len).unwrap();
            assert_eq!(truncated.len(), len);
            assert_eq!(&truncated[..], &full[..len]);
        }
    }

    #[test]
    fn test_truncation_bounds() {
        let input = [0u8; 16];
        assert_eq!(hash_truncated(&input, 0), Err(Error::InvalidOutputLength));
        assert_eq!(hash_truncated(&input, 17), Err(Error::InvalidOutputLength));
    }

    #[test]
    fn test_hash_into() {
        let input = [0u8; 16];
        let mut out = [0u8; 5];
        hash_into(&input, &mut out).unwrap();
        assert_eq!(out, ZERO_DIGEST[..5]);

        let mut untouched = [0xaau8; 4];
        assert_eq!(
            hash_into(&input[..15], &mut untouched),
            Err(Error::InvalidInputLength)
        );
        assert_eq!(untouched, [0xaa; 4]);

        let mut empty: [u8; 0] = [];
        assert_eq!(hash_into(&input, &mut empty), Err(Error::InvalidOutputLength));

        let mut too_long = [0xaau8; 17];
        assert_eq!(
            hash_into(&input, &mut too_long),
            Err(Error::InvalidOutputLength)
        );
        assert_eq!(too_long, [0xaa; 17]);
    }

    #[test]
    fn test_iv_is_xored_bytewise() {
        let cipher = Aes128::with_backend(&[0x01; 16], Backend::Software).unwrap();
        let mut iv = [0u8; 16];
        for (i, byte) in iv.iter_mut().enumerate() {
            *byte = 0x10 + i as u8;
        }
        let input = [0x77u8; 16];

        let encrypted = cipher.encrypt_block(&input);
        let output = compress(&cipher, &iv, &input);
        for i in 0..16 {
            assert_eq!(output[i], encrypted[i] ^ iv[i], "byte {i}");
        }

        // Folding every IV byte into the first output byte would leave the
        // other fifteen bytes equal to the raw ciphertext.
        assert_ne!(&output[1..], &encrypted[1..]);
    }

    #[test]
    fn test_debug_renders_hex() {
        let output = HashOutput::truncate(ZERO_DIGEST, 3);
        assert_eq!(format!("{output:?}"), "HashOutput(66e94b)");
    }

    #[test]
    fn test_init_is_idempotent() {
        init().unwrap();
        init().unwrap();
        assert!(HASH_CIPHER.get().is_some());
    }

    #[test]
    fn test_failed_derivation_reports_initialization_failure() {
        let cell: OnceLock<Result<Aes128>> = OnceLock::new();
        assert!(cell.set(Err(Error::InvalidKeyLength)).is_ok());

        assert_eq!(cipher_in(&cell).unwrap_err(), Error::InitializationFailure);
        // The stored failure is not retried or replaced.
        assert_eq!(cipher_in(&cell).unwrap_err(), Error::InitializationFailure);
    }

    #[test]
    fn test_racing_first_use_sees_one_schedule() {
        const THREADS: usize = 8;

        let cell: Arc<OnceLock<Result<Aes128>>> = Arc::new(OnceLock::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let cipher = cipher_in(&cell).unwrap();
                    let address = cipher as *const Aes128 as usize;
                    (address, compress(cipher, &HASH_IV, &[0u8; 16]))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for (address, digest) in &results {
            assert_eq!(*address, results[0].0);
            assert_eq!(*digest, ZERO_DIGEST);
        }
    }
}
