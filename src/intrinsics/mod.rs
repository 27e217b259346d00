//! Backend selection and dispatch for AES-128 block encryption.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::key_schedule::{self, RoundKeys, KEY_SIZE, ROUNDS};
use crate::utils::Block;

/// CPU capability detection cache.
static CPU_FEATURES: AtomicU8 = AtomicU8::new(0);

/// Feature detection states.
const FEATURES_UNKNOWN: u8 = 0;
const FEATURES_HARDWARE: u8 = 1;
const FEATURES_SOFTWARE: u8 = 2;

/// Initialize CPU feature detection (called once).
#[cold]
fn init_cpu_features() -> u8 {
    #[cfg(all(target_arch = "aarch64", not(feature = "force-software")))]
    {
        #[cfg(feature = "std")]
        {
            if std::arch::is_aarch64_feature_detected!("neon")
                && std::arch::is_aarch64_feature_detected!("aes")
            {
                return FEATURES_HARDWARE;
            }
        }
        #[cfg(not(feature = "std"))]
        {
            // In no-std mode, compile-time detection only
            #[cfg(all(target_feature = "neon", target_feature = "aes"))]
            {
                return FEATURES_HARDWARE;
            }
        }
    }

    #[cfg(all(target_arch = "x86_64", not(feature = "force-software")))]
    {
        #[cfg(feature = "std")]
        {
            if std::arch::is_x86_feature_detected!("aes")
                && std::arch::is_x86_feature_detected!("sse2")
            {
                return FEATURES_HARDWARE;
            }
        }
        #[cfg(not(feature = "std"))]
        {
            #[cfg(all(target_feature = "aes", target_feature = "sse2"))]
            {
                return FEATURES_HARDWARE;
            }
        }
    }

    FEATURES_SOFTWARE
}

/// Get CPU features with caching.
#[inline]
fn get_cpu_features() -> u8 {
    let features = CPU_FEATURES.load(Ordering::Relaxed);
    if features == FEATURES_UNKNOWN {
        let detected = init_cpu_features();
        CPU_FEATURES.store(detected, Ordering::Relaxed);
        detected
    } else {
        features
    }
}

/// Returns `true` if this CPU can run the hardware AES backend.
#[inline]
pub fn hardware_available() -> bool {
    get_cpu_features() == FEATURES_HARDWARE
}

/// Implementation strategy for block encryption.
///
/// A backend is chosen once, when a cipher is constructed, and every
/// encryption through that cipher uses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// AES-NI on x86-64, or the ARMv8 Cryptography Extensions on AArch64.
    Hardware,
    /// Portable table-based implementation.
    Software,
}

impl Backend {
    /// Picks the hardware backend when the CPU supports it.
    pub fn detect() -> Self {
        if hardware_available() {
            Backend::Hardware
        } else {
            Backend::Software
        }
    }

    /// Whether this backend can run on the current CPU.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Hardware => hardware_available(),
            Backend::Software => true,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(target_arch = "x86_64")]
            Backend::Hardware => write!(f, "hardware (AES-NI)"),
            #[cfg(target_arch = "aarch64")]
            Backend::Hardware => write!(f, "hardware (ARMv8 AES)"),
            #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
            Backend::Hardware => write!(f, "hardware"),
            Backend::Software => write!(f, "software"),
        }
    }
}

/// Encrypts one block with the given backend.
///
/// `Backend::Hardware` must only be passed after `hardware_available`
/// returned `true`.
#[inline]
pub fn encrypt_block(backend: Backend, block: &Block, round_keys: &RoundKeys) -> Block {
    if backend == Backend::Hardware {
        #[cfg(all(target_arch = "x86_64", not(feature = "force-software")))]
        {
            return x86_64::encrypt_block(block, round_keys.as_blocks());
        }
        #[cfg(all(target_arch = "aarch64", not(feature = "force-software")))]
        {
            return aarch64::encrypt_block(block, round_keys.as_blocks());
        }
    }

    fallback::encrypt_block(block, round_keys.as_blocks())
}

/// Encrypts two blocks with their rounds interleaved.
#[inline]
pub fn encrypt_pair(
    backend: Backend,
    a: &Block,
    b: &Block,
    round_keys: &RoundKeys,
) -> (Block, Block) {
    if backend == Backend::Hardware {
        #[cfg(all(target_arch = "x86_64", not(feature = "force-software")))]
        {
            return x86_64::encrypt_pair(a, b, round_keys.as_blocks());
        }
        #[cfg(all(target_arch = "aarch64", not(feature = "force-software")))]
        {
            return aarch64::encrypt_pair(a, b, round_keys.as_blocks());
        }
    }

    fallback::encrypt_pair(a, b, round_keys.as_blocks())
}

/// Kept out of line so two calls cannot be merged and interleaved.
#[inline(never)]
fn encrypt_block_outlined(backend: Backend, block: &Block, round_keys: &RoundKeys) -> Block {
    encrypt_block(backend, block, round_keys)
}

/// Encrypts two blocks one after the other, without interleaving.
///
/// Benchmark reference for `encrypt_pair`; not used by any encryption path.
pub fn encrypt_pair_unpipelined(
    backend: Backend,
    a: &Block,
    b: &Block,
    round_keys: &RoundKeys,
) -> (Block, Block) {
    let ca = encrypt_block_outlined(backend, a, round_keys);
    let cb = encrypt_block_outlined(backend, b, round_keys);
    (ca, cb)
}

/// Expands a key into 11 round keys with the given backend.
#[inline]
pub fn expand_key(backend: Backend, key: &[u8; KEY_SIZE]) -> [Block; ROUNDS + 1] {
    if backend == Backend::Hardware {
        #[cfg(all(target_arch = "x86_64", not(feature = "force-software")))]
        {
            return x86_64::expand_key(key);
        }
        #[cfg(all(target_arch = "aarch64", not(feature = "force-software")))]
        {
            return aarch64::expand_key(key);
        }
    }

    key_schedule::expand_key(key)
}

/// Encrypts one block from the raw key, deriving round keys on the fly.
#[inline]
pub fn encrypt_block_with_key(backend: Backend, block: &Block, key: &[u8; KEY_SIZE]) -> Block {
    if backend == Backend::Hardware {
        #[cfg(all(target_arch = "x86_64", not(feature = "force-software")))]
        {
            return x86_64::encrypt_block_with_key(block, key);
        }
        #[cfg(all(target_arch = "aarch64", not(feature = "force-software")))]
        {
            return aarch64::encrypt_block_with_key(block, key);
        }
    }

    let [output] = fallback::encrypt_with_key(&[*block], key);
    output
}

/// Encrypts two blocks from the raw key, with the rounds of both blocks and
/// the on-the-fly key expansion interleaved.
#[inline]
pub fn encrypt_pair_with_key(
    backend: Backend,
    a: &Block,
    b: &Block,
    key: &[u8; KEY_SIZE],
) -> (Block, Block) {
    if backend == Backend::Hardware {
        #[cfg(all(target_arch = "x86_64", not(feature = "force-software")))]
        {
            return x86_64::encrypt_pair_with_key(a, b, key);
        }
        #[cfg(all(target_arch = "aarch64", not(feature = "force-software")))]
        {
            return aarch64::encrypt_pair_with_key(a, b, key);
        }
    }

    let [ca, cb] = fallback::encrypt_with_key(&[*a, *b], key);
    (ca, cb)
}

#[inline(never)]
fn encrypt_block_with_key_outlined(backend: Backend, block: &Block, key: &[u8; KEY_SIZE]) -> Block {
    encrypt_block_with_key(backend, block, key)
}

/// Key-input counterpart of `encrypt_pair_unpipelined`: each block expands
/// the key and runs its rounds on its own.
pub fn encrypt_pair_with_key_unpipelined(
    backend: Backend,
    a: &Block,
    b: &Block,
    key: &[u8; KEY_SIZE],
) -> (Block, Block) {
    let ca = encrypt_block_with_key_outlined(backend, a, key);
    let cb = encrypt_block_with_key_outlined(backend, b, key);
    (ca, cb)
}

#[cfg(all(target_arch = "aarch64", not(feature = "force-software")))]
mod aarch64;

#[cfg(all(target_arch = "x86_64", not(feature = "force-software")))]
mod x86_64;

mod fallback;
