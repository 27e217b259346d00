//! AES-128 key schedule and the S-box it shares with the software rounds.

use core::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::intrinsics::{self, Backend};
use crate::utils::{Block, BLOCK_SIZE};

/// AES-128 key size in bytes.
pub const KEY_SIZE: usize = 16;

/// Number of AES-128 rounds.
pub const ROUNDS: usize = 10;

/// Size of the serialized round key schedule (11 round keys).
pub const SCHEDULE_SIZE: usize = (ROUNDS + 1) * BLOCK_SIZE;

/// Round constants for the key expansion.
pub(crate) const RCON: [u8; ROUNDS] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// The AES S-box, generated at compile time.
pub(crate) const SBOX: [u8; 256] = build_sbox();

/// Multiplication in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
const fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    let mut i = 0;
    while i < 8 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1b;
        }
        b >>= 1;
        i += 1;
    }
    product
}

/// Multiplicative inverse as x^254; maps 0 to 0.
const fn gf_inv(x: u8) -> u8 {
    let mut result = 1u8;
    let mut power = x;
    let mut i = 0;
    // 254 = 0b1111_1110
    while i < 7 {
        power = gf_mul(power, power);
        result = gf_mul(result, power);
        i += 1;
    }
    result
}

const fn build_sbox() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let b = gf_inv(i as u8);
        table[i] = b
            ^ b.rotate_left(1)
            ^ b.rotate_left(2)
            ^ b.rotate_left(3)
            ^ b.rotate_left(4)
            ^ 0x63;
        i += 1;
    }
    table
}

#[inline]
fn sub_word(word: u32) -> u32 {
    u32::from_be_bytes(word.to_be_bytes().map(|b| SBOX[b as usize]))
}

/// Derives round key `i + 1` from round key `i`.
///
/// Words are big-endian, so RotWord is a left rotation and Rcon lands in
/// the first byte of the word.
pub(crate) fn next_round_key(round_key: &Block, rcon: u8) -> Block {
    let mut w = [0u32; 4];
    for (word, chunk) in w.iter_mut().zip(round_key.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let mut temp = sub_word(w[3].rotate_left(8)) ^ (u32::from(rcon) << 24);
    let mut next = [0u8; BLOCK_SIZE];
    for (dst, word) in next.chunks_exact_mut(4).zip(w.iter()) {
        temp ^= word;
        dst.copy_from_slice(&temp.to_be_bytes());
    }
    w.zeroize();

    next
}

/// Portable key expansion.
pub(crate) fn expand_key(key: &[u8; KEY_SIZE]) -> [Block; ROUNDS + 1] {
    let mut round_keys = [[0u8; BLOCK_SIZE]; ROUNDS + 1];
    round_keys[0] = *key;
    for (i, &rcon) in RCON.iter().enumerate() {
        round_keys[i + 1] = next_round_key(&round_keys[i], rcon);
    }
    round_keys
}

/// Expanded round keys for AES-128.
///
/// Round key 0 is the cipher key itself. The schedule is wiped from memory
/// when dropped, and its `Debug` output never includes key material.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RoundKeys([Block; ROUNDS + 1]);

impl RoundKeys {
    /// Expands a 128-bit key into 11 round keys, using AES instructions
    /// when the CPU has them.
    pub fn from_key(key: &[u8; KEY_SIZE]) -> Self {
        Self::expand(key, Backend::detect())
    }

    /// Expands a key given as a byte slice, which must be exactly 16 bytes.
    pub fn derive(key: &[u8]) -> Result<Self> {
        Self::derive_with(key, Backend::detect())
    }

    /// Expands a key with the requested backend.
    ///
    /// Every backend produces the same schedule. Fails with
    /// [`Error::HardwareUnavailable`] if `Backend::Hardware` is requested on a
    /// CPU without AES instructions, and with [`Error::InvalidKeyLength`] if
    /// `key` is not 16 bytes.
    pub fn derive_with(key: &[u8], backend: Backend) -> Result<Self> {
        if !backend.is_available() {
            return Err(Error::HardwareUnavailable);
        }
        let key: &[u8; KEY_SIZE] = key.try_into().map_err(|_| Error::InvalidKeyLength)?;
        Ok(Self::expand(key, backend))
    }

    #[inline]
    fn expand(key: &[u8; KEY_SIZE], backend: Backend) -> Self {
        Self(intrinsics::expand_key(backend, key))
    }

    /// Rebuilds a schedule from its 176-byte serialized form.
    pub fn from_bytes(bytes: &[u8; SCHEDULE_SIZE]) -> Self {
        let mut round_keys = [[0u8; BLOCK_SIZE]; ROUNDS + 1];
        for (round_key, chunk) in round_keys.iter_mut().zip(bytes.chunks_exact(BLOCK_SIZE)) {
            round_key.copy_from_slice(chunk);
        }
        Self(round_keys)
    }

    /// Serializes the schedule as 11 consecutive round keys.
    pub fn to_bytes(&self) -> [u8; SCHEDULE_SIZE] {
        let mut bytes = [0u8; SCHEDULE_SIZE];
        for (chunk, round_key) in bytes.chunks_exact_mut(BLOCK_SIZE).zip(self.0.iter()) {
            chunk.copy_from_slice(round_key);
        }
        bytes
    }

    /// Returns the round key at the requested index (0..=10).
    #[inline]
    pub fn get(&self, round: usize) -> &Block {
        &self.0[round]
    }

    #[inline]
    pub(crate) fn as_blocks(&self) -> &[Block; ROUNDS + 1] {
        &self.0
    }
}

impl fmt::Debug for RoundKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundKeys").finish_non_exhaustive()
    }
}
