//! ARM NEON + Crypto Extensions implementation.

#![allow(unsafe_code)]

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

use crate::key_schedule::{RCON, ROUNDS};
use crate::utils::Block;

#[inline(always)]
unsafe fn store(value: uint8x16_t) -> Block {
    let mut output = [0u8; 16];
    vst1q_u8(output.as_mut_ptr(), value);
    output
}

/// ARM AES single-block encryption.
///
/// `aese` performs AddRoundKey before SubBytes and ShiftRows, so round key
/// `i` is consumed one round earlier than in the FIPS-197 description and
/// the last round key is XORed in separately.
#[target_feature(enable = "neon,aes")]
unsafe fn encrypt_block_impl(block: &Block, round_keys: &[Block; ROUNDS + 1]) -> Block {
    let mut state = vld1q_u8(block.as_ptr());

    for round_key in &round_keys[..ROUNDS - 1] {
        state = vaesmcq_u8(vaeseq_u8(state, vld1q_u8(round_key.as_ptr())));
    }
    state = vaeseq_u8(state, vld1q_u8(round_keys[ROUNDS - 1].as_ptr()));
    state = veorq_u8(state, vld1q_u8(round_keys[ROUNDS].as_ptr()));

    store(state)
}

/// Safe wrapper around the ARM single-block encryption.
#[inline]
pub fn encrypt_block(block: &Block, round_keys: &[Block; ROUNDS + 1]) -> Block {
    unsafe { encrypt_block_impl(block, round_keys) }
}

/// ARM AES two-block encryption with the `aese`/`aesmc` pairs of both
/// states interleaved, so the core can fuse and overlap them.
#[target_feature(enable = "neon,aes")]
unsafe fn encrypt_pair_impl(
    a: &Block,
    b: &Block,
    round_keys: &[Block; ROUNDS + 1],
) -> (Block, Block) {
    let mut s0 = vld1q_u8(a.as_ptr());
    let mut s1 = vld1q_u8(b.as_ptr());

    for round_key in &round_keys[..ROUNDS - 1] {
        let rk = vld1q_u8(round_key.as_ptr());
        s0 = vaesmcq_u8(vaeseq_u8(s0, rk));
        s1 = vaesmcq_u8(vaeseq_u8(s1, rk));
    }

    let penultimate = vld1q_u8(round_keys[ROUNDS - 1].as_ptr());
    let last = vld1q_u8(round_keys[ROUNDS].as_ptr());
    s0 = veorq_u8(vaeseq_u8(s0, penultimate), last);
    s1 = veorq_u8(vaeseq_u8(s1, penultimate), last);

    (store(s0), store(s1))
}

/// Safe wrapper for the interleaved ARM two-block encryption.
#[inline]
pub fn encrypt_pair(a: &Block, b: &Block, round_keys: &[Block; ROUNDS + 1]) -> (Block, Block) {
    unsafe { encrypt_pair_impl(a, b, round_keys) }
}

/// SubWord through `aese` with an all-zero round key.
///
/// With the word copied into all four columns, ShiftRows leaves the state
/// unchanged, so lane 0 holds the substituted word.
#[inline]
#[target_feature(enable = "neon,aes")]
unsafe fn sub_word(word: u32) -> u32 {
    let input = vreinterpretq_u8_u32(vdupq_n_u32(word));
    let substituted = vaeseq_u8(input, vdupq_n_u8(0));
    vgetq_lane_u32::<0>(vreinterpretq_u32_u8(substituted))
}

/// Derives round key `i + 1` from round key `i`.
///
/// Words are little-endian here, so RotWord is a right rotation and Rcon
/// goes in the low byte.
#[inline]
#[target_feature(enable = "neon,aes")]
unsafe fn next_round_key(round_key: &Block, rcon: u8) -> Block {
    let mut w = [0u32; 4];
    for (word, chunk) in w.iter_mut().zip(round_key.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let mut temp = sub_word(w[3]).rotate_right(8) ^ u32::from(rcon);
    let mut next = [0u8; 16];
    for (dst, word) in next.chunks_exact_mut(4).zip(w.iter()) {
        temp ^= word;
        dst.copy_from_slice(&temp.to_le_bytes());
    }
    next
}

#[target_feature(enable = "neon,aes")]
unsafe fn expand_key_impl(key: &Block) -> [Block; ROUNDS + 1] {
    let mut round_keys = [[0u8; 16]; ROUNDS + 1];
    round_keys[0] = *key;
    for (i, &rcon) in RCON.iter().enumerate() {
        round_keys[i + 1] = next_round_key(&round_keys[i], rcon);
    }
    round_keys
}

/// ARM key expansion with the S-box lookups done by `aese`.
#[inline]
pub fn expand_key(key: &Block) -> [Block; ROUNDS + 1] {
    unsafe { expand_key_impl(key) }
}

/// Encrypts `N` blocks from the raw key, deriving each round key while the
/// previous round's `aese`/`aesmc` pairs are in flight.
#[target_feature(enable = "neon,aes")]
unsafe fn encrypt_with_key_impl<const N: usize>(blocks: &[Block; N], key: &Block) -> [Block; N] {
    let mut states = [vdupq_n_u8(0); N];
    for (state, block) in states.iter_mut().zip(blocks.iter()) {
        *state = vld1q_u8(block.as_ptr());
    }

    let mut round_key = *key;
    for &rcon in &RCON[..ROUNDS - 1] {
        let rk = vld1q_u8(round_key.as_ptr());
        round_key = next_round_key(&round_key, rcon);
        for state in states.iter_mut() {
            *state = vaesmcq_u8(vaeseq_u8(*state, rk));
        }
    }

    let penultimate = vld1q_u8(round_key.as_ptr());
    round_key = next_round_key(&round_key, RCON[ROUNDS - 1]);
    let last = vld1q_u8(round_key.as_ptr());

    let mut output = [[0u8; 16]; N];
    for (out, state) in output.iter_mut().zip(states.iter()) {
        *out = store(veorq_u8(vaeseq_u8(*state, penultimate), last));
    }
    output
}

/// Single-block encryption straight from the cipher key.
#[inline]
pub fn encrypt_block_with_key(block: &Block, key: &Block) -> Block {
    let [output] = unsafe { encrypt_with_key_impl(&[*block], key) };
    output
}

/// Two-block encryption straight from the cipher key, rounds interleaved.
#[inline]
pub fn encrypt_pair_with_key(a: &Block, b: &Block, key: &Block) -> (Block, Block) {
    let [ca, cb] = unsafe { encrypt_with_key_impl(&[*a, *b], key) };
    (ca, cb)
}
