//! x86-64 AES-NI implementation.

#![allow(unsafe_code)]

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::key_schedule::ROUNDS;
use crate::utils::Block;

#[inline(always)]
unsafe fn load(block: &Block) -> __m128i {
    _mm_loadu_si128(block.as_ptr() as *const __m128i)
}

#[inline(always)]
unsafe fn store(value: __m128i) -> Block {
    let mut output = [0u8; 16];
    _mm_storeu_si128(output.as_mut_ptr() as *mut __m128i, value);
    output
}

/// Load all eleven round keys into SSE registers up front.
#[inline(always)]
unsafe fn load_round_keys(round_keys: &[Block; ROUNDS + 1]) -> [__m128i; ROUNDS + 1] {
    let mut rk = [_mm_setzero_si128(); ROUNDS + 1];
    for (dst, round_key) in rk.iter_mut().zip(round_keys.iter()) {
        *dst = load(round_key);
    }
    rk
}

#[target_feature(enable = "aes,sse2")]
unsafe fn encrypt_block_impl(block: &Block, round_keys: &[Block; ROUNDS + 1]) -> Block {
    let rk = load_round_keys(round_keys);

    let mut state = _mm_xor_si128(load(block), rk[0]);
    for round_key in &rk[1..ROUNDS] {
        state = _mm_aesenc_si128(state, *round_key);
    }
    state = _mm_aesenclast_si128(state, rk[ROUNDS]);

    store(state)
}

/// Safe wrapper around the AES-NI single-block encryption.
///
/// Only reachable through `Backend::Hardware`, which is selected after
/// runtime detection of the `aes` feature.
#[inline]
pub fn encrypt_block(block: &Block, round_keys: &[Block; ROUNDS + 1]) -> Block {
    unsafe { encrypt_block_impl(block, round_keys) }
}

/// Two-block AES-NI encryption.
///
/// `aesenc` has a latency of several cycles but a throughput of one per
/// cycle or better. Issuing the round for both states back to back lets the
/// second instruction start while the first is still in flight, so each round
/// costs roughly one latency instead of two.
#[target_feature(enable = "aes,sse2")]
unsafe fn encrypt_pair_impl(
    a: &Block,
    b: &Block,
    round_keys: &[Block; ROUNDS + 1],
) -> (Block, Block) {
    let rk = load_round_keys(round_keys);

    let mut s0 = _mm_xor_si128(load(a), rk[0]);
    let mut s1 = _mm_xor_si128(load(b), rk[0]);

    for round_key in &rk[1..ROUNDS] {
        s0 = _mm_aesenc_si128(s0, *round_key);
        s1 = _mm_aesenc_si128(s1, *round_key);
    }

    s0 = _mm_aesenclast_si128(s0, rk[ROUNDS]);
    s1 = _mm_aesenclast_si128(s1, rk[ROUNDS]);

    (store(s0), store(s1))
}

/// Safe wrapper for the interleaved two-block encryption.
#[inline]
pub fn encrypt_pair(a: &Block, b: &Block, round_keys: &[Block; ROUNDS + 1]) -> (Block, Block) {
    unsafe { encrypt_pair_impl(a, b, round_keys) }
}

/// One step of the AES-128 key expansion.
///
/// The top lane of `aeskeygenassist` holds `SubWord(RotWord(w3)) ^ rcon`.
/// Broadcast, it is XORed into the running prefix XOR of the previous key's
/// four words.
#[inline]
#[target_feature(enable = "aes,sse2")]
unsafe fn expand_round<const RCON: i32>(key: __m128i) -> __m128i {
    let assist = _mm_shuffle_epi32::<0xff>(_mm_aeskeygenassist_si128::<RCON>(key));
    let mut key = key;
    key = _mm_xor_si128(key, _mm_slli_si128::<4>(key));
    key = _mm_xor_si128(key, _mm_slli_si128::<4>(key));
    key = _mm_xor_si128(key, _mm_slli_si128::<4>(key));
    _mm_xor_si128(key, assist)
}

#[target_feature(enable = "aes,sse2")]
unsafe fn expand_key_impl(key: &Block) -> [Block; ROUNDS + 1] {
    let mut rk = [_mm_setzero_si128(); ROUNDS + 1];
    rk[0] = load(key);
    rk[1] = expand_round::<0x01>(rk[0]);
    rk[2] = expand_round::<0x02>(rk[1]);
    rk[3] = expand_round::<0x04>(rk[2]);
    rk[4] = expand_round::<0x08>(rk[3]);
    rk[5] = expand_round::<0x10>(rk[4]);
    rk[6] = expand_round::<0x20>(rk[5]);
    rk[7] = expand_round::<0x40>(rk[6]);
    rk[8] = expand_round::<0x80>(rk[7]);
    rk[9] = expand_round::<0x1b>(rk[8]);
    rk[10] = expand_round::<0x36>(rk[9]);

    let mut round_keys = [[0u8; 16]; ROUNDS + 1];
    for (dst, value) in round_keys.iter_mut().zip(rk.iter()) {
        *dst = store(*value);
    }
    round_keys
}

/// AES-NI key expansion.
#[inline]
pub fn expand_key(key: &Block) -> [Block; ROUNDS + 1] {
    unsafe { expand_key_impl(key) }
}

/// Derives the next round key and runs one `aesenc` round on every state.
#[inline]
#[target_feature(enable = "aes,sse2")]
unsafe fn keyed_round<const RCON: i32, const N: usize>(
    key: &mut __m128i,
    states: &mut [__m128i; N],
) {
    *key = expand_round::<RCON>(*key);
    for state in states.iter_mut() {
        *state = _mm_aesenc_si128(*state, *key);
    }
}

/// Encrypts `N` blocks from the raw key, expanding each round key just
/// before it is needed.
///
/// No schedule is stored. The `aeskeygenassist` chain for round `i + 1`
/// has no dependency on the states, so it overlaps with the `aesenc`
/// instructions of round `i`.
#[target_feature(enable = "aes,sse2")]
unsafe fn encrypt_with_key_impl<const N: usize>(blocks: &[Block; N], key: &Block) -> [Block; N] {
    let mut rk = load(key);
    let mut states = [_mm_setzero_si128(); N];
    for (state, block) in states.iter_mut().zip(blocks.iter()) {
        *state = _mm_xor_si128(load(block), rk);
    }

    keyed_round::<0x01, N>(&mut rk, &mut states);
    keyed_round::<0x02, N>(&mut rk, &mut states);
    keyed_round::<0x04, N>(&mut rk, &mut states);
    keyed_round::<0x08, N>(&mut rk, &mut states);
    keyed_round::<0x10, N>(&mut rk, &mut states);
    keyed_round::<0x20, N>(&mut rk, &mut states);
    keyed_round::<0x40, N>(&mut rk, &mut states);
    keyed_round::<0x80, N>(&mut rk, &mut states);
    keyed_round::<0x1b, N>(&mut rk, &mut states);
    rk = expand_round::<0x36>(rk);

    let mut output = [[0u8; 16]; N];
    for (out, state) in output.iter_mut().zip(states.iter()) {
        *out = store(_mm_aesenclast_si128(*state, rk));
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
