//! Portable AES-128 encryption used when AES instructions are unavailable.
//!
//! The state is kept in FIPS-197 column-major order: byte `r + 4c` holds row
//! `r` of column `c`. Table lookups make this path variable-time.

use zeroize::Zeroize;

use crate::key_schedule::{next_round_key, RCON, ROUNDS, SBOX};
use crate::utils::{xor_in_place, Block, BLOCK_SIZE};

/// Source index of each output byte under ShiftRows.
const SHIFT_ROWS: [usize; BLOCK_SIZE] = [0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12, 1, 6, 11];

#[inline]
fn sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = SBOX[*byte as usize];
    }
}

#[inline]
fn shift_rows(state: &mut Block) {
    let input = *state;
    for (dst, &src) in state.iter_mut().zip(SHIFT_ROWS.iter()) {
        *dst = input[src];
    }
}

#[inline]
fn xtime(byte: u8) -> u8 {
    (byte << 1) ^ (((byte >> 7) & 1) * 0x1b)
}

#[inline]
fn mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        let all = a0 ^ a1 ^ a2 ^ a3;
        column[0] = a0 ^ all ^ xtime(a0 ^ a1);
        column[1] = a1 ^ all ^ xtime(a1 ^ a2);
        column[2] = a2 ^ all ^ xtime(a2 ^ a3);
        column[3] = a3 ^ all ^ xtime(a3 ^ a0);
    }
}

/// One full round: SubBytes, ShiftRows, MixColumns, AddRoundKey.
#[inline]
fn round(state: &mut Block, round_key: &Block) {
    sub_bytes(state);
    shift_rows(state);
    mix_columns(state);
    xor_in_place(state, round_key);
}

/// The last round omits MixColumns.
#[inline]
fn final_round(state: &mut Block, round_key: &Block) {
    sub_bytes(state);
    shift_rows(state);
    xor_in_place(state, round_key);
}

/// Encrypts a single block with pre-expanded round keys.
pub fn encrypt_block(block: &Block, round_keys: &[Block; ROUNDS + 1]) -> Block {
    let mut state = *block;
    xor_in_place(&mut state, &round_keys[0]);
    for round_key in &round_keys[1..ROUNDS] {
        round(&mut state, round_key);
    }
    final_round(&mut state, &round_keys[ROUNDS]);
    state
}

/// Encrypts two blocks, advancing both states one round at a time.
pub fn encrypt_pair(a: &Block, b: &Block, round_keys: &[Block; ROUNDS + 1]) -> (Block, Block) {
    let mut s0 = *a;
    let mut s1 = *b;
    xor_in_place(&mut s0, &round_keys[0]);
    xor_in_place(&mut s1, &round_keys[0]);
    for round_key in &round_keys[1..ROUNDS] {
        round(&mut s0, round_key);
        round(&mut s1, round_key);
    }
    final_round(&mut s0, &round_keys[ROUNDS]);
    final_round(&mut s1, &round_keys[ROUNDS]);
    (s0, s1)
}

/// Encrypts `N` blocks from the raw key, stepping the key schedule one
/// round at a time instead of storing it.
pub fn encrypt_with_key<const N: usize>(blocks: &[Block; N], key: &Block) -> [Block; N] {
    let mut states = *blocks;
    let mut round_key = *key;
    for state in states.iter_mut() {
        xor_in_place(state, &round_key);
    }

    for (i, &rcon) in RCON.iter().enumerate() {
        round_key = next_round_key(&round_key, rcon);
        for state in states.iter_mut() {
            if i + 1 < ROUNDS {
                round(state, &round_key);
            } else {
                final_round(state, &round_key);
            }
        }
    }
    round_key.zeroize();

    states
}
