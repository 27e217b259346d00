//! Block type and byte helpers shared by the cipher and the hash.

use crate::error::{Error, Result};

/// Size of an AES block in bytes.
pub const BLOCK_SIZE: usize = 16;

/// A single 16-byte AES block.
pub type Block = [u8; BLOCK_SIZE];

/// XOR two 16-byte blocks.
#[cfg_attr(not(feature = "std"), allow(dead_code))]
#[inline]
pub fn xor_block(a: &Block, b: &Block) -> Block {
    let mut result = [0u8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        result[i] = a[i] ^ b[i];
    }
    result
}

/// XOR `rhs` into `dst`, byte `i` with byte `i`.
#[inline]
pub fn xor_in_place(dst: &mut Block, rhs: &Block) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

/// Validate a truncated hash output length.
#[cfg_attr(not(feature = "std"), allow(dead_code))]
#[inline]
pub fn validate_output_len(len: usize) -> Result<()> {
    if len == 0 || len > BLOCK_SIZE {
        return Err(Error::InvalidOutputLength);
    }
    Ok(())
}
