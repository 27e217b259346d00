//! Basic usage example for the AES-128 block engine and block hash.

use aes_blockhash::{
    derive_schedule, encrypt_block, encrypt_pair_with_key, hardware_acceleration_available, hash,
    hash_into, hash_truncated, Aes128, Backend, Error,
};

fn main() -> Result<(), Error> {
    println!("AES Block Engine Basic Usage Example");
    println!("====================================");
    println!(
        "Hardware acceleration: {}",
        if hardware_acceleration_available() {
            "ENABLED"
        } else {
            "DISABLED"
        }
    );

    // Example 1: Single and pipelined block encryption
    encryption_example()?;

    // Example 2: Block hash with truncation
    hash_example()?;

    // Example 3: Error handling
    error_handling_example();

    Ok(())
}

fn encryption_example() -> Result<(), Error> {
    println!("\n1. Block Encryption:");

    let key = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];
    let plaintext = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];

    let schedule = derive_schedule(&key)?;
    let ciphertext = encrypt_block(&plaintext, &schedule);
    println!("  Ciphertext: {:02x?}", ciphertext);

    let cipher = Aes128::new(&key)?;
    println!("  Backend: {}", cipher.backend());
    let (first, second) = cipher.encrypt_pair(&plaintext, &[0u8; 16]);
    assert_eq!(first, ciphertext);
    println!("  Pair: {:02x?} / {:02x?}", &first[..4], &second[..4]);

    let (keyed, _) = encrypt_pair_with_key(&plaintext, &[0u8; 16], &key);
    assert_eq!(keyed, ciphertext);

    println!("  ✓ Pipelined pair matches single-block encryption!");
    Ok(())
}

fn hash_example() -> Result<(), Error> {
    println!("\n2. Block Hash:");

    let input = *b"sixteen byte msg";
    let digest = hash(&input)?;
    println!("  Full digest: {:02x?}", digest);

    for len in [1, 4, 8, 16] {
        let truncated = hash_truncated(&input, len)?;
        assert_eq!(&truncated[..], &digest[..len]);
        println!("  Truncated to {len:2} bytes: {truncated:?}");
    }

    let mut out = [0u8; 6];
    hash_into(&input, &mut out)?;
    assert_eq!(out, digest[..6]);

    println!("  ✓ Truncated outputs are prefixes of the full digest!");
    Ok(())
}

fn error_handling_example() {
    println!("\n3. Error Handling:");

    match derive_schedule(&[0u8; 15]) {
        Err(Error::InvalidKeyLength) => println!("  ✓ Short key rejected"),
        other => println!("  ✗ Unexpected result: {other:?}"),
    }

    match hash_truncated(&[0u8; 16], 17) {
        Err(Error::InvalidOutputLength) => println!("  ✓ Oversized output length rejected"),
        other => println!("  ✗ Unexpected result: {other:?}"),
    }

    match Aes128::with_backend(&[0u8; 16], Backend::Hardware) {
        Ok(cipher) => println!("  ✓ Hardware backend available: {}", cipher.backend()),
        Err(e) => println!("  ✓ Hardware backend refused: {e}"),
    }
}
