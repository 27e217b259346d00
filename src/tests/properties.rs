//! Randomized equivalence and concurrency checks.

use rand::RngCore;

use crate::intrinsics;
use crate::{
    derive_schedule, encrypt_block, encrypt_block_with_key, encrypt_pair, encrypt_pair_with_key,
    encrypt_pair_with_key_unpipelined, software_encrypt_block, Aes128, Backend, RoundKeys,
};

const ITERATIONS: usize = 256;

fn random_block(rng: &mut impl RngCore) -> [u8; 16] {
    let mut block = [0u8; 16];
    rng.fill_bytes(&mut block);
    block
}

#[test]
fn test_hardware_and_software_agree_random() {
    let mut rng = rand::thread_rng();
    let hardware = Backend::Hardware.is_available();

    for _ in 0..ITERATIONS {
        let key = random_block(&mut rng);
        let block = random_block(&mut rng);

        let software = Aes128::with_backend(&key, Backend::Software).unwrap();
        let expected = software.encrypt_block(&block);

        let schedule = derive_schedule(&key).unwrap();
        assert_eq!(software_encrypt_block(&block, &schedule), expected);
        assert_eq!(encrypt_block(&block, &schedule), expected);

        if hardware {
            let cipher = Aes128::with_backend(&key, Backend::Hardware).unwrap();
            assert_eq!(cipher.encrypt_block(&block), expected);
        }
    }
}

#[test]
fn test_pair_equals_two_singles_random() {
    let mut rng = rand::thread_rng();

    for _ in 0..ITERATIONS {
        let key = random_block(&mut rng);
        let a = random_block(&mut rng);
        let b = random_block(&mut rng);
        let schedule = derive_schedule(&key).unwrap();

        let expected = (encrypt_block(&a, &schedule), encrypt_block(&b, &schedule));
        assert_eq!(encrypt_pair(&a, &b, &schedule), expected);

        let software = Aes128::with_backend(&key, Backend::Software).unwrap();
        assert_eq!(software.encrypt_pair(&a, &b), expected);
        assert_eq!(software.encrypt_pair_unpipelined(&a, &b), expected);

        if Backend::Hardware.is_available() {
            let hardware = Aes128::with_backend(&key, Backend::Hardware).unwrap();
            assert_eq!(hardware.encrypt_pair(&a, &b), expected);
            assert_eq!(hardware.encrypt_pair_unpipelined(&a, &b), expected);
        }
    }
}

#[test]
fn test_schedule_is_deterministic_random() {
    let mut rng = rand::thread_rng();

    for _ in 0..ITERATIONS {
        let key = random_block(&mut rng);
        let first = derive_schedule(&key).unwrap();
        let second = derive_schedule(&key).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.get(0), &key);
    }
}

#[test]
fn test_hardware_and_software_schedules_agree_random() {
    let mut rng = rand::thread_rng();
    let hardware = Backend::Hardware.is_available();

    for _ in 0..ITERATIONS {
        let key = random_block(&mut rng);
        let software = RoundKeys::derive_with(&key, Backend::Software).unwrap();
        assert_eq!(derive_schedule(&key).unwrap(), software);

        if hardware {
            let derived = RoundKeys::derive_with(&key, Backend::Hardware).unwrap();
            assert_eq!(derived.to_bytes(), software.to_bytes());
        } else {
            assert_eq!(
                RoundKeys::derive_with(&key, Backend::Hardware).unwrap_err(),
                crate::Error::HardwareUnavailable
            );
        }
    }
}

#[test]
fn test_key_input_variants_match_schedule_random() {
    let mut rng = rand::thread_rng();

    for _ in 0..ITERATIONS {
        let key = random_block(&mut rng);
        let a = random_block(&mut rng);
        let b = random_block(&mut rng);

        let schedule = derive_schedule(&key).unwrap();
        let expected = (encrypt_block(&a, &schedule), encrypt_block(&b, &schedule));

        assert_eq!(encrypt_block_with_key(&a, &key), expected.0);
        assert_eq!(encrypt_pair_with_key(&a, &b, &key), expected);
        assert_eq!(encrypt_pair_with_key_unpipelined(&a, &b, &key), expected);

        assert_eq!(
            intrinsics::encrypt_pair_with_key(Backend::Software, &a, &b, &key),
            expected
        );
        assert_eq!(
            intrinsics::encrypt_block_with_key(Backend::Software, &b, &key),
            expected.1
        );
    }
}

#[test]
fn test_shared_cipher_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let cipher = Arc::new(Aes128::new(&[0x5c; 16]).unwrap());
    let block = [0x99u8; 16];
    let expected = cipher.encrypt_block(&block);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cipher = Arc::clone(&cipher);
            thread::spawn(move || {
                (0..64)
                    .map(|_| cipher.encrypt_pair(&block, &block))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for (a, b) in handle.join().unwrap() {
            assert_eq!(a, expected);
            assert_eq!(b, expected);
        }
    }
}

#[cfg(feature = "std")]
mod block_hash_properties {
    use super::{random_block, ITERATIONS};
    use crate::utils::xor_block;
    use crate::{hash, hash_truncated, Aes128, HASH_IV, HASH_KEY};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_hash_matches_definition_random() {
        let mut rng = rand::thread_rng();
        let cipher = Aes128::new(&HASH_KEY).unwrap();

        for _ in 0..ITERATIONS {
            let input = random_block(&mut rng);
            let mut expected = cipher.encrypt_block(&input);
            for (byte, iv) in expected.iter_mut().zip(HASH_IV.iter()) {
                *byte ^= iv;
            }
            assert_eq!(hash(&input).unwrap(), expected);
        }
    }

    #[test]
    fn test_truncation_is_prefix_random() {
        let mut rng = rand::thread_rng();

        for _ in 0..ITERATIONS / 16 {
            let input = random_block(&mut rng);
            let full = hash(&input).unwrap();
            for len in 1..=16 {
                assert_eq!(&*hash_truncated(&input, len).unwrap(), &full[..len]);
            }
        }
    }

    #[test]
    fn test_concurrent_hash_calls_agree() {
        const THREADS: usize = 16;

        let inputs: Vec<[u8; 16]> = (0..32u8).map(|i| [i; 16]).collect();
        let inputs = Arc::new(inputs);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let inputs = Arc::clone(&inputs);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    inputs
                        .iter()
                        .map(|input| hash(input).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let results: Vec<Vec<[u8; 16]>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let cipher = Aes128::new(&HASH_KEY).unwrap();
        let expected: Vec<[u8; 16]> = inputs
            .iter()
            .map(|x| xor_block(&cipher.encrypt_block(x), &HASH_IV))
            .collect();
        for digests in &results {
            assert_eq!(digests, &expected);
        }
    }
}
