//! Fuzz target for AES-CBC chaining and request validation
//!
//! # Strategy
//!
//! - Arbitrary key sizes, including lengths AES does not accept
//! - Arbitrary input lengths, aligned and misaligned
//! - Arbitrary split points across successive updates
//!
//! # Invariants
//!
//! - Keys other than 16/24/32 bytes MUST be rejected
//! - Misaligned input MUST fail and leave output and chaining state untouched
//! - Any block-aligned split MUST produce the same ciphertext as one update
//! - decrypt(encrypt(P)) MUST equal P
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use keystone_crypto::{AesCbc, BLOCK_SIZE, Direction};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    key: Vec<u8>,
    iv: Option<[u8; BLOCK_SIZE]>,
    data: Vec<u8>,
    split: u16,
}

fuzz_target!(|input: FuzzInput| {
    let iv = input.iv.as_ref().map(|iv| &iv[..]);
    let Ok(mut whole) = AesCbc::with_key(&input.key, iv, Direction::Encrypt) else {
        // INVARIANT 1: only AES key sizes are accepted
        assert!(![16, 24, 32].contains(&input.key.len()));
        return;
    };

    if input.data.len() % BLOCK_SIZE != 0 {
        // INVARIANT 2: misaligned input is rejected atomically
        let before = *whole.iv();
        let mut out = vec![0xEEu8; input.data.len() + BLOCK_SIZE];
        assert!(whole.update(&input.data, &mut out).is_err());
        assert!(out.iter().all(|&b| b == 0xEE));
        assert_eq!(whole.iv(), &before);
        return;
    }

    let mut expected = vec![0u8; input.data.len()];
    assert_eq!(whole.update(&input.data, &mut expected).ok(), Some(input.data.len()));

    // INVARIANT 3: splitting on a block boundary does not change the output
    let blocks = input.data.len() / BLOCK_SIZE;
    let cut = (usize::from(input.split) % (blocks + 1)) * BLOCK_SIZE;
    let Ok(mut split) = AesCbc::with_key(&input.key, iv, Direction::Encrypt) else {
        unreachable!("key accepted once must be accepted again");
    };
    let mut actual = vec![0u8; input.data.len()];
    assert!(split.update(&input.data[..cut], &mut actual[..cut]).is_ok());
    assert!(split.update(&input.data[cut..], &mut actual[cut..]).is_ok());
    assert_eq!(actual, expected);

    // INVARIANT 4: decryption inverts encryption
    let Ok(mut dec) = AesCbc::with_key(&input.key, iv, Direction::Decrypt) else {
        unreachable!("key accepted once must be accepted again");
    };
    let mut recovered = expected.clone();
    assert!(dec.update_in_place(&mut recovered).is_ok());
    assert_eq!(recovered, input.data);
});
