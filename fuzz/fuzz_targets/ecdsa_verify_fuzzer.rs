//! Fuzz target for ECDSA verification
//!
//! Prevent signature forgery and verification bypass
//!
//! # Strategy
//!
//! - Corrupted signatures: flip one bit of a valid signature
//! - Wrong keys: sign with one key, verify with another
//! - Tampered digests: flip one bit of the signed digest
//! - Garbage: arbitrary bytes as the signature
//!
//! # Invariants
//!
//! - Valid signature MUST verify
//! - Any single bit flip in signature or digest MUST verify false
//! - Signature from the wrong key MUST verify false
//! - Garbage MUST return a verdict; only an empty signature is an error
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use keystone_crypto::{Capabilities, CurveId, EccKey, HashAlgorithm, Rng, digest};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    curve: u8,
    seed: [u8; 32],
    message: Vec<u8>,
    attack: Attack,
}

#[derive(Debug, Arbitrary)]
enum Attack {
    CorruptedSignature { bit: u16 },
    TamperedDigest { bit: u16 },
    WrongKey,
    Garbage(Vec<u8>),
}

fn key_from(seed: [u8; 32], curve: CurveId) -> EccKey {
    let mut key = EccKey::new();
    assert!(key.generate(&mut Rng::from_seed(seed), curve).is_ok());
    key
}

fuzz_target!(|input: FuzzInput| {
    let curves = Capabilities::current().curves;
    if curves.is_empty() {
        return;
    }
    let curve = curves[usize::from(input.curve) % curves.len()];
    let algorithm =
        if curve.field_size() > 32 { HashAlgorithm::Sha384 } else { HashAlgorithm::Sha256 };
    let Ok(hash) = digest(algorithm, &input.message) else { unreachable!("sha2 is always built") };

    let signer = key_from(input.seed, curve);
    let Ok(signature) = signer.sign_hash(&hash, &mut Rng::from_seed(input.seed)) else {
        unreachable!("generated key failed to sign");
    };

    // INVARIANT 1: valid signature verifies
    assert_eq!(signer.verify_hash(&hash, &signature).ok(), Some(true));

    match input.attack {
        Attack::CorruptedSignature { bit } => {
            let bit = usize::from(bit) % (signature.len() * 8);
            let mut bad = signature.clone();
            bad[bit / 8] ^= 1 << (bit % 8);
            // INVARIANT 2
            assert_eq!(signer.verify_hash(&hash, &bad).ok(), Some(false));
        },
        Attack::TamperedDigest { bit } => {
            let bit = usize::from(bit) % (hash.len() * 8);
            let mut bad = hash.clone();
            bad[bit / 8] ^= 1 << (bit % 8);
            // INVARIANT 2
            assert_eq!(signer.verify_hash(&bad, &signature).ok(), Some(false));
        },
        Attack::WrongKey => {
            let mut other_seed = input.seed;
            other_seed[0] ^= 0xFF;
            let other = key_from(other_seed, curve);
            // INVARIANT 3
            assert_eq!(other.verify_hash(&hash, &signature).ok(), Some(false));
        },
        Attack::Garbage(bytes) => {
            // INVARIANT 4: only the empty signature is an argument error
            if signer.verify_hash(&hash, &bytes).is_err() {
                assert!(bytes.is_empty());
            }
        },
    }
});
