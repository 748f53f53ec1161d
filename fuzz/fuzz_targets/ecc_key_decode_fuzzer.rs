//! Fuzz target for ECC key import paths
//!
//! Key blobs arrive from outside the process; every decoder is an attack
//! surface.
//!
//! # Strategy
//!
//! - Raw bytes through SEC1, PKCS#8, SubjectPublicKeyInfo and X9.63 decoders
//! - Raw bytes as a private scalar with and without a curve name
//!
//! # Invariants
//!
//! - Malformed input MUST return an error, never panic
//! - A successfully decoded key MUST pass `check_key`
//! - A successfully decoded key MUST re-encode to the same public point
//! - A failed import MUST leave a previously loaded key intact

#![no_main]

use arbitrary::Arbitrary;
use keystone_crypto::{CurveId, EccKey};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Decoder {
    Sec1,
    Pkcs8,
    Spki,
    X963 { curve: Option<u8> },
    Private { curve: Option<u8> },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    decoder: Decoder,
    blob: Vec<u8>,
}

fn curve_for(code: u8) -> CurveId {
    CurveId::ALL[usize::from(code) % CurveId::ALL.len()]
}

fn assert_reencodes(key: &EccKey) {
    // INVARIANT 2: decoded keys are consistent
    assert!(key.check_key().is_ok());

    // INVARIANT 3: SPKI round trip preserves the point
    let Ok(point) = key.export_x963() else { unreachable!("decoded key has no point") };
    let Ok(spki) = key.public_key_to_der() else { unreachable!("decoded key does not encode") };
    let mut again = EccKey::new();
    assert!(again.public_key_decode(&spki).is_ok());
    assert_eq!(again.export_x963().ok(), Some(point));
}

fuzz_target!(|input: FuzzInput| {
    let mut key = EccKey::new();
    let result = match input.decoder {
        Decoder::Sec1 => key.private_key_decode(&input.blob),
        Decoder::Pkcs8 => key.private_key_from_pkcs8(&input.blob),
        Decoder::Spki => key.public_key_decode(&input.blob),
        Decoder::X963 { curve } => key.import_x963(&input.blob, curve.map(curve_for)),
        Decoder::Private { curve } => {
            let name = curve.map(|c| curve_for(c).name());
            key.import_private(&input.blob, None, name)
        },
    };

    // INVARIANT 1: errors only, no panics
    let Ok(()) = result else {
        assert!(key.curve().is_none());
        return;
    };

    match input.decoder {
        Decoder::Private { .. } => {
            assert!(key.is_private());
            assert!(key.make_pub().is_ok());
            assert_reencodes(&key);
        },
        _ => assert_reencodes(&key),
    }

    // INVARIANT 4: a rejected blob leaves the loaded key alone
    let Ok(before) = key.export_x963() else { unreachable!("decoded key has no point") };
    let _ = key.public_key_decode(&[0x30, 0x00]);
    assert_eq!(key.export_x963().ok(), Some(before));
});
