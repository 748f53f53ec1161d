//! Fuzz target for streaming digests
//!
//! # Strategy
//!
//! - Arbitrary data split at arbitrary points, fed through `update`,
//!   `update_byte` and `update_range`
//! - State copied mid-stream and continued on both sides
//!
//! # Invariants
//!
//! - Any chunking MUST equal the one-shot digest
//! - `total_len` MUST equal the number of bytes fed
//! - A copy MUST finish with the same digest as its source
//! - Out-of-range `update_range` MUST fail without changing the state
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use keystone_crypto::{HashAlgorithm, HashState, digest};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    algorithm: u8,
    data: Vec<u8>,
    cuts: Vec<u16>,
    copy_after: u16,
    bogus_offset: u16,
}

fuzz_target!(|input: FuzzInput| {
    let enabled: Vec<HashAlgorithm> =
        HashAlgorithm::ALL.into_iter().filter(|a| a.is_enabled()).collect();
    let algorithm = enabled[usize::from(input.algorithm) % enabled.len()];
    let Ok(expected) = digest(algorithm, &input.data) else {
        unreachable!("enabled algorithm failed to hash");
    };

    let mut points: Vec<usize> =
        input.cuts.iter().map(|c| usize::from(*c) % (input.data.len() + 1)).collect();
    points.sort_unstable();
    points.push(input.data.len());

    let Ok(mut state) = HashState::new(algorithm) else {
        unreachable!("enabled algorithm failed to initialize");
    };
    let copy_at = usize::from(input.copy_after) % (points.len() + 1);
    let mut copy: Option<HashState> = None;

    let mut start = 0;
    for (i, point) in points.into_iter().enumerate() {
        if i == copy_at {
            copy = Some(state.clone());
        }
        let chunk = &input.data[start..point];
        let fed = match chunk.len() {
            1 => state.update_byte(chunk[0]),
            n if n % 2 == 0 => state.update_range(&input.data, start, n),
            _ => state.update(chunk),
        };
        assert!(fed.is_ok());
        if let Some(copy) = copy.as_mut() {
            assert!(copy.update(chunk).is_ok());
        }
        start = point;
    }

    // INVARIANT 4: bad ranges are rejected and do not count
    let offset = input.data.len() + 1 + usize::from(input.bogus_offset);
    assert!(state.update_range(&input.data, offset, 1).is_err());

    // INVARIANT 2: every byte counted once
    assert_eq!(state.total_len(), input.data.len() as u64);

    // INVARIANT 1: chunking is invisible
    assert_eq!(state.finalize().ok(), Some(expected.clone()));

    // INVARIANT 3: copies continue identically
    if let Some(mut copy) = copy {
        assert_eq!(copy.finalize().ok(), Some(expected));
    }
});
