//! Digest known-answer tests and streaming properties
//!
//! 1. **Vectors**: every enabled algorithm matches the published answers
//!    for "", "abc", the 448-bit two-block message and a million 'a's
//! 2. **Chunking**: any split of the input yields the one-shot digest
//! 3. **Copy**: a copied state continues identically, and diverges exactly
//!    when the suffixes diverge

use keystone_crypto::{CryptoError, HashAlgorithm, HashState, digest};
use proptest::prelude::*;

const TWO_BLOCK: &[u8] = b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq";

struct Vector {
    algorithm: HashAlgorithm,
    empty: &'static str,
    abc: &'static str,
    two_block: &'static str,
    million_a: &'static str,
}

const VECTORS: &[Vector] = &[
    Vector {
        algorithm: HashAlgorithm::Md5,
        empty: "d41d8cd98f00b204e9800998ecf8427e",
        abc: "900150983cd24fb0d6963f7d28e17f72",
        two_block: "8215ef0796a20bcaaae116d3876c664a",
        million_a: "7707d6ae4e027c70eea2a935c2296f21",
    },
    Vector {
        algorithm: HashAlgorithm::Sha1,
        empty: "da39a3ee5e6b4b0d3255bfef95601890afd80709",
        abc: "a9993e364706816aba3e25717850c26c9cd0d89d",
        two_block: "84983e441c3bd26ebaae4aa1f95129e5e54670f1",
        million_a: "34aa973cd4c4daa4f61eeb2bdbad27316534016f",
    },
    Vector {
        algorithm: HashAlgorithm::Sha224,
        empty: "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f",
        abc: "23097d223405d8228642a477bda255b32aadbce4bda0b3f7e36c9da7",
        two_block: "75388b16512776cc5dba5da1fd890150b0c6455cb4f58b1952522525",
        million_a: "20794655980c91d8bbb4c1ea97618a4bf03f42581948b2ee4ee7ad67",
    },
    Vector {
        algorithm: HashAlgorithm::Sha256,
        empty: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        abc: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        two_block: "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        million_a: "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0",
    },
    Vector {
        algorithm: HashAlgorithm::Sha384,
        empty: "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da274edebfe76f65fbd51ad2f14898b95b",
        abc: "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7",
        two_block: "3391fdddfc8dc7393707a65b1b4709397cf8b1d162af05abfe8f450de5f36bc6b0455a8520bc4e6f5fe95b1fe3c8452b",
        million_a: "9d0e1809716474cb086e834e310a4a1ced149e9c00f248527972cec5704c2a5b07b8b3dc38ecc4ebae97ddd87f3d8985",
    },
    Vector {
        algorithm: HashAlgorithm::Sha512,
        empty: "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e",
        abc: "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f",
        two_block: "204a8fc6dda82f0a0ced7beb8e08a41657c16ef468b228a8279be331a703c33596fd15c13b1b07f9aa1d3bea57789ca031ad85c7a71dd70354ec631238ca3445",
        million_a: "e718483d0ce769644e2e42c7bc15b4638e1f98b13b2044285632a803afa973ebde0ff244877ea60a4cb0432ce577c31beb009c5c2c49aa2e4eadb217ad8cc09b",
    },
];

fn enabled_vectors() -> impl Iterator<Item = &'static Vector> {
    VECTORS.iter().filter(|v| v.algorithm.is_enabled())
}

fn enabled_algorithms() -> impl Strategy<Value = HashAlgorithm> {
    let enabled: Vec<HashAlgorithm> =
        HashAlgorithm::ALL.into_iter().filter(|a| a.is_enabled()).collect();
    prop::sample::select(enabled)
}

#[test]
fn known_answers() {
    for v in enabled_vectors() {
        assert_eq!(
            hex::encode(digest(v.algorithm, b"").unwrap()),
            v.empty,
            "{} empty",
            v.algorithm
        );
        assert_eq!(hex::encode(digest(v.algorithm, b"abc").unwrap()), v.abc, "{} abc", v.algorithm);
        assert_eq!(
            hex::encode(digest(v.algorithm, TWO_BLOCK).unwrap()),
            v.two_block,
            "{} two-block",
            v.algorithm
        );
    }
}

#[test]
fn million_a_streamed_in_chunks() {
    let chunk = [b'a'; 1000];
    for v in enabled_vectors() {
        let mut state = HashState::new(v.algorithm).unwrap();
        for _ in 0..1000 {
            state.update(&chunk).unwrap();
        }
        assert_eq!(state.total_len(), 1_000_000);
        assert_eq!(hex::encode(state.finalize().unwrap()), v.million_a, "{}", v.algorithm);
    }
}

#[test]
fn disabled_algorithms_report_not_supported() {
    for algorithm in HashAlgorithm::ALL.into_iter().filter(|a| !a.is_enabled()) {
        assert!(matches!(HashState::new(algorithm), Err(CryptoError::NotSupported { .. })));
    }
}

#[test]
fn prefix_reuse_via_copy() {
    let mut prefix = HashState::new(HashAlgorithm::Sha256).unwrap();
    prefix.update(b"common prefix | ").unwrap();

    let mut first = prefix.clone();
    let mut second = HashState::new(HashAlgorithm::Sha256).unwrap();
    second.copy_from(&prefix);

    first.update(b"suffix one").unwrap();
    second.update(b"suffix two").unwrap();

    assert_eq!(
        first.finalize().unwrap(),
        digest(HashAlgorithm::Sha256, b"common prefix | suffix one").unwrap()
    );
    assert_eq!(
        second.finalize().unwrap(),
        digest(HashAlgorithm::Sha256, b"common prefix | suffix two").unwrap()
    );
    assert!(!prefix.is_finalized(), "copies do not consume the source");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_chunked_update_matches_one_shot(
        algorithm in enabled_algorithms(),
        data in prop::collection::vec(any::<u8>(), 0..600),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut points: Vec<usize> = cuts.iter().map(|c| c.index(data.len() + 1)).collect();
        points.sort_unstable();

        let mut state = HashState::new(algorithm).unwrap();
        let mut start = 0;
        for point in points {
            state.update(&data[start..point]).unwrap();
            start = point;
        }
        state.update(&data[start..]).unwrap();

        prop_assert_eq!(state.total_len(), data.len() as u64);
        prop_assert_eq!(state.finalize().unwrap(), digest(algorithm, &data).unwrap());
    }

    #[test]
    fn prop_copy_diverges_only_with_input(
        algorithm in enabled_algorithms(),
        prefix in prop::collection::vec(any::<u8>(), 0..200),
        suffix_a in prop::collection::vec(any::<u8>(), 0..200),
        suffix_b in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        let mut original = HashState::new(algorithm).unwrap();
        original.update(&prefix).unwrap();
        let mut copy = original.clone();

        original.update(&suffix_a).unwrap();
        copy.update(&suffix_b).unwrap();

        let a = original.finalize().unwrap();
        let b = copy.finalize().unwrap();
        if suffix_a == suffix_b {
            prop_assert_eq!(a, b);
        } else {
            prop_assert_ne!(a, b);
        }
    }

    #[test]
    fn prop_finalize_writes_exactly_digest_size(
        algorithm in enabled_algorithms(),
        slack in 0usize..64,
    ) {
        let mut state = HashState::new(algorithm).unwrap();
        state.update(b"payload").unwrap();

        let size = algorithm.digest_size();
        let mut out = vec![0xA5u8; size + slack];
        prop_assert_eq!(state.finalize_into(&mut out).unwrap(), size);
        prop_assert!(out[size..].iter().all(|&b| b == 0xA5));
    }
}
