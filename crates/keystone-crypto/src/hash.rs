//! Streaming Merkle-Damgård digests: MD5 and the SHA family.
//!
//! # State machine
//!
//! ```text
//! new / init ──► update* ──► finalize ──► (terminal)
//!      ▲                                      │
//!      └──────────────── init ◄───────────────┘
//! ```
//!
//! Finalize pads the pending partial block (0x80, zero fill, 64- or 128-bit
//! message length) and writes exactly `digest_size()` bytes. A finalized
//! state rejects further input until it is re-initialized.
//!
//! States are deep-copyable: [`HashState::copy_from`] (or `Clone`) yields a
//! state whose continuation is byte-for-byte identical to the source, so a
//! shared prefix can be hashed once and finished with different suffixes.

use std::fmt;

use sha2::Digest;

use crate::{
    error::{CryptoError, Result},
    secure_buffer::checked_range,
};

/// Supported hash algorithms.
///
/// A closed set with fixed digest and block sizes. Algorithms compiled out
/// of this build stay in the enum; using them yields `NotSupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (RFC 1321), 128-bit digest
    Md5,
    /// SHA-1 (FIPS 180-4), 160-bit digest
    Sha1,
    /// SHA-224 (FIPS 180-4)
    Sha224,
    /// SHA-256 (FIPS 180-4)
    Sha256,
    /// SHA-384 (FIPS 180-4)
    Sha384,
    /// SHA-512 (FIPS 180-4)
    Sha512,
}

impl HashAlgorithm {
    /// Every algorithm known to the engine, enabled or not.
    pub const ALL: [Self; 6] =
        [Self::Md5, Self::Sha1, Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512];

    /// Digest length in bytes.
    pub const fn digest_size(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Compression block length in bytes.
    pub const fn block_size(self) -> usize {
        match self {
            Self::Md5 | Self::Sha1 | Self::Sha224 | Self::Sha256 => 64,
            Self::Sha384 | Self::Sha512 => 128,
        }
    }

    /// Stable numeric identifier used at the binding boundary.
    pub const fn code(self) -> i32 {
        match self {
            Self::Md5 => 1,
            Self::Sha1 => 2,
            Self::Sha224 => 3,
            Self::Sha256 => 4,
            Self::Sha384 => 5,
            Self::Sha512 => 6,
        }
    }

    /// Resolve a numeric identifier.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: no algorithm has this code
    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.code() == code)
            .ok_or_else(|| CryptoError::invalid_argument(format!("unknown hash type {code}")))
    }

    /// Canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Resolve a name. Case and dashes are ignored (`sha256`, `SHA-256`).
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        let wanted = if wanted == "SHA" { "SHA1".to_string() } else { wanted };

        Self::ALL
            .into_iter()
            .find(|alg| alg.name().replace('-', "") == wanted)
            .ok_or_else(|| CryptoError::invalid_argument(format!("unknown hash algorithm {name}")))
    }

    /// True if this build carries an implementation.
    pub const fn is_enabled(self) -> bool {
        match self {
            Self::Md5 => cfg!(feature = "md5"),
            Self::Sha1 => cfg!(feature = "sha1"),
            Self::Sha224 | Self::Sha256 | Self::Sha384 | Self::Sha512 => true,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
enum Backend {
    #[cfg(feature = "md5")]
    Md5(md5::Md5),
    #[cfg(feature = "sha1")]
    Sha1(sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

impl Backend {
    fn new(algorithm: HashAlgorithm) -> Result<Self> {
        match algorithm {
            #[cfg(feature = "md5")]
            HashAlgorithm::Md5 => Ok(Self::Md5(md5::Md5::new())),
            #[cfg(feature = "sha1")]
            HashAlgorithm::Sha1 => Ok(Self::Sha1(sha1::Sha1::new())),
            HashAlgorithm::Sha224 => Ok(Self::Sha224(sha2::Sha224::new())),
            HashAlgorithm::Sha256 => Ok(Self::Sha256(sha2::Sha256::new())),
            HashAlgorithm::Sha384 => Ok(Self::Sha384(sha2::Sha384::new())),
            HashAlgorithm::Sha512 => Ok(Self::Sha512(sha2::Sha512::new())),
            #[allow(unreachable_patterns)]
            other => Err(CryptoError::not_supported(other.name())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            #[cfg(feature = "md5")]
            Self::Md5(h) => h.update(data),
            #[cfg(feature = "sha1")]
            Self::Sha1(h) => h.update(data),
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Pad, compress the final block(s) and write the digest into `out`,
    /// which must be exactly the digest size.
    fn finalize_into(self, out: &mut [u8]) {
        match self {
            #[cfg(feature = "md5")]
            Self::Md5(h) => out.copy_from_slice(&h.finalize()),
            #[cfg(feature = "sha1")]
            Self::Sha1(h) => out.copy_from_slice(&h.finalize()),
            Self::Sha224(h) => out.copy_from_slice(&h.finalize()),
            Self::Sha256(h) => out.copy_from_slice(&h.finalize()),
            Self::Sha384(h) => out.copy_from_slice(&h.finalize()),
            Self::Sha512(h) => out.copy_from_slice(&h.finalize()),
        }
    }
}

/// Streaming hash context.
#[derive(Clone)]
pub struct HashState {
    algorithm: HashAlgorithm,
    /// `None` once finalized
    backend: Option<Backend>,
    /// Bytes absorbed since the last init
    total_len: u64,
}

impl HashState {
    /// Allocate and initialize a context.
    ///
    /// # Errors
    ///
    /// - `NotSupported`: the algorithm is compiled out of this build
    pub fn new(algorithm: HashAlgorithm) -> Result<Self> {
        Ok(Self { algorithm, backend: Some(Backend::new(algorithm)?), total_len: 0 })
    }

    /// Reset to the initial state, discarding any absorbed input.
    pub fn init(&mut self) -> Result<()> {
        self.backend = Some(Backend::new(self.algorithm)?);
        self.total_len = 0;
        Ok(())
    }

    /// Algorithm this context computes.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest length in bytes.
    pub fn digest_size(&self) -> usize {
        self.algorithm.digest_size()
    }

    /// Bytes absorbed since the last init. Never decreases before finalize.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// True once finalize has run and init has not.
    pub fn is_finalized(&self) -> bool {
        self.backend.is_none()
    }

    /// Absorb `data`. Zero-length input is a no-op.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: the state is finalized
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let backend = self.live_backend()?;
        if data.is_empty() {
            return Ok(());
        }

        backend.update(data);
        self.total_len = self.total_len.wrapping_add(data.len() as u64);
        Ok(())
    }

    /// Absorb a single byte.
    pub fn update_byte(&mut self, byte: u8) -> Result<()> {
        self.update(&[byte])
    }

    /// Absorb `data[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// - `BufferTooSmall`: the range exceeds `data`
    /// - `InvalidArgument`: the state is finalized
    pub fn update_range(&mut self, data: &[u8], offset: usize, len: usize) -> Result<()> {
        let range = checked_range(data.len(), offset, len)?;
        self.update(&data[range])
    }

    /// Finalize into `out`, writing exactly `digest_size()` bytes at its
    /// start. Returns the number of bytes written.
    ///
    /// The state is only consumed once the destination has been checked.
    ///
    /// # Errors
    ///
    /// - `BufferTooSmall`: `out` is shorter than the digest
    /// - `InvalidArgument`: the state is already finalized
    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let size = self.digest_size();
        self.live_backend()?;
        if out.len() < size {
            return Err(CryptoError::BufferTooSmall { needed: size, available: out.len() });
        }

        let backend = self
            .backend
            .take()
            .ok_or_else(|| CryptoError::internal("hash backend vanished during finalize"))?;
        backend.finalize_into(&mut out[..size]);

        tracing::trace!(algorithm = %self.algorithm, total_len = self.total_len, "hash finalized");
        Ok(size)
    }

    /// Finalize into a freshly allocated digest.
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let mut digest = vec![0u8; self.digest_size()];
        self.finalize_into(&mut digest)?;
        Ok(digest)
    }

    /// Overwrite this context with a deep copy of `src`.
    pub fn copy_from(&mut self, src: &HashState) {
        self.clone_from(src);
    }

    fn live_backend(&mut self) -> Result<&mut Backend> {
        self.backend.as_mut().ok_or_else(|| {
            CryptoError::invalid_argument("hash state is finalized; call init before reuse")
        })
    }
}

impl fmt::Debug for HashState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashState")
            .field("algorithm", &self.algorithm)
            .field("total_len", &self.total_len)
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

/// One-shot digest of `data`.
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
    let mut state = HashState::new(algorithm)?;
    state.update(data)?;
    state.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_digest(algorithm: HashAlgorithm, data: &[u8]) -> String {
        hex::encode(digest(algorithm, data).unwrap())
    }

    #[cfg(feature = "md5")]
    #[test]
    fn md5_known_answers() {
        assert_eq!(hex_digest(HashAlgorithm::Md5, b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(hex_digest(HashAlgorithm::Md5, b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            hex_digest(HashAlgorithm::Md5, b"message digest"),
            "f96b697d7cb7938d525a2f31aaf161d0"
        );
    }

    #[test]
    fn sha256_known_answer() {
        assert_eq!(
            hex_digest(HashAlgorithm::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_sizes_match_output() {
        for algorithm in HashAlgorithm::ALL.into_iter().filter(|a| a.is_enabled()) {
            let out = digest(algorithm, b"size check").unwrap();
            assert_eq!(out.len(), algorithm.digest_size(), "{algorithm}");
        }
    }

    #[test]
    fn codes_round_trip() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(HashAlgorithm::from_code(algorithm.code()).unwrap(), algorithm);
        }
        assert!(matches!(HashAlgorithm::from_code(99), Err(CryptoError::InvalidArgument { .. })));
    }

    #[test]
    fn names_resolve_loosely() {
        assert_eq!(HashAlgorithm::from_name("sha256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::from_name("SHA-384").unwrap(), HashAlgorithm::Sha384);
        assert_eq!(HashAlgorithm::from_name("sha").unwrap(), HashAlgorithm::Sha1);
        assert_eq!(HashAlgorithm::from_name("md5").unwrap(), HashAlgorithm::Md5);
        assert!(HashAlgorithm::from_name("whirlpool").is_err());
    }

    #[test]
    fn zero_length_update_is_noop() {
        let mut state = HashState::new(HashAlgorithm::Sha256).unwrap();
        state.update(&[]).unwrap();
        assert_eq!(state.total_len(), 0);
        assert_eq!(state.finalize().unwrap(), digest(HashAlgorithm::Sha256, b"").unwrap());
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut state = HashState::new(HashAlgorithm::Sha512).unwrap();
        for chunk in data.chunks(7) {
            state.update(chunk).unwrap();
        }
        assert_eq!(state.total_len(), data.len() as u64);
        assert_eq!(state.finalize().unwrap(), digest(HashAlgorithm::Sha512, data).unwrap());
    }

    #[test]
    fn finalized_state_rejects_update() {
        let mut state = HashState::new(HashAlgorithm::Sha256).unwrap();
        state.finalize().unwrap();
        assert!(state.is_finalized());

        assert!(matches!(state.update(b"more"), Err(CryptoError::InvalidArgument { .. })));
        assert!(matches!(state.finalize(), Err(CryptoError::InvalidArgument { .. })));

        state.init().unwrap();
        state.update(b"abc").unwrap();
        assert_eq!(state.finalize().unwrap(), digest(HashAlgorithm::Sha256, b"abc").unwrap());
    }

    #[test]
    fn short_destination_does_not_consume_state() {
        let mut state = HashState::new(HashAlgorithm::Sha256).unwrap();
        state.update(b"abc").unwrap();

        let mut short = [0u8; 16];
        let result = state.finalize_into(&mut short);
        assert!(matches!(result, Err(CryptoError::BufferTooSmall { needed: 32, available: 16 })));
        assert!(!state.is_finalized());
        assert_eq!(short, [0u8; 16], "no partial write");

        assert_eq!(state.finalize().unwrap(), digest(HashAlgorithm::Sha256, b"abc").unwrap());
    }

    #[test]
    fn finalize_into_larger_buffer_writes_only_digest() {
        let mut state = HashState::new(HashAlgorithm::Sha224).unwrap();
        let mut out = [0xEEu8; 40];
        let written = state.finalize_into(&mut out).unwrap();

        assert_eq!(written, 28);
        assert_eq!(&out[28..], &[0xEE; 12]);
    }

    #[test]
    fn update_range_checks_bounds() {
        let mut state = HashState::new(HashAlgorithm::Sha256).unwrap();
        let data = b"xxabcxx";

        state.update_range(data, 2, 3).unwrap();
        assert_eq!(state.finalize().unwrap(), digest(HashAlgorithm::Sha256, b"abc").unwrap());

        let mut state = HashState::new(HashAlgorithm::Sha256).unwrap();
        assert!(matches!(
            state.update_range(data, 5, 5),
            Err(CryptoError::BufferTooSmall { needed: 10, available: 7 })
        ));
        assert!(matches!(
            state.update_range(data, usize::MAX, 2),
            Err(CryptoError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn copy_preserves_continuation() {
        let mut original = HashState::new(HashAlgorithm::Sha256).unwrap();
        original.update(b"common prefix ").unwrap();

        let mut copy = HashState::new(HashAlgorithm::Sha384).unwrap();
        copy.copy_from(&original);
        assert_eq!(copy.algorithm(), original.algorithm());
        assert_eq!(copy.total_len(), original.total_len());

        let mut same = copy.clone();
        same.update(b"suffix A").unwrap();
        copy.update(b"suffix B").unwrap();
        original.update(b"suffix A").unwrap();

        let original_digest = original.finalize().unwrap();
        assert_eq!(same.finalize().unwrap(), original_digest);
        assert_ne!(copy.finalize().unwrap(), original_digest);
    }

    #[cfg(not(feature = "md5"))]
    #[test]
    fn disabled_algorithm_is_not_supported() {
        assert!(matches!(
            HashState::new(HashAlgorithm::Md5),
            Err(CryptoError::NotSupported { .. })
        ));
    }
}
