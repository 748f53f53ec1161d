//! Build-time capability report.
//!
//! Algorithms compiled out of a build stay visible in the public enums and
//! fail with `NotSupported` at call time. This module answers the question
//! ahead of time.

use crate::{ecc::CurveId, hash::HashAlgorithm};

/// What this build of the engine can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Digests usable with `HashState` and `Hmac`
    pub hashes: Vec<HashAlgorithm>,
    /// Curves with a key-operation backend
    pub curves: Vec<CurveId>,
    /// Curves known to the registry but without a backend
    pub registered_only: Vec<CurveId>,
    /// AES key sizes in bits
    pub aes_key_bits: [usize; 3],
}

impl Capabilities {
    /// Capabilities compiled into this binary.
    pub fn current() -> Self {
        let hashes = HashAlgorithm::ALL.into_iter().filter(|a| a.is_enabled()).collect();
        let (curves, registered_only) = CurveId::ALL.into_iter().partition(|c| c.has_backend());
        Self { hashes, curves, registered_only, aes_key_bits: [128, 192, 256] }
    }

    /// True if `algorithm` is available for hashing and HMAC.
    pub fn supports_hash(&self, algorithm: HashAlgorithm) -> bool {
        self.hashes.contains(&algorithm)
    }

    /// True if key operations on `curve` are available.
    pub fn supports_curve(&self, curve: CurveId) -> bool {
        self.curves.contains(&curve)
    }
}
