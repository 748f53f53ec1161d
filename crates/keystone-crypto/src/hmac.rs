//! HMAC (RFC 2104) composed from two [`HashState`] instances.
//!
//! ```text
//! key ──(hash if longer than block)──► K (padded to block size)
//!
//! inner = H((K ⊕ ipad) || message)
//! mac   = H((K ⊕ opad) || inner)
//! ```
//!
//! The derived pads live in [`SecureBuffer`]s and are zeroed when the
//! context is rekeyed, finalized or dropped. A context is single-use: after
//! `finalize` it must be rekeyed with [`Hmac::set_key`] before it accepts
//! input again.

use crate::{
    error::{CryptoError, Result},
    hash::{HashAlgorithm, HashState},
    secure_buffer::{SecureBuffer, checked_range},
};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Resolve a hash algorithm for keyed use.
///
/// Key setup and output sizing both go through here so they can never
/// disagree about which algorithms exist.
fn resolve(algorithm: HashAlgorithm) -> Result<HashAlgorithm> {
    if algorithm.is_enabled() {
        Ok(algorithm)
    } else {
        Err(CryptoError::not_supported(format!("HMAC-{algorithm}")))
    }
}

/// MAC output size for a numeric hash identifier.
///
/// # Errors
///
/// - `InvalidArgument`: unknown identifier
/// - `NotSupported`: known identifier compiled out of this build
pub fn hmac_size_by_code(code: i32) -> Result<usize> {
    Ok(resolve(HashAlgorithm::from_code(code)?)?.digest_size())
}

struct Keyed {
    algorithm: HashAlgorithm,
    /// Absorbed `K ⊕ ipad`, then message data
    inner: HashState,
    /// Fresh state, fed `K ⊕ opad` and the inner digest at finalize
    outer: HashState,
    inner_pad: SecureBuffer,
    outer_pad: SecureBuffer,
}

enum Phase {
    Unkeyed,
    Keyed(Box<Keyed>),
    Finalized(HashAlgorithm),
}

/// HMAC context.
pub struct Hmac {
    phase: Phase,
}

impl Default for Hmac {
    fn default() -> Self {
        Self::new()
    }
}

impl Hmac {
    /// Create an unkeyed context.
    pub fn new() -> Self {
        Self { phase: Phase::Unkeyed }
    }

    /// Create a context keyed with `key` under `algorithm`.
    pub fn with_key(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self> {
        let mut mac = Self::new();
        mac.set_key(algorithm, key)?;
        Ok(mac)
    }

    /// Install a key, deriving fresh pads and resetting the inner hash.
    ///
    /// Any previous key material is zeroed. On error the context is left
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// - `NotSupported`: algorithm compiled out of this build
    /// - `OutOfMemory`: pad allocation failed
    pub fn set_key(&mut self, algorithm: HashAlgorithm, key: &[u8]) -> Result<()> {
        let algorithm = resolve(algorithm)?;
        let block_size = algorithm.block_size();

        let mut key_block = SecureBuffer::allocate(block_size)?;
        if key.len() > block_size {
            let mut hashed = HashState::new(algorithm)?;
            hashed.update(key)?;
            hashed.finalize_into(key_block.as_mut_slice())?;
        } else {
            key_block.as_mut_slice()[..key.len()].copy_from_slice(key);
        }

        let mut inner_pad = SecureBuffer::allocate(block_size)?;
        let mut outer_pad = SecureBuffer::allocate(block_size)?;
        for ((k, i), o) in key_block
            .as_slice()
            .iter()
            .zip(inner_pad.as_mut_slice().iter_mut())
            .zip(outer_pad.as_mut_slice().iter_mut())
        {
            *i = k ^ IPAD;
            *o = k ^ OPAD;
        }

        let mut inner = HashState::new(algorithm)?;
        inner.update(inner_pad.as_slice())?;
        let outer = HashState::new(algorithm)?;

        let keyed = Keyed { algorithm, inner, outer, inner_pad, outer_pad };
        self.phase = Phase::Keyed(Box::new(keyed));

        tracing::debug!(%algorithm, key_len = key.len(), "hmac key installed");
        Ok(())
    }

    /// Algorithm of the installed (or most recently finalized) key.
    pub fn algorithm(&self) -> Option<HashAlgorithm> {
        match &self.phase {
            Phase::Unkeyed => None,
            Phase::Keyed(keyed) => Some(keyed.algorithm),
            Phase::Finalized(algorithm) => Some(*algorithm),
        }
    }

    /// MAC length in bytes for the installed key.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: no key has been set
    pub fn output_size(&self) -> Result<usize> {
        self.algorithm()
            .map(HashAlgorithm::digest_size)
            .ok_or_else(|| CryptoError::invalid_argument("HMAC key not set"))
    }

    /// Absorb message data. Zero-length input is a no-op.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: no key set, or context already finalized
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let keyed = self.keyed()?;
        keyed.inner.update(data)
    }

    /// Absorb a single byte.
    pub fn update_byte(&mut self, byte: u8) -> Result<()> {
        self.update(&[byte])
    }

    /// Absorb `data[offset..offset + len]`.
    pub fn update_range(&mut self, data: &[u8], offset: usize, len: usize) -> Result<()> {
        let range = checked_range(data.len(), offset, len)?;
        self.update(&data[range])
    }

    /// Finalize into `out`, writing exactly `output_size()` bytes.
    ///
    /// The destination is checked before any state is consumed.
    ///
    /// # Errors
    ///
    /// - `BufferTooSmall`: `out` is shorter than the MAC
    /// - `InvalidArgument`: no key set, or context already finalized
    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let size = self.keyed()?.algorithm.digest_size();
        if out.len() < size {
            return Err(CryptoError::BufferTooSmall { needed: size, available: out.len() });
        }

        let Phase::Keyed(mut keyed) = std::mem::replace(&mut self.phase, Phase::Unkeyed) else {
            return Err(CryptoError::internal("HMAC phase changed during finalize"));
        };
        self.phase = Phase::Finalized(keyed.algorithm);

        let mut inner_digest = SecureBuffer::allocate(size)?;
        keyed.inner.finalize_into(inner_digest.as_mut_slice())?;

        keyed.outer.update(keyed.outer_pad.as_slice())?;
        keyed.outer.update(inner_digest.as_slice())?;
        keyed.outer.finalize_into(&mut out[..size])
    }

    /// Finalize into a freshly allocated MAC.
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let mut mac = vec![0u8; self.output_size()?];
        self.finalize_into(&mut mac)?;
        Ok(mac)
    }

    /// Finalize and compare against `expected` in constant time.
    ///
    /// A mismatch is `Ok(false)`, not an error.
    pub fn verify(&mut self, expected: &[u8]) -> Result<bool> {
        let mut computed = SecureBuffer::allocate(self.output_size()?)?;
        self.finalize_into(computed.as_mut_slice())?;
        Ok(computed.ct_eq(expected))
    }

    fn keyed(&mut self) -> Result<&mut Keyed> {
        match &mut self.phase {
            Phase::Keyed(keyed) => Ok(keyed),
            Phase::Unkeyed => Err(CryptoError::invalid_argument("HMAC key not set")),
            Phase::Finalized(_) => {
                Err(CryptoError::invalid_argument("HMAC already finalized; set a key again"))
            },
        }
    }
}

impl std::fmt::Debug for Hmac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match &self.phase {
            Phase::Unkeyed => "unkeyed",
            Phase::Keyed(_) => "keyed",
            Phase::Finalized(_) => "finalized",
        };
        f.debug_struct("Hmac").field("algorithm", &self.algorithm()).field("phase", &phase).finish()
    }
}
