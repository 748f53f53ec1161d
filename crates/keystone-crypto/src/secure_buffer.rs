//! Owned byte buffer that is zeroed before its memory is released.
//!
//! Every component that touches key material or intermediate secret state
//! stores it in a [`SecureBuffer`]. Zeroing happens in `Drop`, so it runs on
//! every exit path including early returns through `?`.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result};

/// Zero-initialized, zero-on-release byte buffer.
#[derive(Clone, Default)]
pub struct SecureBuffer {
    bytes: Vec<u8>,
}

impl SecureBuffer {
    /// Allocate `len` zeroed bytes.
    ///
    /// # Errors
    ///
    /// - `OutOfMemory`: the allocator could not satisfy the request
    pub fn allocate(len: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).map_err(|_| CryptoError::OutOfMemory { requested: len })?;
        bytes.resize(len, 0);
        Ok(Self { bytes })
    }

    /// Allocate a buffer holding a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let mut buffer = Self::allocate(data.len())?;
        buffer.bytes.copy_from_slice(data);
        Ok(buffer)
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutably borrow the contents.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Shorten the buffer to `len` bytes, zeroing the discarded tail.
    ///
    /// Has no effect if `len` is not smaller than the current length.
    pub fn truncate(&mut self, len: usize) {
        if len < self.bytes.len() {
            self.bytes[len..].zeroize();
            self.bytes.truncate(len);
        }
    }

    /// Constant-time comparison against `other`.
    ///
    /// Lengths are not secret; a length mismatch returns false immediately.
    pub fn ct_eq(&self, other: &[u8]) -> bool {
        self.bytes.as_slice().ct_eq(other).into()
    }

    /// Zero and release the buffer now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl AsRef<[u8]> for SecureBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Zeroize for SecureBuffer {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl ZeroizeOnDrop for SecureBuffer {}

// Never print contents
impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer").field("len", &self.bytes.len()).finish_non_exhaustive()
    }
}

/// Validate `offset..offset + len` against a buffer of `available` bytes.
pub(crate) fn checked_range(
    available: usize,
    offset: usize,
    len: usize,
) -> Result<std::ops::Range<usize>> {
    let end = offset.checked_add(len).ok_or_else(|| {
        CryptoError::invalid_argument(format!("range overflow: offset {offset} + length {len}"))
    })?;
    if end > available {
        return Err(CryptoError::BufferTooSmall { needed: end, available });
    }
    Ok(offset..end)
}
