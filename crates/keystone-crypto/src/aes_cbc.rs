//! AES in CBC mode with caller-visible chaining state.
//!
//! A context holds one expanded key schedule and the current IV block.
//! Every successful [`AesCbc::update`] advances the IV to the last
//! ciphertext block it processed, so consecutive calls continue a single
//! chain. Independent streams need independent contexts.
//!
//! # Failure model
//!
//! All argument checks (key present, alignment, destination capacity,
//! offsets) run before the first block is touched. A rejected call writes
//! nothing and leaves the chaining state unchanged.
//!
//! No padding is applied. Input must be a whole number of blocks.

use aes::{
    Aes128, Aes192, Aes256, Block,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit},
};
use zeroize::Zeroize;

use crate::{
    error::{CryptoError, Result},
    secure_buffer::checked_range,
};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Cipher direction, fixed when the key is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out
    Encrypt,
    /// Ciphertext in, plaintext out
    Decrypt,
}

// Key schedules zeroize themselves on drop (aes `zeroize` feature)
enum Schedule {
    Aes128(Box<Aes128>),
    Aes192(Box<Aes192>),
    Aes256(Box<Aes256>),
}

impl Schedule {
    fn expand(key: &[u8]) -> Result<Self> {
        let schedule = match key.len() {
            16 => Aes128::new_from_slice(key).map(|k| Self::Aes128(Box::new(k))),
            24 => Aes192::new_from_slice(key).map(|k| Self::Aes192(Box::new(k))),
            32 => Aes256::new_from_slice(key).map(|k| Self::Aes256(Box::new(k))),
            other => {
                return Err(CryptoError::invalid_argument(format!(
                    "AES key must be 16, 24 or 32 bytes, got {other}"
                )));
            },
        };
        schedule.map_err(|_| CryptoError::internal("AES key schedule rejected a valid key length"))
    }

    fn key_bits(&self) -> usize {
        match self {
            Self::Aes128(_) => 128,
            Self::Aes192(_) => 192,
            Self::Aes256(_) => 256,
        }
    }

    fn encrypt(&self, block: &mut Block) {
        match self {
            Self::Aes128(k) => k.encrypt_block(block),
            Self::Aes192(k) => k.encrypt_block(block),
            Self::Aes256(k) => k.encrypt_block(block),
        }
    }

    fn decrypt(&self, block: &mut Block) {
        match self {
            Self::Aes128(k) => k.decrypt_block(block),
            Self::Aes192(k) => k.decrypt_block(block),
            Self::Aes256(k) => k.decrypt_block(block),
        }
    }
}

/// AES-CBC cipher context.
#[derive(Default)]
pub struct AesCbc {
    schedule: Option<Schedule>,
    direction: Option<Direction>,
    iv: [u8; BLOCK_SIZE],
}

impl AesCbc {
    /// Create a context with no key installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context and install `key`.
    pub fn with_key(key: &[u8], iv: Option<&[u8]>, direction: Direction) -> Result<Self> {
        let mut cipher = Self::new();
        cipher.set_key(key, iv, direction)?;
        Ok(cipher)
    }

    /// Install a key and IV, replacing any previous key and chaining state.
    ///
    /// `iv = None` is taken as a deliberate all-zero IV.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: key is not 16, 24 or 32 bytes, or IV is not 16 bytes
    pub fn set_key(&mut self, key: &[u8], iv: Option<&[u8]>, direction: Direction) -> Result<()> {
        let mut next_iv = [0u8; BLOCK_SIZE];
        if let Some(iv) = iv {
            if iv.len() != BLOCK_SIZE {
                return Err(CryptoError::invalid_argument(format!(
                    "AES IV must be {BLOCK_SIZE} bytes, got {}",
                    iv.len()
                )));
            }
            next_iv.copy_from_slice(iv);
        }

        let schedule = Schedule::expand(key)?;
        tracing::debug!(
            key_bits = schedule.key_bits(),
            ?direction,
            zero_iv = iv.is_none(),
            "aes key installed"
        );

        self.iv.zeroize();
        self.iv = next_iv;
        self.schedule = Some(schedule);
        self.direction = Some(direction);
        Ok(())
    }

    /// Direction chosen at `set_key`, if a key is installed.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Current chaining block.
    pub fn iv(&self) -> &[u8; BLOCK_SIZE] {
        &self.iv
    }

    /// Process `input` into the front of `output`, returning bytes written.
    ///
    /// Zero-length input is a no-op that returns `Ok(0)`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: no key set, or `input.len()` is not a multiple of 16
    /// - `BufferTooSmall`: `output` is shorter than `input`
    pub fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let len = input.len();
        self.check_request(len, output.len())?;
        if len == 0 {
            return Ok(0);
        }
        output[..len].copy_from_slice(input);
        self.process(&mut output[..len])?;
        Ok(len)
    }

    /// Process `input[in_offset..in_offset + len]` into
    /// `output[out_offset..]`, returning bytes written.
    ///
    /// # Errors
    ///
    /// As [`AesCbc::update`], plus `BufferTooSmall` if either range falls
    /// outside its slice.
    pub fn update_range(
        &mut self,
        input: &[u8],
        in_offset: usize,
        len: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize> {
        self.check_request(len, len)?;
        let src = checked_range(input.len(), in_offset, len)?;
        let dst = checked_range(output.len(), out_offset, len)?;
        self.update(&input[src], &mut output[dst])
    }

    /// Process `data` in place. This is the only supported form of overlap.
    pub fn update_in_place(&mut self, data: &mut [u8]) -> Result<usize> {
        let len = data.len();
        self.check_request(len, len)?;
        if len == 0 {
            return Ok(0);
        }
        self.process(data)?;
        Ok(len)
    }

    /// Drop the key schedule and zero the chaining state.
    pub fn free(&mut self) {
        self.schedule = None;
        self.direction = None;
        self.iv.zeroize();
    }

    // Argument checks shared by every update form; first failure wins.
    fn check_request(&self, len: usize, available: usize) -> Result<()> {
        if self.schedule.is_none() {
            return Err(CryptoError::invalid_argument("AES key not set"));
        }
        if len % BLOCK_SIZE != 0 {
            return Err(CryptoError::invalid_argument(format!(
                "AES-CBC input must be a multiple of {BLOCK_SIZE} bytes, got {len}"
            )));
        }
        if available < len {
            return Err(CryptoError::BufferTooSmall { needed: len, available });
        }
        Ok(())
    }

    fn process(&mut self, data: &mut [u8]) -> Result<()> {
        let (Some(schedule), Some(direction)) = (&self.schedule, self.direction) else {
            return Err(CryptoError::invalid_argument("AES key not set"));
        };

        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            let block = Block::from_mut_slice(chunk);
            match direction {
                Direction::Encrypt => {
                    xor_in_place(block, &self.iv);
                    schedule.encrypt(block);
                    self.iv.copy_from_slice(block);
                },
                Direction::Decrypt => {
                    let mut next_iv = [0u8; BLOCK_SIZE];
                    next_iv.copy_from_slice(block);
                    schedule.decrypt(block);
                    xor_in_place(block, &self.iv);
                    self.iv = next_iv;
                },
            }
        }

        tracing::trace!(len = data.len(), "aes-cbc blocks processed");
        Ok(())
    }
}

fn xor_in_place(block: &mut [u8], mask: &[u8; BLOCK_SIZE]) {
    for (b, m) in block.iter_mut().zip(mask) {
        *b ^= m;
    }
}

impl Drop for AesCbc {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}

impl std::fmt::Debug for AesCbc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCbc")
            .field("key_bits", &self.schedule.as_ref().map(Schedule::key_bits))
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
