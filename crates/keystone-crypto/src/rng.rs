//! Random number generator context.
//!
//! The generator is owned by the caller and injected by reference into every
//! operation that needs randomness (key generation and ECDSA nonce
//! hedging). There is no hidden process-wide generator: tests seed a
//! deterministic instance with [`Rng::from_seed`], production code seeds
//! from the operating system with [`Rng::init`].
//!
//! A context that was never seeded is a valid value, not undefined
//! behaviour: operations that draw from it fail with `InvalidArgument`.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::error::{CryptoError, Result};

/// CSPRNG context.
#[derive(Default)]
pub struct Rng {
    generator: Option<ChaCha20Rng>,
}

impl Rng {
    /// Create an unseeded context.
    pub fn new() -> Self {
        Self { generator: None }
    }

    /// Create a context seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        let mut rng = Self::new();
        rng.init();
        rng
    }

    /// Create a deterministic context from a 32-byte seed.
    ///
    /// Same seed, same output stream. Meant for tests and known-answer
    /// reproduction only.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { generator: Some(ChaCha20Rng::from_seed(seed)) }
    }

    /// Seed (or reseed) this context from operating system entropy.
    pub fn init(&mut self) {
        self.generator = Some(ChaCha20Rng::from_entropy());
        tracing::debug!("rng seeded from os entropy");
    }

    /// Drop the generator state. The context can be seeded again afterwards.
    pub fn free(&mut self) {
        self.generator = None;
    }

    /// True if the context has been seeded.
    pub fn is_initialized(&self) -> bool {
        self.generator.is_some()
    }

    /// Fill `output` with random bytes.
    pub fn generate_block(&mut self, output: &mut [u8]) -> Result<()> {
        use rand::RngCore;

        self.generator()?.fill_bytes(output);
        Ok(())
    }

    /// Generate a single random byte.
    pub fn generate_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.generate_block(&mut byte)?;
        Ok(byte[0])
    }

    /// Borrow the underlying generator for APIs that take a CSPRNG directly.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: the context has not been seeded
    pub(crate) fn generator(&mut self) -> Result<&mut ChaCha20Rng> {
        self.generator.as_mut().ok_or_else(|| CryptoError::invalid_argument("RNG not initialized"))
    }
}

impl std::fmt::Debug for Rng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rng").field("initialized", &self.is_initialized()).finish()
    }
}
