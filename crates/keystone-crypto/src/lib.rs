//! Keystone Cryptographic Engine
//!
//! Native provider behind a managed-runtime binding layer: AES-CBC, the
//! MD5/SHA digest family, HMAC, and elliptic-curve keys with ECDH and
//! ECDSA. The binding layer (argument marshalling, exception mapping) is
//! not part of this crate; it drives the contexts here and maps
//! [`CryptoError`] onto its own error model through [`ErrorCode`].
//!
//! # Data Flow
//!
//! ```text
//! caller ──► context::new ──► set_key / import ──► update* ──► finalize / sign / verify
//!                                    │
//!                  (ECC only)        ▼
//!                       curve name / id / params ──► CurveId ──► backend
//! ```
//!
//! # Contexts
//!
//! - [`AesCbc`]: block cipher with caller-visible CBC chaining state
//! - [`HashState`]: streaming digest with explicit copy
//! - [`Hmac`]: RFC 2104 MAC composed from two [`HashState`]s
//! - [`EccKey`]: curve key with generation, ECDH, ECDSA and DER codecs
//! - [`Rng`]: seedable CSPRNG injected into every randomized operation
//!
//! Each context is single-owner mutable state. Independent contexts may be
//! used from different threads; one context must not be shared without
//! external locking.
//!
//! # Security
//!
//! Secret material (keys, pads, scalars, shared secrets, intermediate
//! digests) lives in [`SecureBuffer`] or in zeroize-on-drop library types,
//! so it is zeroed on every exit path including errors. ECDH and ECDSA
//! scalar multiplication is constant time. Nothing secret is logged.
//!
//! # Build Configuration
//!
//! Cargo features gate the legacy digests (`md5`, `sha1`) and the curve
//! backends (`p256`, `p384`, `secp256k1`). Disabled algorithms remain in
//! the public enums and fail with `NotSupported`; [`Capabilities`] reports
//! what a build contains.

#![forbid(unsafe_code)]

pub mod aes_cbc;
pub mod capabilities;
pub mod ecc;
pub mod error;
pub mod hash;
pub mod hmac;
pub mod rng;
pub mod secure_buffer;

pub use aes_cbc::{AesCbc, BLOCK_SIZE, Direction};
pub use capabilities::Capabilities;
pub use ecc::{CurveId, EccKey};
pub use error::{CryptoError, ErrorCode, Result};
pub use hash::{HashAlgorithm, HashState, digest};
pub use hmac::{Hmac, hmac_size_by_code};
pub use rng::Rng;
pub use secure_buffer::SecureBuffer;
