//! Elliptic-curve keys: generation, ECDH, ECDSA and key encodings.
//!
//! # Components
//!
//! - [`curve`]: registry of supported curves, resolvable by name, numeric
//!   id, OID or raw domain parameters
//! - [`EccKey`]: key context covering generation, import/export, ECDH,
//!   ECDSA sign/verify
//! - `backend`: per-curve adapters over the RustCrypto curve crates,
//!   compiled in by cargo feature
//!
//! Every key operation resolves a [`CurveId`] first. A registered curve
//! whose backend is compiled out reports `NotSupported`; an unknown curve
//! reports `UnsupportedCurve`.

mod backend;
pub mod curve;
mod key;

pub use curve::{
    CurveId, CurveParams, DomainParams, curve_id_from_params, curve_name_from_id,
    curve_size_from_name,
};
pub use key::EccKey;
