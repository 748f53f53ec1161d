//! Curve arithmetic backends.
//!
//! Each backend is a thin byte-level adapter over one RustCrypto curve
//! crate. Keys cross this boundary as a field-width big-endian scalar and
//! an uncompressed X9.63 point, so [`super::key::EccKey`] never sees a
//! curve-specific type.
//!
//! Scalar multiplication in every backend (key generation, ECDH, signing)
//! runs in constant time with respect to the private scalar. This is a
//! requirement of the engine: a timing leak of the scalar is a key
//! disclosure.
//!
//! Backend errors are logged and collapsed into the engine taxonomy here;
//! nothing above this module matches on RustCrypto error types.

macro_rules! curve_backend {
    ($module:ident, $krate:ident, $feature:literal, $field_size:literal) => {
        #[cfg(feature = $feature)]
        pub(crate) mod $module {
            use rand_chacha::ChaCha20Rng;
            use zeroize::Zeroize;
            use $krate::{
                PublicKey, SecretKey,
                ecdsa::{
                    Signature, SigningKey, VerifyingKey,
                    signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner},
                },
                elliptic_curve::sec1::ToEncodedPoint,
                pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
            };

            use crate::{
                error::{CryptoError, Result},
                secure_buffer::SecureBuffer,
            };

            pub(crate) const FIELD_SIZE: usize = $field_size;

            fn secret_from_scalar(scalar: &[u8]) -> Result<SecretKey> {
                if scalar.len() != FIELD_SIZE {
                    return Err(CryptoError::internal("scalar is not field width"));
                }
                SecretKey::from_slice(scalar).map_err(|_| {
                    CryptoError::invalid_key("private scalar is zero or not below the group order")
                })
            }

            fn public_from_point(point: &[u8]) -> Result<PublicKey> {
                PublicKey::from_sec1_bytes(point).map_err(|_| off_curve())
            }

            fn off_curve() -> CryptoError {
                CryptoError::invalid_key("public point is not a valid curve point")
            }

            fn scalar_bytes(secret: &SecretKey) -> Result<SecureBuffer> {
                let mut bytes = secret.to_bytes();
                let scalar = SecureBuffer::from_slice(&bytes);
                bytes.as_mut_slice().zeroize();
                scalar
            }

            fn encoding_failed(format: &str, error: &dyn std::fmt::Display) -> CryptoError {
                CryptoError::internal(format!("{format} encoding failed: {error}"))
            }

            fn x963(public: &PublicKey) -> Vec<u8> {
                public.to_encoded_point(false).as_bytes().to_vec()
            }

            /// Uniform scalar in `[1, n-1]` and its public point.
            pub(crate) fn generate(rng: &mut ChaCha20Rng) -> Result<(SecureBuffer, Vec<u8>)> {
                let secret = SecretKey::random(rng);
                Ok((scalar_bytes(&secret)?, x963(&secret.public_key())))
            }

            pub(crate) fn public_from_scalar(scalar: &[u8]) -> Result<Vec<u8>> {
                Ok(x963(&secret_from_scalar(scalar)?.public_key()))
            }

            pub(crate) fn validate_scalar(scalar: &[u8]) -> Result<()> {
                secret_from_scalar(scalar).map(drop)
            }

            /// Parse any SEC1 point encoding and return it uncompressed.
            ///
            /// Rejects points off the curve and the identity.
            pub(crate) fn normalize_point(point: &[u8]) -> Result<Vec<u8>> {
                Ok(x963(&public_from_point(point)?))
            }

            /// x-coordinate of `scalar · peer`, field width.
            pub(crate) fn shared_secret(scalar: &[u8], peer: &[u8]) -> Result<SecureBuffer> {
                let secret = secret_from_scalar(scalar)?;
                let peer = public_from_point(peer)?;
                let shared =
                    $krate::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
                SecureBuffer::from_slice(shared.raw_secret_bytes().as_slice())
            }

            /// Hedged RFC 6979 ECDSA over a prehash, DER-encoded into `out`.
            pub(crate) fn sign_prehash(
                scalar: &[u8],
                prehash: &[u8],
                rng: &mut ChaCha20Rng,
                out: &mut [u8],
            ) -> Result<usize> {
                let signing_key = SigningKey::from(&secret_from_scalar(scalar)?);
                let signature: Signature =
                    signing_key.sign_prehash_with_rng(rng, prehash).map_err(|error| {
                        tracing::warn!(%error, "ecdsa signing rejected prehash");
                        CryptoError::invalid_argument("hash rejected by signer")
                    })?;

                let der = signature.to_der();
                let encoded = der.as_bytes();
                if encoded.len() > out.len() {
                    return Err(CryptoError::internal(format!(
                        "signature is {} bytes, exceeds predicted maximum {}",
                        encoded.len(),
                        out.len()
                    )));
                }
                out[..encoded.len()].copy_from_slice(encoded);
                Ok(encoded.len())
            }

            /// Malformed signatures verify as false. Both `s` and `n - s` are
            /// accepted.
            pub(crate) fn verify_prehash(
                point: &[u8],
                prehash: &[u8],
                signature: &[u8],
            ) -> Result<bool> {
                let verifying_key = VerifyingKey::from_sec1_bytes(point).map_err(|_| off_curve())?;
                let Ok(signature) = Signature::from_der(signature) else {
                    tracing::debug!("signature is not a well-formed DER ECDSA-Sig-Value");
                    return Ok(false);
                };
                // secp256k1 verification rejects high-S
                let signature = signature.normalize_s().unwrap_or(signature);
                Ok(verifying_key.verify_prehash(prehash, &signature).is_ok())
            }

            /// SEC1 `ECPrivateKey` with namedCurve parameters and public key.
            pub(crate) fn to_sec1_der(scalar: &[u8]) -> Result<SecureBuffer> {
                let der = secret_from_scalar(scalar)?
                    .to_sec1_der()
                    .map_err(|error| encoding_failed("SEC1", &error))?;
                SecureBuffer::from_slice(&der)
            }

            pub(crate) fn from_sec1_der(der: &[u8]) -> Result<(SecureBuffer, Vec<u8>)> {
                let secret = SecretKey::from_sec1_der(der).map_err(|error| {
                    tracing::warn!(%error, "SEC1 private key rejected");
                    CryptoError::invalid_key("SEC1 private key does not decode on this curve")
                })?;
                Ok((scalar_bytes(&secret)?, x963(&secret.public_key())))
            }

            pub(crate) fn to_pkcs8_der(scalar: &[u8]) -> Result<SecureBuffer> {
                let document = secret_from_scalar(scalar)?
                    .to_pkcs8_der()
                    .map_err(|error| encoding_failed("PKCS8", &error))?;
                SecureBuffer::from_slice(document.as_bytes())
            }

            pub(crate) fn from_pkcs8_der(der: &[u8]) -> Result<(SecureBuffer, Vec<u8>)> {
                let secret = SecretKey::from_pkcs8_der(der).map_err(|error| {
                    tracing::warn!(%error, "PKCS8 private key rejected");
                    CryptoError::invalid_key("PKCS8 private key does not decode on this curve")
                })?;
                Ok((scalar_bytes(&secret)?, x963(&secret.public_key())))
            }

            /// SubjectPublicKeyInfo with namedCurve parameters.
            pub(crate) fn to_spki_der(point: &[u8]) -> Result<Vec<u8>> {
                let document = public_from_point(point)?
                    .to_public_key_der()
                    .map_err(|error| encoding_failed("SPKI", &error))?;
                Ok(document.as_bytes().to_vec())
            }

            pub(crate) fn from_spki_der(der: &[u8]) -> Result<Vec<u8>> {
                let public = PublicKey::from_public_key_der(der).map_err(|error| {
                    tracing::warn!(%error, "SPKI public key rejected");
                    CryptoError::invalid_key("public key does not decode on this curve")
                })?;
                Ok(x963(&public))
            }

            #[cfg(test)]
            mod tests {
                use rand::SeedableRng;

                use super::*;

                #[test]
                fn both_s_forms_verify() {
                    let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
                    let (scalar, point) = generate(&mut rng).unwrap();
                    let prehash = [7u8; FIELD_SIZE];
                    let mut out = [0u8; 160];
                    let len =
                        sign_prehash(scalar.as_slice(), &prehash, &mut rng, &mut out).unwrap();

                    let signature = Signature::from_der(&out[..len]).unwrap();
                    let (r, s) = signature.split_scalars();
                    let negated = Signature::from_scalars(r, -s).unwrap();
                    assert_ne!(negated.to_der().as_bytes(), &out[..len]);

                    for candidate in [signature, negated] {
                        let der = candidate.to_der();
                        assert!(verify_prehash(&point, &prehash, der.as_bytes()).unwrap());
                    }
                    assert!(!verify_prehash(&point, &[8u8; FIELD_SIZE], &out[..len]).unwrap());
                }
            }
        }
    };
}

curve_backend!(p256_backend, p256, "p256", 32);
curve_backend!(p384_backend, p384, "p384", 48);
curve_backend!(k256_backend, k256, "secp256k1", 32);

/// Run `$body` with `$backend` bound to the backend module for `$curve`.
///
/// Curves without a compiled backend evaluate to `NotSupported`.
macro_rules! with_backend {
    ($curve:expr, $backend:ident => $body:expr) => {
        match $curve {
            #[cfg(feature = "p256")]
            $crate::ecc::CurveId::Secp256r1 => {
                use $crate::ecc::backend::p256_backend as $backend;
                $body
            },
            #[cfg(feature = "p384")]
            $crate::ecc::CurveId::Secp384r1 => {
                use $crate::ecc::backend::p384_backend as $backend;
                $body
            },
            #[cfg(feature = "secp256k1")]
            $crate::ecc::CurveId::Secp256k1 => {
                use $crate::ecc::backend::k256_backend as $backend;
                $body
            },
            other => {
                Err($crate::error::CryptoError::not_supported(format!("{other} key operations")))
            },
        }
    };
}

pub(crate) use with_backend;
