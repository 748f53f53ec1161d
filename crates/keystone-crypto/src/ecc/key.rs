//! ECC key context.
//!
//! An [`EccKey`] moves through a small lifecycle:
//!
//! ```text
//! new ──► make_key / import_* / *_decode ──► sign / verify / ECDH / export ──► free
//! ```
//!
//! The private scalar is held field-width in a [`SecureBuffer`] and zeroed
//! on `free`, on re-import, and on drop. The public point is held as an
//! uncompressed X9.63 encoding. Either may be absent: a key is *private*
//! when the scalar is present, *public-only* when only the point is.
//!
//! Import paths validate what they are given (scalar range, point on curve)
//! but do not cross-check scalar against point; [`EccKey::check_key`] does.

use der::Decode;
use spki::ObjectIdentifier;

use super::{backend::with_backend, curve::CurveId};
use crate::{
    error::{CryptoError, Result},
    rng::Rng,
    secure_buffer::SecureBuffer,
};

/// id-ecPublicKey
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Elliptic-curve key pair, private key, or public key.
#[derive(Default)]
pub struct EccKey {
    curve: Option<CurveId>,
    private: Option<SecureBuffer>,
    public: Option<Vec<u8>>,
}

impl EccKey {
    /// Create an empty key with no curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key pair on the default curve for `bits`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: `bits <= 0`, or `rng` is not seeded
    /// - `UnsupportedCurve`: no registered curve has this size
    /// - `NotSupported`: the curve has no backend in this build
    pub fn make_key(&mut self, rng: &mut Rng, bits: i32) -> Result<()> {
        let curve = CurveId::from_bits(bits)?;
        self.generate(rng, curve)
    }

    /// Generate a key pair on the named curve.
    ///
    /// A positive `bits` must agree with the curve's field size. Zero or a
    /// negative `bits` means "use the curve's own size"; unlike
    /// [`EccKey::make_key`], it is not an error here.
    pub fn make_key_ex(&mut self, rng: &mut Rng, bits: i32, curve_name: &str) -> Result<()> {
        let curve = CurveId::from_name(curve_name)?;
        let implied = CurveId::from_bits(bits).ok().map(CurveId::field_size);
        if bits > 0 && implied != Some(curve.field_size()) {
            return Err(CryptoError::invalid_argument(format!(
                "{bits}-bit size does not match {curve}"
            )));
        }
        self.generate(rng, curve)
    }

    /// Generate a key pair on `curve`.
    pub fn generate(&mut self, rng: &mut Rng, curve: CurveId) -> Result<()> {
        let generator = rng.generator()?;
        let (scalar, point) = with_backend!(curve, b => b::generate(generator))?;
        self.install(curve, Some(scalar), Some(point));
        tracing::debug!(%curve, "ecc key generated");
        Ok(())
    }

    /// Verify the key is usable.
    ///
    /// The public point must be present, on the curve and not the identity.
    /// If a private scalar is present it must lie in `[1, n-1]` and
    /// `scalar · G` must equal the public point.
    ///
    /// # Errors
    ///
    /// - `InvalidKey`: any check failed
    /// - `InvalidArgument`: the key is empty
    pub fn check_key(&self) -> Result<()> {
        let curve = self.require_curve()?;
        let public = self.require_public()?;
        let normalized = with_backend!(curve, b => b::normalize_point(public))?;

        if let Some(scalar) = &self.private {
            let derived = with_backend!(curve, b => b::public_from_scalar(scalar.as_slice()))?;
            if derived != normalized {
                tracing::warn!(%curve, "private scalar does not match public point");
                return Err(CryptoError::invalid_key("private scalar does not match public point"));
            }
        }
        Ok(())
    }

    /// Import a big-endian private scalar and optional public point.
    ///
    /// A single leading `0x00` (sign byte) is stripped. The public point is
    /// not derived when absent; call [`EccKey::make_pub`] for that. Without
    /// `curve_name`, the curve is inferred from the point length, or from
    /// the scalar length when no point is supplied. The input length is
    /// tried before the stripped length, so a field-width scalar whose top
    /// byte is zero keeps its curve.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: empty scalar, or malformed point encoding
    /// - `UnsupportedCurve`: unknown curve name, or no curve of inferred size
    /// - `InvalidKey`: scalar out of range, or point not on the curve
    pub fn import_private(
        &mut self,
        private: &[u8],
        public: Option<&[u8]>,
        curve_name: Option<&str>,
    ) -> Result<()> {
        let scalar = match private {
            [] => return Err(CryptoError::invalid_argument("private key is empty")),
            [0, rest @ ..] => rest,
            all => all,
        };

        // A field-width export may itself begin with 0x00
        let curve = match (curve_name, public) {
            (Some(name), _) => CurveId::from_name(name)?,
            (None, Some(point)) => CurveId::from_field_size(point_field_size(point)?)?,
            (None, None) => CurveId::from_field_size(private.len())
                .or_else(|_| CurveId::from_field_size(scalar.len()))?,
        };
        ensure_backend(curve)?;

        let field_size = curve.field_size();
        if scalar.len() > field_size {
            return Err(CryptoError::invalid_key(format!(
                "private scalar is {} bytes, {curve} allows {field_size}",
                scalar.len()
            )));
        }
        let mut padded = SecureBuffer::allocate(field_size)?;
        padded.as_mut_slice()[field_size - scalar.len()..].copy_from_slice(scalar);
        with_backend!(curve, b => b::validate_scalar(padded.as_slice()))?;

        let point = match public {
            Some(point) => Some(normalize(curve, point)?),
            None => None,
        };

        self.install(curve, Some(padded), point);
        tracing::debug!(%curve, with_public = self.public.is_some(), "ecc private key imported");
        Ok(())
    }

    /// Export the private scalar, big-endian and field width.
    ///
    /// # Errors
    ///
    /// - `InvalidKey`: the key has no private scalar
    pub fn export_private(&self) -> Result<SecureBuffer> {
        SecureBuffer::from_slice(self.require_private()?.as_slice())
    }

    /// Import a public point in X9.63 form (uncompressed or compressed).
    ///
    /// Without `curve`, the curve is inferred from the encoding length.
    /// Any private scalar previously held is discarded.
    pub fn import_x963(&mut self, point: &[u8], curve: Option<CurveId>) -> Result<()> {
        let curve = match curve {
            Some(curve) => curve,
            None => CurveId::from_field_size(point_field_size(point)?)?,
        };
        ensure_backend(curve)?;
        let normalized = normalize(curve, point)?;
        self.install(curve, None, Some(normalized));
        tracing::debug!(%curve, "ecc public key imported");
        Ok(())
    }

    /// Export the public point as `0x04 || X || Y`.
    pub fn export_x963(&self) -> Result<Vec<u8>> {
        let expected = 1 + 2 * self.require_curve()?.field_size();
        let public = self.require_public()?;
        if public.len() != expected {
            return Err(CryptoError::internal("stored public point is not field width"));
        }
        Ok(public.to_vec())
    }

    /// Derive and store the public point from the private scalar.
    pub fn make_pub(&mut self) -> Result<()> {
        let curve = self.require_curve()?;
        let scalar = self.require_private()?;
        let point = with_backend!(curve, b => b::public_from_scalar(scalar.as_slice()))?;
        self.public = Some(point);
        Ok(())
    }

    /// Decode a SEC1 `ECPrivateKey`. The curve is read from its parameters.
    ///
    /// The public point is derived from the scalar.
    pub fn private_key_decode(&mut self, der: &[u8]) -> Result<()> {
        let structure = sec1::EcPrivateKey::from_der(der).map_err(|error| {
            tracing::warn!(%error, "malformed SEC1 private key");
            CryptoError::invalid_argument("malformed SEC1 ECPrivateKey")
        })?;
        let oid = structure
            .parameters
            .and_then(|params| params.named_curve())
            .ok_or_else(|| CryptoError::UnsupportedCurve {
                curve: "SEC1 key without namedCurve".into(),
            })?;
        let curve = CurveId::from_oid(&oid)?;

        let (scalar, point) = with_backend!(curve, b => b::from_sec1_der(der))?;
        self.install(curve, Some(scalar), Some(point));
        tracing::debug!(%curve, "ecc private key decoded from SEC1");
        Ok(())
    }

    /// Encode as SEC1 `ECPrivateKey` with namedCurve and public key.
    pub fn key_to_der(&self) -> Result<SecureBuffer> {
        let curve = self.require_curve()?;
        let scalar = self.require_private()?;
        with_backend!(curve, b => b::to_sec1_der(scalar.as_slice()))
    }

    /// Decode a SubjectPublicKeyInfo. Any private scalar is discarded.
    pub fn public_key_decode(&mut self, der: &[u8]) -> Result<()> {
        let info = spki::SubjectPublicKeyInfoRef::from_der(der).map_err(|error| {
            tracing::warn!(%error, "malformed SubjectPublicKeyInfo");
            CryptoError::invalid_argument("malformed SubjectPublicKeyInfo")
        })?;
        let curve = curve_from_algorithm(info.algorithm.oids())?;

        let point = with_backend!(curve, b => b::from_spki_der(der))?;
        self.install(curve, None, Some(point));
        tracing::debug!(%curve, "ecc public key decoded from SPKI");
        Ok(())
    }

    /// Encode the public point as SubjectPublicKeyInfo with namedCurve.
    pub fn public_key_to_der(&self) -> Result<Vec<u8>> {
        let curve = self.require_curve()?;
        let public = self.require_public()?;
        with_backend!(curve, b => b::to_spki_der(public))
    }

    /// Encode the private key as PKCS#8 `PrivateKeyInfo`.
    pub fn private_key_to_pkcs8(&self) -> Result<SecureBuffer> {
        let curve = self.require_curve()?;
        let scalar = self.require_private()?;
        with_backend!(curve, b => b::to_pkcs8_der(scalar.as_slice()))
    }

    /// Decode a PKCS#8 `PrivateKeyInfo`. The public point is derived.
    pub fn private_key_from_pkcs8(&mut self, der: &[u8]) -> Result<()> {
        let info = pkcs8::PrivateKeyInfo::from_der(der).map_err(|error| {
            tracing::warn!(%error, "malformed PKCS8 private key");
            CryptoError::invalid_argument("malformed PKCS8 PrivateKeyInfo")
        })?;
        let curve = curve_from_algorithm(info.algorithm.oids())?;

        let (scalar, point) = with_backend!(curve, b => b::from_pkcs8_der(der))?;
        self.install(curve, Some(scalar), Some(point));
        tracing::debug!(%curve, "ecc private key decoded from PKCS8");
        Ok(())
    }

    /// ECDH: x-coordinate of `self.private · peer.public`, field width.
    ///
    /// `rng` must be seeded. The backends do not consume it; scalar
    /// multiplication is already constant time.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: unseeded RNG, or keys on different curves
    /// - `InvalidKey`: missing local scalar or peer point
    pub fn shared_secret(&self, rng: &mut Rng, peer: &EccKey) -> Result<SecureBuffer> {
        if !rng.is_initialized() {
            return Err(CryptoError::invalid_argument("RNG not initialized"));
        }
        let curve = self.require_curve()?;
        let peer_curve = peer.require_curve()?;
        if curve != peer_curve {
            return Err(CryptoError::invalid_argument(format!(
                "curve mismatch: {curve} vs {peer_curve}"
            )));
        }
        let scalar = self.require_private()?;
        let point = peer.require_public()?;
        with_backend!(curve, b => b::shared_secret(scalar.as_slice(), point))
    }

    /// ECDSA-sign a message digest. Returns a DER `ECDSA-Sig-Value`.
    ///
    /// The nonce is RFC 6979 deterministic, hedged with fresh bytes from
    /// `rng`. Digests longer than the group order are truncated; digests
    /// shorter than half the field size are rejected.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: short digest, or unseeded RNG
    /// - `InvalidKey`: no private scalar
    /// - `InternalError`: signature longer than [`EccKey::signature_max_size`]
    pub fn sign_hash(&self, hash: &[u8], rng: &mut Rng) -> Result<Vec<u8>> {
        let curve = self.require_curve()?;
        check_digest_len(curve, hash)?;
        let scalar = self.require_private()?;
        let generator = rng.generator()?;

        let mut work = SecureBuffer::allocate(signature_max_size(curve))?;
        let written = with_backend!(curve, b => {
            b::sign_prehash(scalar.as_slice(), hash, generator, work.as_mut_slice())
        })?;
        work.truncate(written);

        let mut signature = Vec::new();
        signature
            .try_reserve_exact(written)
            .map_err(|_| CryptoError::OutOfMemory { requested: written })?;
        signature.extend_from_slice(work.as_slice());
        tracing::trace!(%curve, len = written, "ecdsa signature produced");
        Ok(signature)
    }

    /// Verify a DER `ECDSA-Sig-Value` over a message digest.
    ///
    /// Wrong or malformed signatures return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: empty signature or short digest
    /// - `InvalidKey`: no public point
    pub fn verify_hash(&self, hash: &[u8], signature: &[u8]) -> Result<bool> {
        let curve = self.require_curve()?;
        check_digest_len(curve, hash)?;
        if signature.is_empty() {
            return Err(CryptoError::invalid_argument("signature is empty"));
        }
        let public = self.require_public()?;
        with_backend!(curve, b => b::verify_prehash(public, hash, signature))
    }

    /// Upper bound on DER signature length for this key's curve.
    pub fn signature_max_size(&self) -> Result<usize> {
        Ok(signature_max_size(self.require_curve()?))
    }

    /// Field element size in bytes.
    pub fn field_size(&self) -> Result<usize> {
        Ok(self.require_curve()?.field_size())
    }

    /// Curve this key lives on, if any.
    pub fn curve(&self) -> Option<CurveId> {
        self.curve
    }

    /// True if a private scalar is present.
    pub fn is_private(&self) -> bool {
        self.private.is_some()
    }

    /// True if a public point is present.
    pub fn has_public(&self) -> bool {
        self.public.is_some()
    }

    /// Zero the scalar and return to the freshly allocated state.
    pub fn free(&mut self) {
        self.install_empty();
        tracing::trace!("ecc key freed");
    }

    fn install(&mut self, curve: CurveId, private: Option<SecureBuffer>, public: Option<Vec<u8>>) {
        self.curve = Some(curve);
        self.private = private;
        self.public = public;
    }

    fn install_empty(&mut self) {
        self.curve = None;
        self.private = None;
        self.public = None;
    }

    fn require_curve(&self) -> Result<CurveId> {
        self.curve.ok_or_else(|| {
            CryptoError::invalid_argument("ECC key has no curve; generate or import first")
        })
    }

    fn require_private(&self) -> Result<&SecureBuffer> {
        self.private.as_ref().ok_or_else(|| CryptoError::invalid_key("private scalar not present"))
    }

    fn require_public(&self) -> Result<&[u8]> {
        self.public.as_deref().ok_or_else(|| CryptoError::invalid_key("public point not present"))
    }
}

impl std::fmt::Debug for EccKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EccKey")
            .field("curve", &self.curve)
            .field("private", &self.is_private())
            .field("public", &self.has_public())
            .finish()
    }
}

fn ensure_backend(curve: CurveId) -> Result<()> {
    if curve.has_backend() {
        Ok(())
    } else {
        Err(CryptoError::not_supported(format!("{curve} key operations")))
    }
}

fn normalize(curve: CurveId, point: &[u8]) -> Result<Vec<u8>> {
    point_field_size(point)
        .ok()
        .filter(|&size| size == curve.field_size())
        .ok_or_else(|| {
            CryptoError::invalid_argument(format!("point encoding length does not match {curve}"))
        })?;
    with_backend!(curve, b => b::normalize_point(point))
}

/// Field size implied by an X9.63 point encoding.
fn point_field_size(point: &[u8]) -> Result<usize> {
    match point {
        [0x04, coords @ ..] if !coords.is_empty() && coords.len() % 2 == 0 => Ok(coords.len() / 2),
        [0x02 | 0x03, x @ ..] if !x.is_empty() => Ok(x.len()),
        _ => Err(CryptoError::invalid_argument("not an X9.63 point encoding")),
    }
}

fn curve_from_algorithm<E: std::fmt::Display>(
    oids: std::result::Result<(ObjectIdentifier, Option<ObjectIdentifier>), E>,
) -> Result<CurveId> {
    let (algorithm, parameters) = oids.map_err(|error| {
        tracing::warn!(%error, "algorithm identifier parameters are not an OID");
        CryptoError::invalid_argument("algorithm parameters are not a namedCurve OID")
    })?;
    if algorithm != EC_PUBLIC_KEY_OID {
        return Err(CryptoError::invalid_argument(format!(
            "algorithm {algorithm} is not id-ecPublicKey"
        )));
    }
    let named_curve = parameters.ok_or_else(|| CryptoError::UnsupportedCurve {
        curve: "EC key without namedCurve".into(),
    })?;
    CurveId::from_oid(&named_curve)
}

fn check_digest_len(curve: CurveId, hash: &[u8]) -> Result<()> {
    let minimum = curve.field_size() / 2;
    if hash.len() < minimum {
        return Err(CryptoError::invalid_argument(format!(
            "digest is {} bytes, {curve} needs at least {minimum}",
            hash.len()
        )));
    }
    Ok(())
}

/// DER length of `SEQUENCE { INTEGER r, INTEGER s }` at the widest case.
///
/// Each integer may carry one leading zero byte to stay non-negative.
pub(crate) fn signature_max_size(curve: CurveId) -> usize {
    fn header(len: usize) -> usize {
        match len {
            0..=0x7f => 2,
            0x80..=0xff => 3,
            _ => 4,
        }
    }

    let integer = curve.field_size() + 1;
    let body = 2 * (header(integer) + integer);
    header(body) + body
}
