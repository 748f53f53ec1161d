//! Curve registry.
//!
//! The numeric [`CurveId`] is the canonical identity of a curve. Names,
//! OIDs and raw domain parameters are all resolved onto it here, and every
//! key operation starts from a resolved id.
//!
//! A curve can be registered without an arithmetic backend (SECP521R1 in
//! this build). Lookups succeed for it; key operations report
//! `NotSupported`.

use std::fmt;

use spki::ObjectIdentifier;

use crate::error::{CryptoError, Result};

/// Registered curve identifiers. Values are stable across releases.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveId {
    /// NIST P-256 / prime256v1
    Secp256r1 = 7,
    /// NIST P-384
    Secp384r1 = 15,
    /// NIST P-521
    Secp521r1 = 16,
    /// SEC 2 Koblitz curve
    Secp256k1 = 20,
}

/// Short Weierstrass domain parameters `y^2 = x^3 + ax + b (mod p)`.
///
/// Field elements are big-endian hex, zero-padded to the field size.
#[derive(Debug)]
pub struct CurveParams {
    /// Registry id
    pub id: CurveId,
    /// Canonical name
    pub name: &'static str,
    /// Accepted alternative names (matched case-insensitively)
    pub aliases: &'static [&'static str],
    /// Field element size in bytes
    pub field_size: usize,
    /// Field prime p
    pub prime: &'static str,
    /// Coefficient a
    pub a: &'static str,
    /// Coefficient b
    pub b: &'static str,
    /// Group order n
    pub order: &'static str,
    /// Generator x
    pub gx: &'static str,
    /// Generator y
    pub gy: &'static str,
    /// Cofactor h
    pub cofactor: u32,
    /// namedCurve object identifier
    pub oid: ObjectIdentifier,
}

static SECP256R1: CurveParams = CurveParams {
    id: CurveId::Secp256r1,
    name: "SECP256R1",
    aliases: &["P-256", "P256", "PRIME256V1", "NISTP256"],
    field_size: 32,
    prime: "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFF",
    a: "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFC",
    b: "5AC635D8AA3A93E7B3EBBD55769886BC651D06B0CC53B0F63BCE3C3E27D2604B",
    order: "FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551",
    gx: "6B17D1F2E12C4247F8BCE6E563A440F277037D812DEB33A0F4A13945D898C296",
    gy: "4FE342E2FE1A7F9B8EE7EB4A7C0F9E162BCE33576B315ECECBB6406837BF51F5",
    cofactor: 1,
    oid: ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7"),
};

static SECP384R1: CurveParams = CurveParams {
    id: CurveId::Secp384r1,
    name: "SECP384R1",
    aliases: &["P-384", "P384", "NISTP384"],
    field_size: 48,
    prime: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFF0000000000000000FFFFFFFF",
    a: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFF0000000000000000FFFFFFFC",
    b: "B3312FA7E23EE7E4988E056BE3F82D19181D9C6EFE8141120314088F5013875AC656398D8A2ED19D2A85C8EDD3EC2AEF",
    order: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFC7634D81F4372DDF581A0DB248B0A77AECEC196ACCC52973",
    gx: "AA87CA22BE8B05378EB1C71EF320AD746E1D3B628BA79B9859F741E082542A385502F25DBF55296C3A545E3872760AB7",
    gy: "3617DE4A96262C6F5D9E98BF9292DC29F8F41DBD289A147CE9DA3113B5F0B8C00A60B1CE1D7E819D7A431D7C90EA0E5F",
    cofactor: 1,
    oid: ObjectIdentifier::new_unwrap("1.3.132.0.34"),
};

static SECP521R1: CurveParams = CurveParams {
    id: CurveId::Secp521r1,
    name: "SECP521R1",
    aliases: &["P-521", "P521", "NISTP521"],
    field_size: 66,
    prime: "01FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
    a: "01FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFC",
    b: "0051953EB9618E1C9A1F929A21A0B68540EEA2DA725B99B315F3B8B489918EF109E156193951EC7E937B1652C0BD3BB1BF073573DF883D2C34F1EF451FD46B503F00",
    order: "01FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFA51868783BF2F966B7FCC0148F709A5D03BB5C9B8899C47AEBB6FB71E91386409",
    gx: "00C6858E06B70404E9CD9E3ECB662395B4429C648139053FB521F828AF606B4D3DBAA14B5E77EFE75928FE1DC127A2FFA8DE3348B3C1856A429BF97E7E31C2E5BD66",
    gy: "011839296A789A3BC0045C8A5FB42C7D1BD998F54449579B446817AFBD17273E662C97EE72995EF42640C550B9013FAD0761353C7086A272C24088BE94769FD16650",
    cofactor: 1,
    oid: ObjectIdentifier::new_unwrap("1.3.132.0.35"),
};

static SECP256K1: CurveParams = CurveParams {
    id: CurveId::Secp256k1,
    name: "SECP256K1",
    aliases: &["K-256", "K256"],
    field_size: 32,
    prime: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F",
    a: "0000000000000000000000000000000000000000000000000000000000000000",
    b: "0000000000000000000000000000000000000000000000000000000000000007",
    order: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
    gx: "79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798",
    gy: "483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8",
    cofactor: 1,
    oid: ObjectIdentifier::new_unwrap("1.3.132.0.10"),
};

impl CurveId {
    /// Every registered curve, in ascending field size.
    pub const ALL: [CurveId; 4] =
        [Self::Secp256r1, Self::Secp256k1, Self::Secp384r1, Self::Secp521r1];

    /// Domain parameters for this curve.
    pub fn params(self) -> &'static CurveParams {
        match self {
            Self::Secp256r1 => &SECP256R1,
            Self::Secp384r1 => &SECP384R1,
            Self::Secp521r1 => &SECP521R1,
            Self::Secp256k1 => &SECP256K1,
        }
    }

    /// Stable numeric id.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Resolve a numeric id.
    ///
    /// # Errors
    ///
    /// - `UnsupportedCurve`: no registered curve has this id
    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.code() == code)
            .ok_or_else(|| CryptoError::UnsupportedCurve { curve: format!("id {code}") })
    }

    /// Resolve a name or alias, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|id| {
                let params = id.params();
                params.name.eq_ignore_ascii_case(wanted)
                    || params.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| CryptoError::UnsupportedCurve { curve: name.to_owned() })
    }

    /// Resolve a namedCurve OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.params().oid == *oid)
            .ok_or_else(|| CryptoError::UnsupportedCurve { curve: format!("oid {oid}") })
    }

    /// Default curve for a key size in bits.
    ///
    /// 256 resolves to SECP256R1; SECP256K1 must be requested by name.
    pub fn from_bits(bits: i32) -> Result<Self> {
        if bits <= 0 {
            return Err(CryptoError::invalid_argument(format!(
                "key size must be positive, got {bits}"
            )));
        }
        match bits {
            256 => Ok(Self::Secp256r1),
            384 => Ok(Self::Secp384r1),
            521 => Ok(Self::Secp521r1),
            other => Err(CryptoError::UnsupportedCurve { curve: format!("{other}-bit") }),
        }
    }

    /// Curve whose field size matches `field_size`, preferring the NIST curve.
    pub(crate) fn from_field_size(field_size: usize) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.field_size() == field_size)
            .ok_or_else(|| CryptoError::UnsupportedCurve {
                curve: format!("{field_size}-byte field"),
            })
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        self.params().name
    }

    /// Field element size in bytes.
    pub fn field_size(self) -> usize {
        self.params().field_size
    }

    /// namedCurve OID.
    pub fn oid(self) -> ObjectIdentifier {
        self.params().oid
    }

    /// Whether key operations on this curve are compiled into this build.
    pub fn has_backend(self) -> bool {
        match self {
            Self::Secp256r1 => cfg!(feature = "p256"),
            Self::Secp384r1 => cfg!(feature = "p384"),
            Self::Secp256k1 => cfg!(feature = "secp256k1"),
            Self::Secp521r1 => false,
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical name for a numeric curve id.
pub fn curve_name_from_id(code: i32) -> Result<&'static str> {
    CurveId::from_code(code).map(CurveId::name)
}

/// Field size in bytes for a curve name or alias.
pub fn curve_size_from_name(name: &str) -> Result<usize> {
    CurveId::from_name(name).map(CurveId::field_size)
}

/// Raw domain parameters, big-endian, as supplied by an external encoder.
#[derive(Debug, Clone, Copy)]
pub struct DomainParams<'a> {
    /// Field element size in bytes
    pub field_size: usize,
    /// Field prime p
    pub prime: &'a [u8],
    /// Coefficient a
    pub a: &'a [u8],
    /// Coefficient b
    pub b: &'a [u8],
    /// Group order n
    pub order: &'a [u8],
    /// Generator x
    pub gx: &'a [u8],
    /// Generator y
    pub gy: &'a [u8],
    /// Cofactor h
    pub cofactor: u32,
}

/// Find the registered curve whose domain parameters match exactly.
///
/// Leading zero bytes are ignored so callers may pass either minimal or
/// field-width encodings.
///
/// # Errors
///
/// - `InvalidArgument`: `field_size` is zero
/// - `UnsupportedCurve`: no registered curve matches
pub fn curve_id_from_params(params: &DomainParams<'_>) -> Result<CurveId> {
    if params.field_size == 0 {
        return Err(CryptoError::invalid_argument("field size must be positive"));
    }

    for id in CurveId::ALL {
        let known = id.params();
        if known.field_size != params.field_size || known.cofactor != params.cofactor {
            continue;
        }
        let fields = [
            (known.prime, params.prime),
            (known.a, params.a),
            (known.b, params.b),
            (known.order, params.order),
            (known.gx, params.gx),
            (known.gy, params.gy),
        ];
        let mut matched = true;
        for (hex_value, supplied) in fields {
            if !same_integer(&decode_constant(hex_value)?, supplied) {
                matched = false;
                break;
            }
        }
        if matched {
            tracing::debug!(curve = %id, "curve resolved from domain parameters");
            return Ok(id);
        }
    }

    Err(CryptoError::UnsupportedCurve {
        curve: format!("{}-byte field parameters", params.field_size),
    })
}

fn decode_constant(value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|_| CryptoError::internal("malformed curve registry constant"))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn same_integer(a: &[u8], b: &[u8]) -> bool {
    strip_leading_zeros(a) == strip_leading_zeros(b)
}
