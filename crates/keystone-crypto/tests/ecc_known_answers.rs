//! ECC known-answer tests against externally produced fixtures
//!
//! 1. **RFC 6979 A.2.5 / A.2.6**: the published P-256 and P-384 signatures
//!    over SHA-2("sample") verify under the published public keys
//! 2. **secp256k1**: an OpenSSL signature verifies in both its low-S and
//!    high-S (`n - s`) forms
//! 3. **Encodings**: SEC1, PKCS8, SPKI and X9.63 exports of a fixed scalar
//!    are byte-identical to OpenSSL's DER output

use keystone_crypto::{CurveId, EccKey, HashAlgorithm, digest};

struct Fixture {
    curve: CurveId,
    hash: HashAlgorithm,
    scalar: &'static str,
    x963: &'static str,
    signature: &'static str,
    sec1: &'static str,
    pkcs8: &'static str,
    spki: &'static str,
}

#[cfg(feature = "p256")]
const P256: Fixture = Fixture {
    curve: CurveId::Secp256r1,
    hash: HashAlgorithm::Sha256,
    scalar: "c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721",
    x963: "0460fed4ba255a9d31c961eb74c6356d68c049b8923b61fa6ce669622e60f29fb6\
           7903fe1008b8bc99a41ae9e95628bc64f2f1b20c2d7e9f5177a3c294d4462299",
    signature: "3046022100efd48b2aacb6a8fd1140dd9cd45e81d69d2c877b56aaf991c34d0ea84eaf3716\
                022100f7cb1c942d657c41d436c7a1b6e29f65f3e900dbb9aff4064dc4ab2f843acda8",
    sec1: "30770201010420c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721\
           a00a06082a8648ce3d030107a1440342000460fed4ba255a9d31c961eb74c6356d68c049b892\
           3b61fa6ce669622e60f29fb67903fe1008b8bc99a41ae9e95628bc64f2f1b20c2d7e9f5177a3\
           c294d4462299",
    pkcs8: "308187020100301306072a8648ce3d020106082a8648ce3d030107046d306b0201010420c9af\
            a9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721a144034200046\
            0fed4ba255a9d31c961eb74c6356d68c049b8923b61fa6ce669622e60f29fb67903fe1008\
            b8bc99a41ae9e95628bc64f2f1b20c2d7e9f5177a3c294d4462299",
    spki: "3059301306072a8648ce3d020106082a8648ce3d0301070342000460fed4ba255a9d31c961eb\
           74c6356d68c049b8923b61fa6ce669622e60f29fb67903fe1008b8bc99a41ae9e95628bc64f2\
           f1b20c2d7e9f5177a3c294d4462299",
};

#[cfg(feature = "p384")]
const P384: Fixture = Fixture {
    curve: CurveId::Secp384r1,
    hash: HashAlgorithm::Sha384,
    scalar: "6b9d3dad2e1b8c1c05b19875b6659f4de23c3b667bf297ba\
             9aa47740787137d896d5724e4c70a825f872c9ea60d2edf5",
    x963: "04ec3a4e415b4e19a4568618029f427fa5da9a8bc4ae92e02e06aae5286b300c64def8f0ea90558\
           66064a254515480bc138015d9b72d7d57244ea8ef9ac0c621896708a59367f9dfb9f54ca84b3f1c\
           9db1288b231c3ae0d4fe7344fd2533264720",
    signature: "306602310094edbb92a5ecb8aad4736e56c691916b3f88140666ce9fa73d64c4ea95ad133c\
                81a648152e44acf96e36dd1e80fabe4602310099ef4aeb15f178cea1fe40db2603138f130e\
                740a19624526203b6351d0a3a94fa329c145786e679e7b82c71a38628ac8",
    sec1: "3081a402010104306b9d3dad2e1b8c1c05b19875b6659f4de23c3b667bf297ba9aa47740787137\
           d896d5724e4c70a825f872c9ea60d2edf5a00706052b81040022a16403620004ec3a4e415b4e19\
           a4568618029f427fa5da9a8bc4ae92e02e06aae5286b300c64def8f0ea9055866064a254515480\
           bc138015d9b72d7d57244ea8ef9ac0c621896708a59367f9dfb9f54ca84b3f1c9db1288b231c3a\
           e0d4fe7344fd2533264720",
    pkcs8: "3081b6020100301006072a8648ce3d020106052b8104002204819e30819b02010104306b9d3d\
            ad2e1b8c1c05b19875b6659f4de23c3b667bf297ba9aa47740787137d896d5724e4c70a825f8\
            72c9ea60d2edf5a16403620004ec3a4e415b4e19a4568618029f427fa5da9a8bc4ae92e02e06\
            aae5286b300c64def8f0ea9055866064a254515480bc138015d9b72d7d57244ea8ef9ac0c621\
            896708a59367f9dfb9f54ca84b3f1c9db1288b231c3ae0d4fe7344fd2533264720",
    spki: "3076301006072a8648ce3d020106052b8104002203620004ec3a4e415b4e19a4568618029f427f\
           a5da9a8bc4ae92e02e06aae5286b300c64def8f0ea9055866064a254515480bc138015d9b72d7d\
           57244ea8ef9ac0c621896708a59367f9dfb9f54ca84b3f1c9db1288b231c3ae0d4fe7344fd2533\
           264720",
};

fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap()
}

fn check_signature(fixture: &Fixture) {
    let hash = digest(fixture.hash, b"sample").unwrap();
    let signature = unhex(fixture.signature);

    let mut from_point = EccKey::new();
    from_point.import_x963(&unhex(fixture.x963), None).unwrap();
    assert_eq!(from_point.curve(), Some(fixture.curve));
    assert!(from_point.verify_hash(&hash, &signature).unwrap());

    let mut from_spki = EccKey::new();
    from_spki.public_key_decode(&unhex(fixture.spki)).unwrap();
    assert_eq!(from_spki.curve(), Some(fixture.curve));
    assert!(from_spki.verify_hash(&hash, &signature).unwrap());

    let other = digest(fixture.hash, b"test").unwrap();
    assert!(!from_spki.verify_hash(&other, &signature).unwrap());
}

fn check_encodings(fixture: &Fixture) {
    let mut key = EccKey::new();
    key.import_private(&unhex(fixture.scalar), None, Some(fixture.curve.name())).unwrap();
    key.make_pub().unwrap();

    assert_eq!(hex::encode(key.export_x963().unwrap()), fixture.x963);
    assert_eq!(hex::encode(key.key_to_der().unwrap().as_slice()), fixture.sec1);
    assert_eq!(hex::encode(key.private_key_to_pkcs8().unwrap().as_slice()), fixture.pkcs8);
    assert_eq!(hex::encode(key.public_key_to_der().unwrap()), fixture.spki);

    let mut from_sec1 = EccKey::new();
    from_sec1.private_key_decode(&unhex(fixture.sec1)).unwrap();
    assert_eq!(hex::encode(from_sec1.export_private().unwrap().as_slice()), fixture.scalar);

    let mut from_pkcs8 = EccKey::new();
    from_pkcs8.private_key_from_pkcs8(&unhex(fixture.pkcs8)).unwrap();
    assert_eq!(hex::encode(from_pkcs8.export_x963().unwrap()), fixture.x963);
}

#[cfg(feature = "p256")]
#[test]
fn p256_rfc6979_signature_verifies() {
    check_signature(&P256);
}

#[cfg(feature = "p256")]
#[test]
fn p256_encodings_match_openssl() {
    check_encodings(&P256);
}

#[cfg(feature = "p384")]
#[test]
fn p384_rfc6979_signature_verifies() {
    check_signature(&P384);
}

#[cfg(feature = "p384")]
#[test]
fn p384_encodings_match_openssl() {
    check_encodings(&P384);
}

#[cfg(feature = "secp256k1")]
#[test]
fn secp256k1_signature_verifies_in_both_s_forms() {
    const SCALAR: &str = "c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721";
    const X963: &str = "042c8c31fc9f990c6b55e3865a184a4ce50e09481f2eaeb3e60ec1cea13a6ae645\
                        64b95e4fdb6948c0386e189b006a29f686769b011704275e4459822dc3328085";
    const SPKI: &str = "3056301006072a8648ce3d020106052b8104000a034200042c8c31fc9f990c6b55e3\
                        865a184a4ce50e09481f2eaeb3e60ec1cea13a6ae64564b95e4fdb6948c0386e189b\
                        006a29f686769b011704275e4459822dc3328085";
    const LOW_S: &str = "30440220432310e32cb80eb6503a26ce83cc165c783b870845fb8aad6d970889fcd7\
                         a6c80220530128b6b81c548874a6305d93ed071ca6e05074d85863d4056ce89b02bf\
                         ab69";
    const HIGH_S: &str = "30450220432310e32cb80eb6503a26ce83cc165c783b870845fb8aad6d970889fcd\
                          7a6c8022100acfed74947e3ab778b59cfa26c12f8e213ce8c71d6f03c67ba6575f1\
                          cd7695d8";

    let hash = digest(HashAlgorithm::Sha256, b"sample").unwrap();

    let mut key = EccKey::new();
    key.public_key_decode(&unhex(SPKI)).unwrap();
    assert_eq!(key.curve(), Some(CurveId::Secp256k1));
    assert_eq!(hex::encode(key.export_x963().unwrap()), X963);

    assert!(key.verify_hash(&hash, &unhex(LOW_S)).unwrap());
    assert!(key.verify_hash(&hash, &unhex(HIGH_S)).unwrap());

    let mut scalar_key = EccKey::new();
    scalar_key.import_private(&unhex(SCALAR), None, Some("secp256k1")).unwrap();
    scalar_key.make_pub().unwrap();
    assert_eq!(hex::encode(scalar_key.export_x963().unwrap()), X963);
}
