//! Subcommand definitions and their drivers.

use std::{
    error::Error,
    fs::File,
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use clap::Subcommand;
use keystone_crypto::{
    AesCbc, Capabilities, CryptoError, CurveId, Direction, EccKey, HashAlgorithm, HashState, Hmac,
    Rng,
};
use zeroize::Zeroizing;

/// Read size when streaming files into a digest or MAC.
const CHUNK_SIZE: usize = 8192;

/// Result of a subcommand.
pub type CommandResult = Result<(), Box<dyn Error>>;

/// Keystone subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the digests, curves and AES key sizes in this build
    Caps,

    /// Hash a file
    Digest {
        /// Digest algorithm (md5, sha1, sha224, sha256, sha384, sha512)
        #[arg(long, default_value = "sha256")]
        hash: String,

        /// File to hash
        file: PathBuf,
    },

    /// Compute an HMAC over a file
    Hmac {
        /// Digest algorithm
        #[arg(long, default_value = "sha256")]
        hash: String,

        /// Key as hex
        #[arg(long)]
        key: String,

        /// File to authenticate
        file: PathBuf,
    },

    /// Encrypt or decrypt a file with AES-CBC
    ///
    /// No padding is applied: the input length must be a multiple of 16.
    /// Prints the final chaining block so a stream can be continued.
    AesCbc {
        /// Encrypt the input
        #[arg(long, conflicts_with = "decrypt", required_unless_present = "decrypt")]
        encrypt: bool,

        /// Decrypt the input
        #[arg(long)]
        decrypt: bool,

        /// 16, 24 or 32 byte key as hex
        #[arg(long)]
        key: String,

        /// 16 byte IV as hex (all zeroes when omitted)
        #[arg(long)]
        iv: Option<String>,

        /// Input file
        input: PathBuf,

        /// Output file
        output: PathBuf,
    },

    /// Generate a key pair and print PKCS#8 and SubjectPublicKeyInfo DER as hex
    EccKeygen {
        /// Curve name or alias (SECP256R1, P-384, secp256k1, ...)
        #[arg(long, default_value = "SECP256R1")]
        curve: String,
    },

    /// ECDSA-sign the digest of a file
    EccSign {
        /// PKCS#8 private key as hex
        #[arg(long)]
        key: String,

        /// Digest algorithm
        #[arg(long, default_value = "sha256")]
        hash: String,

        /// File to sign
        file: PathBuf,
    },

    /// Verify an ECDSA signature over the digest of a file
    EccVerify {
        /// SubjectPublicKeyInfo as hex
        #[arg(long = "pub")]
        public: String,

        /// DER signature as hex
        #[arg(long)]
        sig: String,

        /// Digest algorithm
        #[arg(long, default_value = "sha256")]
        hash: String,

        /// Signed file
        file: PathBuf,
    },

    /// Derive an ECDH shared secret
    Ecdh {
        /// Local PKCS#8 private key as hex
        #[arg(long)]
        key: String,

        /// Peer SubjectPublicKeyInfo as hex
        #[arg(long)]
        peer: String,
    },
}

/// Execute `command`, writing results to `out`.
pub fn run(command: Command, out: &mut impl Write) -> CommandResult {
    match command {
        Command::Caps => caps(out),
        Command::Digest { hash, file } => {
            let algorithm = HashAlgorithm::from_name(&hash)?;
            let digest = digest_file(algorithm, &file)?;
            writeln!(out, "{}", hex::encode(digest))?;
            Ok(())
        },
        Command::Hmac { hash, key, file } => {
            let algorithm = HashAlgorithm::from_name(&hash)?;
            let key = decode_secret(&key)?;
            let mut mac = Hmac::with_key(algorithm, &key)?;
            let len = for_each_chunk(&file, |chunk| mac.update(chunk))?;
            tracing::debug!(%algorithm, len, "hmac computed");
            writeln!(out, "{}", hex::encode(mac.finalize()?))?;
            Ok(())
        },
        Command::AesCbc { encrypt, decrypt: _, key, iv, input, output } => {
            let direction = if encrypt { Direction::Encrypt } else { Direction::Decrypt };
            aes_cbc(direction, &key, iv.as_deref(), &input, &output, out)
        },
        Command::EccKeygen { curve } => keygen(&curve, out),
        Command::EccSign { key, hash, file } => {
            let signer = private_key(&key)?;
            let digest = digest_file(HashAlgorithm::from_name(&hash)?, &file)?;
            let signature = signer.sign_hash(&digest, &mut Rng::from_entropy())?;
            writeln!(out, "{}", hex::encode(signature))?;
            Ok(())
        },
        Command::EccVerify { public, sig, hash, file } => {
            let verifier = public_key(&public)?;
            let digest = digest_file(HashAlgorithm::from_name(&hash)?, &file)?;
            if verifier.verify_hash(&digest, &hex::decode(sig)?)? {
                writeln!(out, "valid")?;
                Ok(())
            } else {
                tracing::warn!(file = %file.display(), "signature rejected");
                Err(CryptoError::VerificationFailed.into())
            }
        },
        Command::Ecdh { key, peer } => {
            let local = private_key(&key)?;
            let remote = public_key(&peer)?;
            let secret = local.shared_secret(&mut Rng::from_entropy(), &remote)?;
            writeln!(out, "{}", Zeroizing::new(hex::encode(secret.as_slice())).as_str())?;
            Ok(())
        },
    }
}

fn caps(out: &mut impl Write) -> CommandResult {
    let caps = Capabilities::current();
    let hashes: Vec<&str> = caps.hashes.iter().map(|h| h.name()).collect();
    let curves: Vec<&str> = caps.curves.iter().map(|c| c.name()).collect();
    let registered: Vec<&str> = caps.registered_only.iter().map(|c| c.name()).collect();
    let aes: Vec<String> = caps.aes_key_bits.iter().map(ToString::to_string).collect();

    writeln!(out, "hashes: {}", hashes.join(" "))?;
    writeln!(out, "curves: {}", curves.join(" "))?;
    writeln!(out, "registered: {}", registered.join(" "))?;
    writeln!(out, "aes: {}", aes.join(" "))?;
    Ok(())
}

fn aes_cbc(
    direction: Direction,
    key: &str,
    iv: Option<&str>,
    input: &Path,
    output: &Path,
    out: &mut impl Write,
) -> CommandResult {
    let key = decode_secret(key)?;
    let iv = iv.map(hex::decode).transpose()?;
    let mut cipher = AesCbc::with_key(&key, iv.as_deref(), direction)?;

    let mut data = Zeroizing::new(std::fs::read(input)?);
    let processed = cipher.update_in_place(data.as_mut_slice())?;
    std::fs::write(output, data.as_slice())?;

    tracing::info!(?direction, processed, output = %output.display(), "aes-cbc complete");
    writeln!(out, "{}", hex::encode(cipher.iv()))?;
    Ok(())
}

fn keygen(curve: &str, out: &mut impl Write) -> CommandResult {
    let curve = CurveId::from_name(curve)?;
    let mut key = EccKey::new();
    key.generate(&mut Rng::from_entropy(), curve)?;

    let private = key.private_key_to_pkcs8()?;
    let public = key.public_key_to_der()?;
    writeln!(out, "private {}", Zeroizing::new(hex::encode(private.as_slice())).as_str())?;
    writeln!(out, "public {}", hex::encode(public))?;
    Ok(())
}

fn private_key(pkcs8_hex: &str) -> Result<EccKey, Box<dyn Error>> {
    let der = decode_secret(pkcs8_hex)?;
    let mut key = EccKey::new();
    key.private_key_from_pkcs8(&der)?;
    Ok(key)
}

fn public_key(spki_hex: &str) -> Result<EccKey, Box<dyn Error>> {
    let mut key = EccKey::new();
    key.public_key_decode(&hex::decode(spki_hex)?)?;
    Ok(key)
}

fn decode_secret(hex_value: &str) -> Result<Zeroizing<Vec<u8>>, hex::FromHexError> {
    hex::decode(hex_value).map(Zeroizing::new)
}

fn digest_file(algorithm: HashAlgorithm, path: &Path) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut state = HashState::new(algorithm)?;
    let len = for_each_chunk(path, |chunk| state.update(chunk))?;
    tracing::debug!(%algorithm, len, path = %path.display(), "file hashed");
    Ok(state.finalize()?)
}

/// Stream `path` through `sink`. Returns the number of bytes read.
fn for_each_chunk(
    path: &Path,
    mut sink: impl FnMut(&[u8]) -> keystone_crypto::Result<()>,
) -> Result<u64, Box<dyn Error>> {
    let mut file = File::open(path)?;
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        match file.read(&mut chunk) {
            Ok(0) => return Ok(total),
            Ok(n) => {
                sink(&chunk[..n])?;
                total += n as u64;
            },
            Err(e) if e.kind() == ErrorKind::Interrupted => {},
            Err(e) => return Err(e.into()),
        }
    }
}
