//! OpenSSH authorized-key encoding
//!
//! The `sshPublicKey` field holds `base64(authorized_key_line)`, where the
//! line is `<algorithm> <base64 wire blob> [comment]` and the wire blob starts
//! with the algorithm name as a length-prefixed string, followed by the
//! algorithm-specific key fields (RFC 4253 section 6.6, RFC 5656 section 3.1,
//! RFC 8709 section 4, and PROTOCOL.u2f for the security-key variants).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::SigningKey;
use rsa::rand_core::{self, CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey};

use super::{KeyAlgorithm, KeyError, KeyGenerator, PublicKeyValidator};

const SSH_RSA: &str = "ssh-rsa";
const SSH_DSS: &str = "ssh-dss";
const SSH_ED25519: &str = "ssh-ed25519";
const SK_SSH_ED25519: &str = "sk-ssh-ed25519@openssh.com";
const SK_ECDSA_NISTP256: &str = "sk-ecdsa-sha2-nistp256@openssh.com";
const ECDSA_PREFIX: &str = "ecdsa-sha2-";

const ED25519_KEY_LEN: usize = 32;
const RSA_KEY_BITS: usize = 2048;
/// Largest RSA public exponent accepted, in bits
const RSA_MAX_EXPONENT_BITS: usize = 24;

/// Algorithms an authorized-key line may declare
const SUPPORTED_ALGORITHMS: &[&str] = &[
    SSH_RSA,
    SSH_DSS,
    SSH_ED25519,
    "ecdsa-sha2-nistp256",
    "ecdsa-sha2-nistp384",
    "ecdsa-sha2-nistp521",
    SK_SSH_ED25519,
    SK_ECDSA_NISTP256,
];

/// Validates OpenSSH public keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSshKeys;

/// Generates OpenSSH public keys of a fixed algorithm.
///
/// The private half is dropped as soon as the public blob is encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshKeyGenerator {
    algorithm: KeyAlgorithm,
}

impl SshKeyGenerator {
    /// Generator of `algorithm` keys
    pub fn new(algorithm: KeyAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Algorithm of generated keys
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }
}

impl KeyGenerator for SshKeyGenerator {
    fn generate_public_key(&self) -> Result<String, KeyError> {
        let (name, blob) = match self.algorithm {
            KeyAlgorithm::Rsa => (SSH_RSA, rsa_blob()?),
            KeyAlgorithm::Ed25519 => (SSH_ED25519, ed25519_blob()?),
        };
        let line = format!("{name} {}\n", STANDARD.encode(&blob));
        Ok(STANDARD.encode(line))
    }
}

fn rsa_blob() -> Result<Vec<u8>, KeyError> {
    let private = RsaPrivateKey::new(&mut ThreadRngCompat(rand::rng()), RSA_KEY_BITS)
        .map_err(|e| KeyError::Generation(e.to_string()))?;

    let mut blob = Vec::new();
    write_string(&mut blob, SSH_RSA.as_bytes())?;
    write_mpint(&mut blob, private.e())?;
    write_mpint(&mut blob, private.n())?;
    Ok(blob)
}

fn ed25519_blob() -> Result<Vec<u8>, KeyError> {
    let seed: [u8; 32] = rand::random();
    let verifying_key = SigningKey::from_bytes(&seed).verifying_key();

    let mut blob = Vec::with_capacity(4 + SSH_ED25519.len() + 4 + ED25519_KEY_LEN);
    write_string(&mut blob, SSH_ED25519.as_bytes())?;
    write_string(&mut blob, verifying_key.as_bytes())?;
    Ok(blob)
}

/// Drives `rsa` (rand_core 0.6) from the thread-local `rand` 0.9 generator
struct ThreadRngCompat(rand::rngs::ThreadRng);

impl RngCore for ThreadRngCompat {
    fn next_u32(&mut self) -> u32 {
        rand::RngCore::next_u32(&mut self.0)
    }

    fn next_u64(&mut self) -> u64 {
        rand::RngCore::next_u64(&mut self.0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand::RngCore::fill_bytes(&mut self.0, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        rand::RngCore::fill_bytes(&mut self.0, dest);
        Ok(())
    }
}

// ThreadRng is a CSPRNG reseeded from the OS
impl CryptoRng for ThreadRngCompat {}

impl PublicKeyValidator for OpenSshKeys {
    fn validate_public_key(&self, key: &str) -> Result<(), KeyError> {
        let decoded = STANDARD.decode(key.trim())?;
        let line = std::str::from_utf8(&decoded).map_err(|e| KeyError::Invalid(e.to_string()))?;

        let mut fields = line.split_whitespace();
        let algorithm = fields
            .next()
            .ok_or_else(|| KeyError::Invalid("empty key".to_string()))?;
        if !SUPPORTED_ALGORITHMS.contains(&algorithm) {
            return Err(KeyError::Invalid(format!("unsupported key type {algorithm:?}")));
        }
        let encoded_blob = fields
            .next()
            .ok_or_else(|| KeyError::Invalid("missing key data".to_string()))?;
        let blob = STANDARD
            .decode(encoded_blob)
            .map_err(|e| KeyError::Invalid(format!("key data is not base64: {e}")))?;

        parse_blob(algorithm, &blob)
    }
}

/// Checks that `blob` is a complete public key of type `algorithm`
fn parse_blob(algorithm: &str, blob: &[u8]) -> Result<(), KeyError> {
    let mut reader = WireReader::new(blob);
    if reader.read_string()? != algorithm.as_bytes() {
        return Err(KeyError::Invalid(format!(
            "key data does not match declared type {algorithm:?}"
        )));
    }

    match algorithm {
        SSH_RSA => {
            let exponent = reader.read_mpint()?;
            let modulus = reader.read_mpint()?;
            check_rsa(&exponent, &modulus)?;
        }
        SSH_DSS => {
            for parameter in ["p", "q", "g", "y"] {
                if reader.read_mpint()?.bits() == 0 {
                    return Err(KeyError::Invalid(format!("ssh-dss parameter {parameter} is zero")));
                }
            }
        }
        SSH_ED25519 => read_ed25519_point(&mut reader)?,
        SK_SSH_ED25519 => {
            read_ed25519_point(&mut reader)?;
            reader.read_string()?;
        }
        SK_ECDSA_NISTP256 => {
            read_ecdsa_point(&mut reader, "nistp256")?;
            reader.read_string()?;
        }
        ecdsa => {
            let curve = ecdsa.strip_prefix(ECDSA_PREFIX).unwrap_or(ecdsa);
            read_ecdsa_point(&mut reader, curve)?;
        }
    }

    reader.finish()
}

fn check_rsa(exponent: &BigUint, modulus: &BigUint) -> Result<(), KeyError> {
    if exponent.bits() > RSA_MAX_EXPONENT_BITS {
        return Err(KeyError::Invalid("RSA exponent too large".to_string()));
    }
    let odd = exponent.to_bytes_be().last().is_some_and(|b| b & 1 == 1);
    if *exponent < BigUint::from(3u32) || !odd {
        return Err(KeyError::Invalid("incorrect RSA exponent".to_string()));
    }
    if modulus.bits() == 0 {
        return Err(KeyError::Invalid("RSA modulus is empty".to_string()));
    }
    Ok(())
}

fn read_ed25519_point(reader: &mut WireReader<'_>) -> Result<(), KeyError> {
    if reader.read_string()?.len() != ED25519_KEY_LEN {
        return Err(KeyError::Invalid("malformed ed25519 key".to_string()));
    }
    Ok(())
}

/// Curve identifier followed by an uncompressed SEC1 point
fn read_ecdsa_point(reader: &mut WireReader<'_>, curve: &str) -> Result<(), KeyError> {
    let coordinate_len = match curve {
        "nistp256" => 32,
        "nistp384" => 48,
        "nistp521" => 66,
        other => return Err(KeyError::Invalid(format!("unsupported curve {other:?}"))),
    };
    if reader.read_string()? != curve.as_bytes() {
        return Err(KeyError::Invalid(format!("key data does not match curve {curve:?}")));
    }
    match reader.read_string()? {
        [0x04, coordinates @ ..] if coordinates.len() == 2 * coordinate_len => Ok(()),
        _ => Err(KeyError::Invalid(format!("malformed {curve} point"))),
    }
}

/// Cursor over SSH wire-format fields
struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn read_string(&mut self) -> Result<&'a [u8], KeyError> {
        let (value, rest) = read_string(self.buf)?;
        self.buf = rest;
        Ok(value)
    }

    /// Non-negative multiple-precision integer
    fn read_mpint(&mut self) -> Result<BigUint, KeyError> {
        let bytes = self.read_string()?;
        if bytes.first().is_some_and(|b| b & 0x80 != 0) {
            return Err(KeyError::Invalid("negative integer in key data".to_string()));
        }
        Ok(BigUint::from_bytes_be(bytes))
    }

    fn finish(self) -> Result<(), KeyError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(KeyError::Invalid("trailing bytes after key data".to_string()))
        }
    }
}

fn write_string(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), KeyError> {
    let len = u32::try_from(bytes.len()).map_err(|e| KeyError::Generation(e.to_string()))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Big-endian, minimal length, with a zero byte when the high bit is set
fn write_mpint(buf: &mut Vec<u8>, value: &BigUint) -> Result<(), KeyError> {
    let mut bytes = value.to_bytes_be();
    if bytes == [0] {
        bytes.clear();
    } else if bytes.first().is_some_and(|b| b & 0x80 != 0) {
        bytes.insert(0, 0);
    }
    write_string(buf, &bytes)
}

/// Splits one length-prefixed string off the front of `buf`
fn read_string(buf: &[u8]) -> Result<(&[u8], &[u8]), KeyError> {
    let (len, rest) = buf
        .split_first_chunk::<4>()
        .ok_or_else(|| KeyError::Invalid("key data is truncated".to_string()))?;
    let len = usize::try_from(u32::from_be_bytes(*len)).map_err(|e| KeyError::Invalid(e.to_string()))?;
    if rest.len() < len {
        return Err(KeyError::Invalid("key data is truncated".to_string()));
    }
    Ok(rest.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ed25519_key() -> String {
        SshKeyGenerator::new(KeyAlgorithm::Ed25519)
            .generate_public_key()
            .expect("generation succeeds")
    }

    fn encode_line(line: &str) -> String {
        STANDARD.encode(line)
    }

    fn encode_blob(algorithm: &str, blob: &[u8]) -> String {
        encode_line(&format!("{algorithm} {}", STANDARD.encode(blob)))
    }

    fn blob(fields: &[&[u8]]) -> Vec<u8> {
        let mut buf = Vec::new();
        for field in fields {
            write_string(&mut buf, field).expect("fits");
        }
        buf
    }

    fn ecdsa_point(coordinate_len: usize) -> Vec<u8> {
        let mut point = vec![0x04];
        point.extend(std::iter::repeat_n(7, 2 * coordinate_len));
        point
    }

    #[test]
    fn test_generated_ed25519_key_is_valid() {
        assert!(OpenSshKeys.validate_public_key(&ed25519_key()).is_ok());
    }

    #[test]
    fn test_generated_ed25519_key_is_authorized_key_line() {
        let line = String::from_utf8(STANDARD.decode(ed25519_key()).expect("outer base64")).expect("utf8");

        assert!(line.starts_with("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_generated_rsa_key_is_valid() {
        let generator = SshKeyGenerator::default();
        assert_eq!(generator.algorithm(), KeyAlgorithm::Rsa);

        let key = generator.generate_public_key().expect("generation succeeds");
        let line = String::from_utf8(STANDARD.decode(&key).expect("outer base64")).expect("utf8");

        assert!(line.starts_with("ssh-rsa AAAAB3NzaC1yc2E"));
        assert!(OpenSshKeys.validate_public_key(&key).is_ok());
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(ed25519_key(), ed25519_key());
    }

    #[test]
    fn test_mpint_encoding() {
        let mut buf = Vec::new();
        write_mpint(&mut buf, &BigUint::from(0x80u32)).expect("fits");
        write_mpint(&mut buf, &BigUint::from(0u32)).expect("fits");
        assert_eq!(buf, [0, 0, 0, 2, 0x00, 0x80, 0, 0, 0, 0]);

        let mut reader = WireReader::new(&buf);
        assert_eq!(reader.read_mpint().expect("positive"), BigUint::from(0x80u32));
        assert_eq!(reader.read_mpint().expect("zero"), BigUint::from(0u32));
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_comment_is_accepted() {
        let line = String::from_utf8(STANDARD.decode(ed25519_key()).expect("outer base64")).expect("utf8");
        let with_comment = format!("{} user@host", line.trim_end());

        assert!(OpenSshKeys.validate_public_key(&encode_line(&with_comment)).is_ok());
    }

    #[test]
    fn test_not_base64_is_rejected() {
        let err = OpenSshKeys
            .validate_public_key("not base64 at all!")
            .expect_err("must be rejected");
        assert!(matches!(err, KeyError::Encoding(_)));
        assert!(err.to_string().contains("not properly base64 encoded"));
    }

    #[test]
    fn test_plain_text_is_rejected() {
        let err = OpenSshKeys
            .validate_public_key(&encode_line("hello world"))
            .expect_err("must be rejected");
        assert!(matches!(err, KeyError::Invalid(_)));
    }

    #[test]
    fn test_mismatched_algorithm_is_rejected() {
        let key = encode_blob(SSH_ED25519, &blob(&[b"ssh-rsa", &[1, 0, 1]]));
        assert!(OpenSshKeys.validate_public_key(&key).is_err());
    }

    #[test]
    fn test_truncated_ed25519_is_rejected() {
        let key = encode_blob(SSH_ED25519, &blob(&[SSH_ED25519.as_bytes(), &[7; 16]]));
        assert!(OpenSshKeys.validate_public_key(&key).is_err());
    }

    #[test]
    fn test_well_formed_rsa_blob_is_accepted() {
        let modulus = [0x5a; 256];
        let key = encode_blob(SSH_RSA, &blob(&[b"ssh-rsa", &[1, 0, 1], &modulus]));
        assert!(OpenSshKeys.validate_public_key(&key).is_ok());
    }

    #[test]
    fn test_malformed_rsa_blobs_are_rejected() {
        let mut garbage_tail = blob(&[b"ssh-rsa"]);
        garbage_tail.push(0xff);

        let cases: [(&str, Vec<u8>); 6] = [
            ("single garbage byte", garbage_tail),
            ("exponent only", blob(&[b"ssh-rsa", &[1, 0, 1]])),
            ("negative modulus", blob(&[b"ssh-rsa", &[1, 0, 1], &[0x80; 256]])),
            ("even exponent", blob(&[b"ssh-rsa", &[1, 0, 0], &[0x5a; 256]])),
            ("empty modulus", blob(&[b"ssh-rsa", &[1, 0, 1], &[]])),
            ("trailing bytes", blob(&[b"ssh-rsa", &[1, 0, 1], &[0x5a; 256], b"x"])),
        ];

        for (name, data) in cases {
            let key = encode_blob(SSH_RSA, &data);
            assert!(OpenSshKeys.validate_public_key(&key).is_err(), "{name} must be rejected");
        }
    }

    #[test]
    fn test_well_formed_ecdsa_blobs_are_accepted() {
        for (curve, coordinate_len) in [("nistp256", 32), ("nistp384", 48), ("nistp521", 66)] {
            let algorithm = format!("{ECDSA_PREFIX}{curve}");
            let point = ecdsa_point(coordinate_len);
            let key = encode_blob(&algorithm, &blob(&[algorithm.as_bytes(), curve.as_bytes(), &point]));

            assert!(OpenSshKeys.validate_public_key(&key).is_ok(), "{algorithm} must be accepted");
        }
    }

    #[test]
    fn test_malformed_ecdsa_blobs_are_rejected() {
        let name = "ecdsa-sha2-nistp256";
        let mut garbage_tail = blob(&[name.as_bytes()]);
        garbage_tail.extend_from_slice(b"xx");

        let cases: [(&str, Vec<u8>); 5] = [
            ("garbage after name", garbage_tail),
            ("wrong curve", blob(&[name.as_bytes(), b"nistp384", &ecdsa_point(32)])),
            ("short point", blob(&[name.as_bytes(), b"nistp256", &ecdsa_point(16)])),
            ("compressed point", blob(&[name.as_bytes(), b"nistp256", &[0x02; 33]])),
            ("trailing bytes", blob(&[name.as_bytes(), b"nistp256", &ecdsa_point(32), b"x"])),
        ];

        for (case, data) in cases {
            let key = encode_blob(name, &data);
            assert!(OpenSshKeys.validate_public_key(&key).is_err(), "{case} must be rejected");
        }
    }

    #[test]
    fn test_security_key_blobs() {
        let ed = blob(&[SK_SSH_ED25519.as_bytes(), &[7; 32], b"ssh:"]);
        assert!(OpenSshKeys.validate_public_key(&encode_blob(SK_SSH_ED25519, &ed)).is_ok());

        let ecdsa = blob(&[SK_ECDSA_NISTP256.as_bytes(), b"nistp256", &ecdsa_point(32), b"ssh:"]);
        assert!(OpenSshKeys.validate_public_key(&encode_blob(SK_ECDSA_NISTP256, &ecdsa)).is_ok());

        let missing_application = blob(&[SK_SSH_ED25519.as_bytes(), &[7; 32]]);
        assert!(
            OpenSshKeys
                .validate_public_key(&encode_blob(SK_SSH_ED25519, &missing_application))
                .is_err()
        );
    }

    #[test]
    fn test_dss_requires_four_integers() {
        let well_formed = blob(&[b"ssh-dss", &[0x11], &[0x13], &[0x02], &[0x05]]);
        assert!(OpenSshKeys.validate_public_key(&encode_blob(SSH_DSS, &well_formed)).is_ok());

        let short = blob(&[b"ssh-dss", &[0x11], &[0x13]]);
        assert!(OpenSshKeys.validate_public_key(&encode_blob(SSH_DSS, &short)).is_err());
    }

    #[test]
    fn test_read_string_rejects_overlong_length() {
        let buf = [0, 0, 0, 9, b'a'];
        assert!(read_string(&buf).is_err());
    }
}
