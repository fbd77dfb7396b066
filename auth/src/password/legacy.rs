//! Read-only support for ASP.NET Identity password records.
//!
//! Such records are the base64 encoding of a marker byte followed by PBKDF2
//! parameters, salt and subkey:
//!
//! * V2 (`0x00`): HMAC-SHA1, 1000 iterations, 16-byte salt, 32-byte subkey.
//! * V3 (`0x01`): big-endian `u32` PRF id, iteration count and salt length,
//!   then the salt and the subkey.
//!
//! They are never produced here. A matching legacy record is always reported
//! as weak so the caller replaces it with a current one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::Sha256;
use sha2::Sha512;
use subtle::ConstantTimeEq;

const V2_MARKER: u8 = 0x00;
const V3_MARKER: u8 = 0x01;
const V2_ITERATIONS: u32 = 1000;
const V2_SALT_LEN: usize = 16;
const V2_SUBKEY_LEN: usize = 32;
const V3_HEADER_LEN: usize = 13;
const MIN_SALT_LEN: usize = 16;
const MIN_SUBKEY_LEN: usize = 16;
/// Upper bound on V3 iteration counts accepted for verification.
const MAX_ITERATIONS: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Prf {
    HmacSha1,
    HmacSha256,
    HmacSha512,
}

impl Prf {
    fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Prf::HmacSha1),
            1 => Some(Prf::HmacSha256),
            2 => Some(Prf::HmacSha512),
            _ => None,
        }
    }

    fn derive(self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        match self {
            Prf::HmacSha1 => pbkdf2_hmac::<Sha1>(password, salt, iterations, out),
            Prf::HmacSha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, out),
            Prf::HmacSha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, out),
        }
    }
}

#[derive(Debug)]
struct LegacyRecord {
    prf: Prf,
    iterations: u32,
    salt: Vec<u8>,
    subkey: Vec<u8>,
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let chunk = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(chunk.try_into().ok()?))
}

fn parse(record: &str) -> Option<LegacyRecord> {
    let bytes = STANDARD.decode(record).ok()?;

    match *bytes.first()? {
        V2_MARKER => {
            if bytes.len() != 1 + V2_SALT_LEN + V2_SUBKEY_LEN {
                return None;
            }
            Some(LegacyRecord {
                prf: Prf::HmacSha1,
                iterations: V2_ITERATIONS,
                salt: bytes[1..1 + V2_SALT_LEN].to_vec(),
                subkey: bytes[1 + V2_SALT_LEN..].to_vec(),
            })
        }
        V3_MARKER => {
            let prf = Prf::from_id(read_u32(&bytes, 1)?)?;
            let iterations = read_u32(&bytes, 5)?;
            let salt_len = read_u32(&bytes, 9)? as usize;
            if iterations == 0 || iterations > MAX_ITERATIONS || salt_len < MIN_SALT_LEN {
                return None;
            }

            let salt_end = V3_HEADER_LEN.checked_add(salt_len)?;
            if bytes.len() < salt_end.checked_add(MIN_SUBKEY_LEN)? {
                return None;
            }

            Some(LegacyRecord {
                prf,
                iterations,
                salt: bytes[V3_HEADER_LEN..salt_end].to_vec(),
                subkey: bytes[salt_end..].to_vec(),
            })
        }
        _ => None,
    }
}

/// True if `record` is a legacy record and `password` produces its subkey.
pub(crate) fn verify(record: &str, password: &str) -> bool {
    let Some(legacy) = parse(record) else {
        return false;
    };

    tracing::debug!(
        prf = ?legacy.prf,
        iterations = legacy.iterations,
        "Verifying legacy password record"
    );

    let mut derived = vec![0u8; legacy.subkey.len()];
    legacy
        .prf
        .derive(password.as_bytes(), &legacy.salt, legacy.iterations, &mut derived);

    derived.ct_eq(&legacy.subkey).into()
}
