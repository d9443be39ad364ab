//! Wire format for butterfly-round messages (§4.6 Serialization).
//!
//! Fixed little-endian layout, identical byte-for-byte regardless of which
//! rank encodes or decodes it: magic, version, fixed fields, a length-
//! prefixed violation/refinement list, and a trailing xxh3-64 checksum over
//! everything preceding it.

use luciferase_error::{LuciferaseError, Result};
use luciferase_geometry::{KeyKind, SFCKey};
use xxhash_rust::xxh3::xxh3_64;

use crate::checker::BalanceViolation;

const REQUEST_MAGIC: [u8; 8] = *b"LCFBALRQ";
const RESPONSE_MAGIC: [u8; 8] = *b"LCFBALRS";
const WIRE_VERSION: u32 = 1;
const KEY_BYTES: usize = 1 + 8 + 8 + 1;
const VIOLATION_BYTES: usize = KEY_BYTES * 2 + 1 + 1 + 4;

fn append_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn append_u64_le(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn read_array<const N: usize>(bytes: &[u8], cursor: &mut usize, field: &str) -> Result<[u8; N]> {
    let end = cursor.checked_add(N).ok_or_else(|| {
        LuciferaseError::SerializationError(format!("overflow reading field {field}"))
    })?;
    if end > bytes.len() {
        return Err(LuciferaseError::SerializationError(format!(
            "field {field} out of bounds: need {N} bytes at offset {cursor}, total {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[*cursor..end]);
    *cursor = end;
    Ok(out)
}

fn read_u32_le(bytes: &[u8], cursor: &mut usize, field: &str) -> Result<u32> {
    read_array::<4>(bytes, cursor, field).map(u32::from_le_bytes)
}

fn read_u64_le(bytes: &[u8], cursor: &mut usize, field: &str) -> Result<u64> {
    read_array::<8>(bytes, cursor, field).map(u64::from_le_bytes)
}

fn append_key(buf: &mut Vec<u8>, key: &SFCKey) {
    match *key {
        SFCKey::Morton { bits, level } => {
            buf.push(0);
            append_u64_le(buf, bits);
            append_u64_le(buf, 0);
            buf.push(level);
        }
        SFCKey::Tetree { low, high, level } => {
            buf.push(1);
            append_u64_le(buf, low);
            append_u64_le(buf, high);
            buf.push(level);
        }
    }
}

fn read_key(bytes: &[u8], cursor: &mut usize) -> Result<SFCKey> {
    let tag = read_array::<1>(bytes, cursor, "key_kind")?[0];
    let low = read_u64_le(bytes, cursor, "key_low")?;
    let high = read_u64_le(bytes, cursor, "key_high")?;
    let level = read_array::<1>(bytes, cursor, "key_level")?[0];
    match tag {
        0 => Ok(SFCKey::Morton { bits: low, level }),
        1 => Ok(SFCKey::Tetree { low, high, level }),
        other => Err(LuciferaseError::SerializationError(format!(
            "unknown key kind tag {other}"
        ))),
    }
}

fn append_violation(buf: &mut Vec<u8>, violation: &BalanceViolation) {
    append_key(buf, &violation.local_key);
    append_key(buf, &violation.ghost_key);
    buf.push(violation.local_level);
    buf.push(violation.ghost_level);
    append_u32_le(buf, violation.source_rank);
}

fn read_violation(bytes: &[u8], cursor: &mut usize) -> Result<BalanceViolation> {
    let local_key = read_key(bytes, cursor)?;
    let ghost_key = read_key(bytes, cursor)?;
    let local_level = read_array::<1>(bytes, cursor, "violation_local_level")?[0];
    let ghost_level = read_array::<1>(bytes, cursor, "violation_ghost_level")?[0];
    let source_rank = read_u32_le(bytes, cursor, "violation_source_rank")?;
    Ok(BalanceViolation {
        local_key,
        ghost_key,
        local_level,
        ghost_level,
        source_rank,
    })
}

/// A butterfly-round refinement request, sent to `requester_rank XOR (1 <<
/// round)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementRequest {
    pub requester_rank: u32,
    pub round: u32,
    pub timestamp_ms: u64,
    pub violations: Vec<BalanceViolation>,
}

/// The symmetric response: refined keys the peer applied on its side, or an
/// empty batch if it had nothing to contribute.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementResponse {
    pub responder_rank: u32,
    pub round: u32,
    pub timestamp_ms: u64,
    pub refined_keys: Vec<SFCKey>,
}

impl RefinementRequest {
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(8 + 4 + 4 + 8 + 4 + self.violations.len() * VIOLATION_BYTES);
        body.extend_from_slice(&REQUEST_MAGIC);
        append_u32_le(&mut body, WIRE_VERSION);
        append_u32_le(&mut body, self.requester_rank);
        append_u32_le(&mut body, self.round);
        append_u64_le(&mut body, self.timestamp_ms);
        append_u32_le(&mut body, self.violations.len() as u32);
        for violation in &self.violations {
            append_violation(&mut body, violation);
        }
        let checksum = xxh3_64(&body);
        append_u64_le(&mut body, checksum);
        body
    }

    /// # Errors
    /// Returns [`LuciferaseError::SerializationError`] on truncation, a
    /// magic/version mismatch, or a checksum failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = 0usize;
        let magic = read_array::<8>(bytes, &mut cursor, "magic")?;
        if magic != REQUEST_MAGIC {
            return Err(LuciferaseError::SerializationError(
                "invalid refinement request magic".into(),
            ));
        }
        let version = read_u32_le(bytes, &mut cursor, "version")?;
        if version != WIRE_VERSION {
            return Err(LuciferaseError::SerializationError(format!(
                "unsupported refinement request version {version}"
            )));
        }
        let requester_rank = read_u32_le(bytes, &mut cursor, "requester_rank")?;
        let round = read_u32_le(bytes, &mut cursor, "round")?;
        let timestamp_ms = read_u64_le(bytes, &mut cursor, "timestamp_ms")?;
        let count = read_u32_le(bytes, &mut cursor, "violation_count")? as usize;
        let mut violations = Vec::with_capacity(count);
        for _ in 0..count {
            violations.push(read_violation(bytes, &mut cursor)?);
        }
        let checksum = read_u64_le(bytes, &mut cursor, "checksum")?;
        if cursor != bytes.len() {
            return Err(LuciferaseError::SerializationError(format!(
                "trailing bytes after refinement request: consumed {cursor}, total {}",
                bytes.len()
            )));
        }
        let computed = xxh3_64(&bytes[..bytes.len() - 8]);
        if computed != checksum {
            return Err(LuciferaseError::SerializationError(
                "refinement request checksum mismatch".into(),
            ));
        }
        Ok(Self {
            requester_rank,
            round,
            timestamp_ms,
            violations,
        })
    }
}

impl RefinementResponse {
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(8 + 4 + 4 + 8 + 4 + self.refined_keys.len() * KEY_BYTES);
        body.extend_from_slice(&RESPONSE_MAGIC);
        append_u32_le(&mut body, WIRE_VERSION);
        append_u32_le(&mut body, self.responder_rank);
        append_u32_le(&mut body, self.round);
        append_u64_le(&mut body, self.timestamp_ms);
        append_u32_le(&mut body, self.refined_keys.len() as u32);
        for key in &self.refined_keys {
            append_key(&mut body, key);
        }
        let checksum = xxh3_64(&body);
        append_u64_le(&mut body, checksum);
        body
    }

    /// # Errors
    /// Returns [`LuciferaseError::SerializationError`] on truncation, a
    /// magic/version mismatch, or a checksum failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = 0usize;
        let magic = read_array::<8>(bytes, &mut cursor, "magic")?;
        if magic != RESPONSE_MAGIC {
            return Err(LuciferaseError::SerializationError(
                "invalid refinement response magic".into(),
            ));
        }
        let version = read_u32_le(bytes, &mut cursor, "version")?;
        if version != WIRE_VERSION {
            return Err(LuciferaseError::SerializationError(format!(
                "unsupported refinement response version {version}"
            )));
        }
        let responder_rank = read_u32_le(bytes, &mut cursor, "responder_rank")?;
        let round = read_u32_le(bytes, &mut cursor, "round")?;
        let timestamp_ms = read_u64_le(bytes, &mut cursor, "timestamp_ms")?;
        let count = read_u32_le(bytes, &mut cursor, "refined_count")? as usize;
        let mut refined_keys = Vec::with_capacity(count);
        for _ in 0..count {
            refined_keys.push(read_key(bytes, &mut cursor)?);
        }
        let checksum = read_u64_le(bytes, &mut cursor, "checksum")?;
        if cursor != bytes.len() {
            return Err(LuciferaseError::SerializationError(format!(
                "trailing bytes after refinement response: consumed {cursor}, total {}",
                bytes.len()
            )));
        }
        let computed = xxh3_64(&bytes[..bytes.len() - 8]);
        if computed != checksum {
            return Err(LuciferaseError::SerializationError(
                "refinement response checksum mismatch".into(),
            ));
        }
        Ok(Self {
            responder_rank,
            round,
            timestamp_ms,
            refined_keys,
        })
    }
}

#[must_use]
pub fn empty_key(kind: KeyKind) -> SFCKey {
    SFCKey::root(kind)
}
