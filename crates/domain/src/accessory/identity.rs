//! Stable per-device identifiers derived from the remote device id.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::id::DeviceId;

/// Name-based UUID for the accessory of `id`.
#[must_use]
pub fn accessory_uuid(id: &DeviceId) -> Uuid {
    let name = format!("yhk.accessory.{id}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// A MAC-shaped identifier derived from a 32-bit rolling hash of `text`.
#[must_use]
pub fn pseudo_mac(text: &str) -> String {
    let hash = text
        .encode_utf16()
        .filter(|unit| *unit != u16::from(b'-'))
        .fold(0_i32, |hash, unit| {
            hash.wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit))
        });
    let hex = format!("{:012X}", hash.unsigned_abs());
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

/// An 8-digit setup code (`XXX-XX-XXX`) derived from `text`.
#[must_use]
pub fn setup_pin(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let code = digest
        .iter()
        .fold(0_u64, |acc, byte| (acc * 256 + u64::from(*byte)) % 100_000_000);
    let digits = format!("{code:08}");
    format!("{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..])
}
