//! Tolerant decoders for numeric fields the service encodes inconsistently.
//!
//! `request_id` shows up as an integer, a decimal string, or (inside the
//! precreate `info` object) a float in scientific notation. `partseq` is a
//! string from one server generation and an integer from another.

use std::fmt;

use serde::Deserializer;
use serde::de::{self, Visitor};

struct U64Visitor;

impl Visitor<'_> for U64Visitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an unsigned integer, float, or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom(format!("negative value {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
        if v.is_finite() && v >= 0.0 {
            Ok(v as u64)
        } else {
            Err(E::custom(format!("out of range value {v}")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(0);
        }
        if let Ok(n) = v.parse::<u64>() {
            return Ok(n);
        }
        v.parse::<f64>()
            .map_err(|_| E::custom(format!("not a number: {v:?}")))
            .and_then(|f| self.visit_f64(f))
    }

    fn visit_unit<E: de::Error>(self) -> Result<u64, E> {
        Ok(0)
    }
}

/// Decodes a `u64` from an integer, float, numeric string, or `null`.
pub(crate) fn u64_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(U64Visitor)
}

/// Decodes a `u32` sequence number from an integer or numeric string.
pub(crate) fn u32_from_any<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = deserializer.deserialize_any(U64Visitor)?;
    u32::try_from(v).map_err(|_| de::Error::custom(format!("sequence number {v} too large")))
}
