//! Opaque byte codec for persisted rule sets, so the application layer
//! can cache mined rules between requests without re-mining.

use serde::{Deserialize, Serialize};

use crate::error::{ShoprecError, ShoprecResult};
use crate::types::RuleSet;

const MAGIC: [u8; 4] = *b"SRRS";
const FORMAT_VERSION: u16 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    magic: [u8; 4],
    version: u16,
    rule_set: &'a RuleSet,
}

#[derive(Deserialize)]
struct Envelope {
    magic: [u8; 4],
    version: u16,
    rule_set: RuleSet,
}

/// Serialize a rule set to bytes. The encoding is deterministic for a
/// given rule set (the antecedent index is an ordered map and bincode
/// preserves f64 bit patterns), so identical mining runs serialize to
/// identical bytes.
pub fn serialize_rule_set(rule_set: &RuleSet) -> ShoprecResult<Vec<u8>> {
    bincode::serialize(&EnvelopeRef {
        magic: MAGIC,
        version: FORMAT_VERSION,
        rule_set,
    })
    .map_err(|e| ShoprecError::Serialization(e.to_string()))
}

/// Decode bytes produced by [`serialize_rule_set`]. Corrupt input or a
/// format-version mismatch is reported as a `Serialization` error.
pub fn deserialize_rule_set(bytes: &[u8]) -> ShoprecResult<RuleSet> {
    let envelope: Envelope =
        bincode::deserialize(bytes).map_err(|e| ShoprecError::Serialization(e.to_string()))?;
    if envelope.magic != MAGIC {
        return Err(ShoprecError::Serialization(
            "not a shoprec rule set (bad magic)".to_string(),
        ));
    }
    if envelope.version != FORMAT_VERSION {
        return Err(ShoprecError::Serialization(format!(
            "unsupported rule set format version {} (expected {})",
            envelope.version, FORMAT_VERSION
        )));
    }
    Ok(envelope.rule_set)
}

impl RuleSet {
    pub fn to_bytes(&self) -> ShoprecResult<Vec<u8>> {
        serialize_rule_set(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> ShoprecResult<Self> {
        deserialize_rule_set(bytes)
    }
}
