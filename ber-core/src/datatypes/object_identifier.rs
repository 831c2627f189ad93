//! OBJECT IDENTIFIER and RELATIVE-OID values

use crate::error::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hierarchical numeric identifier (absolute or relative)
///
/// Arcs are limited to `u32`; the first two arcs of an absolute identifier
/// share their first subidentifier (`40 * X + Y`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    arcs: Vec<u32>,
    relative: bool,
}

impl ObjectIdentifier {
    /// Create an absolute identifier from its arcs
    pub fn new(arcs: Vec<u32>) -> BerResult<Self> {
        if arcs.len() < 2 {
            return Err(BerError::InvalidData(format!(
                "Object identifier needs at least 2 arcs, got {}",
                arcs.len()
            )));
        }
        if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            return Err(BerError::InvalidData(format!(
                "Invalid leading arcs {}.{}",
                arcs[0], arcs[1]
            )));
        }
        Ok(Self {
            arcs,
            relative: false,
        })
    }

    /// Decode absolute identifier content octets
    pub fn decode(content: &[u8]) -> BerResult<Self> {
        let subids = decode_subidentifiers(content)?;
        let Some((&first, rest)) = subids.split_first() else {
            return Err(BerError::InvalidData(
                "Empty object identifier encoding".to_string(),
            ));
        };

        let mut arcs = Vec::with_capacity(subids.len() + 1);
        match first {
            0..=39 => arcs.extend([0, first]),
            40..=79 => arcs.extend([1, first - 40]),
            _ => arcs.extend([2, first - 80]),
        }
        arcs.extend_from_slice(rest);

        Ok(Self {
            arcs,
            relative: false,
        })
    }

    /// Decode RELATIVE-OID content octets
    pub fn decode_relative(content: &[u8]) -> BerResult<Self> {
        let arcs = decode_subidentifiers(content)?;
        if arcs.is_empty() {
            return Err(BerError::InvalidData(
                "Empty relative object identifier encoding".to_string(),
            ));
        }
        Ok(Self {
            arcs,
            relative: true,
        })
    }

    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }
}

/// Split content into base-128 subidentifiers
///
/// The last octet must not carry the continuation bit and a subidentifier
/// must not start with the padding octet `0x80`.
fn decode_subidentifiers(content: &[u8]) -> BerResult<Vec<u32>> {
    let mut subids = Vec::new();
    let mut current = 0u32;
    let mut in_progress = false;

    for (pos, &byte) in content.iter().enumerate() {
        if !in_progress && byte == 0x80 {
            return Err(BerError::InvalidData(format!(
                "Non-minimal OID subidentifier at octet {}",
                pos
            )));
        }
        current = current
            .checked_mul(128)
            .and_then(|x| x.checked_add((byte & 0x7F) as u32))
            .ok_or_else(|| BerError::InvalidData("OID component overflow".to_string()))?;
        if byte & 0x80 != 0 {
            in_progress = true;
        } else {
            subids.push(current);
            current = 0;
            in_progress = false;
        }
    }

    if in_progress {
        return Err(BerError::InvalidData(
            "OID encoding ends with continuation bit set".to_string(),
        ));
    }
    Ok(subids)
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectIdentifier {
    type Err = BerError;

    fn from_str(s: &str) -> BerResult<Self> {
        let arcs = s
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| BerError::InvalidData(format!("Invalid OID arc: {}", part)))
            })
            .collect::<BerResult<Vec<_>>>()?;
        Self::new(arcs)
    }
}
