//! Terrain lock status packet.
//!
//! Fixed 12-byte little-endian layout shared with clients:
//!
//! ```text
//! offset  size  field
//! 0       8     lock id
//! 8       1     terraform type code
//! 9       1     terraform direction code
//! 10      1     radius
//! 11      1     falloff
//! ```
//!
//! Encoded with bincode's legacy fixed-int configuration, which writes
//! struct fields back to back with no length prefixes or tags.

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};
use crate::targeting::terrain::{TerraformDirection, TerraformType};

/// Encoded size of [`TerrainLockStatus`].
pub const TERRAIN_LOCK_STATUS_LEN: usize = 12;

/// Wire form of a terrain lock's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainLockStatus {
    /// Lock id.
    pub lock_id: u64,
    /// [`TerraformType`] code.
    pub terraform_type: u8,
    /// [`TerraformDirection`] code.
    pub direction: u8,
    /// Radius, already clamped.
    pub radius: u8,
    /// Falloff width.
    pub falloff: u8,
}

impl TerrainLockStatus {
    /// Encode into exactly [`TERRAIN_LOCK_STATUS_LEN`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len(), TERRAIN_LOCK_STATUS_LEN);
        Ok(bytes)
    }

    /// Decode and check enum codes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TERRAIN_LOCK_STATUS_LEN {
            return Err(CombatError::PacketLength {
                expected: TERRAIN_LOCK_STATUS_LEN,
                actual: bytes.len(),
            });
        }
        let status: Self = bincode::deserialize(bytes)?;
        TerraformType::try_from(status.terraform_type)?;
        TerraformDirection::try_from(status.direction)?;
        Ok(status)
    }

    /// Lowercase hex of the encoded packet, for logs and tooling.
    pub fn to_hex(&self) -> Result<String> {
        Ok(self.encode()?.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Decode from a hex string; whitespace is ignored.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits: Vec<u8> = text
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if digits.len() % 2 != 0 {
            return Err(CombatError::PacketCodec(format!(
                "odd number of hex digits ({})",
                digits.len()
            )));
        }

        let bytes = digits
            .chunks(2)
            .map(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| {
                        CombatError::PacketCodec(format!(
                            "invalid hex byte {:?}",
                            String::from_utf8_lossy(pair)
                        ))
                    })
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::decode(&bytes)
    }

    /// Decoded terraform type.
    pub fn terraform_type(&self) -> Result<TerraformType> {
        TerraformType::try_from(self.terraform_type)
    }

    /// Decoded terraform direction.
    pub fn direction(&self) -> Result<TerraformDirection> {
        TerraformDirection::try_from(self.direction)
    }
}
