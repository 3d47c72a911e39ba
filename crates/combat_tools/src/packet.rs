//! Terrain lock status packet inspection.

use std::fmt::Write;

use combat_core::error::Result;
use combat_core::targeting::TerrainLockStatus;

/// Decode a hex-encoded status packet into a readable description.
///
/// # Errors
///
/// Returns an error for malformed hex, a wrong length or unknown codes.
pub fn describe_status_hex(hex: &str) -> Result<String> {
    let status = TerrainLockStatus::from_hex(hex)?;

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "lock id:    {:016x}", status.lock_id);
    let _ = writeln!(out, "terraform:  {:?}", status.terraform_type()?);
    let _ = writeln!(out, "direction:  {:?}", status.direction()?);
    let _ = writeln!(out, "radius:     {}", status.radius);
    let _ = write!(out, "falloff:    {}", status.falloff);
    Ok(out)
}
