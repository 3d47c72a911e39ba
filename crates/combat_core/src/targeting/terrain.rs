//! Terrain lock targets and terraform parameters.

use serde::{Deserialize, Serialize};

use crate::error::CombatError;
use crate::math::Vec3;

/// Largest terraform radius a terrain lock may carry.
pub const MAX_TERRAFORM_RADIUS: u8 = 5;

/// Kind of terraforming requested through a terrain lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum TerraformType {
    /// No terraforming.
    #[default]
    Undefined = 0,
    /// Smooth the area.
    Blur = 1,
    /// Flatten the area to the center height.
    Level = 2,
    /// Raise or lower the area.
    Simple = 3,
}

/// Direction of a `Simple` terraform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum TerraformDirection {
    /// No direction.
    #[default]
    Undefined = 0,
    /// Dig down.
    Lower = 1,
    /// Build up.
    Raise = 2,
}

impl TryFrom<u8> for TerraformType {
    type Error = CombatError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Undefined),
            1 => Ok(Self::Blur),
            2 => Ok(Self::Level),
            3 => Ok(Self::Simple),
            _ => Err(CombatError::PacketCode {
                field: "terraform type",
                code,
            }),
        }
    }
}

impl TryFrom<u8> for TerraformDirection {
    type Error = CombatError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Undefined),
            1 => Ok(Self::Lower),
            2 => Ok(Self::Raise),
            _ => Err(CombatError::PacketCode {
                field: "terraform direction",
                code,
            }),
        }
    }
}

/// A location on the terrain plus terraform parameters.
///
/// Two terrain targets refer to the same thing when their locations match;
/// the terraform parameters are payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainTarget {
    location: Vec3,
    terraform_type: TerraformType,
    direction: TerraformDirection,
    radius: u8,
    falloff: u8,
}

impl TerrainTarget {
    /// Target a location with no terraforming.
    #[must_use]
    pub const fn new(location: Vec3) -> Self {
        Self {
            location,
            terraform_type: TerraformType::Undefined,
            direction: TerraformDirection::Undefined,
            radius: 0,
            falloff: 0,
        }
    }

    /// Locked location.
    #[must_use]
    pub const fn location(&self) -> Vec3 {
        self.location
    }

    /// Terraform kind.
    #[must_use]
    pub const fn terraform_type(&self) -> TerraformType {
        self.terraform_type
    }

    /// Set the terraform kind.
    pub fn set_terraform_type(&mut self, terraform_type: TerraformType) {
        self.terraform_type = terraform_type;
    }

    /// Terraform direction.
    #[must_use]
    pub const fn direction(&self) -> TerraformDirection {
        self.direction
    }

    /// Set the terraform direction.
    pub fn set_direction(&mut self, direction: TerraformDirection) {
        self.direction = direction;
    }

    /// Terraform radius in `[0, MAX_TERRAFORM_RADIUS]`.
    #[must_use]
    pub const fn radius(&self) -> u8 {
        self.radius
    }

    /// Set the radius, clamping silently into `[0, MAX_TERRAFORM_RADIUS]`.
    pub fn set_radius(&mut self, radius: i32) {
        self.radius = radius.clamp(0, i32::from(MAX_TERRAFORM_RADIUS)) as u8;
    }

    /// Falloff width.
    #[must_use]
    pub const fn falloff(&self) -> u8 {
        self.falloff
    }

    /// Set the falloff width.
    pub fn set_falloff(&mut self, falloff: u8) {
        self.falloff = falloff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_clamps() {
        let mut target = TerrainTarget::new(Vec3::ZERO);
        target.set_radius(10);
        assert_eq!(target.radius(), 5);
        target.set_radius(-3);
        assert_eq!(target.radius(), 0);
        target.set_radius(3);
        assert_eq!(target.radius(), 3);
        target.set_radius(i32::MAX);
        assert_eq!(target.radius(), MAX_TERRAFORM_RADIUS);
    }

    #[test]
    fn test_codes_round_trip() {
        for direction in [
            TerraformDirection::Undefined,
            TerraformDirection::Lower,
            TerraformDirection::Raise,
        ] {
            assert_eq!(TerraformDirection::try_from(direction as u8).ok(), Some(direction));
        }
        assert!(TerraformType::try_from(4).is_err());
        assert!(TerraformDirection::try_from(3).is_err());
    }
}
