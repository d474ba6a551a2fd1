use crate::error::{ExtError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Back,
    Front,
    /// Externally attached USB camera
    Usb,
}

impl CameraFacing {
    /// Numeric id used by the platform camera service
    pub fn id(&self) -> i32 {
        match self {
            CameraFacing::Back => 0,
            CameraFacing::Front => 1,
            CameraFacing::Usb => 2,
        }
    }
}

impl TryFrom<i32> for CameraFacing {
    type Error = ExtError;

    fn try_from(id: i32) -> Result<Self> {
        match id {
            0 => Ok(CameraFacing::Back),
            1 => Ok(CameraFacing::Front),
            2 => Ok(CameraFacing::Usb),
            other => Err(ExtError::invalid_value(
                "camera facing",
                format!("unknown facing id {}", other),
            )),
        }
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CameraFacing::Back => "back",
            CameraFacing::Front => "front",
            CameraFacing::Usb => "usb",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub facing: CameraFacing,
    /// Clockwise rotation of the sensor image, in degrees
    pub orientation: u32,
}

/// Native side of one opened camera.
///
/// The standard parameter pair is the base camera capability; the custom
/// pair carries the vendor parameter set. Both exchange whole flattened
/// parameter strings.
pub trait CameraHal {
    fn set_parameters(&mut self, flat: &str) -> Result<()>;

    fn get_parameters(&self) -> Result<String>;

    fn set_custom_parameters(&mut self, flat: &str) -> Result<()>;

    fn get_custom_parameters(&self) -> Result<String>;
}

/// Camera enumeration and opening
pub trait CameraPlatform {
    type Hal: CameraHal;

    fn number_of_cameras(&self) -> i32;

    fn camera_info(&self, camera_id: i32) -> Result<CameraInfo>;

    fn open_hal(&self, camera_id: i32) -> Result<Self::Hal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_ids() {
        for facing in [CameraFacing::Back, CameraFacing::Front, CameraFacing::Usb] {
            assert_eq!(CameraFacing::try_from(facing.id()).unwrap(), facing);
        }
        assert_eq!(CameraFacing::Usb.id(), 2);
        assert!(CameraFacing::try_from(7).is_err());
    }
}
