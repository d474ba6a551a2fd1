use super::flat::CameraParameters;
use super::hal::{CameraFacing, CameraHal, CameraInfo, CameraPlatform};
use super::params::NvParameters;
use crate::error::Result;
use tracing::{debug, info, warn};

/// Camera handle with the vendor parameter extensions.
///
/// Holds the platform's native camera handle and forwards the base camera
/// capability to it; the vendor parameter set is exchanged through the
/// custom parameter pair.
pub struct NvCamera<H: CameraHal> {
    camera_id: i32,
    info: CameraInfo,
    hal: H,
}

impl<H: CameraHal> NvCamera<H> {
    /// Open a specific camera
    pub fn open<P>(platform: &P, camera_id: i32) -> Result<Self>
    where
        P: CameraPlatform<Hal = H>,
    {
        let info = platform.camera_info(camera_id)?;
        info!(
            "Opening camera {} ({} facing, orientation {})",
            camera_id, info.facing, info.orientation
        );

        let hal = platform.open_hal(camera_id)?;
        Ok(Self {
            camera_id,
            info,
            hal,
        })
    }

    /// Open the first back-facing camera, `None` if the device has none
    pub fn open_default<P>(platform: &P) -> Result<Option<Self>>
    where
        P: CameraPlatform<Hal = H>,
    {
        let count = platform.number_of_cameras();
        debug!("Looking for a back-facing camera among {}", count);

        for camera_id in 0..count {
            match platform.camera_info(camera_id) {
                Ok(info) if info.facing == CameraFacing::Back => {
                    return Self::open(platform, camera_id).map(Some);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping camera {}: {}", camera_id, e),
            }
        }

        info!("No back-facing camera found");
        Ok(None)
    }

    /// Wrap an already opened native handle
    pub fn from_hal(camera_id: i32, info: CameraInfo, hal: H) -> Self {
        Self {
            camera_id,
            info,
            hal,
        }
    }

    pub fn camera_id(&self) -> i32 {
        self.camera_id
    }

    pub fn info(&self) -> &CameraInfo {
        &self.info
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn into_hal(self) -> H {
        self.hal
    }

    /// Send the whole vendor parameter set to the native layer
    pub fn set_parameters(&mut self, params: &NvParameters) -> Result<()> {
        let flat = params.flatten();
        debug!("Camera {} custom parameters -> {}", self.camera_id, flat);
        self.hal.set_custom_parameters(&flat)
    }

    /// Fresh snapshot of the vendor parameter set from the native layer
    pub fn parameters(&self) -> Result<NvParameters> {
        let flat = self.hal.get_custom_parameters()?;
        debug!("Camera {} custom parameters <- {}", self.camera_id, flat);
        NvParameters::unflatten(&flat)
    }

    /// Standard parameters, forwarded to the base camera
    pub fn standard_parameters(&self) -> Result<CameraParameters> {
        let flat = self.hal.get_parameters()?;
        Ok(CameraParameters::unflatten(&flat))
    }

    pub fn set_standard_parameters(&mut self, params: &CameraParameters) -> Result<()> {
        self.hal.set_parameters(&params.flatten())
    }
}
