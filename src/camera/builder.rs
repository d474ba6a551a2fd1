use super::hal::CameraPlatform;
use super::interface::NvCamera;
use super::params::NvParameters;
use crate::config::CameraConfig;
use crate::error::{ExtError, Result};
use tracing::info;

/// Builder that opens a camera from configuration and applies its tuning profile
pub struct NvCameraBuilder {
    config: Option<CameraConfig>,
    parameters: Option<NvParameters>,
}

impl NvCameraBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            parameters: None,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Parameters applied after opening, instead of the configured profile
    pub fn parameters(mut self, parameters: NvParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn build<P: CameraPlatform>(self, platform: &P) -> Result<NvCamera<P::Hal>> {
        let config = self
            .config
            .ok_or_else(|| ExtError::system("Camera configuration must be specified"))?;

        let mut camera = match config.camera_id {
            Some(id) => NvCamera::open(platform, id)?,
            None => NvCamera::open_default(platform)?
                .ok_or_else(|| ExtError::system("No back-facing camera available"))?,
        };

        let parameters = match (self.parameters, &config.profile) {
            (Some(parameters), _) => Some(parameters),
            (None, Some(path)) => Some(NvParameters::load_profile(path)?),
            (None, None) => None,
        };

        if let Some(parameters) = parameters {
            info!("Applying tuning parameters to camera {}", camera.camera_id());
            camera.set_parameters(&parameters)?;
        }

        Ok(camera)
    }
}

impl Default for NvCameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}
