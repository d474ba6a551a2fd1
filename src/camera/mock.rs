use super::flat::CameraParameters;
use super::hal::{CameraFacing, CameraHal, CameraInfo, CameraPlatform};
use crate::error::{ExtError, Result};
use parking_lot::Mutex;
use tracing::debug;

/// In-memory camera HAL for testing without camera hardware.
///
/// Incoming parameter strings are merged into the stored state the way the
/// driver applies them, so a later read returns the union of everything set.
#[derive(Debug, Default)]
pub struct MockCameraHal {
    standard: CameraParameters,
    custom: CameraParameters,
    custom_writes: usize,
    fail_next: Option<String>,
}

impl MockCameraHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a driver-reported custom parameter string
    pub fn with_custom(flat: &str) -> Self {
        Self {
            custom: CameraParameters::unflatten(flat),
            ..Self::default()
        }
    }

    /// Make the next native call fail with `message`
    pub fn fail_next_call<S: Into<String>>(&mut self, message: S) {
        self.fail_next = Some(message.into());
    }

    pub fn custom_writes(&self) -> usize {
        self.custom_writes
    }

    pub fn custom(&self) -> &CameraParameters {
        &self.custom
    }

    fn check_failure(&mut self, operation: &str) -> Result<()> {
        match self.fail_next.take() {
            Some(message) => Err(ExtError::native(operation, message)),
            None => Ok(()),
        }
    }

    fn merge(target: &mut CameraParameters, flat: &str) {
        for (key, value) in &CameraParameters::unflatten(flat) {
            target.insert_unchecked(key, value.clone());
        }
    }
}

impl CameraHal for MockCameraHal {
    fn set_parameters(&mut self, flat: &str) -> Result<()> {
        self.check_failure("set_parameters")?;
        Self::merge(&mut self.standard, flat);
        Ok(())
    }

    fn get_parameters(&self) -> Result<String> {
        Ok(self.standard.flatten())
    }

    fn set_custom_parameters(&mut self, flat: &str) -> Result<()> {
        self.check_failure("set_custom_parameters")?;
        debug!("Mock HAL received custom parameters: {}", flat);
        Self::merge(&mut self.custom, flat);
        self.custom_writes += 1;
        Ok(())
    }

    fn get_custom_parameters(&self) -> Result<String> {
        if let Some(message) = &self.fail_next {
            return Err(ExtError::native("get_custom_parameters", message.clone()));
        }
        Ok(self.custom.flatten())
    }
}

/// Camera platform backed by [`MockCameraHal`] instances
#[derive(Debug)]
pub struct MockCameraPlatform {
    cameras: Vec<CameraInfo>,
    initial_custom: String,
    opened: Mutex<Vec<i32>>,
}

impl MockCameraPlatform {
    pub fn new(cameras: Vec<CameraInfo>) -> Self {
        Self {
            cameras,
            initial_custom: String::new(),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// A front camera followed by a back camera, reporting the driver's
    /// default focus window
    pub fn front_and_back() -> Self {
        Self::new(vec![
            CameraInfo {
                facing: CameraFacing::Front,
                orientation: 270,
            },
            CameraInfo {
                facing: CameraFacing::Back,
                orientation: 90,
            },
        ])
        .with_initial_custom("focus-areas=(-240,-240,240,240,1)")
    }

    pub fn with_initial_custom<S: Into<String>>(mut self, flat: S) -> Self {
        self.initial_custom = flat.into();
        self
    }

    /// Camera ids opened so far, in order
    pub fn opened(&self) -> Vec<i32> {
        self.opened.lock().clone()
    }
}

impl CameraPlatform for MockCameraPlatform {
    type Hal = MockCameraHal;

    fn number_of_cameras(&self) -> i32 {
        self.cameras.len() as i32
    }

    fn camera_info(&self, camera_id: i32) -> Result<CameraInfo> {
        usize::try_from(camera_id)
            .ok()
            .and_then(|i| self.cameras.get(i).copied())
            .ok_or_else(|| ExtError::native("camera_info", format!("no camera {}", camera_id)))
    }

    fn open_hal(&self, camera_id: i32) -> Result<MockCameraHal> {
        self.camera_info(camera_id)?;
        self.opened.lock().push(camera_id);
        Ok(MockCameraHal::with_custom(&self.initial_custom))
    }
}
