pub mod camera;
pub mod config;
pub mod error;
pub mod platform;
pub mod stereo;

pub use camera::{
    decode_regions, encode_regions, CameraFacing, CameraHal, CameraInfo, CameraParameters,
    CameraPlatform, ColorCorrection, Contrast, EvBracket, MockCameraHal, MockCameraPlatform,
    NvCamera, NvCameraBuilder, NvParameters, PictureIso, Region,
};
pub use config::ExtConfig;
pub use error::{ExtError, Result};
pub use platform::Platform;
pub use stereo::{
    ActivityManagerNotifier, ControlMessage, HdmiState, MemoryPropertyStore, PropertyStore,
    RecordingNotifier, ServiceNotifier, StereoSeparationSlider,
};
#[cfg(target_os = "android")]
pub use stereo::SystemPropertyStore;
