mod hdmi;
mod properties;
mod service;
mod slider;

pub use hdmi::HdmiState;
pub use properties::{MemoryPropertyStore, PropertyStore};
#[cfg(target_os = "android")]
pub use properties::SystemPropertyStore;
pub use service::{
    ActivityManagerNotifier, ControlMessage, ExtraValue, RecordingNotifier, ServiceNotifier,
};
pub use slider::{StereoSeparationSlider, MAX_SEPARATION};
