mod builder;
mod flat;
mod hal;
mod interface;
mod mock;
mod params;
pub mod region;
pub mod values;

pub use builder::NvCameraBuilder;
pub use flat::CameraParameters;
pub use hal::{CameraFacing, CameraHal, CameraInfo, CameraPlatform};
pub use interface::NvCamera;
pub use mock::{MockCameraHal, MockCameraPlatform};
pub use params::{keys, NvParameters};
pub use region::{decode_regions, encode_regions, Region};
pub use values::{ColorCorrection, Contrast, EvBracket, PictureIso};
