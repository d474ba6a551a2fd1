use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub stereo: StereoConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CameraConfig {
    /// Camera id to open; the first back-facing camera when unset
    #[serde(default)]
    pub camera_id: Option<i32>,

    /// Optional TOML tuning profile applied after opening the camera
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StereoConfig {
    /// Prefix of persisted system properties
    #[serde(default = "default_property_prefix")]
    pub property_prefix: String,

    /// Stereo separation property and control name
    #[serde(default = "default_separation_property")]
    pub separation_property: String,

    /// Property reporting whether stereo is enabled
    #[serde(default = "default_control_property")]
    pub control_property: String,

    /// Property reporting whether a stereo app is running
    #[serde(default = "default_app_property")]
    pub app_property: String,

    /// Control name used to report slider visibility changes
    #[serde(default = "default_visibility_property")]
    pub visibility_property: String,

    /// Separation percentage written the first time the slider is shown
    #[serde(default = "default_separation")]
    pub default_separation: u32,

    /// HDMI switch state pseudo-file
    #[serde(default = "default_hdmi_state_path")]
    pub hdmi_state_path: String,

    /// Package of the control panel service
    #[serde(default = "default_service_package")]
    pub service_package: String,

    /// Fully qualified class of the control panel service
    #[serde(default = "default_service_class")]
    pub service_class: String,

    /// State identifier attached to every control message
    #[serde(default = "default_state_id")]
    pub state_id: i32,

    /// Command used to start the control panel service
    #[serde(default = "default_am_command")]
    pub am_command: String,
}

impl StereoConfig {
    /// Full persisted property name for a short property name
    pub fn persisted(&self, name: &str) -> String {
        format!("{}{}", self.property_prefix, name)
    }
}

impl ExtConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("tegra-ext.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("stereo.property_prefix", default_property_prefix())?
            .set_default("stereo.separation_property", default_separation_property())?
            .set_default("stereo.control_property", default_control_property())?
            .set_default("stereo.app_property", default_app_property())?
            .set_default("stereo.visibility_property", default_visibility_property())?
            .set_default("stereo.default_separation", default_separation())?
            .set_default("stereo.hdmi_state_path", default_hdmi_state_path())?
            .set_default("stereo.service_package", default_service_package())?
            .set_default("stereo.service_class", default_service_class())?
            .set_default("stereo.state_id", default_state_id())?
            .set_default("stereo.am_command", default_am_command())?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(Environment::with_prefix("TEGRAEXT").separator("__"))
            .build()?;

        let config: ExtConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(id) = self.camera.camera_id {
            if id < 0 {
                return Err(ConfigError::Message(
                    "Camera id must not be negative".to_string(),
                ));
            }
        }

        if self.stereo.default_separation > 100 {
            return Err(ConfigError::Message(
                "Stereo default_separation must be a percentage (0-100)".to_string(),
            ));
        }

        let required = [
            ("separation_property", &self.stereo.separation_property),
            ("control_property", &self.stereo.control_property),
            ("app_property", &self.stereo.app_property),
            ("visibility_property", &self.stereo.visibility_property),
            ("hdmi_state_path", &self.stereo.hdmi_state_path),
            ("service_package", &self.stereo.service_package),
            ("service_class", &self.stereo.service_class),
            ("am_command", &self.stereo.am_command),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Stereo {} must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl Default for ExtConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            stereo: StereoConfig::default(),
        }
    }
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            property_prefix: default_property_prefix(),
            separation_property: default_separation_property(),
            control_property: default_control_property(),
            app_property: default_app_property(),
            visibility_property: default_visibility_property(),
            default_separation: default_separation(),
            hdmi_state_path: default_hdmi_state_path(),
            service_package: default_service_package(),
            service_class: default_service_class(),
            state_id: default_state_id(),
            am_command: default_am_command(),
        }
    }
}

// Default value functions
fn default_property_prefix() -> String {
    "persist.sys.".to_string()
}
fn default_separation_property() -> String {
    "NV_STEREOSEP".to_string()
}
fn default_control_property() -> String {
    "NV_STEREOCTRL".to_string()
}
fn default_app_property() -> String {
    "NV_STEREOAPP".to_string()
}
fn default_visibility_property() -> String {
    "NV_STEREOSEPCHG".to_string()
}
fn default_separation() -> u32 {
    20
}

fn default_hdmi_state_path() -> String {
    "/sys/class/switch/tegradc.1/state".to_string()
}

fn default_service_package() -> String {
    "com.nvidia.NvCPLSvc".to_string()
}
fn default_service_class() -> String {
    "com.nvidia.NvCPLSvc.NvCPLService".to_string()
}
fn default_state_id() -> i32 {
    1
} // 3D vision controls

fn default_am_command() -> String {
    "am".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ExtConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.stereo.default_separation, 20);
        assert_eq!(config.stereo.state_id, 1);
        assert_eq!(
            config.stereo.persisted(&config.stereo.separation_property),
            "persist.sys.NV_STEREOSEP"
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[camera]\ncamera_id = 1\n\n[stereo]\ndefault_separation = 35\nhdmi_state_path = \"/tmp/hdmi\""
        )
        .unwrap();

        let config = ExtConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.camera.camera_id, Some(1));
        assert_eq!(config.stereo.default_separation, 35);
        assert_eq!(config.stereo.hdmi_state_path, "/tmp/hdmi");
        assert_eq!(config.stereo.service_package, "com.nvidia.NvCPLSvc");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ExtConfig::default();

        config.stereo.default_separation = 150;
        assert!(config.validate().is_err());

        config.stereo.default_separation = 20;
        config.stereo.service_class = "  ".to_string();
        assert!(config.validate().is_err());

        config.stereo.service_class = default_service_class();
        config.camera.camera_id = Some(-1);
        assert!(config.validate().is_err());

        config.camera.camera_id = Some(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ExtConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
