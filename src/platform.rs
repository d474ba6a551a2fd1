//! Explicit process-wide setup.
//!
//! Native collaborators are created once by [`init`] at startup and shared
//! for the rest of the process. Nothing is loaded lazily on first use.

use crate::config::ExtConfig;
use crate::error::{ExtError, Result};
use crate::stereo::{
    ActivityManagerNotifier, PropertyStore, ServiceNotifier, StereoSeparationSlider,
};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

static PLATFORM: OnceLock<Platform> = OnceLock::new();

pub type SharedSlider = StereoSeparationSlider<Arc<dyn PropertyStore>, Arc<dyn ServiceNotifier>>;

pub struct Platform {
    config: ExtConfig,
    properties: Arc<dyn PropertyStore>,
    notifier: Arc<dyn ServiceNotifier>,
}

impl Platform {
    pub fn config(&self) -> &ExtConfig {
        &self.config
    }

    pub fn property_store(&self) -> Arc<dyn PropertyStore> {
        Arc::clone(&self.properties)
    }

    pub fn notifier(&self) -> Arc<dyn ServiceNotifier> {
        Arc::clone(&self.notifier)
    }

    /// Slider wired to the process property store and service notifier
    pub fn stereo_slider(&self) -> SharedSlider {
        StereoSeparationSlider::new(
            self.config.stereo.clone(),
            self.property_store(),
            self.notifier(),
        )
    }
}

/// Initialize the platform with the system property store and activity manager
pub fn init(config: ExtConfig) -> Result<&'static Platform> {
    let properties = system_properties();
    let notifier = Arc::new(ActivityManagerNotifier::new(config.stereo.am_command.clone()));
    init_with(config, properties, notifier)
}

#[cfg(target_os = "android")]
fn system_properties() -> Arc<dyn PropertyStore> {
    Arc::new(crate::stereo::SystemPropertyStore::new())
}

// Off device there is no property service; every property reads as unset
#[cfg(not(target_os = "android"))]
fn system_properties() -> Arc<dyn PropertyStore> {
    warn!("No system property service on this target, using an empty store");
    Arc::new(crate::stereo::MemoryPropertyStore::new())
}

/// Initialize the platform with explicit collaborators.
///
/// Only the first call installs anything; later calls log a warning and
/// return the platform that is already in place.
pub fn init_with(
    config: ExtConfig,
    properties: Arc<dyn PropertyStore>,
    notifier: Arc<dyn ServiceNotifier>,
) -> Result<&'static Platform> {
    config.validate()?;

    let mut installed = false;
    let platform = PLATFORM.get_or_init(|| {
        installed = true;
        Platform {
            config,
            properties,
            notifier,
        }
    });

    if installed {
        info!("Platform initialized");
    } else {
        warn!("Platform already initialized, ignoring new configuration");
    }
    Ok(platform)
}

/// The initialized platform
pub fn get() -> Result<&'static Platform> {
    PLATFORM.get().ok_or(ExtError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stereo::{MemoryPropertyStore, RecordingNotifier};

    // Single test: the platform is process-wide state
    #[test]
    fn test_init_once() {
        let mut invalid = ExtConfig::default();
        invalid.stereo.default_separation = 500;
        assert!(init_with(
            invalid,
            Arc::new(MemoryPropertyStore::new()),
            Arc::new(RecordingNotifier::new()),
        )
        .is_err());
        assert!(matches!(get(), Err(ExtError::NotInitialized)));

        let store = Arc::new(MemoryPropertyStore::with_properties([(
            "persist.sys.NV_STEREOSEP",
            "55",
        )]));
        let notifier = Arc::new(RecordingNotifier::new());
        let platform = init_with(ExtConfig::default(), store, notifier.clone()).unwrap();

        let mut other = ExtConfig::default();
        other.stereo.default_separation = 70;
        let again = init_with(
            other,
            Arc::new(MemoryPropertyStore::new()),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();

        assert!(std::ptr::eq(platform, again));
        assert!(std::ptr::eq(platform, get().unwrap()));
        assert_eq!(get().unwrap().config().stereo.default_separation, 20);

        let slider = platform.stereo_slider();
        assert_eq!(slider.progress(), 55);
        assert!(notifier.messages().is_empty());
    }
}
