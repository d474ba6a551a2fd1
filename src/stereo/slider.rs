use super::hdmi::HdmiState;
use super::properties::PropertyStore;
use super::service::{ControlMessage, ServiceNotifier};
use crate::config::StereoConfig;
use tracing::{debug, error, info, warn};

/// Largest slider position
pub const MAX_SEPARATION: u32 = 100;

/// Model behind the status bar stereo separation slider.
///
/// The persisted separation is read once at construction. When no value has
/// been persisted yet, the configured default is pushed to the control panel
/// service on the first progress update; after that the service is only told
/// about a new value when the user lets go of the slider.
pub struct StereoSeparationSlider<P, N> {
    config: StereoConfig,
    store: P,
    notifier: N,
    progress: u32,
    label: String,
    init_done: bool,
}

impl<P: PropertyStore, N: ServiceNotifier> StereoSeparationSlider<P, N> {
    pub fn new(config: StereoConfig, store: P, notifier: N) -> Self {
        let property = config.persisted(&config.separation_property);
        let stored = store.get_property(&property);

        let (initial, init_done) = if stored.is_empty() {
            (config.default_separation, false)
        } else {
            match stored.trim().parse::<u32>() {
                Ok(value) => (value.min(MAX_SEPARATION), true),
                Err(e) => {
                    warn!(
                        "Ignoring unreadable {}='{}' ({}), using default {}",
                        property, stored, e, config.default_separation
                    );
                    (config.default_separation, false)
                }
            }
        };

        let mut slider = Self {
            config,
            store,
            notifier,
            progress: 0,
            label: String::new(),
            init_done,
        };
        slider.on_progress_changed(initial);
        slider
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    /// Text shown next to the slider
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_initialized(&self) -> bool {
        self.init_done
    }

    pub fn on_progress_changed(&mut self, progress: u32) {
        self.progress = progress.min(MAX_SEPARATION);
        self.label = format!("{}%", self.progress);

        if !self.init_done {
            // First write of the default; later values go out on release
            self.send_separation();
            self.init_done = true;
        }
    }

    pub fn on_start_tracking(&mut self) {}

    pub fn on_stop_tracking(&mut self) {
        self.send_separation();
    }

    /// Visible only with HDMI connected, stereo enabled and a stereo app running
    pub fn should_be_visible(&self) -> bool {
        self.is_hdmi_connected() && self.is_stereo_enabled() && self.is_stereo_app_running()
    }

    pub fn set_slider_visible(&self, visible: bool) {
        let value = if visible { "1" } else { "0" };
        self.set_control(&self.config.visibility_property, value);
    }

    pub fn on_detached(&mut self) {
        self.set_slider_visible(false);
    }

    pub fn is_hdmi_connected(&self) -> bool {
        HdmiState::probe(&self.config.hdmi_state_path).is_connected()
    }

    pub fn is_stereo_enabled(&self) -> bool {
        let enabled = self
            .store
            .get_flag(&self.config.persisted(&self.config.control_property));
        debug!("Stereo enabled: {}", enabled);
        enabled
    }

    pub fn is_stereo_app_running(&self) -> bool {
        let running = self
            .store
            .get_flag(&self.config.persisted(&self.config.app_property));
        debug!("Stereo app running: {}", running);
        running
    }

    fn send_separation(&self) {
        self.set_control(&self.config.separation_property, &self.progress.to_string());
    }

    fn set_control(&self, name: &str, value: &str) {
        let message = ControlMessage::new(&self.config, name, value);
        match self.notifier.start_service(&message) {
            Ok(()) => info!("Sent {}={} to {}", name, value, message.component()),
            Err(e) => error!("Failed to notify {}: {}", message.component(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stereo::properties::MemoryPropertyStore;
    use crate::stereo::service::RecordingNotifier;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn create_test_slider(
        properties: &[(&str, &str)],
        hdmi_state_path: &str,
    ) -> (
        StereoSeparationSlider<Arc<MemoryPropertyStore>, Arc<RecordingNotifier>>,
        Arc<RecordingNotifier>,
    ) {
        let config = StereoConfig {
            hdmi_state_path: hdmi_state_path.to_string(),
            ..StereoConfig::default()
        };
        let store = Arc::new(MemoryPropertyStore::with_properties(
            properties.iter().copied(),
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let slider = StereoSeparationSlider::new(config, store, Arc::clone(&notifier));
        (slider, notifier)
    }

    fn hdmi_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_first_run_writes_default() {
        let (slider, notifier) = create_test_slider(&[], "/nonexistent");

        assert_eq!(slider.progress(), 20);
        assert_eq!(slider.label(), "20%");
        assert!(slider.is_initialized());

        let sent = notifier.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].control_name, "NV_STEREOSEP");
        assert_eq!(sent[0].control_value, "20");
        assert_eq!(sent[0].state_id, 1);
    }

    #[test]
    fn test_persisted_value_is_not_rewritten() {
        let (slider, notifier) =
            create_test_slider(&[("persist.sys.NV_STEREOSEP", "45")], "/nonexistent");

        assert_eq!(slider.progress(), 45);
        assert_eq!(slider.label(), "45%");
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_unreadable_value_falls_back_to_default() {
        let (slider, notifier) =
            create_test_slider(&[("persist.sys.NV_STEREOSEP", "lots")], "/nonexistent");

        assert_eq!(slider.progress(), 20);
        assert_eq!(notifier.last().unwrap().control_value, "20");
    }

    #[test]
    fn test_drag_sends_on_release_only() {
        let (mut slider, notifier) =
            create_test_slider(&[("persist.sys.NV_STEREOSEP", "45")], "/nonexistent");

        slider.on_start_tracking();
        slider.on_progress_changed(50);
        slider.on_progress_changed(60);
        assert!(notifier.messages().is_empty());
        assert_eq!(slider.label(), "60%");

        slider.on_stop_tracking();
        let sent = notifier.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].control_value, "60");
    }

    #[test]
    fn test_progress_is_clamped() {
        let (mut slider, _notifier) =
            create_test_slider(&[("persist.sys.NV_STEREOSEP", "250")], "/nonexistent");
        assert_eq!(slider.progress(), 100);

        slider.on_progress_changed(101);
        assert_eq!(slider.label(), "100%");
    }

    #[test]
    fn test_visibility_requires_all_conditions() {
        let hdmi = hdmi_file("1920x1080");
        let hdmi_path = hdmi.path().to_string_lossy().into_owned();

        let (slider, _) = create_test_slider(
            &[
                ("persist.sys.NV_STEREOCTRL", "1"),
                ("persist.sys.NV_STEREOAPP", "1"),
            ],
            &hdmi_path,
        );
        assert!(slider.should_be_visible());

        let (slider, _) = create_test_slider(
            &[
                ("persist.sys.NV_STEREOCTRL", "1"),
                ("persist.sys.NV_STEREOAPP", "0"),
            ],
            &hdmi_path,
        );
        assert!(!slider.should_be_visible());

        let (slider, _) = create_test_slider(&[("persist.sys.NV_STEREOAPP", "1")], &hdmi_path);
        assert!(!slider.should_be_visible());

        let offline = hdmi_file("offline");
        let (slider, _) = create_test_slider(
            &[
                ("persist.sys.NV_STEREOCTRL", "1"),
                ("persist.sys.NV_STEREOAPP", "1"),
            ],
            &offline.path().to_string_lossy(),
        );
        assert!(!slider.should_be_visible());
    }

    #[test]
    fn test_visibility_changes_are_reported() {
        let (mut slider, notifier) =
            create_test_slider(&[("persist.sys.NV_STEREOSEP", "30")], "/nonexistent");

        slider.set_slider_visible(true);
        slider.on_detached();

        let sent = notifier.messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].control_name, "NV_STEREOSEPCHG");
        assert_eq!(sent[0].control_value, "1");
        assert_eq!(sent[1].control_value, "0");
    }

    #[test]
    fn test_service_failure_is_swallowed() {
        let (mut slider, notifier) =
            create_test_slider(&[("persist.sys.NV_STEREOSEP", "30")], "/nonexistent");
        notifier.set_failing(true);

        slider.on_progress_changed(40);
        slider.on_stop_tracking();

        assert_eq!(slider.progress(), 40);
        assert!(notifier.messages().is_empty());
    }
}
