use crate::config::StereoConfig;
use crate::error::{ExtError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

const STATE_ID_KEY: &str = "StateID";

/// Typed value carried in a control message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraValue {
    Str(String),
    Int(i32),
}

/// A control-name/control-value pair addressed to the control panel service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub package: String,
    pub class: String,
    pub control_name: String,
    pub control_value: String,
    pub state_id: i32,
}

impl ControlMessage {
    pub fn new<N: Into<String>, V: Into<String>>(
        config: &StereoConfig,
        control_name: N,
        control_value: V,
    ) -> Self {
        Self {
            package: config.service_package.clone(),
            class: config.service_class.clone(),
            control_name: control_name.into(),
            control_value: control_value.into(),
            state_id: config.state_id,
        }
    }

    /// Component name in `package/class` form
    pub fn component(&self) -> String {
        format!("{}/{}", self.package, self.class)
    }

    /// Keyed extras, each key namespaced by the service package
    pub fn extras(&self) -> Vec<(String, ExtraValue)> {
        vec![
            (
                format!("{}.{}", self.package, self.control_name),
                ExtraValue::Str(self.control_value.clone()),
            ),
            (
                format!("{}.{}", self.package, STATE_ID_KEY),
                ExtraValue::Int(self.state_id),
            ),
        ]
    }
}

/// Delivery of control messages to the service
pub trait ServiceNotifier: Send + Sync {
    fn start_service(&self, message: &ControlMessage) -> Result<()>;
}

impl<T: ServiceNotifier + ?Sized> ServiceNotifier for Arc<T> {
    fn start_service(&self, message: &ControlMessage) -> Result<()> {
        (**self).start_service(message)
    }
}

/// Starts the service through the activity manager command line tool
#[derive(Debug, Clone)]
pub struct ActivityManagerNotifier {
    command: String,
}

impl ActivityManagerNotifier {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn arguments(message: &ControlMessage) -> Vec<String> {
        let mut args = vec![
            "startservice".to_string(),
            "-n".to_string(),
            message.component(),
        ];
        for (key, value) in message.extras() {
            match value {
                ExtraValue::Str(s) => args.extend(["--es".to_string(), key, s]),
                ExtraValue::Int(i) => args.extend(["--ei".to_string(), key, i.to_string()]),
            }
        }
        args
    }
}

impl Default for ActivityManagerNotifier {
    fn default() -> Self {
        Self::new("am")
    }
}

impl ServiceNotifier for ActivityManagerNotifier {
    fn start_service(&self, message: &ControlMessage) -> Result<()> {
        let args = Self::arguments(message);
        debug!("Starting service: {} {}", self.command, args.join(" "));

        let status = Command::new(&self.command).args(&args).status()?;
        if !status.success() {
            return Err(ExtError::component(
                "service".to_string(),
                format!("{} startservice exited with {}", self.command, status),
            ));
        }
        Ok(())
    }
}

/// Notifier that keeps every message it is asked to deliver
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<ControlMessage>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject deliveries while `failing` is set; rejected messages are not kept
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn messages(&self) -> Vec<ControlMessage> {
        self.messages.lock().clone()
    }

    pub fn last(&self) -> Option<ControlMessage> {
        self.messages.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl ServiceNotifier for RecordingNotifier {
    fn start_service(&self, message: &ControlMessage) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(ExtError::component("service", "service unavailable"));
        }
        self.messages.lock().push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_message_extras() {
        let config = StereoConfig::default();
        let message = ControlMessage::new(&config, "NV_STEREOSEP", "35");

        assert_eq!(
            message.component(),
            "com.nvidia.NvCPLSvc/com.nvidia.NvCPLSvc.NvCPLService"
        );
        assert_eq!(
            message.extras(),
            vec![
                (
                    "com.nvidia.NvCPLSvc.NV_STEREOSEP".to_string(),
                    ExtraValue::Str("35".to_string())
                ),
                (
                    "com.nvidia.NvCPLSvc.StateID".to_string(),
                    ExtraValue::Int(1)
                ),
            ]
        );
    }

    #[test]
    fn test_activity_manager_arguments() {
        let config = StereoConfig::default();
        let message = ControlMessage::new(&config, "NV_STEREOSEPCHG", "1");

        assert_eq!(
            ActivityManagerNotifier::arguments(&message),
            vec![
                "startservice",
                "-n",
                "com.nvidia.NvCPLSvc/com.nvidia.NvCPLSvc.NvCPLService",
                "--es",
                "com.nvidia.NvCPLSvc.NV_STEREOSEPCHG",
                "1",
                "--ei",
                "com.nvidia.NvCPLSvc.StateID",
                "1",
            ]
        );
    }

    #[test]
    fn test_missing_activity_manager() {
        let notifier = ActivityManagerNotifier::new("/nonexistent/am-for-tests");
        let message = ControlMessage::new(&StereoConfig::default(), "NV_STEREOSEP", "20");

        let err = notifier.start_service(&message).unwrap_err();
        assert!(err.is_degradable());
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        let message = ControlMessage::new(&StereoConfig::default(), "NV_STEREOSEP", "20");

        notifier.start_service(&message).unwrap();
        notifier.set_failing(true);
        assert!(notifier.start_service(&message).is_err());

        assert_eq!(notifier.messages(), vec![message.clone()]);
        assert_eq!(notifier.last(), Some(message));
    }
}
