use std::fmt;
use std::path::Path;
use tracing::{debug, error, info};

/// Connection state reported by the HDMI switch pseudo-file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HdmiState {
    Offline,
    Connected { width: u32, height: u32 },
    /// Anything the switch reported that is neither of the above
    Unrecognized(String),
}

impl HdmiState {
    /// Interpret the switch state text: `offline` or `WIDTHxHEIGHT`
    pub fn parse(raw: &str) -> Self {
        let state = raw.trim();
        if state == "offline" {
            return HdmiState::Offline;
        }

        let dims: Vec<&str> = state.split('x').collect();
        if let [width, height] = dims.as_slice() {
            if let (Ok(width), Ok(height)) = (width.parse::<u32>(), height.parse::<u32>()) {
                return HdmiState::Connected { width, height };
            }
        }

        HdmiState::Unrecognized(state.to_string())
    }

    /// Read the switch state; a failed read counts as not connected
    pub fn probe<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let state = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                error!("Couldn't read HDMI state from {}: {}", path.display(), e);
                return HdmiState::Unrecognized(String::new());
            }
        };

        match &state {
            HdmiState::Offline => debug!("HDMI display not connected"),
            HdmiState::Connected { width, height } => {
                info!("HDMI display connected, dims = {}x{}", width, height)
            }
            HdmiState::Unrecognized(raw) => {
                debug!("Unrecognized HDMI switch state value '{}'", raw)
            }
        }
        state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, HdmiState::Connected { .. })
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            HdmiState::Connected { width, height } => Some((*width, *height)),
            _ => None,
        }
    }
}

impl fmt::Display for HdmiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdmiState::Offline => f.write_str("offline"),
            HdmiState::Connected { width, height } => write!(f, "{}x{}", width, height),
            HdmiState::Unrecognized(raw) => write!(f, "unrecognized ({})", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_parse_states() {
        assert_eq!(HdmiState::parse("offline"), HdmiState::Offline);
        assert_eq!(
            HdmiState::parse("1920x1080\n"),
            HdmiState::Connected {
                width: 1920,
                height: 1080
            }
        );
        assert!(!HdmiState::parse("garbage").is_connected());
        assert!(!HdmiState::parse("1920x").is_connected());
        assert!(!HdmiState::parse("1920x1080x60").is_connected());
        assert!(!HdmiState::parse("").is_connected());
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(HdmiState::parse("1280x720").dimensions(), Some((1280, 720)));
        assert_eq!(HdmiState::Offline.dimensions(), None);
        assert_eq!(HdmiState::parse("1280x720").to_string(), "1280x720");
    }

    #[test]
    fn test_probe_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1920x1080").unwrap();
        assert!(HdmiState::probe(file.path()).is_connected());

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "offline").unwrap();
        assert_eq!(HdmiState::probe(file.path()), HdmiState::Offline);
    }

    #[test]
    fn test_probe_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let state = HdmiState::probe(temp_dir.path().join("state"));
        assert!(!state.is_connected());
    }
}
