use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(target_os = "android")]
use tracing::debug;

/// Read access to the persisted system property store.
///
/// An absent property reads as the empty string; lookups never fail.
pub trait PropertyStore: Send + Sync {
    fn get_property(&self, name: &str) -> String;

    /// Flag semantics: empty or `"0"` is off, anything else is on
    fn get_flag(&self, name: &str) -> bool {
        let value = self.get_property(name);
        !(value.is_empty() || value == "0")
    }
}

impl<T: PropertyStore + ?Sized> PropertyStore for Arc<T> {
    fn get_property(&self, name: &str) -> String {
        (**self).get_property(name)
    }
}

impl<T: PropertyStore + ?Sized> PropertyStore for &T {
    fn get_property(&self, name: &str) -> String {
        (**self).get_property(name)
    }
}

/// Property store backed by the platform system property service
#[cfg(target_os = "android")]
#[derive(Debug)]
pub struct SystemPropertyStore {
    properties: android_system_properties::AndroidSystemProperties,
}

#[cfg(target_os = "android")]
impl SystemPropertyStore {
    pub fn new() -> Self {
        Self {
            properties: android_system_properties::AndroidSystemProperties::new(),
        }
    }
}

#[cfg(target_os = "android")]
impl Default for SystemPropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "android")]
impl PropertyStore for SystemPropertyStore {
    fn get_property(&self, name: &str) -> String {
        match self.properties.get(name) {
            Some(value) => {
                debug!("Property {} = '{}'", name, value);
                value
            }
            None => {
                debug!("Property {} is not set", name);
                String::new()
            }
        }
    }
}

/// In-memory property store
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    pub fn set<K: Into<String>, V: Into<String>>(&self, name: K, value: V) {
        self.values.write().insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.values.write().remove(name)
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get_property(&self, name: &str) -> String {
        self.values.read().get(name).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryPropertyStore::with_properties([("persist.sys.NV_STEREOSEP", "35")]);

        assert_eq!(store.get_property("persist.sys.NV_STEREOSEP"), "35");
        assert_eq!(store.get_property("persist.sys.missing"), "");

        store.set("persist.sys.NV_STEREOSEP", "40");
        assert_eq!(store.get_property("persist.sys.NV_STEREOSEP"), "40");
        assert_eq!(store.remove("persist.sys.NV_STEREOSEP").as_deref(), Some("40"));
        assert_eq!(store.get_property("persist.sys.NV_STEREOSEP"), "");
    }

    #[test]
    fn test_flags() {
        let store = MemoryPropertyStore::with_properties([("on", "1"), ("off", "0"), ("odd", "yes")]);

        assert!(store.get_flag("on"));
        assert!(store.get_flag("odd"));
        assert!(!store.get_flag("off"));
        assert!(!store.get_flag("absent"));
    }

    #[cfg(target_os = "android")]
    #[test]
    fn test_system_store_unset_property_is_empty() {
        let store = SystemPropertyStore::new();
        assert_eq!(store.get_property("persist.sys.tegra_ext.unset"), "");
        assert!(!store.get_flag("persist.sys.tegra_ext.unset"));
    }

    #[test]
    fn test_shared_store() {
        let store = Arc::new(MemoryPropertyStore::new());
        let shared: Arc<dyn PropertyStore> = store.clone();

        store.set("ro.board.platform", "tegra");
        assert_eq!(shared.get_property("ro.board.platform"), "tegra");
    }
}
