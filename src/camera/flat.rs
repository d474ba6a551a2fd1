use crate::error::{ExtError, Result};
use std::collections::BTreeMap;
use tracing::{trace, warn};

const PAIR_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = '=';

/// Base camera parameter object: string keys to string values, transferred
/// as `key=value;key=value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraParameters {
    entries: BTreeMap<String, String>,
}

impl CameraParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Integer value of `key`, `None` when absent or not an integer
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Store `value` under `key`.
    ///
    /// Keys and values may not contain the transfer separators, otherwise
    /// the flattened form could not be split back apart.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> Result<()> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return Err(ExtError::invalid_value("parameter key", "must not be empty"));
        }
        if key.contains([PAIR_SEPARATOR, KEY_VALUE_SEPARATOR]) {
            return Err(ExtError::invalid_value(
                key,
                "key must not contain '=' or ';'",
            ));
        }
        if value.contains([PAIR_SEPARATOR, KEY_VALUE_SEPARATOR]) {
            return Err(ExtError::invalid_value(
                key,
                format!("value '{}' must not contain '=' or ';'", value),
            ));
        }

        self.entries.insert(key, value);
        Ok(())
    }

    /// Insert a value already known to be free of separators
    pub(crate) fn insert_unchecked(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn flatten(&self) -> String {
        let mut flat = String::with_capacity(self.entries.len() * 24);
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                flat.push(PAIR_SEPARATOR);
            }
            flat.push_str(key);
            flat.push(KEY_VALUE_SEPARATOR);
            flat.push_str(value);
        }
        flat
    }

    /// Parse a flattened parameter string. Entries without `=` are dropped.
    pub fn unflatten(flat: &str) -> Self {
        let mut entries = BTreeMap::new();

        for pair in flat.split(PAIR_SEPARATOR).filter(|p| !p.is_empty()) {
            match pair.split_once(KEY_VALUE_SEPARATOR) {
                Some((key, value)) if !key.is_empty() => {
                    entries.insert(key.to_string(), value.to_string());
                }
                _ => {
                    warn!("Skipping malformed parameter entry '{}'", pair);
                }
            }
        }

        trace!("Unflattened {} parameters", entries.len());
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a CameraParameters {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_unflatten() {
        let mut params = CameraParameters::new();
        params.set("preview-size", "640x480").unwrap();
        params.set("jpeg-quality", "95").unwrap();

        let flat = params.flatten();
        assert_eq!(flat, "jpeg-quality=95;preview-size=640x480");
        assert_eq!(CameraParameters::unflatten(&flat), params);
    }

    #[test]
    fn test_unflatten_tolerates_noise() {
        let params = CameraParameters::unflatten("a=1;;broken;=orphan;b=x=y;c=");
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("x=y"));
        assert_eq!(params.get("c"), Some(""));
        assert_eq!(params.len(), 3);
        assert!(CameraParameters::unflatten("").is_empty());
    }

    #[test]
    fn test_set_rejects_separators() {
        let mut params = CameraParameters::new();
        assert!(params.set("bad;key", "1").is_err());
        assert!(params.set("key", "a=b").is_err());
        assert!(params.set("", "1").is_err());
        assert!(params.is_empty());
    }

    #[test]
    fn test_get_int() {
        let mut params = CameraParameters::new();
        params.set("zoom", "3").unwrap();
        params.set("zoom-supported", "true").unwrap();

        assert_eq!(params.get_int("zoom"), Some(3));
        assert_eq!(params.get_int("zoom-supported"), None);
        assert_eq!(params.get_int("missing"), None);
    }
}
