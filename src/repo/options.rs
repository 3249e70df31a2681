use crate::repo::Value;

/// Construction options of a [`ConfigStore`](crate::ConfigStore).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    /// Splits every key into path segments. Must not be empty.
    pub path_separator: String,
    /// Returned by `get` when a key is missing and no fallback is given.
    /// Kept with its original type.
    pub default_value: Value,
}

impl StoreOptions {
    pub fn with_path_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.path_separator = separator.into();
        self
    }

    pub fn with_default_value<V: Into<Value>>(mut self, value: V) -> Self {
        self.default_value = value.into();
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            path_separator: ".".to_string(),
            default_value: Value::Null,
        }
    }
}
