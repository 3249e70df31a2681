pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Conditions a caller may want to match on.
/// They travel inside `anyhow::Error`, use `downcast_ref::<StoreError>()` to inspect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid key {key:?}: it has no path segments")]
    InvalidKey { key: String },

    #[error("path separator must not be empty")]
    InvalidSeparator,
}

pub mod utils {
    /// Splits `key` on every occurrence of `separator`.
    /// The empty key yields no segments. There is no escaping: a segment
    /// can never contain the separator. Empty segments (`"a..b"`) are kept.
    pub fn split_key<'a>(key: &'a str, separator: &str) -> Vec<&'a str> {
        if key.is_empty() {
            return Vec::new();
        }
        key.split(separator).collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_split_empty_key() {
            assert!(split_key("", ".").is_empty());
        }

        #[test]
        fn test_split_single_segment() {
            assert_eq!(split_key("email", "."), vec!["email"]);
        }

        #[test]
        fn test_split_nested() {
            assert_eq!(split_key("db.options.attr", "."), vec!["db", "options", "attr"]);
        }

        #[test]
        fn test_split_keeps_empty_segments() {
            assert_eq!(split_key("a..b", "."), vec!["a", "", "b"]);
            assert_eq!(split_key(".", "."), vec!["", ""]);
        }

        #[test]
        fn test_split_custom_separator() {
            assert_eq!(split_key("db\\user", "\\"), vec!["db", "user"]);
            assert_eq!(split_key("db.user", "\\"), vec!["db.user"]);
        }

        #[test]
        fn test_split_multichar_separator() {
            assert_eq!(split_key("a::b::c", "::"), vec!["a", "b", "c"]);
        }
    }
}
