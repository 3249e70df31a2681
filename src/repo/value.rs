use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::Result;

/// Ordered mapping used for every scope of the tree.
pub type Mapping = IndexMap<String, Value>;

/// Callable behind a deferred value or a computed fallback.
pub type Producer = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A value stored in a [`ConfigStore`](crate::ConfigStore).
///
/// Only [`Value::Map`] is traversable by a path. Everything else is a leaf,
/// including [`Value::Deferred`] until it is forced by a traversal.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Map(Mapping),
    Deferred(Deferred),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Value::Deferred(deferred) => Some(deferred),
            _ => None,
        }
    }

    /// Looks up a direct child of a mapping value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Deferred(deferred) => write!(f, "{deferred:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(map)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Value::Deferred(deferred)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A producer plus its fixed arguments, materialized when a traversal reaches it.
///
/// With `always == false` the first traversal replaces the slot with the produced
/// value. With `always == true` the slot is never replaced and every traversal
/// invokes the producer again.
#[derive(Clone)]
pub struct Deferred {
    producer: Producer,
    args: Vec<Value>,
    always: bool,
}

impl Deferred {
    pub fn new<F>(producer: F, args: Vec<Value>, always: bool) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            producer: Arc::new(producer),
            args,
            always,
        }
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_always(&self) -> bool {
        self.always
    }

    /// Invokes the producer once with the stored arguments.
    pub fn force(&self) -> Result<Value> {
        (self.producer)(self.args.as_slice())
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("args", &self.args)
            .field("always", &self.always)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.producer, &other.producer)
            && self.args == other.args
            && self.always == other.always
    }
}

/// What [`ConfigStore::get_with`](crate::ConfigStore::get_with) returns when a key does not
/// resolve.
#[derive(Clone, Default)]
pub enum Fallback {
    /// The store's configured default value.
    #[default]
    Unspecified,
    /// This literal value.
    Value(Value),
    /// The result of calling `producer(args)`. Invoked on every miss, never memoized.
    Computed { producer: Producer, args: Vec<Value> },
}

impl Fallback {
    pub fn computed<F>(producer: F, args: Vec<Value>) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Fallback::Computed {
            producer: Arc::new(producer),
            args,
        }
    }
}

impl From<Value> for Fallback {
    fn from(value: Value) -> Self {
        Fallback::Value(value)
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Unspecified => f.write_str("Unspecified"),
            Fallback::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Fallback::Computed { args, .. } => f
                .debug_struct("Computed")
                .field("args", args)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from("a"), Value::Str("a".to_string()));
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".to_string()));
    }

    #[test]
    fn test_from_iter_keeps_order() {
        let value: Value = [("b", 1), ("a", 2), ("c", 3)].into_iter().collect();
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(value.get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_only_map_is_traversable() {
        assert!(Value::Map(Mapping::new()).is_map());
        assert!(!Value::from("x").is_map());
        assert!(!Value::Deferred(Deferred::new(|_| Ok(Value::Null), vec![], false)).is_map());
        assert_eq!(Value::from("x").get("x"), None);
    }

    #[test]
    fn test_deferred_force_passes_args() -> Result<()> {
        let deferred = Deferred::new(
            |args| Ok(Value::from(format!("VARCHAR({})", args[0].as_i64().unwrap_or(0)))),
            vec![Value::from(50)],
            false,
        );
        assert_eq!(deferred.force()?, Value::from("VARCHAR(50)"));
        assert_eq!(deferred.args(), &[Value::Int(50)]);
        assert!(!deferred.is_always());
        Ok(())
    }

    #[test]
    fn test_deferred_force_calls_each_time() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let deferred = Deferred::new(
            move |_| Ok(Value::from(counter.fetch_add(1, Ordering::SeqCst) as i64)),
            vec![],
            true,
        );
        assert_eq!(deferred.force()?, Value::Int(0));
        assert_eq!(deferred.force()?, Value::Int(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_deferred_equality_is_identity() {
        let a = Deferred::new(|_| Ok(Value::Null), vec![], false);
        let b = Deferred::new(|_| Ok(Value::Null), vec![], false);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        let value: Value = [("host", Value::from("127.0.0.1")), ("port", Value::from(5432))]
            .into_iter()
            .collect();
        assert_eq!(value.to_string(), r#"{"host": "127.0.0.1", "port": 5432}"#);
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_fallback_from_value() {
        let fallback = Fallback::from(Value::from("UTF-8"));
        assert!(matches!(fallback, Fallback::Value(Value::Str(s)) if s == "UTF-8"));
        assert!(matches!(Fallback::default(), Fallback::Unspecified));
    }
}
