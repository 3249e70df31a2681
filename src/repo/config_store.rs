//! This module provides a configuration store that keeps nested values in memory
//! and addresses them by delimited path strings.

use std::collections::HashMap;

use anyhow::Context;
use tracing::{debug, trace};

use crate::core::{Result, StoreError, utils};
use crate::repo::{Deferred, Fallback, Mapping, StoreOptions, Value};

/// A nested key-value store addressed by delimited keys such as `db.username`.
///
/// `ConfigStore` walks a key segment by segment through nested [`Value::Map`] scopes.
/// Writes create missing intermediate mappings, reads never mutate the shape of the tree,
/// and deferred values met on the way are forced transparently.
///
/// ### Internal state
///
/// * `items` — The root mapping. Every value of the store lives below it.
///   - Insertion order is preserved at every level.
///   - Keys are single path segments, except for literal top-level keys that were
///     written with a different separator (see `exists()`).
///
/// * `caches` — Memoized results of `get()`, keyed by the full key string as passed in.
///   - Filled only by a successful `get()` whose traversal did not pass through an
///     `always` deferred value.
///   - An entry is dropped by `set()`, `lazy_set()` and `remove()` on the exact same key.
///     Entries of ancestor or descendant keys are left alone: after `set("a", ..)` a
///     memoized `get("a.b")` still returns the old value. Call `clear_cache()` when that matters.
///
/// * `options` — Path separator and default value, see [`StoreOptions`].
///
/// ### Deferred values
///
/// A [`Deferred`] stored in the tree is forced whenever a traversal reaches its slot,
/// whatever the operation is (`get`, `exists`, `set`, `lazy_set`, `remove`):
/// - `always == false`: the slot is overwritten by the produced value, so the producer
///   runs at most once for the lifetime of the slot.
/// - `always == true`: the tree is left untouched. The rest of the traversal runs against a
///   throwaway one-entry mapping holding the produced value, and the next traversal calls
///   the producer again. Writing below such a value only changes the throwaway copy, while
///   `set()` or `remove()` on the key of the value itself replaces or deletes it.
///
/// `lazy_set()` never forces the value it overwrites.
///
/// ### Write policy
///
/// Paths win over leaves: `set("a.b", ..)` when `a` holds a scalar replaces that scalar
/// with a new mapping.
///
/// ### Thread Safety
///
/// The store is `Send + Sync` but has no internal locking; every operation takes `&mut self`
/// because reads may force deferred values. Wrap it in `Mutex<ConfigStore>` for shared use.
/// A producer runs while the operation that forced it holds the store, so a slow producer
/// blocks that operation.
///
/// ### Example
///
/// ```no_run
/// use conf_kit::{ConfigStore, Value};
///
/// let mut conf = ConfigStore::new();
/// conf.set("db.username", "admin").unwrap();
///
/// assert_eq!(conf.get("db.username").unwrap(), Value::from("admin"));
/// assert_eq!(conf.get_or("db.charset", "UTF-8").unwrap(), Value::from("UTF-8"));
/// ```
#[derive(Debug, Default)]
pub struct ConfigStore {
    items: Mapping,
    caches: HashMap<String, Value>,
    options: StoreOptions,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Mode {
    Read,
    Write,
    /// Like `Write`, but the value at the last segment is overwritten without being forced.
    Replace,
}

/// Mapping currently addressed by a traversal.
enum Scope<'a> {
    /// A mapping inside the store's tree.
    Live(&'a mut Mapping),
    /// A throwaway mapping produced by an `always` deferred value.
    Detached(Mapping),
}

impl<'a> Scope<'a> {
    fn map(&self) -> &Mapping {
        match self {
            Scope::Live(map) => map,
            Scope::Detached(map) => map,
        }
    }

    fn map_mut(&mut self) -> &mut Mapping {
        match self {
            Scope::Live(map) => map,
            Scope::Detached(map) => map,
        }
    }

    /// Makes sure `segment` is present.
    /// Returns `false` when a read meets a missing segment.
    fn enter(&mut self, segment: &str, mode: Mode) -> bool {
        let map = self.map_mut();
        if !map.contains_key(segment) {
            if mode == Mode::Read {
                return false;
            }
            trace!(segment, "creating path segment");
            map.insert(segment.to_string(), Value::Null);
        }
        true
    }

    /// Forces a deferred value stored at `segment`.
    ///
    /// A compute-once value replaces the slot and `None` is returned. An `always` value
    /// leaves the slot untouched and is returned to the caller.
    fn force(&mut self, segment: &str) -> Result<Option<Value>> {
        let map = self.map_mut();
        let deferred = match map.get(segment) {
            Some(Value::Deferred(deferred)) => deferred.clone(),
            _ => return Ok(None),
        };

        debug!(segment, always = deferred.is_always(), "forcing lazy value");
        let value = deferred
            .force()
            .with_context(|| format!("failed to compute lazy value at {segment:?}"))?;

        if deferred.is_always() {
            return Ok(Some(value));
        }
        map.insert(segment.to_string(), value);
        Ok(None)
    }

    /// Moves into the mapping stored at `segment`.
    /// A write replaces a non-mapping value with an empty mapping, a read gives up.
    fn descend(self, segment: &str, mode: Mode) -> Option<Scope<'a>> {
        match self {
            Scope::Live(map) => {
                let child = as_scope(map.get_mut(segment)?, segment, mode)?;
                Some(Scope::Live(child))
            }
            Scope::Detached(mut map) => {
                let mut value = map.swap_remove(segment)?;
                as_scope(&mut value, segment, mode)?;
                match value {
                    Value::Map(child) => Some(Scope::Detached(child)),
                    _ => None,
                }
            }
        }
    }
}

fn as_scope<'v>(value: &'v mut Value, segment: &str, mode: Mode) -> Option<&'v mut Mapping> {
    if !value.is_map() {
        if mode == Mode::Read {
            return None;
        }
        if !value.is_null() {
            debug!(segment, replaced = %value, "replacing leaf with a mapping");
        }
        *value = Value::Map(Mapping::new());
    }
    match value {
        Value::Map(map) => Some(map),
        _ => None,
    }
}

/// Terminal address of a resolved key: the owning mapping and the last segment.
/// The segment is guaranteed to be present in the mapping.
///
/// `forced` holds the result of an `always` value stored at the segment itself; the
/// mapping keeps the deferred value so that writes and removals still reach the tree.
struct Slot<'a> {
    scope: Scope<'a>,
    segment: String,
    forced: Option<Value>,
}

impl Slot<'_> {
    fn is_detached(&self) -> bool {
        self.forced.is_some() || matches!(self.scope, Scope::Detached(_))
    }

    fn value(&self) -> Value {
        match &self.forced {
            Some(value) => value.clone(),
            None => self.scope.map().get(&self.segment).cloned().unwrap_or_default(),
        }
    }

    fn store(mut self, value: Value) {
        self.scope.map_mut().insert(self.segment, value);
    }

    fn remove(mut self) -> Option<Value> {
        self.scope.map_mut().shift_remove(&self.segment)
    }
}

fn invalid_key(key: &str) -> anyhow::Error {
    debug!(key, "rejecting key without path segments");
    StoreError::InvalidKey {
        key: key.to_string(),
    }
    .into()
}

impl ConfigStore {
    /// Creates an empty store with the default options (separator `.`, default value `Null`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `items` with the default options.
    pub fn with_items(items: Mapping) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Creates a store holding `items` with the given options.
    /// An empty path separator is rejected with [`StoreError::InvalidSeparator`].
    pub fn with_options(items: Mapping, options: StoreOptions) -> Result<Self> {
        if options.path_separator.is_empty() {
            return Err(StoreError::InvalidSeparator.into());
        }
        Ok(Self {
            items,
            caches: HashMap::new(),
            options,
        })
    }

    pub fn path_separator(&self) -> &str {
        &self.options.path_separator
    }

    pub fn default_value(&self) -> &Value {
        &self.options.default_value
    }

    /// Walks `key` from the root.
    /// `Ok(None)` is returned for a key without segments and for a read that leaves the tree.
    fn resolve(&mut self, key: &str, mode: Mode) -> Result<Option<Slot<'_>>> {
        let segments = utils::split_key(key, &self.options.path_separator);
        let Some((last, parents)) = segments.split_last() else {
            return Ok(None);
        };

        let mut scope = Scope::Live(&mut self.items);
        for segment in parents {
            if !scope.enter(segment, mode) {
                return Ok(None);
            }
            if let Some(value) = scope.force(segment)? {
                scope = Scope::Detached(Mapping::from_iter([(segment.to_string(), value)]));
            }
            scope = match scope.descend(segment, mode) {
                Some(scope) => scope,
                None => return Ok(None),
            };
        }
        if !scope.enter(last, mode) {
            return Ok(None);
        }
        let forced = match mode {
            Mode::Replace => None,
            Mode::Read | Mode::Write => scope.force(last)?,
        };

        Ok(Some(Slot {
            scope,
            segment: last.to_string(),
            forced,
        }))
    }

    /// Checks whether `key` exists.
    ///
    /// True for a literal top-level key (even one containing the separator), for a memoized
    /// key, and for any key whose last segment is present in its parent mapping, whatever
    /// its value.
    /// Deferred values on the path are forced, so a failing producer surfaces here.
    pub fn exists(&mut self, key: &str) -> Result<bool> {
        if self.items.contains_key(key) || self.caches.contains_key(key) {
            return Ok(true);
        }
        Ok(self.resolve(key, Mode::Read)?.is_some())
    }

    /// Returns the value at `key`, or the configured default value.
    pub fn get(&mut self, key: &str) -> Result<Value> {
        self.get_with(key, Fallback::Unspecified)
    }

    /// Returns the value at `key`, or `default`.
    pub fn get_or<V: Into<Value>>(&mut self, key: &str, default: V) -> Result<Value> {
        self.get_with(key, Fallback::Value(default.into()))
    }

    /// Returns the value at `key`, or the result of `producer(args)`.
    /// The producer runs on every miss.
    pub fn get_or_else<F>(&mut self, key: &str, producer: F, args: Vec<Value>) -> Result<Value>
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.get_with(key, Fallback::computed(producer, args))
    }

    /// Returns the value at `key`, falling back as described by `fallback`.
    ///
    /// A memoized result short-circuits the traversal. A resolved value is memoized unless it
    /// came out of an `always` deferred value. Fallback results are never memoized.
    pub fn get_with(&mut self, key: &str, fallback: Fallback) -> Result<Value> {
        if let Some(value) = self.caches.get(key) {
            trace!(key, "cache hit");
            return Ok(value.clone());
        }

        let resolved = self
            .resolve(key, Mode::Read)?
            .map(|slot| (slot.value(), slot.is_detached()));

        match resolved {
            Some((value, detached)) => {
                if !detached {
                    trace!(key, "caching resolved value");
                    self.caches.insert(key.to_string(), value.clone());
                }
                Ok(value)
            }
            None => {
                trace!(key, "key not found, using fallback");
                match fallback {
                    Fallback::Unspecified => Ok(self.options.default_value.clone()),
                    Fallback::Value(value) => Ok(value),
                    Fallback::Computed { producer, args } => producer(args.as_slice()),
                }
            }
        }
    }

    /// Stores `value` at `key`, creating intermediate mappings as needed.
    /// Fails with [`StoreError::InvalidKey`] when `key` has no segments; the store is left
    /// unchanged.
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<()> {
        self.store(key, value.into(), Mode::Write)
    }

    /// Stores a deferred value at `key`, replacing whatever was there without forcing it.
    ///
    /// `producer(args)` runs the first time a traversal reaches the slot, or on every
    /// traversal when `always` is set.
    pub fn lazy_set<F>(
        &mut self,
        key: &str,
        producer: F,
        args: Vec<Value>,
        always: bool,
    ) -> Result<()>
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.store(key, Deferred::new(producer, args, always).into(), Mode::Replace)
    }

    fn store(&mut self, key: &str, value: Value, mode: Mode) -> Result<()> {
        match self.resolve(key, mode)? {
            Some(slot) => slot.store(value),
            None => return Err(invalid_key(key)),
        }
        self.caches.remove(key);
        Ok(())
    }

    /// Removes the value at `key`. A key that does not resolve is a no-op.
    ///
    /// The memoized result for `key` is dropped in both cases.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        if let Some(slot) = self.resolve(key, Mode::Read)? {
            slot.remove();
        }
        self.caches.remove(key);
        Ok(())
    }

    /// Drops every memoized `get()` result.
    pub fn clear_cache(&mut self) {
        self.caches.clear();
    }

    /// Returns the root mapping. Deferred values that were never forced show up as
    /// [`Value::Deferred`].
    pub fn as_map(&self) -> &Mapping {
        &self.items
    }

    pub fn into_map(self) -> Mapping {
        self.items
    }
}
