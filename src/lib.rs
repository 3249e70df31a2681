//! A nested key-value configuration store for Rust, addressed by delimited path strings.
//!
//! ### Overview
//!
//! `conf-kit` keeps configuration in an ordered tree of mappings and lets you reach any node
//! with a key such as `db.options.charset`. Values may be stored lazily: the producer runs
//! when a lookup first walks through the value, or on every lookup if you ask for it.
//!
//! **Key ideas**:
//! - **Paths**: `set("a.b.c", v)` creates the intermediate mappings, `get("a.b")` returns
//!   the subtree.
//! - **Defaults**: a missing key yields the store default, a literal, or the result of a closure.
//! - **Lazy values**: expensive values are computed on demand and cached in place; `always`
//!   values are recomputed on every access.
//! - **Configurable separator**: any non-empty string, e.g. `\` or `::`.
//!
//! ```no_run
//! use conf_kit::{ConfigStore, Value};
//!
//! let mut conf = ConfigStore::new();
//! conf.lazy_set(
//!     "some.heavy.setting",
//!     |args| Ok(Value::from(format!("loaded {}", args[0]))),
//!     vec!["heavy.dat".into()],
//!     false,
//! )
//! .unwrap();
//! assert_eq!(conf.get("some.heavy.setting").unwrap(), Value::from("loaded \"heavy.dat\""));
//! ```

mod core;
mod repo;

pub use crate::core::{Result, StoreError};
pub use crate::repo::{ConfigStore, Deferred, Fallback, Mapping, Producer, StoreOptions, Value};
