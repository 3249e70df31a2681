mod config_store;
mod options;
mod value;

pub use config_store::ConfigStore;
pub use options::StoreOptions;
pub use value::{Deferred, Fallback, Mapping, Producer, Value};
