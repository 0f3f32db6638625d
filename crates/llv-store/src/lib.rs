mod error;
mod session;

pub use error::{Result, StoreError};
pub use session::{
    DEFAULT_SESSION, LoadStats, SessionStore, default_data_dir, persistence_enabled,
};
