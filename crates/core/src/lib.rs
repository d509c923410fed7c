pub mod config;
pub mod dsn;
pub mod error;

pub use config::{Config, ImportConfig};
pub use dsn::Dsn;
pub use error::CoreError;
