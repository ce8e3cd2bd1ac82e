//! Command implementations.

pub mod config;
pub mod extract;
pub mod publish;
pub mod schemas;

pub use self::config::execute_config;
pub use self::extract::execute_extract;
pub use self::publish::execute_publish;
pub use self::schemas::execute_schemas;
