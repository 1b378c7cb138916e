//! Infrastructure configuration modules.

pub mod logging;
pub mod server;
pub mod settings;

pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use settings::Config;
