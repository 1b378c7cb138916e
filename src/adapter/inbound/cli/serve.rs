//! `buylist serve`: run the HTTP API.

use std::path::Path;

use tracing::info;

use super::command::ServeArgs;
use super::load_config;
use crate::error::Result;
use crate::infrastructure::bootstrap;

pub async fn execute(config_path: &Path, args: ServeArgs) -> Result<()> {
    let mut config = load_config(config_path, false)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;
    config.init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "buylist starting");

    bootstrap::serve(config).await?;

    info!("buylist stopped");
    Ok(())
}
