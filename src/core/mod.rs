pub mod error;
pub mod executor;
pub mod launch;
pub mod port;
pub mod probe;
pub mod request;
pub mod session;

use std::path::PathBuf;

const VERSION_MESSAGE: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n",
    env!("CARGO_PKG_DESCRIPTION"),
);

pub fn version() -> &'static str {
    VERSION_MESSAGE
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))
        .map(|p| p.join("workbench"))
}
