pub mod defaults;
pub mod settings;

use anyhow::Result;
use std::path::PathBuf;

pub use defaults::DefaultConfig;
pub use settings::{ApiConfig, ModelConfig, OutputConfig, Settings};

/// The per-user data directory, `~/.macrocoach`.
pub fn app_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

    Ok(home_dir.join(".macrocoach"))
}
