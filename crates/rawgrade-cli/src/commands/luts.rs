//! LUT management commands

use anyhow::{Context, Result};
use tracing::debug;

use rawgrade_pipeline::Config;

use crate::LutsCommand;

pub fn run(cmd: LutsCommand, config: &Config) -> Result<()> {
    let registry = config.open_registry();
    debug!(storage = %registry.storage_dir().display(), "registry opened");

    match cmd {
        LutsCommand::List => {
            for option in registry.list_options() {
                let origin = if option.is_built_in { "built-in" } else { "imported" };
                println!("{:<48} {:<24} {}", option.id, option.display_name, origin);
            }
        }
        LutsCommand::Import { file } => {
            let id = registry
                .import(&file)
                .with_context(|| format!("Failed to import LUT: {}", file.display()))?;
            println!("{}", id);
        }
    }
    Ok(())
}
