use anyhow::{Context, Result};

use crate::config::Config;

pub fn handle_config_command() -> Result<()> {
    let path = Config::config_path()?;
    let mut config = Config::load()?;

    if config.greeting.api_key.is_some() {
        config.greeting.api_key = Some("********".to_string());
    }

    println!("Config file: {}\n", path.display());
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to serialize config")?
    );
    Ok(())
}
