//! Init command handler

use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Wrote default config.toml");
        println!("Set AI_API_KEY (and STORAGE_SAS_TOKEN for the azure backend) before serving.");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }
    Ok(())
}
