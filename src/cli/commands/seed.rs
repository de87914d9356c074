//! Seed command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if store.seed_if_empty(&config.security).await? {
        println!("Demo data loaded into {}", config.general.database_path);
    } else {
        println!("Database already has wizards, nothing to seed.");
    }
    Ok(())
}
