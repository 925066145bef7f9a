//! Asset catalog command handlers

use crate::config::Config;
use crate::db::{NewAsset, Store};

pub async fn cmd_add_asset(
    config: &Config,
    name: &str,
    category: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Asset name cannot be empty");
    }

    let store = Store::new(&config.general.database_url).await?;
    let asset = store
        .add_asset(&NewAsset {
            name: name.to_string(),
            category,
            description,
        })
        .await?;

    println!("✓ Added '{}' (ID: {})", asset.name, asset.id);
    Ok(())
}

pub async fn cmd_list_assets(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;
    let assets = store.list_assets().await?;

    if assets.is_empty() {
        println!("No assets in the catalog.");
        println!();
        println!("Add one with: lablend add-asset \"name\" --category \"category\"");
        return Ok(());
    }

    let holders = store.list_users().await?;

    println!("Assets ({} total)", assets.len());
    println!("{:-<70}", "");

    for asset in assets {
        let holder = asset.assigned_to.map(|id| {
            holders
                .iter()
                .find(|u| u.id == id)
                .map_or_else(|| format!("user #{id}"), |u| u.username.clone())
        });

        let (indicator, status) = match holder {
            None => ("🟢", "available".to_string()),
            Some(name) => ("🔒", format!("borrowed by {name}")),
        };

        println!("{} {} [{}]", indicator, asset.name, status);
        println!(
            "  ID: {} | Category: {}",
            asset.id,
            asset.category.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
