//! User administration command handlers

use crate::config::Config;
use crate::db::Store;
use crate::domain::Role;
use crate::services::auth_service::{validate_password, validate_username};

pub async fn cmd_create_user(
    config: &Config,
    username: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<()> {
    validate_username(username)?;
    validate_password(password)?;

    let store = Store::new(&config.general.database_url).await?;
    let role = if admin { Role::Admin } else { Role::User };

    match store
        .create_user(username, password, role, &config.security)
        .await?
    {
        Some(user) => println!("✓ Created {} '{}' (ID: {})", user.role, user.username, user.id),
        None => println!("User '{}' already exists.", username),
    }

    Ok(())
}

pub async fn cmd_promote(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;

    if store.set_user_role(username, Role::Admin).await? {
        println!("✓ '{}' is now an admin", username);
    } else {
        println!("User '{}' not found.", username);
    }

    Ok(())
}
