//! CLI module - Command-line interface for lablend
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

pub use commands::{cmd_add_asset, cmd_create_user, cmd_list_assets, cmd_promote};

/// lablend - Lab asset lending ledger
/// Tracks who has borrowed which piece of equipment
#[derive(Parser)]
#[command(name = "lablend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Write a default config.toml to the working directory
    Init,

    /// Create a user account
    #[command(alias = "useradd")]
    CreateUser {
        username: String,
        password: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },

    /// Grant the admin role to an existing user
    Promote { username: String },

    /// Add an asset to the catalog
    #[command(alias = "add")]
    AddAsset {
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// List all assets and who holds them
    #[command(alias = "ls")]
    ListAssets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["lablend"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_user_with_admin_flag() {
        let cli = Cli::try_parse_from(["lablend", "create-user", "root", "hunter22", "--admin"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::CreateUser { ref username, admin: true, .. }) if username == "root"
        ));
    }

    #[test]
    fn add_asset_options() {
        let cli = Cli::try_parse_from([
            "lablend",
            "add-asset",
            "Oscilloscope",
            "--category",
            "Electronics",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::AddAsset {
                name,
                category,
                description,
            }) => {
                assert_eq!(name, "Oscilloscope");
                assert_eq!(category.as_deref(), Some("Electronics"));
                assert!(description.is_none());
            }
            _ => panic!("expected add-asset"),
        }
    }
}
