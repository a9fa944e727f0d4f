//! Configuration view and validation commands: `taskboard config`.

use anyhow::Result;

use taskboard::config::{TaskboardConfig, TaskboardToml};

use super::super::ConfigCommands;

pub fn cmd_config(config: &TaskboardConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Taskboard Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No taskboard.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[server]");
            println!("  base_url = \"{}\"", toml.server.base_url);
            println!("  project_id = {}", toml.server.project_id);
            if toml.server.token.is_some() {
                println!("  token = \"********\"");
            }
            println!("  request_timeout_ms = {}", toml.server.request_timeout_ms);
            println!(
                "  comment_delete_timeout_ms = {}",
                toml.server.comment_delete_timeout_ms
            );
            println!();

            println!("[board]");
            println!("  rollback = \"{}\"", toml.board.rollback);
            println!("  orphans = \"{}\"", toml.board.orphans);
            println!("  retry_attempts = {}", toml.board.retry_attempts);
            println!("  retry_backoff_ms = {}", toml.board.retry_backoff_ms);
            println!();

            println!("[logging]");
            println!("  level = \"{}\"", toml.logging.level);
            println!("  json = {}", toml.logging.json);
            if let Some(dir) = &toml.logging.dir {
                println!("  dir = \"{}\"", dir.display());
            }
            println!();

            // Show effective values (including env/CLI overrides)
            println!("Effective values (with env/CLI overrides):");
            let server = config.server()?;
            println!("  base_url = \"{}\"", server.base_url);
            println!("  project_id = {}", server.project_id);
            println!("  token = {}", if server.token.is_some() { "set" } else { "unset" });
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No taskboard.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("taskboard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config.config_dir.exists() {
                std::fs::create_dir_all(&config.config_dir)?;
            }

            TaskboardToml::default().save(&config_path)?;

            println!("Created taskboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] base_url, project_id, token, timeouts");
            println!("  - [board] rollback, orphans, retry_attempts");
            println!("  - [logging] level, json, dir");
            println!();
        }
    }

    Ok(())
}
