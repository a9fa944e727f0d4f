//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled            |
//! |------------|-----------------------------|
//! | `board`    | `Board`, `Move`, `Lanes`    |
//! | `backlog`  | `Backlog`                   |
//! | `team`     | `Team`                      |
//! | `activity` | `Activity`                  |
//! | `stub`     | `Stub`                      |
//! | `config`   | `Config`                    |

pub mod activity;
pub mod backlog;
pub mod board;
pub mod config;
pub mod stub;
pub mod team;

pub use activity::cmd_activity;
pub use backlog::cmd_backlog;
pub use board::{cmd_board, cmd_lanes, cmd_move};
pub use config::cmd_config;
pub use stub::cmd_stub;
pub use team::cmd_team;

use std::sync::Arc;

use anyhow::{Context, Result};
use taskboard::api::RestClient;
use taskboard::board::OptimisticMutator;
use taskboard::config::{ServerSettings, TaskboardConfig};
use taskboard::events::EventBus;

/// Backend connection shared by the commands that talk to the server.
pub struct Session {
    pub settings: ServerSettings,
    pub api: Arc<RestClient>,
}

impl Session {
    pub fn connect(config: &TaskboardConfig) -> Result<Self> {
        let settings = config.server()?;
        let api = RestClient::new(&settings).context("Failed to create backend client")?;
        tracing::debug!(base_url = %settings.base_url, project_id = settings.project_id, "session");
        Ok(Self {
            settings,
            api: Arc::new(api),
        })
    }

    pub fn project_id(&self) -> i64 {
        self.settings.project_id
    }

    /// A mutator over a freshly loaded board.
    pub async fn load_board(&self, config: &TaskboardConfig) -> Result<OptimisticMutator> {
        let mutator = OptimisticMutator::new(
            self.project_id(),
            self.api.clone(),
            EventBus::new(),
            config.mutator_settings(),
        );
        mutator
            .load()
            .await
            .with_context(|| format!("Failed to load board from {}", self.settings.base_url))?;
        Ok(mutator)
    }
}
