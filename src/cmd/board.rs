//! Board view and item moves: `taskboard board`, `move`, `lanes`.

use anyhow::{Result, bail};
use console::style;

use taskboard::board::{BoardView, Destination, MoveOutcome};
use taskboard::common::{Column, WorkItem};
use taskboard::config::TaskboardConfig;

use super::super::LanesCommands;
use super::Session;

pub async fn cmd_board(config: &TaskboardConfig, json: bool) -> Result<()> {
    let session = Session::connect(config)?;
    let mutator = session.load_board(config).await?;
    let view = mutator.view();

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }
    print_board(&view);
    Ok(())
}

fn print_board(view: &BoardView) {
    println!();
    println!(
        "{}",
        style(format!("Project {} board", view.project_id)).bold().cyan()
    );
    for column in &view.columns {
        println!();
        println!(
            "{} {}",
            style(column.column.label()).bold(),
            style(format!("({})", column.item_count())).dim()
        );
        for lane in &column.lanes {
            if lane.collapsed {
                println!(
                    "  {} {}",
                    style(&lane.name).yellow(),
                    style(format!("[collapsed, {} items]", lane.items.len())).dim()
                );
                continue;
            }
            if lane.items.is_empty() {
                continue;
            }
            println!("  {}", style(&lane.name).yellow());
            for item in &lane.items {
                println!("    {}", item_line(item));
            }
        }
    }
    println!();
}

pub(crate) fn item_line(item: &WorkItem) -> String {
    let mut line = format!("{} {}", style(format!("#{}", item.id)).dim(), item.subject);
    if item.blocked {
        line.push_str(&format!(" {}", style("blocked").red().bold()));
    }
    if !item.tags.is_empty() {
        line.push_str(&format!(" {}", style(format!("[{}]", item.tags.join(", "))).cyan()));
    }
    if !item.points.is_empty() {
        line.push_str(&format!(" {}", style(format!("{}pt", item.points.total())).dim()));
    }
    line
}

pub async fn cmd_move(
    config: &TaskboardConfig,
    item_id: i64,
    column: Column,
    lane: Option<i64>,
    index: Option<usize>,
) -> Result<()> {
    let session = Session::connect(config)?;
    let mutator = session.load_board(config).await?;

    // Indices past the end clamp to the end of the group.
    let destination = Destination::new(column, lane, index.unwrap_or(usize::MAX));
    let pending = mutator.move_to(item_id, destination)?;

    match pending.outcome().await {
        MoveOutcome::Unchanged => {
            println!("#{} is already there.", item_id);
        }
        MoveOutcome::Persisted => {
            let position = mutator.read(|state| state.position_of(item_id));
            match position {
                Some(pos) => println!(
                    "{} #{} to {} at position {}",
                    style("Moved").green().bold(),
                    item_id,
                    pos.slot,
                    pos.index
                ),
                None => println!("{} #{}", style("Moved").green().bold(), item_id),
            }
        }
        MoveOutcome::RolledBack { reloaded } => {
            let how = if reloaded {
                "board reloaded from server"
            } else {
                "local change undone"
            };
            bail!("Backend rejected the move of #{}; {}", item_id, how);
        }
        MoveOutcome::RollbackFailed { error } => {
            bail!(
                "Backend rejected the move of #{} and the board could not be reloaded: {}",
                item_id,
                error
            );
        }
    }
    Ok(())
}

pub async fn cmd_lanes(config: &TaskboardConfig, command: Option<LanesCommands>) -> Result<()> {
    let session = Session::connect(config)?;
    let mutator = session.load_board(config).await?;

    match command {
        None | Some(LanesCommands::List) => {
            let lanes = mutator.read(|state| state.lanes().to_vec());
            if lanes.is_empty() {
                println!("No lanes. Items are shown as Unclassified.");
                return Ok(());
            }
            for lane in lanes {
                let count = mutator.read(|state| {
                    state
                        .items()
                        .iter()
                        .filter(|i| i.lane_id == Some(lane.id))
                        .count()
                });
                println!(
                    "{:>4}  {}  {}",
                    lane.id,
                    lane.name,
                    style(format!("{} items", count)).dim()
                );
            }
        }
        Some(LanesCommands::Add { name }) => {
            let lane = mutator.create_lane(&name).await?;
            println!("Created lane {} ({})", lane.name, lane.id);
        }
    }
    Ok(())
}
