//! Scrum backlog: `taskboard backlog`.

use anyhow::{Result, bail};
use chrono::Utc;
use console::style;

use taskboard::backlog::Backlog;
use taskboard::board::MoveOutcome;
use taskboard::config::TaskboardConfig;

use super::super::BacklogCommands;
use super::Session;
use super::board::item_line;

pub async fn cmd_backlog(
    config: &TaskboardConfig,
    command: Option<BacklogCommands>,
    json: bool,
) -> Result<()> {
    let session = Session::connect(config)?;
    let mutator = session.load_board(config).await?;

    let (item_id, sprint_id) = match command {
        None => {
            let backlog = mutator.read(|state| Backlog::build(state.items(), state.sprints()));
            if json {
                println!("{}", serde_json::to_string_pretty(&backlog)?);
            } else {
                print_backlog(&backlog);
            }
            return Ok(());
        }
        Some(BacklogCommands::Plan { item, sprint }) => (item, Some(sprint)),
        Some(BacklogCommands::Unplan { item }) => (item, None),
    };

    let pending = mutator.assign_sprint(item_id, sprint_id)?;
    match pending.outcome().await {
        MoveOutcome::Unchanged => println!("#{} is already there.", item_id),
        MoveOutcome::Persisted => match sprint_id {
            Some(id) => println!("Planned #{} into sprint {}", item_id, id),
            None => println!("Returned #{} to the backlog", item_id),
        },
        MoveOutcome::RolledBack { .. } => {
            bail!("Backend rejected the sprint change for #{}", item_id)
        }
        MoveOutcome::RollbackFailed { error } => bail!(
            "Backend rejected the sprint change for #{} and the board could not be reloaded: {}",
            item_id,
            error
        ),
    }
    Ok(())
}

fn print_backlog(backlog: &Backlog) {
    let today = Utc::now().date_naive();
    println!();
    for plan in backlog.plans() {
        let mut header = format!(
            "{} {} to {}",
            style(&plan.sprint.name).bold(),
            plan.sprint.start,
            plan.sprint.finish
        );
        if plan.sprint.closed {
            header.push_str(&format!(" {}", style("closed").dim()));
        } else if plan.sprint.contains(today) {
            header.push_str(&format!(" {}", style("current").green()));
        }
        println!("{}", header);
        println!(
            "  {}",
            style(format!(
                "{} / {} points done ({:.0}%)",
                plan.closed_points,
                plan.points,
                plan.progress() * 100.0
            ))
            .dim()
        );
        for item in &plan.items {
            println!("    {}", item_line(item));
        }
        println!();
    }

    println!(
        "{} {}",
        style("Backlog").bold().cyan(),
        style(format!("({} points)", backlog.backlog_points())).dim()
    );
    for item in backlog.backlog_items() {
        println!("    {}", item_line(item));
    }
    println!();
}
