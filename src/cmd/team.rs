//! Team listing and role changes: `taskboard team`.

use anyhow::Result;
use console::style;

use taskboard::config::TaskboardConfig;
use taskboard::events::EventBus;
use taskboard::team::TeamDirectory;

use super::super::TeamCommands;
use super::Session;

pub async fn cmd_team(config: &TaskboardConfig, command: Option<TeamCommands>) -> Result<()> {
    let session = Session::connect(config)?;
    let mut team = TeamDirectory::fetch(session.api.as_ref(), session.project_id()).await?;

    match command {
        None => {
            for (role_id, members) in team.by_role() {
                let role = team.role(role_id);
                let name = role.map(|r| r.name.as_str()).unwrap_or("Unknown role");
                let marker = if role.is_some_and(|r| r.computable) {
                    style(" (estimates)").dim().to_string()
                } else {
                    String::new()
                };
                println!("{}{}", style(name).bold(), marker);
                if members.is_empty() {
                    println!("  {}", style("no members").dim());
                }
                for member in members {
                    let admin = if member.is_admin {
                        style(" admin").yellow().to_string()
                    } else {
                        String::new()
                    };
                    println!("  {:>4}  {}{}", member.id, member.full_name, admin);
                }
            }
        }
        Some(TeamCommands::SetRole { member, role }) => {
            let bus = EventBus::new();
            let updated = team
                .change_role(session.api.as_ref(), &bus, member, role)
                .await?;
            println!("{} is now role {}", updated.full_name, updated.role_id);
        }
    }
    Ok(())
}
