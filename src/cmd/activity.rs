//! Work item activity log: `taskboard activity`.

use anyhow::Result;
use console::style;

use taskboard::api::BoardApi;
use taskboard::config::TaskboardConfig;

use super::Session;

pub async fn cmd_activity(
    config: &TaskboardConfig,
    item_id: i64,
    delete_comment: Option<i64>,
) -> Result<()> {
    let session = Session::connect(config)?;

    if let Some(comment_id) = delete_comment {
        session.api.delete_comment(item_id, comment_id).await?;
        println!("Deleted comment {} from #{}", comment_id, item_id);
        return Ok(());
    }

    let entries = session.api.list_activity(item_id).await?;
    if entries.is_empty() {
        println!("No activity for #{}", item_id);
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:<14} {}",
            style(entry.at.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(entry.action.as_str()).cyan(),
            entry.message
        );
    }
    Ok(())
}
