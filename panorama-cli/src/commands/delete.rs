//! Delete command implementation.

use anyhow::Result;
use colored::Colorize;
use panorama_core::PhotoId;
use tracing::info;

use crate::client::AdminClient;

/// Execute the delete command.
pub async fn execute(client: &AdminClient, id: PhotoId, dry_run: bool, quiet: bool) -> Result<()> {
    if dry_run {
        println!("{}", "[DRY RUN] Nothing was deleted".yellow().bold());
        println!("   {} {}", "Endpoint:".dimmed(), client.endpoint());
        println!("   {} {}", "Photo:".dimmed(), id);
        return Ok(());
    }

    let reply = client.delete(id).await?;
    info!(photo_id = %id, removed = reply.removed.len(), was_listed = reply.was_listed, "Photo deleted");

    if !quiet {
        println!("{}", reply.message.green().bold());
        if reply.removed.is_empty() {
            println!("   {} {}", "Objects:".dimmed(), "none stored".dimmed());
        }
        for key in &reply.removed {
            println!("   {} {}", "Removed:".dimmed(), key);
        }
        if !reply.was_listed {
            println!("   {}", "ID was not in the manifest".yellow());
        }
    }
    Ok(())
}
