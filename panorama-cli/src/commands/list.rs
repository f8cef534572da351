//! List command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use panorama_core::PhotoId;

use crate::client::AdminClient;

/// Execute the list command.
pub async fn execute(
    client: &AdminClient,
    scan: bool,
    only: Option<PhotoId>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let reply = client.list(scan, only).await?;

    if json {
        let out = serde_json::to_string(&reply.photos).context("Failed to serialize listing")?;
        println!("{}", out);
        return Ok(());
    }

    if quiet {
        for id in &reply.photos {
            println!("{}", id);
        }
        return Ok(());
    }

    let origin = reply
        .origin
        .as_deref()
        .map(|o| format!(" ({})", o))
        .unwrap_or_default();
    println!(
        "{} {}{}",
        format!("{} photo(s)", reply.photos.len()).bold(),
        format!("from {}", reply.source).dimmed(),
        origin.dimmed()
    );

    match &reply.entries {
        Some(entries) => {
            for entry in entries {
                println!("   {:>8}  {}", entry.id, entry.file.dimmed());
            }
        }
        None => {
            for id in &reply.photos {
                println!("   {:>8}", id);
            }
        }
    }
    Ok(())
}
