//! Upload command implementation.

use std::path::PathBuf;

use anyhow::{bail, Result};
use colored::Colorize;
use panorama_core::{PhotoId, Variant};
use tracing::{debug, info};

use crate::client::{field_name, AdminClient, UploadPart};
use crate::utils::{format_size, read_image};

/// Files to send for one photo.
pub struct UploadSource {
    pub file: PathBuf,
    pub mobile: Option<PathBuf>,
    pub desktop: Option<PathBuf>,
    pub resize: bool,
}

/// Read (and optionally render) every part of the upload.
pub fn prepare(source: &UploadSource) -> Result<Vec<UploadPart>> {
    if source.resize {
        return render(source);
    }

    let mut parts = vec![read_image(&source.file, Variant::Primary)?];
    if let Some(path) = &source.mobile {
        parts.push(read_image(path, Variant::Mobile)?);
    }
    if let Some(path) = &source.desktop {
        parts.push(read_image(path, Variant::Desktop)?);
    }
    Ok(parts)
}

#[cfg(feature = "resize")]
fn render(source: &UploadSource) -> Result<Vec<UploadPart>> {
    debug!(path = %source.file.display(), "Rendering variants");
    crate::utils::render_variants(&source.file)
}

#[cfg(not(feature = "resize"))]
fn render(_source: &UploadSource) -> Result<Vec<UploadPart>> {
    bail!("--resize requires panorama-cli built with the `resize` feature")
}

/// Execute the upload command.
pub async fn execute(
    client: &AdminClient,
    id: PhotoId,
    source: UploadSource,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let parts = prepare(&source)?;
    if parts.iter().all(|p| p.data.is_empty()) {
        bail!("{} is empty", source.file.display());
    }

    if dry_run {
        println!("{}", "[DRY RUN] Nothing was uploaded".yellow().bold());
        println!("   {} {}", "Endpoint:".dimmed(), client.endpoint());
        println!("   {} {}", "Photo:".dimmed(), id);
        for part in &parts {
            println!(
                "   {} {} ({}, {})",
                format!("{}:", field_name(part.variant)).dimmed(),
                id.key(part.variant),
                part.content_type,
                format_size(part.data.len())
            );
        }
        return Ok(());
    }

    let total: usize = parts.iter().map(|p| p.data.len()).sum();
    let reply = client.upload(id, parts).await?;
    info!(photo_id = %id, bytes = total, added = reply.added, "Photo uploaded");

    if !quiet {
        println!("{}", reply.message.green().bold());
        println!("   {} {}", "URL:".dimmed(), reply.urls.primary);
        if let Some(url) = &reply.urls.mobile {
            println!("   {} {}", "Mobile:".dimmed(), url);
        }
        if let Some(url) = &reply.urls.desktop {
            println!("   {} {}", "Desktop:".dimmed(), url);
        }
        if !reply.added {
            println!("   {}", "Replaced an existing photo".yellow());
        }
    }
    Ok(())
}
