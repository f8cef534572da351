//! Panorama CLI - admin client for the VR panorama gallery.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod client;
mod commands;
mod exit_codes;
mod utils;

use client::{AdminClient, Credential};
use commands::upload::UploadSource;
use exit_codes::{ExitCode, UsageError};
use utils::parse_id;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments or photo ID)
  65  Data error (not an image or wrong format, request rejected)
  66  Input file not found
  69  Handler unreachable or failing
  77  Credential rejected";

#[derive(Parser)]
#[command(name = "panorama")]
#[command(author, version, about = "Admin client for the VR panorama gallery", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print only essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// When to color output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Connection options shared by commands that talk to the handler.
#[derive(Args)]
struct Connection {
    /// Handler base URL
    #[arg(long, env = "PANORAMA_ENDPOINT", default_value = "http://localhost:8787")]
    endpoint: String,

    /// Admin password (shared-secret mode)
    #[arg(long, env = "PANORAMA_PASSWORD", hide_env_values = true, conflicts_with = "token")]
    password: Option<String>,

    /// Google ID token (token modes)
    #[arg(long, env = "PANORAMA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,
}

impl Connection {
    fn credential(&self) -> Option<Credential> {
        match (&self.password, &self.token) {
            (Some(password), _) => Some(Credential::Password(password.clone())),
            (None, Some(token)) => Some(Credential::Token(token.clone())),
            (None, None) => None,
        }
    }

    fn client(&self) -> Result<AdminClient> {
        AdminClient::new(
            &self.endpoint,
            self.credential(),
            Duration::from_secs(self.timeout),
        )
    }

    fn require_credential(&self) -> Result<()> {
        if self.credential().is_none() {
            return Err(UsageError(
                "No credential: pass --password or --token (or set PANORAMA_PASSWORD / PANORAMA_TOKEN)"
                    .into(),
            )
            .into());
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a photo (and optional previews) under an ID
    Upload {
        /// Photo ID (positive integer)
        #[arg(value_name = "ID")]
        id: String,

        /// Primary VR image (JPEG, or any image with --resize)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Render 1.jpg, mobile.webp and desktop.webp from FILE before upload
        #[arg(long, conflicts_with_all = ["mobile", "desktop"])]
        resize: bool,

        /// Ready-made mobile preview (WebP)
        #[arg(long, value_name = "FILE")]
        mobile: Option<PathBuf>,

        /// Ready-made desktop preview (WebP)
        #[arg(long, value_name = "FILE")]
        desktop: Option<PathBuf>,

        /// Show what would be sent without contacting the handler
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        connection: Connection,
    },

    /// Delete a photo and remove it from the manifest
    Delete {
        /// Photo ID (positive integer)
        #[arg(value_name = "ID")]
        id: String,

        /// Show what would be deleted without contacting the handler
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        connection: Connection,
    },

    /// List published photo IDs
    List {
        /// Scan the store instead of reading the manifest
        #[arg(long)]
        scan: bool,

        /// Only report this ID
        #[arg(long, value_name = "ID")]
        id: Option<String>,

        /// Print the IDs as a JSON array
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        connection: Connection,
    },

    /// Print the public URL of a photo (the QR code target)
    Url {
        /// Photo ID (positive integer)
        #[arg(value_name = "ID")]
        id: String,

        /// Variant file name
        #[arg(long, value_name = "FILE")]
        file: Option<String>,

        /// Public base URL of the bucket
        #[arg(long, env = "PANORAMA_PUBLIC_URL", default_value = "http://localhost:8787")]
        public_url: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "panorama=debug,panorama_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Upload {
            id,
            file,
            resize,
            mobile,
            desktop,
            dry_run,
            connection,
        } => {
            let id = parse_id(&id)?;
            if !dry_run {
                connection.require_credential()?;
            }
            let source = UploadSource {
                file,
                mobile,
                desktop,
                resize,
            };
            commands::upload::execute(&connection.client()?, id, source, dry_run, quiet).await
        }
        Commands::Delete {
            id,
            dry_run,
            connection,
        } => {
            let id = parse_id(&id)?;
            if !dry_run {
                connection.require_credential()?;
            }
            commands::delete::execute(&connection.client()?, id, dry_run, quiet).await
        }
        Commands::List {
            scan,
            id,
            json,
            connection,
        } => {
            let only = id.as_deref().map(parse_id).transpose()?;
            commands::list::execute(&connection.client()?, scan, only, json, quiet).await
        }
        Commands::Url {
            id,
            file,
            public_url,
        } => commands::url::execute(&public_url, parse_id(&id)?, file.as_deref()),
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {}
    }
    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::ExitCode::from(exit.code as u8)
}
