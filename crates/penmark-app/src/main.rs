// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Penmark — handwriting profiles and paginated PDF export.
//
// Entry point. Parses the command line, initialises logging and backend
// services, and dispatches to the command handlers. Failures are printed as
// a human-readable message and suggestion with a non-zero exit status.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use penmark_core::error::{PenmarkError, Result};
use penmark_core::human_errors::humanize_error;
use penmark_core::types::{OwnerId, ProfileId, StyleCategory};

use services::app_services::AppServices;
use services::data_dir;

/// Handwriting profiles and paginated PDF export
#[derive(Parser)]
#[command(name = "penmark", version, about)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Data directory (default: $XDG_DATA_HOME/penmark)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Owner whose profiles are managed
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handwriting profile management
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Export documents as PDF
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },

    /// Show recent registry operations
    Journal {
        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// Configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List profiles, newest first
    List,
    /// Upload a sample image as a new profile
    Upload {
        /// Display name
        #[arg(long)]
        name: String,
        /// Style category: cursive, print, or mixed
        #[arg(long, default_value = "cursive")]
        style: StyleCategory,
        /// Path to the sample image
        #[arg(long)]
        image: PathBuf,
        /// Content type, if the file extension is not enough
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Make a profile the active one
    Activate {
        /// Profile ID
        profile_id: String,
    },
    /// Delete a profile and its sample image
    Delete {
        /// Profile ID
        profile_id: String,
    },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Export a text file
    Text {
        /// Text file to export
        #[arg(long)]
        input: PathBuf,
        /// Title placed above the text
        #[arg(long)]
        title: Option<String>,
        /// Output PDF path
        #[arg(long)]
        out: PathBuf,
    },
    /// Solve a problem and export problem and solution
    Solve {
        /// Problem statement
        #[arg(long)]
        problem: String,
        /// Output PDF path
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Write the active configuration to config.json
    Init,
}

fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("Error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            if let Some(report) = e.partial() {
                eprintln!("  Details: {report}");
            }
            ExitCode::FAILURE
        }
    }
}

fn require_owner(owner: Option<String>) -> Result<OwnerId> {
    owner
        .filter(|o| !o.trim().is_empty())
        .map(OwnerId::new)
        .ok_or_else(|| PenmarkError::Validation("--owner is required for profile commands".into()))
}

fn run(cli: Cli) -> Result<()> {
    let dir = data_dir::data_dir(cli.data_dir.as_deref())?;
    let services = AppServices::init(&dir)?;

    match cli.command {
        Commands::Profiles { action } => {
            let owner = require_owner(cli.owner)?;
            run_profiles(&services, &owner, action)
        }

        Commands::Export { action } => match action {
            ExportAction::Text { input, title, out } => {
                let text = std::fs::read_to_string(&input)?;
                let pages = services.export_text(&text, title.as_deref(), &out)?;
                println!("Wrote {} ({} page{})", out.display(), pages, plural(pages));
                Ok(())
            }
            ExportAction::Solve { problem, out } => {
                let pages = services.export_solution(&problem, &out)?;
                println!("Wrote {} ({} page{})", out.display(), pages, plural(pages));
                Ok(())
            }
        },

        Commands::Journal { limit } => {
            let entries = services.recent_journal(limit)?;
            if entries.is_empty() {
                println!("No journal entries.");
            }
            for entry in entries {
                let status = if entry.success { "ok" } else { "FAILED" };
                println!(
                    "{}  {:<8} {:<6} owner={} subject={}",
                    entry.timestamp, entry.action, status, entry.owner_id, entry.subject
                );
                if let Some(details) = entry.details {
                    println!("    {details}");
                }
            }
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(services.config())?);
                println!();
                println!("Data directory: {}", services.data_dir().display());
                Ok(())
            }
            ConfigAction::Init => {
                let path = services.save_config()?;
                println!("Wrote {}", path.display());
                Ok(())
            }
        },
    }
}

fn run_profiles(services: &AppServices, owner: &OwnerId, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::List => {
            let profiles = services.list_profiles(owner)?;
            if profiles.is_empty() {
                println!("No handwriting profiles. Upload one with `penmark profiles upload`.");
                return Ok(());
            }
            for profile in profiles {
                let marker = if profile.is_active { "*" } else { " " };
                println!(
                    "{} {}  {:<24} {:<8} {}",
                    marker,
                    profile.id,
                    profile.name,
                    profile.style_category.as_str(),
                    profile.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
        ProfileAction::Upload {
            name,
            style,
            image,
            content_type,
        } => {
            let profile = services.upload_profile_file(
                owner,
                &name,
                style,
                &image,
                content_type.as_deref(),
            )?;
            println!("Uploaded profile {} ({})", profile.id, profile.name);
            Ok(())
        }
        ProfileAction::Activate { profile_id } => {
            services.activate(owner, &ProfileId::new(profile_id.clone()))?;
            println!("Profile {profile_id} is now active");
            Ok(())
        }
        ProfileAction::Delete { profile_id } => {
            services.delete_profile(owner, &ProfileId::new(profile_id.clone()))?;
            println!("Deleted profile {profile_id}");
            Ok(())
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
