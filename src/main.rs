//! CLI entry point for frontdoc

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "frontdoc")]
#[command(version)]
#[command(about = "Validate, list and scaffold markdown documents with front-matter", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every document in the content directory
    #[command(alias = "c")]
    Check {
        /// Re-validate on file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// List documents, newest first
    #[command(alias = "ls")]
    List {
        /// Include drafts
        #[arg(long)]
        drafts: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show one document's metadata and body outline
    Show {
        /// Path to the document, relative to the base or content directory
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create a new document
    New {
        /// Title of the new document
        title: String,

        /// Create it as published instead of draft
        #[arg(long)]
        publish: bool,

        /// File name inside the content directory
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "frontdoc=debug,info"
    } else {
        "frontdoc=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Check { watch } => {
            let site = frontdoc::Site::new(&base_dir)?;
            tracing::info!("Checking documents in {:?}", site.content_dir);

            if watch {
                if let Err(e) = frontdoc::commands::check::run(&site) {
                    tracing::error!("{}", e);
                }
                frontdoc::commands::check::watch(&site).await?;
            } else {
                site.check()?;
            }
        }

        Commands::List { drafts, json } => {
            let site = frontdoc::Site::new(&base_dir)?;
            frontdoc::commands::list::run(&site, drafts, json)?;
        }

        Commands::Show { file, json } => {
            let site = frontdoc::Site::new(&base_dir)?;
            frontdoc::commands::show::run(&site, &file, json)?;
        }

        Commands::New {
            title,
            publish,
            path,
        } => {
            let site = frontdoc::Site::new(&base_dir)?;
            tracing::info!("Creating new document with title: {}", title);
            frontdoc::commands::new::run(&site, &title, publish, path.as_deref())?;
        }

        Commands::Version => {
            println!("frontdoc version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
