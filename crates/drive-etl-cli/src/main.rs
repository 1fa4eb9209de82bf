//! Drive ETL CLI - run configured updates against a local store

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drive_etl::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "drive-etl")]
#[command(author, version, about = "Configuration-driven spreadsheet ETL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an update from a settings document
    Run {
        /// Settings JSON file
        settings: PathBuf,

        /// Directory serving as the drive store (keys are relative paths)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Copy every produced file into this directory
        #[arg(short, long)]
        download_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            settings,
            root,
            download_dir,
        } => run(&settings, &root, download_dir.as_deref()),
    }
}

fn run(settings: &Path, root: &Path, download_dir: Option<&Path>) -> Result<()> {
    let drive = LocalDrive::new(root);
    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);

    let location = SettingsLocation::Path {
        path: settings.to_path_buf(),
    };
    let outcomes = manager
        .run_update(&location)
        .with_context(|| format!("Update failed for '{}'", settings.display()))?;

    for (index, dataset) in outcomes.iter().enumerate() {
        println!("Dataset {}:", index);
        for outcome in &dataset.exports {
            match &outcome.path {
                Some(path) => {
                    println!("  {} new row(s), created {}", outcome.table.len(), path.display())
                }
                None => println!("  no new rows"),
            }
        }
    }

    if let Some(dir) = download_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create '{}'", dir.display()))?;
        for dataset in &outcomes {
            for path in dataset.paths() {
                let name = path
                    .file_name()
                    .context("produced file has no name")?;
                std::fs::copy(path, dir.join(name))
                    .with_context(|| format!("Failed to copy '{}'", path.display()))?;
            }
        }
    }

    Ok(())
}
