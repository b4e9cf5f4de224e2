use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use h2print_core::db::{self, FingerprintDb};

#[derive(Parser)]
#[command(name = "h2print-db")]
#[command(about = "Manage the h2print fingerprint database")]
struct Cli {
    /// Path to the database file
    /// [default: ~/.local/share/h2print/fingerprints.db]
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an empty database (creates file and tables)
    Init,

    /// Import labeled fingerprints from an NDJSON collection file
    ///
    /// One {"desc": ..., "h2_hash": ..., "h2_str": ...} object per line
    Import {
        /// Path to the NDJSON file
        file: PathBuf,
        /// Source label recorded with the imported entries
        #[arg(long, default_value = "collection")]
        source: String,
        /// Clear existing entries from this source before importing
        #[arg(long)]
        replace: bool,
    },

    /// Add a single labeled fingerprint
    Add {
        /// The signature hash (SHA-1, hex)
        hash: String,
        /// Client label, e.g. "Chrome 98"
        application: String,
        /// Optional category, e.g. "browser", "tool"
        #[arg(long)]
        category: Option<String>,
    },

    /// Show database statistics
    Stats,

    /// Look up a fingerprint hash
    Lookup {
        /// The hash to look up
        hash: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let db_path = cli.db.unwrap_or_else(db::default_db_path);

    match cli.command {
        Commands::Init => {
            let _db = FingerprintDb::open(&db_path)
                .with_context(|| format!("Failed to initialize database at {}", db_path.display()))?;
            println!("Database initialized: {}", db_path.display());
        }

        Commands::Import {
            file,
            source,
            replace,
        } => {
            let db = FingerprintDb::open(&db_path)
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

            if replace {
                db.clear_source(&source)?;
                println!("Cleared existing '{}' entries.", source);
            }
            let stats = db
                .import_collection(&file, &source)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            println!(
                "Import complete: {} imported, {} skipped",
                stats.imported, stats.skipped
            );
        }

        Commands::Add {
            hash,
            application,
            category,
        } => {
            let db = FingerprintDb::open(&db_path)
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
            db.add_manual(&hash, &application, category.as_deref())?;
            println!("Added: {} -> \"{}\"", hash, application);
        }

        Commands::Stats => {
            let db = FingerprintDb::open(&db_path)
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
            let stats = db.stats()?;

            println!("Database: {}", db_path.display());
            println!("Fingerprints: {}", stats.total);
            for (source, count) in &stats.by_source {
                println!("  {}: {}", source, count);
            }
        }

        Commands::Lookup { hash } => {
            let db = FingerprintDb::open(&db_path)
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

            let matches = db.lookup(&hash)?;
            if matches.is_empty() {
                println!("No matches found for: {}", hash);
                return Ok(());
            }

            for m in &matches {
                let cat = m
                    .category
                    .as_deref()
                    .map(|c| format!(", category: {}", c))
                    .unwrap_or_default();
                println!(
                    "Match: \"{}\" (source: {}{})",
                    m.application, m.source, cat
                );
            }
        }
    }

    Ok(())
}
