use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use h2print_core::db::types::Classification;
use h2print_core::db::{self, FingerprintDb};
use h2print_core::signature::Signature;
use h2print_core::trace::extract_signatures;

mod output;

#[derive(Parser)]
#[command(name = "h2print-scan")]
#[command(about = "Extract HTTP/2 client fingerprints from an nghttpd verbose log")]
struct Cli {
    /// Path to an `nghttpd -v` log file. Reads stdin when omitted or "-".
    log: Option<PathBuf>,

    /// Print verbose output (canonical form and full signature record)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Output format: "text" (human-readable) or "json" (NDJSON, one object per line)
    #[arg(short, long, default_value = "text")]
    output: String,

    /// Disable fingerprint classification (skip database lookups)
    #[arg(long, default_value_t = false)]
    no_classify: bool,

    /// Path to the fingerprint database
    /// [default: ~/.local/share/h2print/fingerprints.db]
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let format = output::OutputFormat::parse(&cli.output)?;
    let raw = read_log(cli.log.as_deref())?;

    let db = if cli.no_classify {
        None
    } else {
        let path = cli.db.unwrap_or_else(db::default_db_path);
        match FingerprintDb::open(&path) {
            Ok(db) => {
                info!("Fingerprint DB loaded: {}", path.display());
                Some(db)
            }
            Err(_) => {
                info!("No fingerprint DB found (classification disabled)");
                None
            }
        }
    };

    let extraction = extract_signatures(&raw);

    if extraction.clients.is_empty() && extraction.error.is_none() {
        info!("No HTTP/2 client frames found in the log");
    }

    for client in &extraction.clients {
        let classification = db
            .as_ref()
            .map(|db| db.classify(&client.signature.hash_hex()))
            .transpose()
            .unwrap_or_else(|e| {
                debug!("Classification error: {}", e);
                None
            })
            .unwrap_or_else(Classification::empty);
        output::print_signature(client, &classification, format, cli.verbose);
    }

    if let Some(err) = extraction.error {
        bail!("malformed trace: {}", err);
    }

    Ok(())
}

fn read_log(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file {}", path.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read log from stdin")?;
            Ok(raw)
        }
    }
}
