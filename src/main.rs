//! # LIDIA Context CLI (`lidia-ctx`)
//!
//! Developer tool for inspecting what the pipeline makes of a file.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lidia-ctx extract <FILE>` | Print the raw extraction result |
//! | `lidia-ctx context <FILE>` | Print the final bounded context |
//!
//! ## Examples
//!
//! ```bash
//! lidia-ctx extract relatorio.pdf
//! lidia-ctx --config ./lidia.toml context planilha.xlsx --max-length 2000
//! RUST_LOG=lidia_context=debug lidia-ctx context ata.docx --json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use lidia_context::config::{load_config, Config};
use lidia_context::models::SourceFile;
use lidia_context::pipeline::ContextPipeline;

/// LIDIA Context CLI: extract text from documents and reduce it to a
/// bounded context for LLM prompts.
#[derive(Parser)]
#[command(name = "lidia-ctx", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract raw text from a file, without normalization or reduction.
    Extract {
        /// File to read. Its extension selects the format.
        file: PathBuf,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Build the bounded context for a file.
    Context {
        file: PathBuf,
        /// Override `context.max_context_length`.
        #[arg(long)]
        max_length: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &Path) -> Result<SourceFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(SourceFile::new(filename, bytes))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Extract { file, json } => {
            let source = read_source(&file)?;
            let result = ContextPipeline::new(cfg).extract(&source);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                eprintln!("method: {:?} ({})", result.method, result.diagnostic);
                println!("{}", result.raw_text);
            }
        }
        Commands::Context {
            file,
            max_length,
            json,
        } => {
            if let Some(max_length) = max_length {
                cfg.context.max_context_length = max_length;
                cfg.validate()?;
            }
            let source = read_source(&file)?;
            let output = ContextPipeline::new(cfg).build(&source);
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", output.context.text);
            }
        }
    }

    Ok(())
}
