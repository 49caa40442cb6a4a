//! Song Conversion CLI
//!
//! Inspects song files and upgrades them to the canonical schema.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use funkin_schemas::{
    resolver, Converter, Document, FunkinConfig, OutputFormat, Resolver, SchemaRegistry, SongPack,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "funkin-convert")]
#[command(about = "Inspect and convert song metadata and chart files")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the role, generation and version of a file
    Inspect {
        /// Metadata or chart JSON
        file: PathBuf,
    },

    /// Convert metadata and/or a chart to the latest schema
    Convert {
        /// Metadata JSON
        #[arg(short, long)]
        metadata: Option<PathBuf>,
        /// Chart JSON (legacy charts also produce metadata)
        #[arg(long)]
        chart: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Difficulty id for notes of a legacy chart
        #[arg(short, long)]
        difficulty: Option<String>,
        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = FunkinConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let registry = SchemaRegistry::standard();
    let resolver = Resolver::new(&registry);

    match cli.command {
        Commands::Inspect { file } => {
            let bytes = read(&file)?;
            let document = resolver
                .decode_any(&bytes)
                .with_context(|| format!("decoding {}", file.display()))?;
            let latest = registry.latest(document.role());

            println!("📄 {}", file.display());
            println!("  role:       {}", document.role());
            println!("  generation: {}", document.generation());
            println!("  version:    {}", document.version());
            println!("  summary:    {}", document);
            if latest == Some(document.generation()) {
                println!("  ✅ already on the latest schema");
            } else if let Some(latest) = latest {
                println!("  ⬆️  converts to {}", latest);
            }
            Ok(())
        }

        Commands::Convert {
            metadata,
            chart,
            out,
            difficulty,
            compact,
        } => {
            if metadata.is_none() && chart.is_none() {
                bail!("nothing to convert; pass --metadata and/or --chart");
            }

            let mut options = config.conversion_options();
            if let Some(difficulty) = difficulty {
                options.legacy_difficulty = difficulty;
            }
            let format = if compact {
                OutputFormat::Compact
            } else {
                config.output.format
            };

            let mut pack = SongPack::default();
            if let Some(path) = &metadata {
                let decoded = resolver
                    .decode_metadata(&read(path)?)
                    .with_context(|| format!("decoding metadata {}", path.display()))?;
                println!("🔍 {} ({})", path.display(), decoded.generation());
                pack.metadata = Some(decoded);
            }
            if let Some(path) = &chart {
                let decoded = resolver
                    .decode_chart(&read(path)?)
                    .with_context(|| format!("decoding chart {}", path.display()))?;
                println!("🔍 {} ({})", path.display(), decoded.generation());
                pack.chart = Some(decoded);
            }

            let converted = Converter::with_options(&registry, options).convert_pack(pack)?;
            let song_id = song_id(converted.song_name().unwrap_or("song"));

            std::fs::create_dir_all(&out)
                .with_context(|| format!("creating {}", out.display()))?;
            if let Some(metadata) = converted.metadata {
                let path = out.join(format!("{}-metadata.json", song_id));
                write(&path, &Document::Metadata(metadata), format)?;
            }
            if let Some(chart) = converted.chart {
                let path = out.join(format!("{}-chart.json", song_id));
                write(&path, &Document::Chart(chart), format)?;
            }
            Ok(())
        }
    }
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write(path: &Path, document: &Document, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = resolver::encode(document, format)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("✅ {} written to {}", document.generation(), path.display());
    Ok(())
}

/// File-name friendly song id: lowercase, dashes for anything non-alphanumeric
fn song_id(name: &str) -> String {
    let id: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let id = id
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if id.is_empty() {
        "song".to_string()
    } else {
        id
    }
}
