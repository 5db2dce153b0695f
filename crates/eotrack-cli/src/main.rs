mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use eotrack_core::{AggregationConfig, Exporter, SourceProvider};
use eotrack_store::{BatchWriter, JsonSourceStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "eotrack", version, about = "Executive order source aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate every document against its sources and write the export files.
    Export {
        #[command(flatten)]
        input: InputArgs,
        /// Output directory for executive_orders.json and source_metadata.json.
        #[arg(long, env = "EOTRACK_OUT_DIR", default_value = "export")]
        out_dir: PathBuf,
        /// Also write source_metadata.parquet.
        #[arg(long)]
        parquet: bool,
    },
    /// Aggregate a single document and print it.
    Inspect {
        /// Document id, e.g. EO-14151.
        id: String,
        #[command(flatten)]
        input: InputArgs,
        /// Print the exported JSON record instead of the card.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// JSON array of executive orders.
    #[arg(long, env = "EOTRACK_DOCUMENTS")]
    documents: PathBuf,
    /// JSON array of source records tagged with document_id.
    #[arg(long, env = "EOTRACK_SOURCES")]
    sources: PathBuf,
    /// Aggregation settings (abbreviations, impact areas, thresholds).
    #[arg(long, env = "EOTRACK_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    info!("eotrack v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Export {
            input,
            out_dir,
            parquet,
        } => cmd_export(&input, &out_dir, parquet),
        Command::Inspect { id, input, json } => cmd_inspect(&id, &input, json),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AggregationConfig> {
    match path {
        Some(path) => AggregationConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(AggregationConfig::default()),
    }
}

fn cmd_export(input: &InputArgs, out_dir: &Path, parquet: bool) -> anyhow::Result<()> {
    let exporter = Exporter::new(load_config(input.config.as_deref())?);
    let documents = eotrack_store::read_documents(&input.documents)
        .with_context(|| format!("reading documents {}", input.documents.display()))?;
    let store = JsonSourceStore::open(&input.sources)
        .with_context(|| format!("reading sources {}", input.sources.display()))?;

    let batch = exporter.export_batch(documents, &store)?;

    let writer = BatchWriter::open(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let paths = if parquet {
        writer.write_with_parquet(&batch)?
    } else {
        writer.write(&batch)?
    };

    println!(
        "Exported {} documents → {}",
        batch.documents.len(),
        paths.documents.display()
    );
    println!(
        "Summarised {} sources → {}",
        batch.source_summary.len(),
        paths.source_summary.display()
    );
    if let Some(parquet) = &paths.source_summary_parquet {
        println!("Source summary parquet → {}", parquet.display());
    }
    Ok(())
}

fn cmd_inspect(id: &str, input: &InputArgs, json: bool) -> anyhow::Result<()> {
    let exporter = Exporter::new(load_config(input.config.as_deref())?);
    let documents = eotrack_store::read_documents(&input.documents)
        .with_context(|| format!("reading documents {}", input.documents.display()))?;
    let Some(document) = documents.into_iter().find(|d| d.id == id) else {
        bail!("no document with id {id}");
    };
    let store = JsonSourceStore::open(&input.sources)
        .with_context(|| format!("reading sources {}", input.sources.display()))?;

    let sources = store.sources_for(&document)?;
    let exported = exporter.aggregate(document, sources);

    if json {
        println!("{}", serde_json::to_string_pretty(&exported)?);
    } else {
        display::print_document_card(&exported)?;
    }
    Ok(())
}
