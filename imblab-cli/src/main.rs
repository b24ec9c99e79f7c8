//! ImbLab CLI: download, list and inspect dataset collections.
//!
//! Commands:
//! - `download`: fetch a collection, derive variants and save it to SQLite
//! - `list`: print the datasets of a collection without fetching anything
//! - `inspect`: summarize the tables of a saved database

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use imblab_core::data::{HttpFetcher, StdoutProgress};
use imblab_core::store::{self, TableSummary};
use imblab_core::{CollectionKind, DatasetCollection, PipelineConfig};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "imblab",
    version,
    about = "ImbLab CLI: imbalanced binary classification dataset collections"
)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Imbalanced,
    Binary,
}

impl From<Collection> for CollectionKind {
    fn from(c: Collection) -> Self {
        match c {
            Collection::Imbalanced => CollectionKind::Imbalanced,
            Collection::Binary => CollectionKind::Binary,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a collection and save it as one SQLite table per dataset.
    Download {
        /// Which collection to build.
        #[arg(long, value_enum, default_value_t = Collection::Imbalanced)]
        collection: Collection,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the database file. Defaults to the current directory.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Database name without extension. Defaults to the collection's name.
        #[arg(long)]
        db_name: Option<String>,

        /// Only fetch these datasets (key or display name).
        #[arg(long, num_args = 1..)]
        only: Vec<String>,

        /// Multiplication factors for derived variants (e.g. 2,3).
        #[arg(long, value_delimiter = ',')]
        factors: Option<Vec<f64>>,

        /// Master seed for undersampling and synthetic data.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the datasets of a collection.
    List {
        #[arg(long, value_enum, default_value_t = Collection::Imbalanced)]
        collection: Collection,
    },
    /// Summarize the tables of a saved database.
    Inspect {
        /// Path to the database file.
        db: PathBuf,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Download {
            collection,
            config,
            output_dir,
            db_name,
            only,
            factors,
            seed,
        } => run_download(
            collection.into(),
            config.as_deref(),
            &output_dir,
            db_name,
            &only,
            factors,
            seed,
        ),
        Commands::List { collection } => run_list(collection.into()),
        Commands::Inspect { db, json } => run_inspect(&db, json),
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_download(
    kind: CollectionKind,
    config_path: Option<&Path>,
    output_dir: &Path,
    db_name: Option<String>,
    only: &[String],
    factors: Option<Vec<f64>>,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(factors) = factors {
        config.imbalance.multiplication_factors = factors;
    }
    if let Some(seed) = seed {
        config.imbalance.seed = seed;
    }
    config.validate()?;

    let fetcher = HttpFetcher::new(&config.http)?;
    let mut collection = DatasetCollection::new(kind, &config)?.select(only)?;
    info!(
        factors = ?config.imbalance.multiplication_factors,
        seed = config.imbalance.seed,
        "imbalance settings"
    );

    collection.download(&fetcher, &StdoutProgress)?;

    let db_name = db_name.unwrap_or_else(|| collection.kind().default_db_name().to_string());
    let path = collection.save(output_dir, &db_name)?;
    println!(
        "Saved {} tables to: {}",
        collection.datasets().len(),
        path.display()
    );

    Ok(())
}

fn run_list(kind: CollectionKind) -> Result<()> {
    let collection = DatasetCollection::new(kind, &PipelineConfig::default())?;

    println!("{:<26} {:<26} {}", "Key", "Name", "Description");
    println!("{}", "-".repeat(90));
    for spec in collection.specs() {
        println!("{:<26} {:<26} {}", spec.key, spec.name(), spec.description);
    }
    println!();
    println!("{} datasets", collection.specs().len());

    Ok(())
}

fn run_inspect(db: &Path, json: bool) -> Result<()> {
    if !db.exists() {
        bail!("database does not exist: {}", db.display());
    }
    let conn = rusqlite::Connection::open_with_flags(db, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("opening {}", db.display()))?;
    let summary = store::summarize(&conn)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(db, &summary);
    }
    Ok(())
}

fn print_summary(db: &Path, summary: &[TableSummary]) {
    println!("Database: {}", db.display());
    println!("Tables:   {}", summary.len());
    println!();
    println!(
        "{:<28} {:>8} {:>9} {:>10} {:>8}",
        "Table", "Rows", "Features", "Positives", "IR"
    );
    println!("{}", "-".repeat(67));
    for t in summary {
        println!(
            "{:<28} {:>8} {:>9} {:>10} {:>8.2}",
            t.name, t.rows, t.features, t.positives, t.imbalance_ratio
        );
    }
}
