//! wdex: streaming organisation and city extraction from Wikidata JSON dumps

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;
use wdex::{
    config::{Config, LogFormat},
    dump::DumpReader,
    extract::{Category, Extractor},
    membership,
    pipeline::{CancelToken, ExtractionPipeline},
    sink::{BatchWriter, OutputFormat},
};

#[derive(Parser)]
#[command(name = "wdex")]
#[command(about = "Extract organisations and cities from a Wikidata JSON dump")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "wdex.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction scan over a dump file
    Extract {
        /// Path to the dump (.json or .json.gz); falls back to the config
        dump: Option<PathBuf>,

        /// Category to extract (organisations, cities)
        #[arg(long)]
        category: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows per batch file
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Output format (csv, json)
        #[arg(long)]
        format: Option<String>,

        /// Stop after scanning this many records
        #[arg(long)]
        max_records: Option<u64>,

        /// Suppress the progress bar and summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resolve and print the city type membership set
    Subclasses {
        /// Root type to expand instead of the configured one
        #[arg(long)]
        root: Option<String>,
    },

    /// Write a default wdex.toml
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    let log_level = match cli.verbose {
        0 => config.logging.level.tracing_level(),
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false);
    match config.logging.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    match cli.command {
        Commands::Extract {
            dump,
            category,
            output,
            batch_size,
            format,
            max_records,
            quiet,
        } => run_extract(
            config,
            dump,
            category,
            output,
            batch_size,
            format,
            max_records,
            quiet,
        ),
        Commands::Subclasses { root } => run_subclasses(config, root),
        Commands::Init { path } => init_config(path),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_extract(
    mut config: Config,
    dump: Option<PathBuf>,
    category: Option<String>,
    output: Option<PathBuf>,
    batch_size: Option<usize>,
    format: Option<String>,
    max_records: Option<u64>,
    quiet: bool,
) -> Result<()> {
    // CLI flags override the config file
    if let Some(category) = category {
        config.extraction.category = category.parse::<Category>().map_err(anyhow::Error::msg)?;
    }
    if let Some(output) = output {
        config.output.dir = output;
    }
    if let Some(batch_size) = batch_size {
        config.extraction.batch_size = batch_size;
    }
    if let Some(format) = format {
        config.output.format = format.parse::<OutputFormat>().map_err(anyhow::Error::msg)?;
    }
    if max_records.is_some() {
        config.extraction.max_records = max_records;
    }
    config.validate()?;

    let Some(dump) = dump.or(config.dump.path.clone()) else {
        anyhow::bail!("no dump path given (pass it as an argument or set [dump] path)");
    };
    if !dump.exists() {
        anyhow::bail!("Dump file not found: {}", dump.display());
    }

    let category = config.extraction.category;
    let membership = membership::resolve(category, &config.sparql);
    info!(
        category = %category,
        source = %membership.source(),
        types = membership.len(),
        "membership set ready"
    );

    let writer = BatchWriter::new(
        &config.output.dir,
        category,
        config.output.format,
        config.output.naming,
        config.extraction.batch_size,
    )?;
    let extractor = Extractor::new(category, membership)
        .with_require_website(config.extraction.require_website_for(category))
        .with_language(config.extraction.language.clone());

    let cancel = CancelToken::new();
    {
        let token = cancel.clone();
        ctrlc::set_handler(move || {
            eprintln!("\ninterrupt received, finishing current record and flushing...");
            token.cancel();
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let reader = DumpReader::open(&dump)
        .with_context(|| format!("Failed to open dump: {}", dump.display()))?;
    let mut pipeline = ExtractionPipeline::new(extractor, writer)
        .with_cancel_token(cancel)
        .with_max_records(config.extraction.max_records)
        .with_quiet(quiet);

    let stats = pipeline.run(reader)?;
    if !quiet {
        stats.print_summary();
    }
    Ok(())
}

fn run_subclasses(config: Config, root: Option<String>) -> Result<()> {
    let mut sparql = config.sparql.clone();
    if let Some(root) = root {
        sparql.root_type = root;
    }

    let set = membership::resolve_city_types(&sparql);
    println!(
        "{} type ids for {} (source: {})",
        set.len(),
        sparql.root_type,
        set.source()
    );
    let mut ids: Vec<&str> = set.ids().collect();
    ids.sort_unstable();
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

fn init_config(path: PathBuf) -> Result<()> {
    let config_path = path.join("wdex.toml");
    if config_path.exists() {
        anyhow::bail!("Config already exists: {}", config_path.display());
    }

    let toml_content = r#"# wdex configuration

[dump]
# path = "wikidata-latest-all.json.gz"

[extraction]
# organisations | cities
category = "organisations"
batch_size = 5000
# max_records = 100000
# require_website = true
language = "en"

[output]
dir = "out"
# csv | json
format = "csv"
# row-count | last-entity
naming = "row-count"

[sparql]
enabled = true
endpoint = "https://query.wikidata.org/sparql"
root_type = "Q515"
timeout_secs = 60

[logging]
level = "info"
format = "text"
"#;

    std::fs::create_dir_all(&path)?;
    std::fs::write(&config_path, toml_content)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
