//! pg-slice CLI - extract a referentially consistent PostgreSQL slice.

use clap::Parser;
use pg_slice::{Config, Orchestrator, SliceError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "pg-slice")]
#[command(about = "Extract a referentially consistent slice of a PostgreSQL database")]
#[command(version)]
struct Cli {
    /// Root table name
    root_table: String,

    /// Root row primary key value (treated as a raw SQL literal; numeric
    /// recommended)
    root_id: String,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "dataSource.json")]
    config: PathBuf,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SliceError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let result = Orchestrator::new(config)
        .run(&cli.root_table, &cli.root_id)
        .await?;

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        println!("\nSlice extraction completed!");
        println!("  Root: {} id={}", result.root_table, result.root_id);
        println!("  Duration: {:.2}s", result.duration_seconds);
        println!(
            "  Tables: {} reached ({} descendants, {} outsiders)",
            result.tables_reached, result.direct_descendants, result.outsiders
        );
        println!("  Rows: {}", result.rows_extracted);
        if result.tables_loaded > 0 {
            println!("  Loaded into destination: {}", result.tables_loaded);
        }
        if !result.failed_tables.is_empty() {
            println!("  Failed copy commands: {:?}", result.failed_tables);
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
