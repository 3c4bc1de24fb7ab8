use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

use scancam::detect::{DetectionMatch, StubDetector, StubOutcome};
use scancam::scan::{DisplayPacedScheduler, ScanController};
use scancam::{
    export, ExportFormat, InventoryRecord, JsonFileStore, ScanFailure, ScancamConfig,
    StreamConstraints, StubMediaSource, Symbology,
};

#[derive(Parser, Debug)]
#[command(name = "scancam")]
#[command(about = "Live barcode/QR scanning engine with a file-backed inventory capture CLI")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "scancam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scan session against the built-in synthetic capability
    Scan {
        /// Barcode payload the synthetic detector reports
        #[arg(long, default_value = "4006381333931")]
        value: String,

        /// Symbology wire name the synthetic detector reports
        #[arg(long, default_value = "ean_13")]
        format: String,

        /// Empty detect cycles before the match
        #[arg(long, default_value_t = 3)]
        cycles: usize,

        /// Save the match to the record store
        #[arg(long)]
        save: bool,

        /// Design attribute stored with the record
        #[arg(long, default_value = "")]
        design: String,

        /// Size attributes stored with the record (repeatable)
        #[arg(long = "size")]
        sizes: Vec<String>,

        /// Color attributes stored with the record (repeatable)
        #[arg(long = "color")]
        colors: Vec<String>,

        /// Price attribute stored with the record
        #[arg(long)]
        price: Option<f64>,
    },

    /// List stored records
    List,

    /// Export stored records to a file
    Export {
        /// Export format: text, csv, or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Output path (defaults to scanned-items-<date>.<ext>)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Delete a stored record by id
    Delete {
        /// Record id
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting scancam v{}", env!("CARGO_PKG_VERSION"));

    let config = match ScancamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate()?;

    let store = JsonFileStore::new(&config.store.path);

    match args.command.unwrap_or(Command::List) {
        Command::Scan {
            value,
            format,
            cycles,
            save,
            design,
            sizes,
            colors,
            price,
        } => {
            let format = Symbology::from_str(&format).map_err(anyhow::Error::msg)?;
            run_scan(&config, &store, value, format, cycles, save, design, sizes, colors, price)
                .await?;
        }
        Command::List => {
            let records = store.list().await?;
            if records.is_empty() {
                println!("No items scanned yet");
            } else {
                for record in records {
                    println!(
                        "{}  {}  ({})  {}",
                        record.id,
                        record.barcode,
                        record.format,
                        record.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }
        Command::Export { format, output } => {
            let format = ExportFormat::from_str(&format).map_err(anyhow::Error::msg)?;
            let path = output.unwrap_or_else(|| PathBuf::from(export::default_file_name(format)));

            let records = store.list().await?;
            let rendered = export::render(&records, format)?;
            tokio::fs::write(&path, rendered).await?;

            println!("Exported {} record(s) to {}", records.len(), path.display());
        }
        Command::Delete { id } => {
            let removed = store.delete(id).await?;
            println!("Deleted {} ({})", removed.id, removed.barcode);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_scan(
    config: &ScancamConfig,
    store: &JsonFileStore,
    value: String,
    format: Symbology,
    cycles: usize,
    save: bool,
    design: String,
    sizes: Vec<String>,
    colors: Vec<String>,
    price: Option<f64>,
) -> Result<()> {
    // Synthetic capabilities stand in for a real camera host: the engine
    // only ever sees the MediaSource/BarcodeDetector seams.
    let mut script = vec![StubOutcome::Empty; cycles];
    script.push(StubOutcome::Matches(vec![DetectionMatch::new(
        value, format,
    )]));

    let source = Arc::new(StubMediaSource::new());
    let detector = Arc::new(StubDetector::new(script));
    let scheduler = Arc::new(DisplayPacedScheduler::new(config.camera.refresh_hz));

    let controller = ScanController::builder()
        .source(source)
        .detector(detector)
        .scheduler(scheduler)
        .constraints(StreamConstraints::from_config(&config.camera))
        .policy(&config.detector)
        .build()?;

    let matched: Arc<Mutex<Option<(String, Symbology)>>> = Arc::new(Mutex::new(None));
    let failed: Arc<Mutex<Option<ScanFailure>>> = Arc::new(Mutex::new(None));

    let matched_slot = Arc::clone(&matched);
    let failed_slot = Arc::clone(&failed);

    controller
        .start(
            move |raw_value, symbology| {
                *matched_slot
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) =
                    Some((raw_value, symbology));
            },
            move |failure| {
                *failed_slot
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(failure);
            },
        )
        .await?;

    controller.join().await;

    if let Some(failure) = failed
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
    {
        error!("Scan failed: {}", failure);
        anyhow::bail!("scan failed: {}", failure);
    }

    let (raw_value, symbology) = matched
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
        .ok_or_else(|| anyhow::anyhow!("scan ended without a match"))?;

    println!("Result: {} ({})", raw_value, symbology);

    if save {
        let mut record = InventoryRecord::from_scan(raw_value, symbology)
            .with_design(design)
            .with_sizes(sizes)
            .with_colors(colors);
        if let Some(price) = price {
            record = record.with_price(price);
        }

        let stored = store.create(record).await?;
        println!("Saved as {}", stored.id);
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scancam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_target(true).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() {
    let default_config = r#"# Scancam Configuration File
# This is the default configuration with all available options

[camera]
# Which way the camera should face: "user" or "environment"
facing = "environment"
# Preferred capture resolution (width, height)
resolution = [1280, 720]
# Display refresh rate the scan loop paces itself to
refresh_hz = 60

[detector]
# Symbologies requested from the detector, by wire name
formats = [
    "qr_code", "code_128", "ean_13", "code_39", "code_93", "upc_a",
    "upc_e", "ean_8", "itf", "pdf417", "aztec", "data_matrix",
]
# Consecutive transient detect errors tolerated before the session fails
# (0 disables the cap)
max_consecutive_errors = 120
# Optional per-detect-call timeout in milliseconds
# detect_timeout_ms = 500

[store]
# Path of the JSON file backing the record store
path = "data.json"
"#;

    println!("{}", default_config);
}
