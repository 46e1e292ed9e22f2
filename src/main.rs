//! Workflow Sensor Agent CLI
//!
//! Tracks foreground application usage and turns it into workflow suggestions.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use workflow_sensor_agent::{
    parse_activity_batch, probe, transparency::create_shared_log_with_persistence,
    ActivityTracker, Config, ExtractionScope, FeatureExtractor, StartOutcome, StopOutcome,
    SuggestionEngine, TrackerEvent, PRIVACY_DECLARATION, VERSION,
};

#[derive(Parser)]
#[command(name = "workflow-sensor")]
#[command(version = VERSION)]
#[command(about = "Foreground activity sensor with adaptive workflow suggestions", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track foreground activity until Ctrl+C, printing events as JSON lines
    Start {
        /// Write events to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Override the probe interval, in seconds
        #[arg(long)]
        sample_interval: Option<u64>,
    },

    /// Probe the host once and print what was observed
    Probe,

    /// Extract features from a JSON array of activity records
    Features {
        /// Input file
        #[arg(long, short)]
        input: PathBuf,

        /// Only use records from this device
        #[arg(long)]
        device_id: Option<Uuid>,

        /// Only use records from this session
        #[arg(long)]
        session_id: Option<Uuid>,
    },

    /// Generate suggestions from a JSON array of activity records
    Suggest {
        /// Input file
        #[arg(long, short)]
        input: PathBuf,

        /// Seed the engine for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show current collection status
    Status,

    /// Show configuration
    Config,

    /// Display privacy declaration
    Privacy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Start {
            output,
            sample_interval,
        } => cmd_start(output, sample_interval),
        Commands::Probe => cmd_probe(),
        Commands::Features {
            input,
            device_id,
            session_id,
        } => cmd_features(&input, device_id, session_id),
        Commands::Suggest { input, seed } => cmd_suggest(&input, seed),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
        Commands::Privacy => {
            cmd_privacy();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config() -> Result<Config> {
    Config::load().with_context(|| format!("loading {}", Config::config_path().display()))
}

fn cmd_start(output: Option<PathBuf>, sample_interval: Option<u64>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(secs) = sample_interval {
        if secs == 0 {
            bail!("--sample-interval must be at least 1 second");
        }
        config.sample_interval = Duration::from_secs(secs);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    eprintln!("Workflow Sensor Agent v{VERSION}");
    eprintln!("  Sample interval: {}s", config.sample_interval.as_secs());
    eprintln!("  Health interval: {}s", config.health_interval.as_secs());
    eprintln!("Press Ctrl+C to stop");
    eprintln!();

    let mut sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let transparency_log = create_shared_log_with_persistence(config.transparency_path());
    let probe = probe::default_probe(config.probe_config());
    let tracker = ActivityTracker::new(
        probe,
        config.tracker_config(),
        Some(Arc::clone(&transparency_log)),
    );
    let events = tracker.events();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(Arc::clone(&running))?;

    match tracker.start().context("starting tracker")? {
        StartOutcome::Started { device, session } => {
            eprintln!("Device: {} ({})", device.name, device.id);
            eprintln!("Session: {}", session.id);
        }
        StartOutcome::AlreadyRunning => eprintln!("Tracker already running"),
    }

    while running.load(Ordering::SeqCst) {
        if let Ok(event) = events.recv_timeout(Duration::from_millis(200)) {
            write_event(&mut sink, &event)?;
        }
    }

    eprintln!();
    eprintln!("Stopping...");
    if let StopOutcome::Stopped(session) = tracker.stop() {
        eprintln!(
            "Session {} closed after {}s",
            session.id,
            session.duration_secs().unwrap_or_default()
        );
    }
    for event in events.try_iter() {
        write_event(&mut sink, &event)?;
    }
    sink.flush().context("flushing output")?;

    if let Err(e) = transparency_log.save() {
        eprintln!("Warning: Could not save transparency stats: {e}");
    }

    eprintln!();
    eprintln!("{}", transparency_log.summary());
    Ok(())
}

fn write_event(sink: &mut dyn Write, event: &TrackerEvent) -> Result<()> {
    serde_json::to_writer(&mut *sink, event).context("serializing event")?;
    writeln!(sink).context("writing event")?;
    Ok(())
}

fn cmd_probe() -> Result<()> {
    let config = load_config()?;
    let probe = probe::default_probe(config.probe_config());

    let report = serde_json::json!({
        "platform": probe.name(),
        "foreground": probe.foreground_window(),
        "host": probe.host_info(),
        "hardware_id": probe.hardware_id(),
        "health": probe.health(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn read_records(input: &Path) -> Result<Vec<workflow_sensor_agent::ActivityRecord>> {
    let content =
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", input.display()))?;
    Ok(parse_activity_batch(&value)?)
}

fn cmd_features(input: &Path, device_id: Option<Uuid>, session_id: Option<Uuid>) -> Result<()> {
    let config = load_config()?;
    let records = read_records(input)?;

    let scope = ExtractionScope {
        device_id,
        session_id,
        ..ExtractionScope::default()
    };
    let features = FeatureExtractor::new(config.tz()?).extract(&records, &scope);
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}

fn cmd_suggest(input: &Path, seed: Option<u64>) -> Result<()> {
    let config = load_config()?;
    let records = read_records(input)?;

    let features = FeatureExtractor::new(config.tz()?).extract(&records, &ExtractionScope::all());
    let engine = match seed {
        Some(seed) => SuggestionEngine::with_seed(config.engine.clone(), seed)?,
        None => SuggestionEngine::new(config.engine.clone())?,
    };

    let batch = engine.generate(&features);
    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config = load_config()?;

    println!("Workflow Sensor Agent Status");
    println!("============================");
    println!();

    let probe = probe::default_probe(config.probe_config());
    let window = probe.foreground_window();
    println!("Platform probe: {}", probe.name());
    println!(
        "Foreground detection: {}",
        if window.is_known() {
            "available ✓"
        } else {
            "unavailable ✗"
        }
    );
    println!();

    println!("Configuration:");
    println!("  Sample interval: {}s", config.sample_interval.as_secs());
    println!("  Health interval: {}s", config.health_interval.as_secs());
    println!("  Minimum dwell: {}s", config.min_dwell.as_secs());
    println!("  Timezone: {}", config.timezone);
    println!();

    let stats_path = config.transparency_path();
    if stats_path.exists() {
        let content = std::fs::read_to_string(&stats_path)
            .with_context(|| format!("reading {}", stats_path.display()))?;
        let stats: serde_json::Value = serde_json::from_str(&content)?;
        println!("Cumulative Statistics:");
        for (key, label) in [
            ("activity_records", "Activity records"),
            ("debounced_switches", "Switches debounced"),
            ("health_samples", "Health samples"),
            ("probe_failures", "Empty probes"),
            ("events_dropped", "Events dropped"),
        ] {
            if let Some(value) = stats.get(key) {
                println!("  {label}: {value}");
            }
        }
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}

fn cmd_config() -> Result<()> {
    let config = load_config()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
