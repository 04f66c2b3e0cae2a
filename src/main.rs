//! Emosense Agent CLI
//!
//! Debounced emotion output from noisy expression streams.

use clap::{Parser, Subcommand};
use emosense_agent::{
    chart::{ChartSink, ConsoleChart, NullChart},
    config::Config,
    core::AggregationScheduler,
    detector::{EmotionLabel, ExpressionSample, ScriptedSource},
    recommend::{PlaylistRecommender, RecommendationTrigger},
    telemetry::create_shared_stats_with_persistence,
    VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emosense")]
#[command(version = VERSION)]
#[command(about = "Debounced emotion agent over facial-expression streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the sampling/aggregation pipeline
    Start {
        /// Sampling interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Voting window size (samples per stable emotion)
        #[arg(long)]
        window_size: Option<usize>,

        /// Base URI the detection collaborator loads its assets from
        #[arg(long)]
        model_base_uri: Option<String>,

        /// Render the per-tick percentage chart on stdout
        #[arg(long)]
        chart: bool,

        /// Accept detection batches over HTTP instead of the scripted demo
        /// source (requires the server feature)
        #[arg(long)]
        serve: bool,

        /// Ingest server port
        #[arg(long, default_value = "7878")]
        port: u16,

        /// Post recommendations to the playlist service (requires the
        /// playlist feature)
        #[arg(long)]
        playlist: bool,
    },

    /// Show telemetry from previous sessions
    Status,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            interval_ms,
            window_size,
            model_base_uri,
            chart,
            serve,
            port,
            playlist,
        } => {
            cmd_start(interval_ms, window_size, model_base_uri, chart, serve, port, playlist);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

#[allow(unused_variables)]
fn cmd_start(
    interval_ms: Option<u64>,
    window_size: Option<usize>,
    model_base_uri: Option<String>,
    chart: bool,
    serve: bool,
    port: u16,
    enable_playlist: bool,
) {
    println!("Emosense Agent v{VERSION}");
    println!();

    // Load configuration and apply CLI overrides
    let mut config = Config::load().unwrap_or_default();
    if let Some(ms) = interval_ms {
        config.sample_interval = Duration::from_millis(ms);
    }
    if let Some(size) = window_size {
        config.window_size = size;
    }
    if let Some(uri) = model_base_uri {
        config.model_base_uri = uri;
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Starting pipeline...");
    println!("  Sampling interval: {}ms", config.sample_interval.as_millis());
    println!("  Voting window: {} samples", config.window_size);
    println!("  Model base URI: {}", config.model_base_uri);
    println!("  Chart: {}", if chart { "console" } else { "disabled" });

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Could not create async runtime: {e}");
            std::process::exit(1);
        }
    };

    // Telemetry with persistence
    let stats = create_shared_stats_with_persistence(config.data_path.join("telemetry.json"));
    println!("  Instance ID: {}", stats.instance_id());

    // Chart sink
    let chart_sink: Arc<dyn ChartSink> = if chart {
        Arc::new(ConsoleChart::default())
    } else {
        Arc::new(NullChart)
    };

    // Recommendation trigger
    #[cfg(feature = "playlist")]
    let recommender: Arc<dyn RecommendationTrigger> = if enable_playlist {
        match emosense_agent::playlist::PlaylistClient::from_runtime() {
            Ok(client) => {
                println!("  Playlist sync: enabled");
                println!("  Device ID: {}", client.device_id());
                match runtime.block_on(client.test_connection()) {
                    Ok(true) => println!("  Playlist connection: OK"),
                    Ok(false) => eprintln!("Warning: Playlist health check failed"),
                    Err(e) => eprintln!("Warning: Could not connect to playlist service: {e}"),
                }
                Arc::new(emosense_agent::playlist::HttpRecommender::new(client))
            }
            Err(e) => {
                eprintln!("Warning: Playlist initialization failed: {e}");
                eprintln!("Continuing with console recommendations.");
                Arc::new(PlaylistRecommender)
            }
        }
    } else {
        Arc::new(PlaylistRecommender)
    };

    #[cfg(not(feature = "playlist"))]
    let recommender: Arc<dyn RecommendationTrigger> = {
        if enable_playlist {
            eprintln!(
                "Warning: --playlist flag ignored (playlist feature not enabled at compile time)"
            );
        }
        Arc::new(PlaylistRecommender)
    };

    let mut scheduler = AggregationScheduler::new(config.sample_interval, config.window_size)
        .with_chart(chart_sink)
        .with_recommender(recommender)
        .with_stats(stats.clone());

    // Sample source: HTTP ingest when serving, scripted demo otherwise
    let mut server_shutdown = None;
    let start_result = if serve {
        start_with_ingest_server(&runtime, &mut scheduler, port, &mut server_shutdown)
    } else {
        println!("  Source: scripted demo (no detector attached)");
        runtime.block_on(async { scheduler.start(ScriptedSource::looping(demo_script())) })
    };

    if let Err(e) = start_result {
        eprintln!("Error starting scheduler: {e}");
        std::process::exit(1);
    }

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Wait for Ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    println!();
    println!("Stopping pipeline...");
    scheduler.stop();
    runtime.block_on(scheduler.join());

    if let Some(shutdown_tx) = server_shutdown {
        let _ = shutdown_tx.send(());
    }

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save telemetry: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

/// Start the ingest server and hand its channel source to the scheduler.
#[cfg(feature = "server")]
fn start_with_ingest_server(
    runtime: &tokio::runtime::Runtime,
    scheduler: &mut AggregationScheduler,
    port: u16,
    server_shutdown: &mut Option<tokio::sync::oneshot::Sender<()>>,
) -> Result<(), emosense_agent::SchedulerError> {
    let server_config = emosense_agent::server::ServerConfig::new(port);
    match runtime.block_on(emosense_agent::server::run(server_config)) {
        Ok((addr, shutdown_tx, source)) => {
            println!("  Ingest endpoint: http://{addr}/sample");
            *server_shutdown = Some(shutdown_tx);
            runtime.block_on(async { scheduler.start(source) })
        }
        Err(e) => {
            eprintln!("Error: Could not start ingest server: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "server"))]
fn start_with_ingest_server(
    _runtime: &tokio::runtime::Runtime,
    _scheduler: &mut AggregationScheduler,
    _port: u16,
    _server_shutdown: &mut Option<tokio::sync::oneshot::Sender<()>>,
) -> Result<(), emosense_agent::SchedulerError> {
    eprintln!("Error: --serve requires the server feature");
    std::process::exit(1);
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Emosense Agent Status");
    println!("=====================");
    println!();
    println!("Configuration:");
    println!("  Sampling interval: {}ms", config.sample_interval.as_millis());
    println!("  Voting window: {} samples", config.window_size);
    println!("  Model base URI: {}", config.model_base_uri);
    println!();

    let stats_path = config.data_path.join("telemetry.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(v) = stats.get("ticks_sampled") {
                    println!("  Ticks sampled: {v}");
                }
                if let Some(v) = stats.get("ticks_skipped") {
                    println!("  Ticks skipped (no face): {v}");
                }
                if let Some(v) = stats.get("ticks_invalid") {
                    println!("  Ticks dropped (invalid): {v}");
                }
                if let Some(v) = stats.get("windows_completed") {
                    println!("  Voting windows completed: {v}");
                }
                if let Some(v) = stats.get("recommendations") {
                    println!("  Recommendations emitted: {v}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Canned detection sequence for running the pipeline without a detector:
/// a mostly-happy stretch with noise and no-face gaps, then a sad stretch.
fn demo_script() -> Vec<Option<ExpressionSample>> {
    use EmotionLabel::{Happy, Neutral, Sad, Surprised};

    let lean = |dominant: EmotionLabel, p: f64| {
        let spread = (1.0 - p) / 3.0;
        ExpressionSample::new()
            .with(Neutral, spread)
            .with(Happy, spread)
            .with(Sad, spread)
            .with(Surprised, spread)
            .with(dominant, p)
    };

    vec![
        Some(lean(Happy, 0.8)),
        Some(lean(Happy, 0.7)),
        None,
        Some(lean(Neutral, 0.5)),
        Some(lean(Happy, 0.9)),
        Some(lean(Happy, 0.6)),
        Some(lean(Surprised, 0.7)),
        Some(lean(Happy, 0.8)),
        None,
        Some(lean(Happy, 0.75)),
        Some(lean(Happy, 0.85)),
        Some(lean(Sad, 0.6)),
        Some(lean(Sad, 0.7)),
        Some(lean(Sad, 0.8)),
        Some(lean(Neutral, 0.55)),
        Some(lean(Sad, 0.65)),
        Some(lean(Sad, 0.75)),
        None,
        Some(lean(Sad, 0.7)),
        Some(lean(Sad, 0.6)),
        Some(lean(Sad, 0.8)),
        Some(lean(Sad, 0.9)),
    ]
}
