//! Mocap Stream Agent CLI
//!
//! Streams live motion-sensor samples to a remote endpoint and records
//! labeled windows into a CSV dataset.

use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use crossbeam_channel::{bounded, Receiver};
use log::warn;
use mocap_stream_agent::{
    config::Config,
    hub::SampleIngestHub,
    sender::PeriodicSender,
    sensors::SourceEvent,
    sources::{ReplaySource, SyntheticSource},
    stats::create_shared_stats,
    transport::TcpSendChannel,
    VERSION,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "mocap-stream")]
#[command(version = VERSION)]
#[command(about = "Motion-sensor streaming and window-recording agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream sensor samples and record labeled windows
    Run {
        /// Device identifier (generated when omitted and not configured)
        #[arg(long)]
        device_id: Option<String>,

        /// Send interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Recording window duration in milliseconds
        #[arg(long)]
        window_ms: Option<u64>,

        /// Streaming endpoint address (host:port)
        #[arg(long)]
        server: Option<String>,

        /// Event source: synthetic or replay
        #[arg(long, default_value = "synthetic")]
        source: String,

        /// Trace file for the replay source (JSONL)
        #[arg(long)]
        replay_file: Option<PathBuf>,

        /// Synthetic source rate in Hz
        #[arg(long, default_value = "60.0")]
        rate_hz: f64,

        /// Write the CSV export to this directory on exit
        #[arg(long)]
        export: Option<PathBuf>,

        /// Upload the CSV export on exit (requires upload feature)
        #[arg(long)]
        upload: bool,

        /// Upload endpoint URL
        #[arg(long)]
        upload_url: Option<String>,
    },

    /// Show configuration
    Config,
}

/// The source driving this run.
enum RunSource {
    Synthetic(SyntheticSource),
    Replay(ReplaySource),
}

impl RunSource {
    fn receiver(&self) -> &Receiver<SourceEvent> {
        match self {
            RunSource::Synthetic(s) => s.receiver(),
            RunSource::Replay(s) => s.receiver(),
        }
    }

    fn stop(&mut self) {
        match self {
            RunSource::Synthetic(s) => s.stop(),
            RunSource::Replay(s) => s.stop(),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            device_id,
            interval_ms,
            window_ms,
            server,
            source,
            replay_file,
            rate_hz,
            export,
            upload,
            upload_url,
        } => {
            cmd_run(RunOptions {
                device_id,
                interval_ms,
                window_ms,
                server,
                source,
                replay_file,
                rate_hz,
                export,
                upload,
                upload_url,
            });
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

struct RunOptions {
    device_id: Option<String>,
    interval_ms: Option<u64>,
    window_ms: Option<u64>,
    server: Option<String>,
    source: String,
    replay_file: Option<PathBuf>,
    rate_hz: f64,
    export: Option<PathBuf>,
    upload: bool,
    upload_url: Option<String>,
}

fn cmd_run(opts: RunOptions) {
    println!("Mocap Stream Agent v{VERSION}");
    println!();

    // Load configuration, with CLI overrides
    let mut config = Config::load().unwrap_or_default();
    if let Some(id) = opts.device_id {
        config.device_id = id;
    }
    if let Some(interval) = opts.interval_ms {
        config.send_interval_ms = interval;
    }
    if let Some(window) = opts.window_ms {
        config.window_duration_ms = window;
    }
    if let Some(server) = opts.server {
        config.server_addr = server;
    }
    if opts.upload_url.is_some() {
        config.upload_url = opts.upload_url.clone();
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let device_id = config.effective_device_id();
    let window_duration_ms = config.window_duration_ms as f64;

    println!("Starting stream...");
    println!("  Device ID: {device_id}");
    println!("  Server: {}", config.server_addr);
    println!("  Send interval: {}ms", config.send_interval_ms);
    println!("  Window duration: {}ms", config.window_duration_ms);
    println!("  Source: {}", opts.source);
    println!();
    println!("Type a label (optionally `label duration_ms`) + Enter to record a window.");
    println!("Press Ctrl+C to stop");
    println!();

    // Create the event source
    let mut run_source = match opts.source.as_str() {
        "replay" => {
            let path = match opts.replay_file {
                Some(p) => p,
                None => {
                    eprintln!("Error: --replay-file is required with --source replay");
                    std::process::exit(1);
                }
            };
            let mut source = ReplaySource::new(path);
            if let Err(e) = source.start() {
                eprintln!("Error starting replay source: {e}");
                std::process::exit(1);
            }
            RunSource::Replay(source)
        }
        "synthetic" => {
            let mut source = SyntheticSource::new(opts.rate_hz);
            if let Err(e) = source.start() {
                eprintln!("Error starting synthetic source: {e}");
                std::process::exit(1);
            }
            RunSource::Synthetic(source)
        }
        other => {
            eprintln!("Error: unknown source '{other}' (expected synthetic or replay)");
            std::process::exit(1);
        }
    };

    // Open the send channel. A failed connect is not fatal: ticks are
    // skipped until the operator restarts against a live server.
    let mut channel = TcpSendChannel::new(config.server_addr.clone());
    if let Err(e) = channel.connect() {
        warn!("could not connect to {}: {e}; ticks will be skipped", config.server_addr);
    }

    // Recording triggers come from stdin, one label per line.
    let labels = spawn_label_reader();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let stats = create_shared_stats();
    let mut hub = SampleIngestHub::new(device_id.clone());
    let mut sender = PeriodicSender::new(device_id);

    // Monotonic time base for the whole run
    let origin = Instant::now();
    let now_ms = || origin.elapsed().as_secs_f64() * 1000.0;

    sender.start(config.send_interval_ms, now_ms());

    let events = run_source.receiver().clone();

    // Main event loop: all pipeline mutation happens here, in order.
    while running.load(Ordering::SeqCst) {
        crossbeam_channel::select! {
            recv(events) -> msg => match msg {
                Ok(event) => {
                    stats.record_sample();
                    hub.ingest(&event, now_ms());
                }
                Err(_) => {
                    // Replay finished or source dropped; keep ticking so the
                    // operator can still finish a window and export.
                    thread::sleep(Duration::from_millis(10));
                }
            },
            recv(labels) -> msg => {
                if let Ok(line) = msg {
                    let (label, duration) = parse_trigger(&line, window_duration_ms);
                    if !label.is_empty() {
                        // A due finish runs before the new trigger is
                        // considered, so a window that expired between loop
                        // iterations never blocks the next one.
                        if hub.poll(now_ms(), Utc::now()) {
                            stats.record_window();
                            println!(
                                "[{}] Window recorded ({} rows total)",
                                Utc::now().format("%H:%M:%S"),
                                hub.dataset().row_count()
                            );
                        }
                        if hub.start_window(&label, duration, now_ms()) {
                            println!("[recorder] start \"{label}\" for {duration}ms");
                        } else {
                            println!("[recorder] busy, dropped \"{label}\"");
                        }
                    }
                }
            },
            default(Duration::from_millis(10)) => {}
        }

        if hub.poll(now_ms(), Utc::now()) {
            stats.record_window();
            println!(
                "[{}] Window recorded ({} rows total)",
                Utc::now().format("%H:%M:%S"),
                hub.dataset().row_count()
            );
        }

        let skipped_before = sender.skipped_ticks();
        let sent = sender.poll(now_ms(), Utc::now(), hub.snapshot(), &mut channel);
        stats.record_messages_sent(sent);
        stats.record_ticks_skipped(sender.skipped_ticks() - skipped_before);
    }

    // Stop everything
    println!();
    println!("Stopping stream...");
    run_source.stop();
    sender.stop();
    channel.close();

    // Let an in-flight window run to completion before exporting.
    if hub.is_capturing() {
        println!("Waiting for the active window to finish...");
        while hub.is_capturing() {
            thread::sleep(Duration::from_millis(20));
            while let Ok(event) = events.try_recv() {
                stats.record_sample();
                hub.ingest(&event, now_ms());
            }
            if hub.poll(now_ms(), Utc::now()) {
                stats.record_window();
            }
        }
    }

    // Export the dataset
    if !hub.dataset().is_empty() {
        let csv = hub.dataset().to_export_text();
        let ts = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let export_dir = opts.export.unwrap_or_else(|| config.export_path.clone());
        let export_path = export_dir.join(format!("dataset_{ts}.csv"));

        if let Some(parent) = export_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(&export_path, &csv) {
            Ok(_) => println!(
                "Exported {} rows to {:?}",
                hub.dataset().row_count(),
                export_path
            ),
            Err(e) => eprintln!("Error writing export: {e}"),
        }

        if opts.upload {
            upload_csv(&config, &csv);
        }
    } else {
        println!("No windows recorded; nothing to export.");
    }

    // Session stats
    if let Err(e) = stats.save(&config.data_path.join("session_stats.json")) {
        eprintln!("Warning: Could not save session stats: {e}");
    }
    println!();
    println!("{}", stats.summary());
    match sender.last_sent_at() {
        Some(at) => println!("Last message sent: {}", at.format("%Y-%m-%d %H:%M:%S%.3f UTC")),
        None => println!("Last message sent: never"),
    }
}

/// Read recording triggers from stdin, one per line.
fn spawn_label_reader() -> Receiver<String> {
    let (sender, receiver) = bounded(16);
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    receiver
}

/// Parse `label [duration_ms]` from a trigger line.
fn parse_trigger(line: &str, default_duration_ms: f64) -> (String, f64) {
    let mut parts = line.trim().split_whitespace();
    let label = parts.next().unwrap_or("").to_string();
    let duration = parts
        .next()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .unwrap_or(default_duration_ms);
    (label, duration)
}

#[cfg(feature = "upload")]
fn upload_csv(config: &Config, csv: &str) {
    use mocap_stream_agent::uploader::BlockingDatasetUploader;

    let url = match config.upload_url {
        Some(ref url) => url.clone(),
        None => {
            eprintln!("Error: no upload URL configured (set upload_url or pass --upload-url)");
            return;
        }
    };

    match BlockingDatasetUploader::new(url) {
        Ok(uploader) => match uploader.upload_csv(csv) {
            Ok(_) => println!("Dataset uploaded."),
            Err(e) => eprintln!("Upload failed: {e}"),
        },
        Err(e) => eprintln!("Upload failed: {e}"),
    }
}

#[cfg(not(feature = "upload"))]
fn upload_csv(_config: &Config, _csv: &str) {
    eprintln!("Warning: --upload ignored (upload feature not enabled at compile time)");
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
