//! gesture-pilot CLI
//!
//! Hand-gesture navigation commands from a camera feed.

use chrono::Utc;
use clap::{Parser, Subcommand};
use gesture_pilot::{
    activity::create_shared_log_with_persistence,
    config::Config,
    core::{CommandEvent, EmitPolicy, Emitter, GesturePipeline, Mode, Transition},
    source::{check_camera_permission, FrameSource, ReplayConfig, ReplaySource},
    GESTURE_REFERENCE, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Parser)]
#[command(name = "gesture-pilot")]
#[command(version = VERSION)]
#[command(about = "Hand-gesture navigation commands from a camera feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start recognizing gestures from a landmark capture
    Start {
        /// JSON Lines capture to replay
        #[arg(long, short)]
        input: PathBuf,

        /// Replay rate in frames per second (defaults to the configured rate)
        #[arg(long)]
        fps: Option<u32>,

        /// Publish only when the stable command changes
        #[arg(long)]
        on_change: bool,
    },

    /// Suspend recognition on a running agent
    Suspend,

    /// Wake recognition on a running agent
    Wake,

    /// Show current configuration and cumulative statistics
    Status,

    /// Display the gesture reference card
    Gestures,

    /// Export published commands
    Export {
        /// Directory holding session files
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_pilot=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            input,
            fps,
            on_change,
        } => {
            cmd_start(input, fps, on_change);
        }
        Commands::Suspend => {
            cmd_set_suspended(true);
        }
        Commands::Wake => {
            cmd_set_suspended(false);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Gestures => {
            println!("{GESTURE_REFERENCE}");
        }
        Commands::Export { output, format } => {
            cmd_export(output, &format);
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn cmd_start(input: PathBuf, fps: Option<u32>, on_change: bool) {
    println!("gesture-pilot v{VERSION}");
    println!();

    if !check_camera_permission(&input) {
        eprintln!("Error: Permission denied reading {}", input.display());
        std::process::exit(1);
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config, using defaults: {e}");
        Config::default()
    });
    if let Some(fps) = fps {
        config.frame_rate = fps;
    }
    if on_change {
        config.emit_policy = EmitPolicy::OnChange;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Starting recognition...");
    println!("  Input: {}", input.display());
    println!("  Frame rate: {} fps", config.frame_rate);
    println!("  Suspend after: {}ms idle", config.suspend_after.as_millis());
    println!("  Wake threshold: {}", config.motion_wake_threshold);
    println!(
        "  Publishing: {}",
        match config.emit_policy {
            EmitPolicy::EveryFrame => "every frame",
            EmitPolicy::OnChange => "on change",
        }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let activity_log = create_shared_log_with_persistence(config.data_path.join("activity.json"));

    let (emitter, events) = Emitter::channel();
    let mut pipeline =
        GesturePipeline::new(config.pipeline(), emitter).with_activity_log(activity_log.clone());
    let mut source = ReplaySource::new(ReplayConfig::new(input.clone(), config.frame_rate));

    let session_id = uuid::Uuid::new_v4().to_string();
    let session_start = Instant::now();
    if pipeline.start_with(&mut source, session_start).is_err() {
        eprintln!("{}", pipeline.status());
        std::process::exit(1);
    }
    println!("Session: {session_id}");
    println!("{}", pipeline.status());

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    // `gesture-pilot suspend/wake` flips `suspended` in the config file; only
    // changes are acted on, so automatic transitions are left alone.
    let mut requested_suspended = config.suspended;
    if requested_suspended {
        pipeline.set_mode(Mode::Suspended, session_start);
        println!("{}", pipeline.status());
    }
    let mut last_config_check = Instant::now();
    let mut last_frame_at = session_start;

    let mut published: Vec<CommandEvent> = Vec::new();
    let mut last_printed: Option<String> = None;
    let receiver = source.receiver().clone();

    while running.load(Ordering::SeqCst) {
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                if cfg.suspended != requested_suspended {
                    requested_suspended = cfg.suspended;
                    let mode = if requested_suspended {
                        Mode::Suspended
                    } else {
                        Mode::Active
                    };
                    if pipeline.set_mode(mode, last_frame_at).is_some() {
                        println!("{}", pipeline.status());
                    }
                }
            }
            last_config_check = Instant::now();
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(sample) => {
                // Capture timestamps drive the clock so replays are repeatable.
                let now = session_start + Duration::from_millis(sample.timestamp_ms);
                last_frame_at = now;

                let input = match sample.into_input() {
                    Ok(input) => input,
                    Err(e) => {
                        warn!("skipping frame: {e}");
                        continue;
                    }
                };

                if let Some(report) = pipeline.process_frame(&input, now) {
                    if let Some(transition) = report.transition {
                        print_transition(transition, &pipeline);
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                println!("End of capture.");
                break;
            }
        }

        for event in events.try_iter() {
            if last_printed.as_deref() != Some(event.command.as_str()) {
                println!(
                    "[{}] {} → {}",
                    event.emitted_at.format("%H:%M:%S"),
                    event.source,
                    event.command
                );
                last_printed = Some(event.command.clone());
            }
            published.push(event);
        }
    }

    println!();
    println!("Stopping recognition...");
    source.stop();
    pipeline.stop();
    published.extend(events.try_iter());

    if let Err(e) = activity_log.save() {
        eprintln!("Warning: Could not save activity log: {e}");
    }

    if !published.is_empty() {
        let export_path = config.export_path.join(format!(
            "session_{}_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &session_id[..8]
        ));

        if let Some(parent) = export_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match serde_json::to_string_pretty(&published) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&export_path, json) {
                    eprintln!("Error writing commands: {e}");
                } else {
                    println!(
                        "Exported {} command events to {:?}",
                        published.len(),
                        export_path
                    );
                }
            }
            Err(e) => {
                eprintln!("Error serializing commands: {e}");
            }
        }
    }

    println!();
    println!("{}", activity_log.summary());
}

fn print_transition(transition: Transition, pipeline: &GesturePipeline) {
    let mode = transition.mode();
    println!("[{}] {}", mode, pipeline.status());
}

fn cmd_set_suspended(suspended: bool) {
    let mut config = Config::load().unwrap_or_default();
    config.suspended = suspended;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    if suspended {
        println!("Recognition suspended. Use 'gesture-pilot wake' to resume.");
    } else {
        println!("Recognition resumed.");
    }
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("gesture-pilot Status");
    println!("====================");
    println!();

    println!("Configuration:");
    println!("  Suspend after: {}ms", config.suspend_after.as_millis());
    println!("  Wake threshold: {}", config.motion_wake_threshold);
    println!("  Stable frames: {}", config.stable_frames);
    println!("  Mirrored view: {}", config.mirrored_view);
    println!("  Suspend requested: {}", config.suspended);
    println!();

    let stats_path = config.data_path.join("activity.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                for (key, label) in [
                    ("frames_processed", "Frames processed"),
                    ("hands_detected", "Frames with a hand"),
                    ("commands_emitted", "Commands published"),
                    ("suspensions", "Suspensions"),
                    ("wakes", "Wakes"),
                ] {
                    if let Some(value) = stats.get(key) {
                        println!("  {label}: {value}");
                    }
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_export(output: Option<PathBuf>, format: &str) {
    let config = Config::load().unwrap_or_default();
    let export_dir = output.unwrap_or(config.export_path.clone());

    let session_files: Vec<PathBuf> = std::fs::read_dir(&export_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension().map(|e| e == "json").unwrap_or(false)
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.starts_with("session_"))
                            .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();

    if session_files.is_empty() {
        println!("No session data found in {export_dir:?}");
        println!("Run 'gesture-pilot start' to begin recognizing gestures.");
        return;
    }

    println!(
        "Found {} session file(s) in {:?}",
        session_files.len(),
        export_dir
    );

    let mut all_events: Vec<CommandEvent> = Vec::new();
    for file in &session_files {
        if let Ok(content) = std::fs::read_to_string(file) {
            if let Ok(events) = serde_json::from_str::<Vec<CommandEvent>>(&content) {
                all_events.extend(events);
            }
        }
    }
    all_events.sort_by_key(|e| e.emitted_at);

    println!("Total command events: {}", all_events.len());

    let output_path = export_dir.join(format!(
        "export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        if format == "jsonl" { "jsonl" } else { "json" }
    ));

    let result = if format == "jsonl" {
        let lines: Vec<String> = all_events
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect();
        std::fs::write(&output_path, lines.join("\n"))
    } else {
        match serde_json::to_string_pretty(&all_events) {
            Ok(json) => std::fs::write(&output_path, json),
            Err(e) => {
                eprintln!("Error serializing: {e}");
                return;
            }
        }
    };

    match result {
        Ok(_) => println!("Exported to {output_path:?}"),
        Err(e) => eprintln!("Error writing export: {e}"),
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

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        warn!("could not install Ctrl+C handler: {e}");
    }
}
