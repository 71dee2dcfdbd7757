//! ScreenX Cinema - headless driver
//!
//! Runs the media core in a frame loop and reads key presses from stdin, one
//! per line ("Space", "3", "Digit5"). Extra line commands: `status` prints the
//! JSON snapshot, `overlay` prints the overlay text, `quit` exits.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use screenx_cinema::audio::{AudioBackend, ContextState, CHANNEL_COUNT};
use screenx_cinema::session::SessionConfig;
use screenx_cinema::settings::{AppPreferences, CinemaSettings};
use screenx_cinema::telemetry::{init_logging, LogConfig};
use screenx_cinema::{CinemaSession, FileMediaFactory, KeyInput, Scene, SoftwareAudioContext};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const SAMPLE_RATE: f32 = 48_000.0;

#[derive(Parser)]
#[command(name = "screenx-cinema")]
#[command(author, version, about = "Three-panel cinema media core", long_about = None)]
struct Cli {
    /// Cinema environment XML file (defaults to the last one opened)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Directory media asset paths are resolved against
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Override the frame rate from the settings file
    #[arg(long)]
    fps: Option<u32>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log in JSON format
    #[arg(long)]
    json_logs: bool,

    /// Environment model file; whether it exists is reported as scene loaded
    #[arg(long)]
    scene_model: Option<PathBuf>,

    /// Print the overlay every N seconds (0 disables)
    #[arg(long, default_value_t = 0.0)]
    status_interval: f64,

    /// Write the default settings to this file and exit
    #[arg(long)]
    write_default_settings: Option<PathBuf>,
}

/// Settings from the command line, the last opened file, or defaults
fn load_settings(cli: &Cli) -> anyhow::Result<(CinemaSettings, Option<PathBuf>)> {
    let mut preferences = AppPreferences::load();
    if let Some(path) = &cli.settings {
        let settings = CinemaSettings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        preferences.set_last_opened(path);
        return Ok((settings, Some(path.clone())));
    }
    if let Some(last_file) = preferences.get_last_opened() {
        tracing::info!("Loading last opened file: {}", last_file.display());
        match CinemaSettings::load_from_file(&last_file) {
            Ok(settings) => return Ok((settings, Some(last_file))),
            Err(e) => tracing::warn!("Failed to load last file: {}", e),
        }
    }
    Ok((CinemaSettings::default(), None))
}

enum LineCommand {
    Key(KeyInput),
    Status,
    Overlay,
    Quit,
}

fn parse_line(line: &str) -> LineCommand {
    match line.trim() {
        "status" => LineCommand::Status,
        "overlay" => LineCommand::Overlay,
        "quit" | "exit" | "q" => LineCommand::Quit,
        // FromStr for KeyInput cannot fail
        _ => LineCommand::Key(line.parse().unwrap_or(KeyInput::Other)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        log_file: cli.log_file.clone(),
        json: cli.json_logs,
    };
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("ScreenX Cinema v{}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &cli.write_default_settings {
        CinemaSettings::default()
            .save_to_file(path)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        tracing::info!("Default settings written to {}", path.display());
        return Ok(());
    }

    let (mut settings, settings_file) = load_settings(&cli)?;
    if let Some(fps) = cli.fps {
        settings.target_fps = fps;
        settings.clamp_fps();
    }
    tracing::info!("Target FPS: {}", settings.target_fps);

    let config = SessionConfig::from_settings(&settings).context("Invalid cinema settings")?;

    let mut scene = Scene::new();
    config.layout.populate(&mut scene);

    let asset_dir = cli
        .assets
        .clone()
        .or_else(|| settings_file.as_deref().and_then(Path::parent).map(Path::to_path_buf));
    let factory = FileMediaFactory::new(asset_dir);
    let audio = SoftwareAudioContext::new(SAMPLE_RATE);

    let mut session = CinemaSession::new(config, scene, audio, factory);

    let model = cli
        .scene_model
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.scene_model));
    session.set_scene_loaded(model.is_file());

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    let frame_period = Duration::from_secs_f64(1.0 / settings.target_fps as f64);
    let mut frames = tokio::time::interval(frame_period);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let sample_rate = session.audio_backend().sample_rate() as f64;
    let samples_per_frame = (sample_rate * frame_period.as_secs_f64()).round() as usize * CHANNEL_COUNT;
    let silence = vec![0.0f32; samples_per_frame];

    let status_period = (cli.status_interval > 0.0).then(|| Duration::from_secs_f64(cli.status_interval));
    let mut last_status = Instant::now();

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                session.tick(now);
                session.finish_pending_seek(now).await;
                // No decoder is attached; pulling silence keeps the output clock moving
                if session.audio_backend().state() == ContextState::Running {
                    session.audio_backend_mut().render(&silence);
                }
                if let Some(period) = status_period {
                    if now.duration_since(last_status) >= period {
                        last_status = now;
                        println!("{}\n", session.status().overlay_text());
                    }
                }
            }
            line = rx.recv() => {
                let Some(line) = line else {
                    tracing::info!("Input closed, exiting");
                    break;
                };
                match parse_line(&line) {
                    LineCommand::Quit => break,
                    LineCommand::Status => match serde_json::to_string(&session.status()) {
                        Ok(json) => println!("{}", json),
                        Err(e) => tracing::warn!("Failed to serialize status: {}", e),
                    },
                    LineCommand::Overlay => println!("{}", session.status().overlay_text()),
                    LineCommand::Key(key) => {
                        if session.handle_key(key, Instant::now()).await.is_none() {
                            tracing::debug!("Ignoring input {:?}", line.trim());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
