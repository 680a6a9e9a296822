//! Trackline Player - headless target/sample session driver
//!
//! This is the main entry point. It:
//! 1. Loads the session configuration (YAML)
//! 2. Registers the configured sources with the simulated audio backend
//! 3. Reads commands from stdin on a helper thread
//! 4. Runs the session at 60 ticks per second until `quit`
//!
//! ## Command line flags
//!
//! - `--config <path>`: use a config file other than the default
//! - `--write-default-config`: write the default config to the config path and exit

mod input;
mod presenter;
mod sources;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel;
use crossbeam::select;

use trackline_core::backend::CursorId;
use trackline_core::config::{default_config_path, load_config, save_config, SessionConfig};
use trackline_core::{Session, TickReport};

use input::{spawn_stdin_reader, PlayerInput, HELP};
use presenter::LogPresenter;

/// One tick at ~60 Hz
const TICK: Duration = Duration::from_millis(16);

fn config_path_from_args(args: &[String]) -> PathBuf {
    args.iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

fn print_status(report: Option<&TickReport>, presenter: &LogPresenter) {
    let Some(report) = report else {
        println!("no tick yet");
        return;
    };
    let samples: Vec<&str> = report.sample_states.iter().map(|s| s.name()).collect();
    println!(
        "target: {} @ {} ms | samples: [{}]",
        report.target_state.name(),
        report.target_position_ms,
        samples.join(", ")
    );
    match report.scale {
        Some(scale) => println!(
            "timeline: reference {} ms, {:.6} px/ms",
            scale.reference_length_ms,
            scale.width_per_ms()
        ),
        None => println!("timeline: waiting for target length"),
    }
    if let Some(cursor) = presenter.cursor(CursorId::Group) {
        println!("group cursor: x = {:.2}", cursor.x);
    }
    println!(
        "waveforms bound: {}, curve redraws: {}",
        presenter.waveforms_bound(),
        presenter.polylines_drawn()
    );
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = config_path_from_args(&args);

    if args.iter().any(|arg| arg == "--write-default-config") {
        save_config(&SessionConfig::default(), &config_path)
            .with_context(|| format!("Failed to write default config to {:?}", config_path))?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    log::info!("trackline-player starting up");
    let config: SessionConfig = load_config(&config_path);

    let mut backend = sources::build_backend(&config);
    let mut session = Session::new(config, &mut backend).context("Failed to create session")?;
    let mut presenter = LogPresenter::new();

    let (input_tx, input_rx) = channel::unbounded();
    let _input_thread = spawn_stdin_reader(input_tx).context("Failed to spawn stdin reader")?;
    let ticker = channel::tick(TICK);

    println!("{}", HELP);

    let mut last_tick = Instant::now();
    let mut last_report: Option<TickReport> = None;

    loop {
        select! {
            recv(input_rx) -> input => {
                match input {
                    Ok(PlayerInput::Session(command)) => {
                        let outcome = session.apply(command, &mut presenter);
                        log::info!("{:?} -> {:?}", command, outcome);
                    }
                    Ok(PlayerInput::Status) => print_status(last_report.as_ref(), &presenter),
                    Ok(PlayerInput::Help) => println!("{}", HELP),
                    Ok(PlayerInput::Quit) | Err(_) => break,
                }
            }
            recv(ticker) -> now => {
                let now = now.unwrap_or_else(|_| Instant::now());
                let dt = now.saturating_duration_since(last_tick);
                last_tick = now;

                backend.advance(dt.as_secs_f64() * 1000.0);
                last_report = Some(session.tick(&mut backend, &mut presenter));
            }
        }
    }

    log::info!("trackline-player shutting down");
    // Dropping the session releases every instance handle
    drop(session);
    log::debug!("released {} instance(s)", backend.released_count());
    Ok(())
}
