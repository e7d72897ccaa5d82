//! `ucad`: the UCA-NET daemon binary. CLI parsing, configuration loading,
//! logging initialization and graceful-shutdown wiring around
//! `uca_server::serve` (spec.md §6.5, §7.3).

use std::collections::HashMap;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use uca_camera::SimulatedCamera;

/// `ucad [--port P] [--log-level L] [--config PATH] <camera-name> [prop=val ...]`
#[derive(Parser, Debug)]
#[command(name = "ucad", about = "UCA-NET remote camera daemon")]
struct Cli {
    /// TCP port to listen on; overrides the config file and environment.
    #[arg(long)]
    port: Option<u16>,

    /// Log level passed to `uca_telemetry::init` when `RUST_LOG` is unset.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Optional TOML configuration file (SPEC_FULL.md §7.3).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera to expose. Only `"simulated"` is built in (spec.md §1).
    camera_name: String,

    /// Initial property overrides as `name=value` pairs, applied in order.
    props: Vec<String>,
}

fn main() {
    std::process::exit(match run() {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "ucad exited with an error");
            1
        }
    });
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut cli_overrides = HashMap::new();
    if let Some(port) = cli.port {
        cli_overrides.insert("port".to_string(), port.to_string());
    }
    if let Some(level) = &cli.log_level {
        cli_overrides.insert("log_level".to_string(), level.clone());
    }
    let config = uca_config::load_config(cli.config.as_deref(), &cli_overrides)?;

    uca_telemetry::init(&config.logging.level);
    tracing::info!(port = config.server.port, camera = %cli.camera_name, "starting ucad");

    let mut camera = match cli.camera_name.as_str() {
        "simulated" => SimulatedCamera::new("simulated"),
        other => return Err(format!("no such camera: {other}").into()),
    };
    for assignment in &cli.props {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("malformed property assignment: {assignment}"))?;
        uca_camera::Camera::set_property(&mut camera, name, value)?;
    }

    let listener = TcpListener::bind(("0.0.0.0", config.server.port))?;
    tracing::info!(port = config.server.port, "listening");

    let running = Arc::new(AtomicBool::new(true));
    let handler_running = Arc::clone(&running);
    ctrlc::set_handler(move || {
        tracing::info!("received shutdown signal");
        handler_running.store(false, Ordering::Relaxed);
    })?;

    uca_server::serve(listener, camera, running)?;
    tracing::info!("ucad shut down cleanly");
    Ok(())
}
