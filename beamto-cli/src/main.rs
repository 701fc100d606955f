//! Command-line client for the beamto file-drop service.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "beamto",
    version,
    about = "Send files to devices paired with the beamto service"
)]
struct Cli {
    /// Service socket path (default: the well-known beamto socket,
    /// or $BEAMTO_SOCKET if set).
    #[arg(long, global = true, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Seconds to wait for the service per call; 0 waits forever.
    #[arg(long, global = true, default_value_t = 5, value_name = "SECS")]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List devices currently paired with the service.
    Devices {
        /// Output format.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Send files to a paired device.
    ///
    /// DEVICE is an id from `beamto devices`. The transfer itself runs in
    /// the background service; this command only submits the job.
    Send {
        /// Target device id.
        device: String,

        /// Files to send.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for `devices`.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = Cli::parse().dispatch() {
        eprintln!("beamto: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        let Self { socket, timeout, command } = self;
        match command {
            Command::Devices { format } => devices(socket, timeout, format),
            Command::Send { device, files } => send(socket, timeout, &device, &files),
            Command::Completion { shell } => {
                clap_complete::generate(
                    shell,
                    &mut Self::command(),
                    "beamto",
                    &mut std::io::stdout(),
                );
                Ok(())
            }
        }
    }
}

#[cfg(unix)]
fn build_client(socket: Option<PathBuf>, timeout_secs: u64) -> beamto::Client {
    let client = match socket {
        Some(path) => beamto::Client::with_endpoint(path),
        None => beamto::Client::new(),
    };
    let timeout = (timeout_secs > 0).then(|| std::time::Duration::from_secs(timeout_secs));
    client.timeout(timeout)
}

#[cfg(unix)]
fn devices(socket: Option<PathBuf>, timeout: u64, format: OutputFormat) -> Result<()> {
    let client = build_client(socket, timeout);
    let devices = match client.list_devices() {
        Err(e) if e.is_unavailable() => {
            anyhow::bail!("service is not running at {}", client.endpoint().display())
        }
        result => result?,
    };

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No paired devices.");
        return Ok(());
    }

    println!("{:<24} NAME", "ID");
    for device in &devices {
        println!("{:<24} {}", device.id, device.display_name);
    }
    Ok(())
}

#[cfg(unix)]
fn send(socket: Option<PathBuf>, timeout: u64, device: &str, files: &[PathBuf]) -> Result<()> {
    let client = build_client(socket, timeout);

    // The wire carries UTF-8 path strings. Resolve each argument to an
    // absolute path and reject names that cannot be represented rather
    // than submitting something lossy the service cannot open.
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        let abs = std::fs::canonicalize(file)
            .with_context(|| format!("cannot resolve {}", file.display()))?;
        let text = abs
            .to_str()
            .with_context(|| format!("path is not valid UTF-8: {}", abs.display()))?;
        paths.push(text.to_owned());
    }

    match client.send_files(device, &paths) {
        Ok(()) => {
            println!("submitted {} file(s) to {device}", paths.len());
            Ok(())
        }
        Err(e) if e.is_unavailable() => {
            anyhow::bail!("service is not running at {}", client.endpoint().display())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn devices(_socket: Option<PathBuf>, _timeout: u64, _format: OutputFormat) -> Result<()> {
    anyhow::bail!("Talking to the beamto service requires Linux or macOS")
}

#[cfg(not(unix))]
fn send(_socket: Option<PathBuf>, _timeout: u64, _device: &str, _files: &[PathBuf]) -> Result<()> {
    anyhow::bail!("Talking to the beamto service requires Linux or macOS")
}
