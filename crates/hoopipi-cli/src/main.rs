//! HoopiPi CLI - process-local entry point for the real-time guitar engine.
//!
//! `hoopipi run` wires a [`hoopipi_engine::Engine`] to a duplex audio stream
//! and a Unix-domain-socket control façade, loads `runtime.json` at startup
//! and persists it (debounced) as parameters change, and blocks until
//! Ctrl-C. `hoopipi devices` lists the audio devices the default backend
//! sees, and `hoopipi status` is a thin control-socket client for
//! `getStatus`, both matching the device-enumeration / inspection commands
//! a DSP CLI in this space ships alongside its real-time mode.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hoopipi")]
#[command(author, version, about = "HoopiPi real-time guitar engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine against a live audio device, with the control façade
    /// and config persistence active.
    Run(commands::run::RunArgs),

    /// List available audio devices.
    Devices(commands::devices::DevicesArgs),

    /// Send one request to a running instance's control socket and print
    /// the response (primarily `getStatus`).
    Status(commands::status::StatusArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}
