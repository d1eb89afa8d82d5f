//! Thin control-socket client: sends one JSON request, prints the response.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use clap::Args;
use hoopipi_control::server::default_socket_path;

#[derive(Args)]
pub struct StatusArgs {
    /// Control socket path (defaults to `$XDG_RUNTIME_DIR/hoopipi.sock`).
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Action to send (defaults to `getStatus`).
    #[arg(long, default_value = "getStatus")]
    action: String,
}

pub fn run(args: StatusArgs) -> anyhow::Result<()> {
    let socket_path = args.socket.unwrap_or_else(default_socket_path);
    let mut stream = UnixStream::connect(&socket_path)
        .map_err(|e| anyhow::anyhow!("couldn't connect to {}: {e}", socket_path.display()))?;

    let request = serde_json::json!({ "action": args.action });
    stream.write_all(request.to_string().as_bytes())?;
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut response = String::new();
    stream.read_to_string(&mut response)?;

    let parsed: serde_json::Value = serde_json::from_str(&response)
        .map_err(|e| anyhow::anyhow!("malformed response from control socket: {e}"))?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);

    Ok(())
}
