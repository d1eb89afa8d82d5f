//! Unix-domain-socket transport (§4.8 "Transport \[ambient\]").
//!
//! One request per connection: the acceptor thread hands each connection to
//! a short-lived handler thread, which reads until the client shuts down its
//! write half (or a 4 KiB cap is hit), dispatches the request, writes the
//! JSON response, and exits. Plain blocking I/O throughout — this is
//! entirely off the RT path.

use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use hoopipi_engine::Engine;

use crate::dispatch;

/// Requests larger than this are truncated at the read boundary rather than
/// read indefinitely (§4.8, §6 "≤ 4 KiB").
const MAX_REQUEST_BYTES: usize = 4096;

/// Resolves the default socket path: `$XDG_RUNTIME_DIR/hoopipi.sock` if set,
/// else `/tmp/hoopipi.sock` (§4.8).
pub fn default_socket_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("hoopipi.sock")
}

/// A running control façade: owns the acceptor thread and stops it on drop.
pub struct ControlServer {
    running: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
    socket_path: PathBuf,
}

impl ControlServer {
    /// Binds `socket_path`, removing a stale socket file left behind by a
    /// previous crashed instance, and spawns the acceptor thread.
    ///
    /// `engine` is shared with the audio thread behind a [`Mutex`]: every
    /// request locks it briefly to dispatch, while the audio callback locks
    /// it once per period to call `process_stereo`. Parameter reads/writes
    /// inside a locked period are the cheap atomic/`ArcSwap` operations
    /// already used by the RT path, so contention is brief even though the
    /// lock itself is a host-level convenience rather than a lock-free
    /// handoff.
    ///
    /// Uses [`parking_lot`]'s `Mutex` rather than the standard library's: no
    /// poisoning means a handler thread that panics mid-dispatch can't taint
    /// every later lock attempt from the audio callback.
    pub fn bind(socket_path: &Path, engine: Arc<Mutex<Engine>>) -> std::io::Result<Self> {
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }
        let listener = UnixListener::bind(socket_path)?;
        let running = Arc::new(AtomicBool::new(true));

        let acceptor_running = Arc::clone(&running);
        let acceptor = std::thread::spawn(move || accept_loop(listener, engine, acceptor_running));

        tracing::info!(path = %socket_path.display(), "control façade listening");
        Ok(Self {
            running,
            acceptor: Some(acceptor),
            socket_path: socket_path.to_path_buf(),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Stops the acceptor thread and removes the socket file. Any handler
    /// threads already dispatched finish on their own.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        // Unblock the acceptor's blocking `accept()` by connecting once.
        let _ = UnixStream::connect(&self.socket_path);
        if let Some(handle) = self.acceptor.take() {
            let _ = handle.join();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        if self.acceptor.is_some() {
            self.shutdown();
        }
    }
}

fn accept_loop(listener: UnixListener, engine: Arc<Mutex<Engine>>, running: Arc<AtomicBool>) {
    for incoming in listener.incoming() {
        if !running.load(Ordering::Acquire) {
            break;
        }
        let Ok(stream) = incoming else { continue };
        let engine = Arc::clone(&engine);
        // One short-lived handler thread per connection, matching the
        // request/reply CLI pattern's non-RT worker-per-task convention.
        std::thread::spawn(move || handle_connection(stream, &engine));
    }
}

fn handle_connection(mut stream: UnixStream, engine: &Mutex<Engine>) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let remaining = MAX_REQUEST_BYTES.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(remaining)]);
                if buf.len() >= MAX_REQUEST_BYTES {
                    break;
                }
            }
            Err(_) => return,
        }
    }

    let body = String::from_utf8_lossy(&buf);
    tracing::debug!(request = %body, "control request");
    let response = {
        let guard = engine.lock();
        dispatch::handle(&guard, &body)
    };
    let response_text = response.to_string();
    tracing::debug!(response = %response_text, "control response");
    let _ = stream.write_all(response_text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoopipi_engine::model::NullModelLoader;

    #[test]
    fn round_trips_a_get_status_request() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");
        let engine = Arc::new(Mutex::new(Engine::new(48_000.0, 512, Arc::new(NullModelLoader))));
        let mut server = ControlServer::bind(&socket_path, engine).unwrap();

        let mut stream = UnixStream::connect(&socket_path).unwrap();
        stream.write_all(br#"{"action":"getStatus"}"#).unwrap();
        stream.shutdown(std::net::Shutdown::Write).unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["success"], true);

        server.shutdown();
    }
}
