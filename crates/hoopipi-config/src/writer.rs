//! Debounced background writer for `runtime.json` (§11): config writes
//! never block the RT path or the control thread that triggered them.
//! Matches the existing-workspace convention of deferring disk I/O onto its
//! own thread fed by a small channel.

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::runtime::RuntimeConfig;

/// How long the writer waits for a quiet period before committing a
/// snapshot to disk. Rapid-fire setter calls (e.g. a GUI knob drag)
/// coalesce into a single write.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Owns the writer thread's sending half. Dropping this stops the thread
/// after flushing any pending snapshot.
pub struct ConfigWriter {
    sender: Option<Sender<RuntimeConfig>>,
    handle: Option<JoinHandle<()>>,
}

impl ConfigWriter {
    /// Spawns the writer thread targeting `path`.
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = mpsc::channel::<RuntimeConfig>();
        let handle = std::thread::spawn(move || {
            loop {
                let Ok(mut pending) = receiver.recv() else { break };
                // Drain any snapshots queued during the debounce window,
                // keeping only the most recent one.
                loop {
                    match receiver.recv_timeout(DEBOUNCE) {
                        Ok(newer) => pending = newer,
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => {
                            let _ = pending.save(&path);
                            return;
                        }
                    }
                }
                if let Err(err) = pending.save(&path) {
                    tracing::warn!(error = %err, path = %path.display(), "failed to write runtime config");
                }
            }
        });
        Self { sender: Some(sender), handle: Some(handle) }
    }

    /// Queues a snapshot to be written after the debounce window. Never
    /// blocks the caller on disk I/O.
    pub fn queue_write(&self, snapshot: RuntimeConfig) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(snapshot);
        }
    }
}

impl Drop for ConfigWriter {
    fn drop(&mut self) {
        // Drop the sender first so the writer thread's `recv` sees
        // `Disconnected` and exits instead of blocking `join` forever.
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_write_lands_on_disk_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        let writer = ConfigWriter::spawn(path.clone());

        let mut config = RuntimeConfig::default();
        config.reverb_wet = 0.42;
        writer.queue_write(config);
        drop(writer);

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.reverb_wet, 0.42);
    }

    #[test]
    fn rapid_successive_writes_coalesce_to_the_latest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        let writer = ConfigWriter::spawn(path.clone());

        for i in 0..5 {
            let mut config = RuntimeConfig::default();
            config.active_slot = i;
            writer.queue_write(config);
        }
        drop(writer);

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.active_slot, 4);
    }
}
