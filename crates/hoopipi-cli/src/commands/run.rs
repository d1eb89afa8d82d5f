//! Runs the engine against a live duplex audio stream with the control
//! façade and config persistence active, blocking until Ctrl-C.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use parking_lot::Mutex;

use hoopipi_config::{paths, ConfigWriter, RuntimeConfig};
use hoopipi_control::server::default_socket_path;
use hoopipi_control::ControlServer;
use hoopipi_engine::model::NullModelLoader;
use hoopipi_engine::Engine;
use hoopipi_io::backend::{AudioBackend, BackendStreamConfig};
use hoopipi_io::cpal_backend::CpalBackend;
use hoopipi_io::priority;

#[derive(Args)]
pub struct RunArgs {
    /// Audio device name (case-insensitive substring match); uses the
    /// system default input/output device if omitted.
    #[arg(long)]
    device: Option<String>,

    /// Sample rate in Hz.
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    /// Period size in frames.
    #[arg(long, default_value_t = 256)]
    buffer_size: u32,

    /// Override the `runtime.json` path (defaults to the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the control socket path.
    #[arg(long)]
    socket: Option<PathBuf>,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config_path = args.config.unwrap_or_else(paths::runtime_file_path);
    let socket_path = args.socket.unwrap_or_else(default_socket_path);

    let loaded_config = RuntimeConfig::load(&config_path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", config_path.display()))?;

    let engine = Arc::new(Mutex::new(Engine::new(
        args.sample_rate as f32,
        args.buffer_size as usize,
        Arc::new(NullModelLoader),
    )));

    {
        let guard = engine.lock();
        hoopipi_config::apply_to_engine(&loaded_config, &guard);
    }

    let writer = ConfigWriter::spawn(config_path.clone());
    {
        let guard = engine.lock();
        let snapshot = hoopipi_config::snapshot_from_engine(&guard, loaded_config.extra.clone());
        writer.queue_write(snapshot);
    }

    let mut control_server = ControlServer::bind(&socket_path, Arc::clone(&engine))?;
    println!("Control façade listening on {}", control_server.socket_path().display());

    let backend = CpalBackend::new();
    let stream_config = BackendStreamConfig {
        sample_rate: args.sample_rate,
        buffer_size: args.buffer_size,
        channels: 2,
        device_name: args.device.clone(),
    };

    let channels = stream_config.channels as usize;
    let mut scratch_l = vec![0.0f32; args.buffer_size as usize];
    let mut scratch_r = vec![0.0f32; args.buffer_size as usize];
    let mut out_l = vec![0.0f32; args.buffer_size as usize];
    let mut out_r = vec![0.0f32; args.buffer_size as usize];

    let process_engine = Arc::clone(&engine);
    let process = Box::new(move |input: &[f32], output: &mut [f32]| {
        priority::elevate_current_thread();

        let frames = output.len() / channels;
        scratch_l.resize(frames, 0.0);
        scratch_r.resize(frames, 0.0);
        out_l.resize(frames, 0.0);
        out_r.resize(frames, 0.0);

        deinterleave_stereo(input, &mut scratch_l, &mut scratch_r);

        {
            let mut guard = process_engine.lock();
            guard.process_stereo(&scratch_l, Some(&scratch_r), &mut out_l, &mut out_r, frames);
        }

        interleave_stereo(&out_l, &out_r, output);
    });

    let error_callback = Box::new(|msg: &str| {
        tracing::error!(error = %msg, "audio stream error");
    });

    let (_input_stream, _output_stream) = backend.build_duplex_stream(&stream_config, process, error_callback)?;

    println!("Running at {} Hz, {} frames/period. Press Ctrl+C to stop.", args.sample_rate, args.buffer_size);

    let running = Arc::new(AtomicBool::new(true));
    let ctrlc_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        ctrlc_flag.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    println!("\nStopping...");
    drop(_input_stream);
    drop(_output_stream);
    control_server.shutdown();

    {
        let guard = engine.lock();
        let snapshot = hoopipi_config::snapshot_from_engine(&guard, loaded_config.extra.clone());
        writer.queue_write(snapshot);
    }
    drop(writer);

    Ok(())
}

/// Splits an interleaved `[L0, R0, L1, R1, ...]` buffer into separate L/R
/// channel buffers, resizing the destinations to match.
fn deinterleave_stereo(input: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
    let frames = out_l.len().min(out_r.len());
    for i in 0..frames {
        let base = i * 2;
        out_l[i] = input.get(base).copied().unwrap_or(0.0);
        out_r[i] = input.get(base + 1).copied().unwrap_or(0.0);
    }
}

/// Interleaves separate L/R channel buffers into `[L0, R0, L1, R1, ...]`.
fn interleave_stereo(l: &[f32], r: &[f32], out: &mut [f32]) {
    let frames = l.len().min(r.len()).min(out.len() / 2);
    for i in 0..frames {
        out[i * 2] = l[i];
        out[i * 2 + 1] = r[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_round_trips_through_deinterleave() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut l = vec![0.0; 3];
        let mut r = vec![0.0; 3];
        deinterleave_stereo(&interleaved, &mut l, &mut r);
        assert_eq!(l, vec![1.0, 3.0, 5.0]);
        assert_eq!(r, vec![2.0, 4.0, 6.0]);

        let mut back = vec![0.0; 6];
        interleave_stereo(&l, &r, &mut back);
        assert_eq!(back, interleaved);
    }
}
