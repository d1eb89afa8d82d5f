//! Audio device enumeration command.

use clap::Args;
use hoopipi_io::backend::AudioBackend;
use hoopipi_io::cpal_backend::CpalBackend;

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_devices()?;

    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
    let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();

    if !inputs.is_empty() {
        println!("Input Devices:");
        for (idx, device) in inputs.iter().enumerate() {
            let also_output = if device.is_output { " (also output)" } else { "" };
            println!("  [{}] {} ({} Hz){}", idx, device.name, device.default_sample_rate, also_output);
        }
        println!();
    }

    if !outputs.is_empty() {
        println!("Output Devices:");
        for (idx, device) in outputs.iter().enumerate() {
            let also_input = if device.is_input { " (also input)" } else { "" };
            println!("  [{}] {} ({} Hz){}", idx, device.name, device.default_sample_rate, also_input);
        }
        println!();
    }

    println!("Total: {} input(s), {} output(s)", inputs.len(), outputs.len());
    println!("\nUse --input/--output with `hoopipi run` to pick a device by name.");

    Ok(())
}
