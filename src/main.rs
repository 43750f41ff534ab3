//! MPU6050 SD logger - two-button capture session on the host
//!
//! Keys stand in for the buttons: `a` + Enter starts or stops a capture,
//! `b` + Enter mounts or unmounts the card, `q` + Enter quits. Each storage
//! device is a directory; removing the directory behaves like pulling the
//! card.
//!
//! Usage:
//!   sd-logger --device sd0=sdcard --sensor simulated

use clap::Parser;
use mpu6050_sd_logger::{
    Button, Clock, ConsoleFeedback, ControllerConfig, DirectoryMedium, InputSource,
    SensorSource, SessionController, SimulatedSensor, SystemClock,
};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sd-logger")]
#[command(about = "Log MPU6050 samples to a storage device, driven by two buttons", long_about = None)]
struct Args {
    /// Storage device as NAME=DIRECTORY (repeatable)
    #[arg(short, long = "device", value_parser = parse_device, default_value = "sd0=sdcard")]
    devices: Vec<(String, PathBuf)>,

    /// Device to mount (defaults to the first --device)
    #[arg(short, long)]
    mount: Option<String>,

    /// Capture file name at the device root
    #[arg(long, default_value = mpu6050_sd_logger::config::DATA_FILE_NAME)]
    data_file: String,

    /// Sensor: "simulated" or "mpu6050"
    #[arg(short, long, default_value = "simulated")]
    sensor: String,

    /// FT232H channel index for the mpu6050 sensor
    #[arg(short, long, default_value = "0")]
    channel: u32,
}

fn parse_device(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, dir)) if !name.is_empty() && !dir.is_empty() => {
            Ok((name.to_string(), PathBuf::from(dir)))
        }
        _ => Err(format!("expected NAME=DIRECTORY, got '{}'", s)),
    }
}

#[cfg(feature = "ftdi")]
fn open_mpu6050(channel: u32) -> Result<Box<dyn SensorSource>, Box<dyn std::error::Error>> {
    println!("Initializing sensor on channel {}...", channel);
    let sensor = mpu6050_sd_logger::Mpu6050::new(channel)?;
    println!("Sensor initialized!\n");
    Ok(Box::new(sensor))
}

#[cfg(not(feature = "ftdi"))]
fn open_mpu6050(_channel: u32) -> Result<Box<dyn SensorSource>, Box<dyn std::error::Error>> {
    Err("this build has no MPU6050 support; rebuild with --features ftdi".into())
}

/// Forward key presses to the edge handler until stdin closes
fn spawn_button_reader(input: Arc<InputSource>, clock: SystemClock, shutdown: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            for key in line.trim().chars() {
                let button = match key.to_ascii_lowercase() {
                    'a' => Button::A,
                    'b' => Button::B,
                    'q' => {
                        shutdown.store(true, Ordering::SeqCst);
                        return;
                    }
                    other => {
                        warn!("Unknown key '{}'", other);
                        continue;
                    }
                };
                if input.press(button, clock.now_ms()).is_none() {
                    println!("  ({:?} ignored)", button);
                }
            }
        }
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let sensor: Box<dyn SensorSource> = match args.sensor.as_str() {
        "simulated" => Box::new(SimulatedSensor::new()),
        "mpu6050" => open_mpu6050(args.channel)?,
        other => {
            eprintln!("Error: sensor must be 'simulated' or 'mpu6050', got '{}'", other);
            std::process::exit(1);
        }
    };

    let mut medium = DirectoryMedium::new();
    for (name, root) in &args.devices {
        if !root.is_dir() {
            warn!("{} has no directory at {} yet; mounting will fail", name, root.display());
        }
        medium = medium.with_device(name, root);
    }

    let config = ControllerConfig {
        device_name: args.mount.clone(),
        data_file: args.data_file.clone(),
        ..ControllerConfig::default()
    };

    println!("MPU6050 SD Logger");
    println!("=================");
    for (name, root) in &args.devices {
        println!("Device {}: {}", name, root.display());
    }
    println!("Capture file: {}", config.data_file);
    println!("Keys: a = capture, b = mount/unmount, q = quit (then Enter)\n");

    let clock = SystemClock::new();
    let mut controller =
        SessionController::new(sensor, medium, ConsoleFeedback::new(), clock, config);

    let shutdown = controller.shutdown_handle();
    let s = shutdown.clone();
    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping...");
        s.store(true, Ordering::SeqCst);
    })?;

    spawn_button_reader(controller.input(), clock, shutdown);

    controller.run();

    if let Some(outcome) = controller.last_capture() {
        info!("Last capture: {:?}", outcome);
    }
    println!("Stopped after {:.1} s", clock.elapsed_secs());

    Ok(())
}
