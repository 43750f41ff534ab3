//! Capture file checker
//!
//! Reads a capture file back, checks the header and every row, and reports
//! whether the sample indices run 1, 2, 3... without gaps.
//!
//! Usage:
//!   validate-capture sdcard/mpu6050_data.csv

use clap::Parser;
use mpu6050_sd_logger::config::SAMPLE_INTERVAL;
use mpu6050_sd_logger::read_capture;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "validate-capture")]
#[command(about = "Check the structure of an MPU6050 capture file", long_about = None)]
struct Args {
    /// Capture file to check
    #[arg(default_value = mpu6050_sd_logger::config::DATA_FILE_NAME)]
    file: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    println!("Capture file: {}", args.file.display());

    let file = File::open(&args.file)?;
    let summary = match read_capture(BufReader::new(file)) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("Rows: {}", summary.rows);
    match (summary.first_index, summary.last_index) {
        (Some(first), Some(last)) => println!("Samples: {} to {}", first, last),
        _ => println!("Samples: none"),
    }
    println!(
        "Approx. duration: {:.1} s",
        summary.rows as f64 * SAMPLE_INTERVAL.as_secs_f64()
    );

    if let Some((line, expected, found)) = summary.first_break {
        println!("Index break at line {}: expected {}, found {}", line, expected, found);
    }

    if summary.is_contiguous() {
        println!("OK");
        Ok(())
    } else {
        println!("NOT CONTIGUOUS");
        std::process::exit(1);
    }
}
