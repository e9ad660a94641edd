use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use voc2yolo::{config::Voc2YoloArgs, process_voc_dataset};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Voc2YoloArgs::parse();

    info!("Starting Pascal VOC to YOLO conversion...");

    match process_voc_dataset(&args) {
        Ok(stats) => {
            stats.print_summary();
            info!("Save to {}", args.dst.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
