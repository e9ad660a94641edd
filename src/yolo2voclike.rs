use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use voc2yolo::{config::Yolo2VoclikeArgs, process_yolo_dataset};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Yolo2VoclikeArgs::parse();

    info!("Starting YOLO to VOC-like conversion...");

    match process_yolo_dataset(&args) {
        Ok(stats) => {
            stats.print_summary();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
