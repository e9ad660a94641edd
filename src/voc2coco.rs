use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use voc2yolo::{config::Voc2CocoArgs, process_coco_dataset};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Voc2CocoArgs::parse();

    info!("Starting Pascal VOC to COCO conversion...");

    match process_coco_dataset(&args) {
        Ok(stats) => {
            stats.print_summary();
            info!("COCO conversion process completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
