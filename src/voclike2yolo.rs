use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use voc2yolo::config::VoclikeArgs;
use voc2yolo::process_voclike;
use voc2yolo::yolo_dataset::VoclikeOutcome;

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = VoclikeArgs::parse();

    match process_voclike(&args) {
        Ok(VoclikeOutcome::Printed(yolo_data)) => {
            print!("{}", yolo_data);
            ExitCode::SUCCESS
        }
        Ok(VoclikeOutcome::Written(stats)) => {
            stats.print_summary();
            if let Some(dst) = &args.dst {
                info!("Save to {}", dst.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert VOC-like labels: {}", e);
            ExitCode::FAILURE
        }
    }
}
