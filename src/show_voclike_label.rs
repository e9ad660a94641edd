use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use voc2yolo::config::ShowVoclikeArgs;
use voc2yolo::visualize::show_voclike_labels;

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ShowVoclikeArgs::parse();

    match show_voclike_labels(&args) {
        Ok(count) => {
            info!("Rendered {} images.", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to show labels: {}", e);
            ExitCode::FAILURE
        }
    }
}
