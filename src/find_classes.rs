use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use voc2yolo::category::{discover_categories, write_categories};
use voc2yolo::config::FindClassesArgs;
use voc2yolo::utils::create_output_directory;
use voc2yolo::Result;

fn run(args: &FindClassesArgs) -> Result<()> {
    let names = discover_categories(&args.label)?;
    info!("Found classes: {:?}", names);

    let dst = create_output_directory(&args.dst)?;
    let class_path = dst.join("classes.txt");
    write_categories(&class_path, &names)?;
    info!("Save to {}", class_path.display());
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = FindClassesArgs::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to find classes: {}", e);
            ExitCode::FAILURE
        }
    }
}
