use std::fs::File;
use std::process::ExitCode;

use adb_remote::core::config;
use adb_remote::tui;
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(
    name = "adb-remote",
    version,
    about = "Drive an Android phone from the terminal over adb"
)]
struct Args {}

#[tokio::main]
async fn main() -> ExitCode {
    let _args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to adb-remote.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("adb-remote.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!("adb-remote starting up");

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: {e}. Using defaults.");
        log::warn!("Config load failed: {}", e);
        config::RemoteConfig::default()
    });
    let resolved = config::resolve(&file_config);
    log::debug!("Resolved config: {:?}", resolved);

    match tui::run(resolved).await {
        Ok(()) => {
            log::info!("adb-remote exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Session ended with error: {}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
