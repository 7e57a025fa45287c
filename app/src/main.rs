use clap::Parser;
use rc_config::Config;
use rc_core::telemetry;
use rc_db::Db;
use std::process;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration - exit with non-zero if invalid
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    telemetry::init_tracing(&config.telemetry.environment, "rollcall");
    tracing::debug!(?config, "Configuration loaded successfully");

    let db = match Db::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = db.health_check().await {
        tracing::error!("Database health check failed: {}", e);
        process::exit(1);
    }

    let output = match commands::execute(&cli.command, &db, &config).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!("Failed to render output: {}", e);
            process::exit(1);
        }
    }
}
