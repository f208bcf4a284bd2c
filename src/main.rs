use anyhow::Result;
use clap::Parser;
use log::error;

use macrocoach::cli::{load_dotenv, version_info};
use macrocoach::{Cli, CommandHandler, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Errors only, unless --verbose or RUST_LOG says otherwise
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Error
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Handle version early
    if matches!(cli.command, Commands::Version) {
        println!("{}", version_info());
        return Ok(());
    }

    load_dotenv();

    let handler = match CommandHandler::new() {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to initialize macrocoach: {e:#}");
            eprintln!("Error: Failed to initialize macrocoach: {e:#}");
            eprintln!("Try running 'macrocoach init' first.");
            std::process::exit(1);
        }
    };

    match handler.handle_command(cli.command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("{}", handler.format_error(&format!("{e:#}")));
            std::process::exit(1);
        }
    }

    Ok(())
}
