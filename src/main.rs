use expsweep::cli::commands::{CliArgs, Commands};
use expsweep::cli::handlers::{handle_config, handle_status, handle_sweep, EXIT_CONFIG};
use expsweep::config::SweepConfig;
use expsweep::util::{init_logging, LoggingConfig};
use expsweep::{NAME, VERSION};

use clap::Parser;
use std::process;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match SweepConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    let logging = match LoggingConfig::resolve(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
        &config.log_level,
    ) {
        Ok(logging) => logging.json(args.log_json),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };
    init_logging(&logging);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command_or_default() {
        Commands::Sweep(sweep_args) => handle_sweep(sweep_args, config, args.quiet).await,
        Commands::Status(status_args) => handle_status(status_args, config, args.quiet).await,
        Commands::Config(config_args) => handle_config(config_args, &config),
    };

    process::exit(exit_code);
}
