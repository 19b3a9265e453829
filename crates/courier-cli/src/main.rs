//! Courier CLI - Command-line front end for the Courier request pipeline
//!
//! This is the main entry point for the Courier CLI application, providing
//! commands for sending authenticated requests, uploading files and
//! managing the stored credential.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use courier_core::HttpMethod;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    let result = run(cli).await;

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_with_file(cli.config.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        config.pipeline.base_url = base_url.clone();
    }

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    dispatch(cli, config).await
}

#[instrument(skip_all, fields(command = ?cli.command))]
async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");
    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(verbosity = cli.verbosity_level(), "Executing command");

    match cli.command {
        Commands::Get(args) => {
            handlers::handle_request(HttpMethod::Get, args, None, &config, &mut output).await
        }
        Commands::Post(args) => {
            handlers::handle_request(HttpMethod::Post, args.request, args.data, &config, &mut output)
                .await
        }
        Commands::Put(args) => {
            handlers::handle_request(HttpMethod::Put, args.request, args.data, &config, &mut output)
                .await
        }
        Commands::Patch(args) => {
            handlers::handle_request(HttpMethod::Patch, args.request, args.data, &config, &mut output)
                .await
        }
        Commands::Delete(args) => {
            handlers::handle_request(HttpMethod::Delete, args, None, &config, &mut output).await
        }
        Commands::Upload(args) => handlers::handle_upload(args, &config, &mut output).await,
        Commands::Login(args) => handlers::handle_login(args, &config, &mut output).await,
        Commands::Logout => handlers::handle_logout(&config, &mut output).await,
        Commands::Status => handlers::handle_status(&config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge(&config.logging, cli.verbosity_level());

    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}
