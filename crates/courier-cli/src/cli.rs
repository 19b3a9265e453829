//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Courier CLI - Authenticated requests against JSON HTTP APIs
///
/// Sends requests through the Courier pipeline: stored bearer credentials are
/// attached to private endpoints, failures are classified, and every outcome
/// is printed as a uniform response envelope.
#[derive(Parser, Debug)]
#[command(
    name = "courier",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "COURIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL override for this invocation
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a GET request
    Get(RequestArgs),

    /// Send a POST request with an optional JSON body
    Post(BodyRequestArgs),

    /// Send a PUT request with an optional JSON body
    Put(BodyRequestArgs),

    /// Send a PATCH request with an optional JSON body
    Patch(BodyRequestArgs),

    /// Send a DELETE request
    Delete(RequestArgs),

    /// Upload files as a multipart form
    Upload(UploadArgs),

    /// Store a credential for private endpoints
    Login(LoginArgs),

    /// Remove the stored credential
    Logout,

    /// Show whether a credential is stored and when it expires
    Status,

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments shared by every request command
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Request path, resolved against the base URL (absolute URLs pass through)
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Extra header as name=value (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub headers: Vec<(String, String)>,

    /// Show receive progress
    #[arg(long)]
    pub progress: bool,
}

/// Arguments for commands that carry a JSON body
#[derive(Args, Debug, Clone)]
pub struct BodyRequestArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// JSON body, or @path to read it from a file
    #[arg(short, long, value_name = "JSON|@FILE")]
    pub data: Option<String>,
}

/// Arguments for the upload command
#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// File to upload (repeatable)
    #[arg(short, long = "file", value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Text form field as key=value (repeatable)
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub fields: Vec<(String, String)>,
}

/// Arguments for the login command
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Access token sent as the bearer credential
    #[arg(long, env = "COURIER_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Refresh token kept alongside the access token
    #[arg(long, env = "COURIER_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Lifetime of the access token in seconds
    #[arg(long, value_name = "SECONDS")]
    pub expires_in: Option<i64>,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Write the user config instead of ./.courier.yaml
    #[arg(long)]
    pub user: bool,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

/// Parse `key=value`; the value may itself contain `=`
pub fn parse_key_value(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got {:?}", input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            base_url: None,
            output: OutputFormat::Human,
            no_color: false,
            command: Commands::Logout,
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli { quiet: true, ..cli };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("q=rust").unwrap(),
            ("q".to_string(), "rust".to_string())
        );
        assert_eq!(
            parse_key_value("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_key_value("empty=").unwrap().1, "");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_request_command_parsing() {
        let cli = Cli::parse_from([
            "courier", "post", "/orders", "--data", r#"{"qty":1}"#, "--query", "dry=true", "-H",
            "X-Trace=t1",
        ]);
        match cli.command {
            Commands::Post(args) => {
                assert_eq!(args.request.path, "/orders");
                assert_eq!(args.data.as_deref(), Some(r#"{"qty":1}"#));
                assert_eq!(args.request.query, vec![("dry".to_string(), "true".to_string())]);
                assert_eq!(args.request.headers[0].0, "X-Trace");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_upload_requires_file() {
        assert!(Cli::try_parse_from(["courier", "upload", "/photos"]).is_err());

        let cli = Cli::parse_from([
            "courier", "upload", "/photos", "-f", "a.jpg", "--file", "b.jpg", "--field", "album=x",
        ]);
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.fields, vec![("album".to_string(), "x".to_string())]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
