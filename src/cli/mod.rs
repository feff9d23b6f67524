//! CLI module for Delve
//!
//! Provides command-line interface parsing for the delve-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Delve - Asynchronous Research Server
#[derive(Parser, Debug)]
#[command(
    name = "delve-server",
    version,
    about = "Delve - Asynchronous Research Server",
    long_about = "Runs web research jobs in the background and serves their progress over HTTP.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config file.",
    after_help = "EXAMPLES:\n    \
                  delve-server init                    # Write a default delve.toml\n    \
                  delve-server                         # Start the server\n    \
                  delve-server run \"quantum sensing\"   # Research a topic in the foreground\n    \
                  delve-server --config my.toml        # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "delve.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Research a single topic in the foreground and print the result
    Run {
        /// Topic to research
        topic: String,
    },

    /// Write a default delve.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing delve.toml
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (ollama or openai)
        #[arg(long, default_value = "ollama", value_parser = ["ollama", "openai"])]
        provider: String,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "5000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_start_server() {
        let cli = Cli::try_parse_from(["delve-server"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("delve.toml"));
        assert!(cli.command.is_none());
        assert!(!cli.json_logs);
    }

    #[test]
    fn test_run_takes_topic() {
        let cli = Cli::try_parse_from(["delve-server", "run", "solid state batteries"]).unwrap();
        match cli.command {
            Some(Commands::Run { topic }) => assert_eq!(topic, "solid state batteries"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["delve-server", "config", "--validate", "-c", "x.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(cli.command, Some(Commands::Config { validate: true })));
    }

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["delve-server", "init"]).unwrap();
        match cli.command {
            Some(Commands::Init {
                path,
                force,
                provider,
                port,
                ..
            }) => {
                assert_eq!(path, PathBuf::from("."));
                assert!(!force);
                assert_eq!(provider, "ollama");
                assert_eq!(port, 5000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["delve-server", "init", "--provider", "foo"]).is_err());

        let cli = Cli::try_parse_from(["delve-server", "init", "--provider", "openai"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Init { ref provider, .. }) if provider == "openai"
        ));
    }
}
