//! CLI module for the codelist gateway

pub mod serve;

use clap::{Parser, Subcommand};

/// Codelist Gateway - admission control and change streaming for reference data
#[derive(Parser)]
#[command(name = "codelist-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(serve::ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_overrides() {
        let cli = Cli::parse_from(["codelist-gateway", "serve", "--port", "9090"]);

        let Command::Serve(args) = cli.command;
        assert_eq!(args.port, Some(9090));
        assert!(args.host.is_none());
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["codelist-gateway"]).is_err());
    }
}
