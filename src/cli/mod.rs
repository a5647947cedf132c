//! CLI command definitions and handlers

mod init;
mod languages;
mod score;
mod watch;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codemood::config::MoodConfig;
use std::path::PathBuf;

/// CodeMood - how your code feels, from its diagnostics
#[derive(Parser, Debug)]
#[command(name = "codemood")]
#[command(
    version,
    about = "Turn a file's diagnostics into a mood score and a matching emoji",
    after_help = "\
Examples:
  codemood score src/app.ts --diagnostics issues.json   Score one file
  eslint-to-json | codemood score app.js --diagnostics -  Read issues from stdin
  codemood score lib.rs --format json --offline         JSON output, no network
  codemood watch diagnostics.json                       Live moods as the report changes
  codemood languages                                    Supported languages"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Extra config file, layered over codemood.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a single file
    Score {
        /// File being scored (used for line count and language detection)
        file: PathBuf,

        /// JSON array of {severity, message}; `-` reads stdin
        #[arg(long, short = 'd')]
        diagnostics: Option<String>,

        /// Language id (default: detected from the file extension)
        #[arg(long, short = 'l')]
        language: Option<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Never fetch emoji images, use text glyphs
        #[arg(long)]
        offline: bool,
    },

    /// List supported languages and their scoring parameters
    Languages {
        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Watch a diagnostics report and print mood changes
    Watch {
        /// JSON object mapping file paths to arrays of {severity, message}
        report: PathBuf,

        /// Never fetch emoji images, use text glyphs
        #[arg(long)]
        offline: bool,
    },

    /// Write an example codemood.toml to the current directory
    Init {
        /// Overwrite an existing codemood.toml
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    match cli.command {
        Commands::Score {
            file,
            diagnostics,
            language,
            format,
            offline,
        } => {
            let mut config = MoodConfig::load_with(&cwd, cli.config.as_deref());
            config.assets.offline |= offline;
            score::run(&config, &file, diagnostics.as_deref(), language.as_deref(), &format)
        }

        Commands::Languages { format } => languages::run(&format),

        Commands::Watch { report, offline } => {
            let mut config = MoodConfig::load_with(&cwd, cli.config.as_deref());
            config.assets.offline |= offline;
            watch::run(&config, &report)
        }

        Commands::Init { force } => init::run(&cwd, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score_args() {
        let cli = Cli::try_parse_from([
            "codemood", "score", "a.ts", "-d", "-", "--format", "json", "--offline",
        ])
        .unwrap();
        match cli.command {
            Commands::Score {
                file,
                diagnostics,
                format,
                offline,
                language,
            } => {
                assert_eq!(file, PathBuf::from("a.ts"));
                assert_eq!(diagnostics.as_deref(), Some("-"));
                assert_eq!(format, "json");
                assert!(offline);
                assert!(language.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["codemood", "languages", "--format", "xml"]).is_err());
    }
}
