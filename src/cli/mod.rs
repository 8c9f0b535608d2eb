//! Command-line interface implementation
//!
//! With no subcommand the binary serves LSP over stdio, which is what editor
//! extensions launch. The other commands run the same completion, hover and
//! color logic against a file and print JSON.

mod agent;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::loader::{find_config_from, load_config};
use crate::config::ThemeConfig;
use crate::logging::init_logging;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// EuropaCSS IntelliSense language server
#[derive(Parser)]
#[command(name = "europa-lsp")]
#[command(about = "EuropaCSS IntelliSense - completions, hovers and color swatches for EuropaCSS at-rules")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Language Server Protocol server on stdio (default)
    Lsp,

    /// Print the completions offered at a position
    Complete {
        /// Stylesheet to complete in
        file: Option<PathBuf>,

        /// Read the stylesheet from stdin
        #[arg(long)]
        stdin: bool,

        /// Theme config (default: nearest europa.config.js)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Line number (1-indexed)
        #[arg(long, default_value = "1")]
        line: u32,

        /// Character position (0-indexed, UTF-16)
        #[arg(long, default_value = "0")]
        character: u32,
    },

    /// Print the hover shown for the token at a position
    Hover {
        /// Stylesheet containing the token
        file: Option<PathBuf>,

        /// Read the stylesheet from stdin
        #[arg(long)]
        stdin: bool,

        /// Theme config (default: nearest europa.config.js)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Line number (1-indexed)
        #[arg(long)]
        line: u32,

        /// Character position (0-indexed, UTF-16)
        #[arg(long)]
        character: u32,
    },

    /// Print every theme color as `colorInfo` payloads
    Colors {
        /// Theme config (default: nearest europa.config.js)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the color bridge over a stylesheet and print its decorations
    Swatches {
        /// Stylesheet to decorate
        file: Option<PathBuf>,

        /// Read the stylesheet from stdin
        #[arg(long)]
        stdin: bool,

        /// Theme config (default: nearest europa.config.js)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Load the theme for a CLI run.
///
/// An explicit `--config` must load. Otherwise the nearest config above the
/// input file (or the current directory) is used, and a missing or broken
/// one yields an empty theme.
pub(crate) fn resolve_theme(
    config: Option<&Path>,
    file: Option<&Path>,
) -> Result<ThemeConfig, ExitCode> {
    if let Some(path) = config {
        return load_config(path).map(|c| c.theme).map_err(|e| {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        });
    }

    let start = match file.and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let Some(path) = find_config_from(&start, None) else {
        tracing::warn!(start = %start.display(), "no europa.config.js found, using empty theme");
        return Ok(ThemeConfig::default());
    };

    match load_config(&path) {
        Ok(config) => Ok(config.theme),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config not loaded, using empty theme");
            Ok(ThemeConfig::default())
        }
    }
}

/// Read the input document from a file or stdin
pub(crate) fn read_input(file: Option<&Path>, stdin: bool) -> Result<String, ExitCode> {
    use std::io::{self, Read};

    if stdin {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("Error reading stdin: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
        Ok(buf)
    } else if let Some(path) = file {
        std::fs::read_to_string(path).map_err(|e| {
            eprintln!("Error reading file: {}", e);
            ExitCode::from(EXIT_ERROR)
        })
    } else {
        eprintln!("Error: Provide a file or use --stdin");
        Err(ExitCode::from(EXIT_INVALID_ARGS))
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Lsp) {
        Commands::Lsp => agent::run_lsp(),
        Commands::Complete { file, stdin, config, line, character } => {
            agent::run_complete(file.as_deref(), stdin, config.as_deref(), line, character)
        }
        Commands::Hover { file, stdin, config, line, character } => {
            agent::run_hover(file.as_deref(), stdin, config.as_deref(), line, character)
        }
        Commands::Colors { config } => agent::run_colors(config.as_deref()),
        Commands::Swatches { file, stdin, config } => {
            agent::run_swatches(file.as_deref(), stdin, config.as_deref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["europa-lsp"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_complete_args() {
        let cli = Cli::try_parse_from([
            "europa-lsp",
            "complete",
            "style.pcss",
            "--line",
            "3",
            "--character",
            "10",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Complete { file, line, character, stdin, config }) => {
                assert_eq!(file, Some(PathBuf::from("style.pcss")));
                assert_eq!((line, character), (3, 10));
                assert!(!stdin);
                assert!(config.is_none());
            }
            _ => panic!("expected complete"),
        }
    }

    #[test]
    fn test_resolve_theme_discovers_config_near_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("europa.config.js"),
            "module.exports = { theme: { breakpoints: { mobile: '480px' } } }",
        )
        .unwrap();
        let sheet = temp.path().join("app.pcss");

        let theme = resolve_theme(None, Some(&sheet)).unwrap();
        assert_eq!(theme.breakpoint("mobile"), Some("480px"));
    }

    #[test]
    fn test_resolve_theme_explicit_config_must_load() {
        let temp = TempDir::new().unwrap();
        assert!(resolve_theme(Some(&temp.path().join("missing.js")), None).is_err());
    }

    #[test]
    fn test_read_input_requires_source() {
        assert!(read_input(None, false).is_err());
    }
}
