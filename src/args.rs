//! Command-line argument parsing.
//!
//! Supports help, version, debug, an explicit config path, and a single
//! check cycle. Unknown options fall through to the help text.

use std::path::PathBuf;

use crate::logger::Log;

/// What the command line asks poolpump to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon (or a single cycle with `once`)
    Run {
        debug_enabled: bool,
        once: bool,
        config_path: Option<PathBuf>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or incomplete arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments, the program name included.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut once = false;
        let mut config_path: Option<PathBuf> = None;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;

        let mut args = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--once" | "-o" => once = true,
                "--config" | "-c" => match args.next() {
                    Some(path) if !path.starts_with('-') => config_path = Some(PathBuf::from(path)),
                    _ => {
                        Log::log_warning("Missing path for --config. Usage: --config <path>");
                        unknown_arg_found = true;
                    }
                },
                other => {
                    if let Some(path) = other.strip_prefix("--config=") {
                        config_path = Some(PathBuf::from(path));
                    } else if other.starts_with('-') {
                        Log::log_warning(&format!("Unknown option: {}", other));
                        unknown_arg_found = true;
                    }
                    // Non-option arguments are ignored
                }
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else if display_help {
            CliAction::ShowHelp
        } else {
            CliAction::Run {
                debug_enabled,
                once,
                config_path,
            }
        };

        ParsedArgs { action }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

pub fn display_version_info() {
    Log::log_version();
    Log::log_pipe();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

pub fn display_help() {
    Log::log_version();
    Log::log_block_start(env!("CARGO_PKG_DESCRIPTION"));
    Log::log_block_start("Usage: poolpump [OPTIONS]");
    Log::log_block_start("Options:");
    Log::log_indented("-c, --config <path>  Load this config file instead of the default");
    Log::log_indented("-d, --debug          Enable detailed debug output");
    Log::log_indented("-h, --help           Print help information");
    Log::log_indented("-o, --once           Run a single check cycle and exit");
    Log::log_indented("-V, --version        Print version information");
    Log::log_end();
}
