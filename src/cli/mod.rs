//! CLI module for the Motoko compiler
//!
//! This module provides the `moc` command-line driver over a disk-backed [`Session`](crate::session::Session).
//!
//! ## Commands
//!
//! - `check <files>` - Type check units and their imports
//! - `compile <file> --target wasi|ic` - Compile to a wasm module
//! - `run <files>` - Interpret units in order
//! - `idl <file>` - Print the Candid interface of an actor
//! - `parse <file>` - Print the syntax tree (`--json` for the wire shape)
//!
//! ## Session flags
//!
//! `-W <codes>`, `-E <codes>`, `-A <codes>` (also `-W=<codes>`), `-Werror`, `--hide-warnings`,
//! `--blob-import-placeholders` and `--package <name> <dir>` configure the session before the command runs.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use crate::backend::Target;
use crate::config::ConfigError;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::failure(err.to_string())
    }
}

impl From<crate::vfs::ResourceError> for CliError {
    fn from(err: crate::vfs::ResourceError) -> Self {
        CliError::failure(format!("moc: {err}"))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The Motoko compiler
#[derive(Parser, Debug)]
#[command(name = "moc")]
#[command(version = VERSION)]
#[command(about = "The Motoko compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub flags: SessionFlags,
}

/// Flags forwarded to [`Session::set_extra_flags`](crate::session::Session::set_extra_flags).
#[derive(clap::Args, Debug, Default)]
pub struct SessionFlags {
    /// Enable warnings (comma separated codes); `-Werror` turns warnings into errors
    #[arg(short = 'W', value_name = "CODES", global = true)]
    pub warn: Vec<String>,

    /// Report warnings as errors (comma separated codes)
    #[arg(short = 'E', value_name = "CODES", global = true)]
    pub error: Vec<String>,

    /// Disable warnings (comma separated codes)
    #[arg(short = 'A', value_name = "CODES", global = true)]
    pub allow: Vec<String>,

    /// Do not report warnings
    #[arg(long, global = true)]
    pub hide_warnings: bool,

    /// Accept `blob:` imports as placeholders that fail when run
    #[arg(long, global = true)]
    pub blob_import_placeholders: bool,

    /// Register package NAME rooted at DIR for `mo:NAME/..` imports
    #[arg(long, num_args = 2, value_names = ["NAME", "DIR"], global = true)]
    pub package: Vec<String>,
}

impl SessionFlags {
    /// The flags in the textual form the session accepts.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for codes in &self.warn {
            if codes == "error" {
                args.push("-Werror".to_string());
            } else {
                args.push(format!("-W={codes}"));
            }
        }
        args.extend(self.error.iter().map(|codes| format!("-E={codes}")));
        args.extend(self.allow.iter().map(|codes| format!("-A={codes}")));
        if self.hide_warnings {
            args.push("--hide-warnings".into());
        }
        if self.blob_import_placeholders {
            args.push("--blob-import-placeholders".into());
        }
        for pair in self.package.chunks(2) {
            args.push("--package".into());
            args.extend(pair.iter().cloned());
        }
        args
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    Wasi,
    Ic,
}

impl From<TargetArg> for Target {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Wasi => Target::Wasi,
            TargetArg::Ic => Target::InternetComputer,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Type check units and their imports
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Compile a unit to WebAssembly
    Compile {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Binary profile
        #[arg(long, value_enum, default_value = "wasi")]
        target: TargetArg,
        /// Output file (default: FILE with a .wasm extension)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Interpret units in order; the last one is the program
    Run {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the Candid interface of an actor
    Idl {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the syntax tree of a unit
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Keep going after syntax errors
        #[arg(long)]
        recover: bool,
        /// Print the tree and diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    let session = commands::session(&cli.flags)?;
    match cli.command {
        Command::Check { files } => commands::check_files(&session, &paths(&files)),
        Command::Compile { file, target, output } => {
            commands::compile_file(&session, &path_text(&file), target.into(), output.as_deref())
        }
        Command::Run { files } => commands::run_files(&session, &paths(&files)),
        Command::Idl { file } => commands::print_interface(&session, &path_text(&file)),
        Command::Parse { file, recover, json } => commands::parse_file(&session, &path_text(&file), recover, json),
    }
}

fn path_text(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

fn paths(files: &[PathBuf]) -> Vec<String> {
    files.iter().map(|f| path_text(f)).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_compile() {
        let cli = Cli::try_parse_from(["moc", "compile", "main.mo", "--target", "ic"]).unwrap();
        match cli.command {
            Command::Compile { target, output, .. } => {
                assert_eq!(target, TargetArg::Ic);
                assert!(output.is_none());
            }
            other => panic!("Expected Compile command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_many_files() {
        let cli = Cli::try_parse_from(["moc", "run", "lib.mo", "main.mo"]).unwrap();
        if let Command::Run { files } = cli.command {
            assert_eq!(files.len(), 2);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_warning_flags() {
        let cli = Cli::try_parse_from([
            "moc",
            "-W=M0223",
            "-Werror",
            "-A",
            "M0194",
            "--hide-warnings",
            "check",
            "main.mo",
        ])
        .unwrap();
        assert_eq!(
            cli.flags.to_args(),
            vec!["-W=M0223", "-Werror", "-A=M0194", "--hide-warnings"]
        );
    }

    #[test]
    fn test_cli_packages_and_blobs() {
        let cli = Cli::try_parse_from([
            "moc",
            "check",
            "main.mo",
            "--package",
            "base",
            "vendor/base",
            "--blob-import-placeholders",
        ])
        .unwrap();
        assert_eq!(
            cli.flags.to_args(),
            vec!["--blob-import-placeholders", "--package", "base", "vendor/base"]
        );
    }

    #[test]
    fn test_invalid_warning_codes_fail_before_any_command() {
        let cli = Cli::try_parse_from(["moc", "-W=MMM", "check", "main.mo"]).unwrap();
        let err = execute(cli).unwrap_err();
        assert_eq!(err.message, "moc: invalid warning code: MMM");
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }
}
