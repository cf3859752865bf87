//! threadvm command-line driver.
//!
//! Exit codes:
//! - 0: Success (or `--help` / `--version`)
//! - 1: Usage, load, decode or assembly error
//! - 3: Fatal runtime error

pub mod commands;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use threadvm_vm::config::{DEFAULT_MEMORY_SIZE, DEFAULT_SEED};
use threadvm_vm::{Dispatch, RuntimeError};
use tracing_subscriber::EnvFilter;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_RUNTIME: i32 = 3;

#[derive(Debug, Parser)]
#[command(
    name = "threadvm",
    version,
    about = "Run, assemble and disassemble threadvm bytecode",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` wins if set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Options for running a program image.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Program image to execute
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Announce the start of execution and report timing afterwards
    #[arg(long)]
    pub benchmark: bool,

    /// Dispatch strategy: switch, jump-table or threaded
    #[arg(long, default_value = "switch")]
    pub dispatch: Dispatch,

    /// Stop with an error after this many instructions
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u64>,

    /// Memory size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MEMORY_SIZE)]
    pub memory_size: usize,

    /// Seed for RAND
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Assemble a text file into a program image
    Assemble {
        /// Assembly source
        input: PathBuf,
        /// Output image (defaults to the input with a `.bin` extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a program image as assembly text
    Disassemble {
        /// Program image
        input: PathBuf,
    },
}

/// Install the stderr `fmt` subscriber. `RUST_LOG` takes precedence over
/// the verbosity flag.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|expr| EnvFilter::try_new(expr).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<RuntimeError>().is_some() {
        EXIT_RUNTIME
    } else {
        EXIT_FAILURE
    }
}

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Assemble { input, output }) => commands::assemble(&input, output.as_deref()),
        Some(Commands::Disassemble { input }) => commands::disassemble(&input),
        None => commands::run(&cli.run),
    }
}

/// Parse `args`, run, and return the process exit code.
pub fn main_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => EXIT_SUCCESS,
                _ => EXIT_FAILURE,
            };
        }
    };

    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            if code == EXIT_RUNTIME {
                eprintln!("runtime error: {e}");
            } else {
                eprintln!("error: {e:#}");
            }
            code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("threadvm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn run_defaults() {
        let cli = parse(&["prog.bin"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.run.file, Some(PathBuf::from("prog.bin")));
        assert_eq!(cli.run.dispatch, Dispatch::Switch);
        assert_eq!(cli.run.memory_size, DEFAULT_MEMORY_SIZE);
        assert!(!cli.run.benchmark);
        assert_eq!(cli.run.max_steps, None);
    }

    #[test]
    fn run_options() {
        let cli = parse(&[
            "--benchmark",
            "--dispatch",
            "threaded",
            "--max-steps",
            "10",
            "--memory-size",
            "4096",
            "-vv",
            "prog.bin",
        ]);
        assert!(cli.run.benchmark);
        assert_eq!(cli.run.dispatch, Dispatch::Threaded);
        assert_eq!(cli.run.max_steps, Some(10));
        assert_eq!(cli.run.memory_size, 4096);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn subcommands() {
        match parse(&["assemble", "a.tvm", "-o", "a.bin"]).command {
            Some(Commands::Assemble { input, output }) => {
                assert_eq!(input, PathBuf::from("a.tvm"));
                assert_eq!(output, Some(PathBuf::from("a.bin")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse(&["disassemble", "a.bin"]).command,
            Some(Commands::Disassemble { .. })
        ));
    }

    #[test]
    fn bad_dispatch_is_a_usage_error() {
        assert_eq!(main_with_args(["threadvm", "--dispatch", "native", "x.bin"]), EXIT_FAILURE);
    }

    #[test]
    fn runtime_errors_map_to_three() {
        let err = anyhow::Error::new(RuntimeError::DivisionByZero { at: 2 });
        assert_eq!(exit_code(&err), EXIT_RUNTIME);
        assert_eq!(exit_code(&anyhow::anyhow!("missing file")), EXIT_FAILURE);
    }
}
