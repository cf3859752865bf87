//! threadvm CLI entry point. See the library crate for exit codes.

use std::process;

fn main() {
    process::exit(threadvm_cli::main_with_args(std::env::args_os()));
}
