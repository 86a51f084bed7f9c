//! Provides the main entry point to the program.
use ::log::error;
use std::process::exit;
use tworegion::cli::run_cli;
use tworegion::log::is_logger_initialised;

fn main() {
    if let Err(err) = run_cli() {
        // If the logger is not yet initialised the error goes straight to stderr
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }
        exit(1);
    }
}
