//! # Notes CLI
//!
//! The binary is thin: the CLI lives in `cli/`, and this file only starts the
//! runtime, invokes `cli::run()` and handles process termination.
//!
//! Everything the CLI calls is UI agnostic and lives in the library; see the
//! crate-level documentation there for the layering. The catalog runs as a
//! task on the same current-thread runtime, with blocking storage work on
//! tokio's blocking pool.

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
