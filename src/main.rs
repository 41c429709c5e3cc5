//! docker-ctp - build, tag and push a container image.
//!
//! This binary resolves the run configuration, drives the `docker` CLI through
//! login, build, tag and push, and removes the images it created on exit.

use docker_ctp::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("Hint: {}", hint);
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
