//! Container image build, tag and push automation
//!
//! This library drives the `docker` CLI through one run:
//! - Resolve configuration from flags, environment, config file and defaults
//! - Check the engine and build context
//! - Log in, build (or reuse), tag and push the image
//! - Remove the images the run created
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::{ExecutionConfig, Registry};
pub use error::{ConfigError, CtpError, Result, Stage};
