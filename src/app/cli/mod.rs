//! CLI module containing argument parsing, configuration file support and validation

pub mod args;
pub mod config;
pub mod validation;

pub use args::Args;
pub use validation::ValidationError;
