//! Presentation layer.

pub mod cli;

pub use cli::WizardCli;
