//! Tracegen CLI Library
//!
//! Command-line front end for the tracegen pipeline: plan a capture run,
//! analyze the instrumented application, generate scenarios and emit Java
//! test classes.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    AnalyzeArgs, Cli, ColorArg, Commands, EmitArgs, FrameworkArg, GenerateArgs, InspectArgs,
    LogFormatArg, PlanArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{suite_counts, Reporter};
