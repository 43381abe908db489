mod args;
mod commands;
mod handlers;
mod logging;
pub mod presentation;

pub use args::{Cli, Commands, ConfigCommand, ExportArgs, SessionFilterArgs};
pub use commands::{EXIT_SESSION_ERRORS, run};
