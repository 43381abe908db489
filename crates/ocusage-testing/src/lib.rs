//! Testing infrastructure for ocusage integration tests.
//!
//! - `TestWorld`: isolated OpenCode storage, output dir and a fake `opencode`
//! - `fixtures`: session metadata and export payload builders
//! - `fake_opencode`: the shell stand-in for `opencode export`

pub mod fake_opencode;
pub mod fixtures;
pub mod world;

pub use fixtures::{ExportFixture, SessionFixture, T0};
pub use world::{CliResult, TestWorld};
