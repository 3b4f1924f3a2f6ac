//! CLI subcommand implementations for the `filings` binary.

pub mod doctor;
pub mod feeds_cmd;
pub mod output;
pub mod run_cmd;
