//! CI runner integration
//!
//! Workflow commands on stdout, file commands for outputs and state, and the failure summary.

pub mod commands;
pub mod files;
pub mod summary;

pub use files::RunnerFiles;
