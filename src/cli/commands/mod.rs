//! Command implementations for the taskpool CLI

pub mod config;
pub mod run;
pub mod version;
