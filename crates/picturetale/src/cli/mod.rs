//! Command implementations.

pub mod config;
pub mod pipeline_args;
pub mod run;
pub mod serve;
pub mod types;
