//! CLI command implementations.

pub mod common;
pub mod config;
pub mod distance;
pub mod nearby;
pub mod rate;
pub mod register;
pub mod track;
