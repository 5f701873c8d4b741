//! CLI command handlers

pub mod commands;

pub use commands::{clone, fill, sheets};
