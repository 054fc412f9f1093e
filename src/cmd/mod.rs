//! Subcommand implementations for the fewatch binary.

pub mod health_check;
