//! Subcommand modules for the `maftc` binary.

pub mod closure;
pub mod plan;
pub mod stat;
