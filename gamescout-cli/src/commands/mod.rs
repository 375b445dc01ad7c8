//! CLI subcommands.

pub mod scan;
