//! cmdroute - textual command routing and argument parsing.
//!
//! [`commands`] holds the alias-routing dispatcher and the command types that
//! plug into it; [`parameter`] holds the argument reader, value parsers,
//! modifier chains and flags used by parameterized commands.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod parameter;
