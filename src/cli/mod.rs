//! Command-line surface.
//!
//! Each command returns printable output; the binary decides how to emit it.

mod commands;
mod error;


pub use commands::{create, export, list, remove, update};
pub use error::{CliError, CliResult};
