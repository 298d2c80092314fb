//! Command-line interface module.

mod args;
pub mod convert;
pub mod preview;

pub use args::{Cli, Commands, InputArgs};
