//! Library half of the `assetsync` binary, split out so the command modules
//! can be exercised from tests.

pub mod cli;
pub mod commands;
pub mod context;
pub mod logging;
