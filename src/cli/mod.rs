pub mod args;
pub mod commands;
pub mod context;
pub mod format;
pub mod help;
pub mod output;
pub mod registry;
pub mod shell;
pub mod system_clock;
pub mod table;

pub use context::{CommandError, CommandResult, ShellContext};
pub use shell::run_cli;
