//! Shell command execution and terminal sessions.

pub mod command;
pub mod platform;
pub mod terminal;

pub use command::{execute, run_captured, run_sync, CommandOptions, CommandResult};
pub use platform::{detect_shell, is_ci, posix_shell, shell_flag, ShellInfo, ShellType};
pub use terminal::{
    LaunchRequest, MarkerOutcome, MarkerPair, ShellLauncher, TemplateLauncher, TerminalLauncher,
    TerminalRunner,
};
