//! Platform-specific shell detection.

use std::path::{Path, PathBuf};

/// Information about the user's shell.
#[derive(Debug, Clone)]
pub struct ShellInfo {
    /// Shell executable path.
    pub executable: PathBuf,

    /// Shell family.
    pub name: ShellType,
}

/// Known shell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Sh,
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Cmd,
    Unknown,
}

impl ShellType {
    /// Parse shell type from executable name.
    pub fn from_executable(exe: &str) -> Self {
        let name = Path::new(exe)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match name.as_str() {
            "sh" | "dash" | "ash" => ShellType::Sh,
            "bash" => ShellType::Bash,
            "zsh" => ShellType::Zsh,
            "fish" => ShellType::Fish,
            "powershell" | "pwsh" => ShellType::PowerShell,
            "cmd" => ShellType::Cmd,
            _ => ShellType::Unknown,
        }
    }

    /// Whether the shell understands `if [ $? -eq 0 ]; then ...; fi`.
    pub fn is_posix(&self) -> bool {
        matches!(self, ShellType::Sh | ShellType::Bash | ShellType::Zsh)
    }
}

/// Detect the user's shell from `$SHELL`.
pub fn detect_shell() -> ShellInfo {
    let executable = std::env::var("SHELL")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/bin/sh"));
    let name = ShellType::from_executable(&executable.to_string_lossy());

    ShellInfo { executable, name }
}

/// Shell used to run workflow commands.
///
/// The user's shell when it is POSIX-compatible (so login profiles load the
/// same toolchain they use by hand), `/bin/sh` otherwise.
pub fn posix_shell() -> PathBuf {
    let info = detect_shell();
    if info.name.is_posix() {
        info.executable
    } else {
        PathBuf::from("/bin/sh")
    }
}

/// Flag passing a command string to the shell, optionally as a login shell.
pub fn shell_flag(login: bool) -> &'static str {
    if login {
        "-lc"
    } else {
        "-c"
    }
}

/// Check if running in a CI environment.
///
/// Used to force non-interactive mode in `main()` and to suppress progress
/// bars in [`NonInteractiveUI`](crate::ui::NonInteractiveUI).
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}
