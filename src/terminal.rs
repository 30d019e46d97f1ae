use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use tracing::{debug, info};

use crate::config::PreferredTerminal;
use crate::error::{Result, YaError};

/// Answers "does this executable resolve on the search path?".
pub trait ExecutableResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<PathBuf>;
}

/// Starts a process without waiting for it or capturing its output.
pub trait ProcessSpawner: Send + Sync {
    fn spawn_detached(&self, plan: &LaunchPlan) -> std::io::Result<()>;
}

/// Ordered terminal candidates for one platform family.
pub trait TerminalFamily: Send + Sync {
    fn name(&self) -> &'static str;
    fn candidates(&self, preferred: PreferredTerminal) -> Vec<TerminalCandidate>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalCandidate {
    WindowsTerminal,
    PowerShell,
    CommandShell,
    GnomeTerminal,
    XTerminalEmulator,
    Konsole,
    Xterm,
    Bash,
}

impl TerminalCandidate {
    pub fn executable(self) -> &'static str {
        match self {
            TerminalCandidate::WindowsTerminal => "wt",
            TerminalCandidate::PowerShell => "powershell",
            TerminalCandidate::CommandShell => "cmd",
            TerminalCandidate::GnomeTerminal => "gnome-terminal",
            TerminalCandidate::XTerminalEmulator => "x-terminal-emulator",
            TerminalCandidate::Konsole => "konsole",
            TerminalCandidate::Xterm => "xterm",
            TerminalCandidate::Bash => "bash",
        }
    }

    /// Arguments that run `command` and leave an interactive shell open.
    pub fn args(self, command: &str, directory: &Path) -> Vec<String> {
        let stay_open = format!("{command}; exec bash");
        match self {
            TerminalCandidate::WindowsTerminal => vec![
                "-d".to_string(),
                directory.display().to_string(),
                "powershell".to_string(),
                "-NoExit".to_string(),
                "-Command".to_string(),
                command.to_string(),
            ],
            TerminalCandidate::PowerShell => vec![
                "-NoExit".to_string(),
                "-Command".to_string(),
                command.to_string(),
            ],
            TerminalCandidate::CommandShell => vec!["/K".to_string(), command.to_string()],
            TerminalCandidate::GnomeTerminal => vec![
                "--".to_string(),
                "bash".to_string(),
                "-c".to_string(),
                stay_open,
            ],
            TerminalCandidate::XTerminalEmulator
            | TerminalCandidate::Konsole
            | TerminalCandidate::Xterm => vec![
                "-e".to_string(),
                "bash".to_string(),
                "-c".to_string(),
                stay_open,
            ],
            TerminalCandidate::Bash => vec!["-c".to_string(), stay_open],
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsFamily;

impl TerminalFamily for WindowsFamily {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn candidates(&self, preferred: PreferredTerminal) -> Vec<TerminalCandidate> {
        match preferred {
            PreferredTerminal::Powershell => {
                vec![TerminalCandidate::PowerShell, TerminalCandidate::CommandShell]
            }
            PreferredTerminal::Cmd => vec![TerminalCandidate::CommandShell],
            PreferredTerminal::Wt | PreferredTerminal::Auto | PreferredTerminal::Bash => vec![
                TerminalCandidate::WindowsTerminal,
                TerminalCandidate::PowerShell,
                TerminalCandidate::CommandShell,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnixFamily;

impl TerminalFamily for UnixFamily {
    fn name(&self) -> &'static str {
        "unix"
    }

    /// Bare `bash` is always last, so a missing desktop terminal still runs
    /// the command in the working directory.
    fn candidates(&self, preferred: PreferredTerminal) -> Vec<TerminalCandidate> {
        if preferred == PreferredTerminal::Bash {
            return vec![TerminalCandidate::Bash];
        }
        vec![
            TerminalCandidate::GnomeTerminal,
            TerminalCandidate::XTerminalEmulator,
            TerminalCandidate::Konsole,
            TerminalCandidate::Xterm,
            TerminalCandidate::Bash,
        ]
    }
}

pub fn current_family() -> Box<dyn TerminalFamily> {
    #[cfg(windows)]
    {
        Box::new(WindowsFamily)
    }

    #[cfg(not(windows))]
    {
        Box::new(UnixFamily)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub candidate: TerminalCandidate,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl LaunchPlan {
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchedTerminal {
    pub terminal: TerminalCandidate,
    pub command_line: String,
    pub directory: String,
}

/// `PATH` lookup with `PATHEXT` handling on Windows.
#[derive(Debug, Clone, Default)]
pub struct SearchPathResolver {
    search_path: Option<OsString>,
}

impl SearchPathResolver {
    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
        }
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl ExecutableResolver for SearchPathResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        let cwd = std::env::current_dir().unwrap_or_default();
        which::which_in(name, Some(search_path), cwd).ok()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

impl ProcessSpawner for SystemSpawner {
    fn spawn_detached(&self, plan: &LaunchPlan) -> std::io::Result<()> {
        let mut command = Command::new(&plan.program);
        command.args(&plan.args).current_dir(&plan.cwd);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NEW_CONSOLE | CREATE_NEW_PROCESS_GROUP);
        }

        let mut child = command.spawn()?;
        // Nothing else waits on the child; reap it once it exits.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Picks the first available terminal for the platform family and starts it.
/// Success means the terminal process started, not that the command succeeded.
pub struct TerminalLauncher {
    family: Box<dyn TerminalFamily>,
    resolver: Box<dyn ExecutableResolver>,
    spawner: Box<dyn ProcessSpawner>,
}

impl TerminalLauncher {
    pub fn new(
        family: Box<dyn TerminalFamily>,
        resolver: Box<dyn ExecutableResolver>,
        spawner: Box<dyn ProcessSpawner>,
    ) -> Self {
        Self {
            family,
            resolver,
            spawner,
        }
    }

    pub fn system() -> Self {
        Self::new(
            current_family(),
            Box::new(SearchPathResolver::from_env()),
            Box::new(SystemSpawner),
        )
    }

    pub fn plan(
        &self,
        command: &str,
        directory: &Path,
        preferred: PreferredTerminal,
    ) -> Result<LaunchPlan> {
        for candidate in self.family.candidates(preferred) {
            let Some(program) = self.resolver.resolve(candidate.executable()) else {
                debug!(
                    family = self.family.name(),
                    executable = candidate.executable(),
                    "terminal candidate not found"
                );
                continue;
            };
            return Ok(LaunchPlan {
                candidate,
                program,
                args: candidate.args(command, directory),
                cwd: directory.to_path_buf(),
            });
        }
        Err(YaError::NoTerminal)
    }

    pub fn launch(
        &self,
        command: &str,
        directory: &Path,
        preferred: PreferredTerminal,
    ) -> Result<LaunchedTerminal> {
        let plan = self.plan(command, directory, preferred)?;
        self.spawner
            .spawn_detached(&plan)
            .map_err(|source| YaError::Spawn {
                program: plan.program.display().to_string(),
                source,
            })?;

        let command_line = plan.command_line();
        info!(
            terminal = plan.candidate.executable(),
            preferred = %preferred,
            directory = %directory.display(),
            "launched terminal"
        );
        Ok(LaunchedTerminal {
            terminal: plan.candidate,
            command_line,
            directory: directory.display().to_string(),
        })
    }

    /// Whether `name` (for example the `ya` CLI) resolves on the search path.
    pub fn cli_exists(&self, name: &str) -> bool {
        self.resolver.resolve(name).is_some()
    }
}
