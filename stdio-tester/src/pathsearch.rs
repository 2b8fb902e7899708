//! Resolution of the command under test to something we can launch.

use std::{
    collections::VecDeque,
    fmt::Display,
    path::{Path, PathBuf},
};

use crate::error::Error;

/// Characters that only make sense to a command interpreter.
const SHELL_METACHARACTERS: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', '*', '?', '[', ']', '#', '~',
    '=', '%', '{', '}',
];

/// How the command under test is to be launched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandSpec {
    /// Launch the given executable file directly.
    Program(PathBuf),
    /// Hand the given command line to `sh -c`.
    ShellCommand(String),
}

impl Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Program(path) => write!(f, "{}", path.display()),
            Self::ShellCommand(command) => write!(f, "sh -c '{command}'"),
        }
    }
}

impl CommandSpec {
    /// Resolves a user-provided command.
    ///
    /// A command naming an existing file is run from the current directory. A command
    /// containing whitespace or shell syntax is run through `sh`. Anything else is looked
    /// up in `PATH`.
    pub fn resolve(command: &str) -> Result<Self, Error> {
        let path = Path::new(command);
        if path.exists() {
            let program = if path.is_relative() {
                Path::new(".").join(path)
            } else {
                path.to_path_buf()
            };

            return Ok(Self::Program(program));
        }

        if command.trim().is_empty() {
            return Err(Error::CommandNotFound(command.to_owned()));
        }

        if command.contains(char::is_whitespace) || command.contains(SHELL_METACHARACTERS) {
            return Ok(Self::ShellCommand(command.to_owned()));
        }

        let search_paths = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
            .unwrap_or_default();

        search_for_executable(search_paths.into_iter(), command)
            .next()
            .map(Self::Program)
            .ok_or_else(|| Error::CommandNotFound(command.to_owned()))
    }

    /// Creates a process builder that launches this command.
    pub fn to_command(&self) -> std::process::Command {
        match self {
            Self::Program(path) => std::process::Command::new(path),
            Self::ShellCommand(command) => {
                let mut cmd = std::process::Command::new("sh");
                cmd.arg("-c").arg(command);
                cmd
            }
        }
    }
}

/// Encapsulates the result of a path search.
pub struct ExecutablePathSearch<N: AsRef<str>> {
    paths: VecDeque<PathBuf>,
    filename: N,
}

impl<N: AsRef<str>> Iterator for ExecutablePathSearch<N> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.paths.pop_front() {
            let path = path.join(self.filename.as_ref());
            if path.is_file() && is_executable(&path) {
                return Some(path);
            }
        }

        None
    }
}

/// Search for the given executable name in the provided paths.
///
/// # Arguments
///
/// * `paths` - An iterator over the paths to search.
/// * `filename` - The name of the executable file to search for.
pub fn search_for_executable<P, N>(paths: P, filename: N) -> ExecutablePathSearch<N>
where
    P: Iterator<Item = PathBuf>,
    N: AsRef<str>,
{
    ExecutablePathSearch {
        paths: paths.collect(),
        filename,
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|metadata| metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
