//! The closed set of lifecycle commands.

use std::fmt;
use std::str::FromStr;

/// Which containers a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    Running,
    All,
}

impl ListFilter {
    /// Whether stopped containers are included.
    pub fn includes_stopped(self) -> bool {
        self == ListFilter::All
    }
}

/// One lifecycle operation. Targeted variants carry an optional container
/// name; `None` means "ask the user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(ListFilter),
    Install,
    Download,
    Stop(Option<String>),
    Restart(Option<String>),
    Remove(Option<String>),
    Update,
    Logs(Option<String>),
    Shell(Option<String>),
    StartWatchtower,
}

impl Command {
    /// Keyword that selects this command.
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::List(_) => "list",
            Command::Install => "install",
            Command::Download => "download",
            Command::Stop(_) => "stop",
            Command::Restart(_) => "restart",
            Command::Remove(_) => "remove",
            Command::Update => "update",
            Command::Logs(_) => "logs",
            Command::Shell(_) => "shell",
            Command::StartWatchtower => "start-watchtower",
        }
    }

    /// Attach a target container to a targeted command. Other commands are
    /// returned unchanged.
    pub fn with_target(self, name: Option<String>) -> Self {
        match self {
            Command::Stop(_) => Command::Stop(name),
            Command::Restart(_) => Command::Restart(name),
            Command::Remove(_) => Command::Remove(name),
            Command::Logs(_) => Command::Logs(name),
            Command::Shell(_) => Command::Shell(name),
            other => other,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Input that names no command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    /// Parse a menu keyword (case-insensitive, surrounding whitespace ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s.trim().to_lowercase().as_str() {
            "list" => Command::List(ListFilter::All),
            "install" => Command::Install,
            "download" => Command::Download,
            "stop" => Command::Stop(None),
            "restart" => Command::Restart(None),
            "remove" => Command::Remove(None),
            "update" => Command::Update,
            "logs" => Command::Logs(None),
            "shell" => Command::Shell(None),
            "start-watchtower" | "start_watchtower" => Command::StartWatchtower,
            _ => return Err(UnknownCommand(s.trim().to_string())),
        };
        Ok(command)
    }
}

/// Menu help text.
pub const USAGE: &str = "
▄▀▄▀▄▀▄▀   Edge Container Manager   ▀▄▀▄▀▄▀▄

Commands:

  list         List the currently installed containers
  install      Install a new container
  download     Download the latest container image (OEM use only)
  stop         Kills a running container
  restart      Restart a container & update to the latest version
  remove       Remove a container
  update       Migrate legacy containers and check for image updates
  logs         Print the logs of a container
  shell        Open an interactive shell in a running container
  exit         Quits this program";
