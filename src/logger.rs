//! Session log for the mask engine.
//!
//! One file per editing session, truncated when [`init`] runs.  Before that
//! every log call is dropped, so the engine can be embedded (and tested)
//! without touching the filesystem.
//!
//! Default location: `<data dir>/MaskFE/maskfe.log`, where the data dir is
//! `%APPDATA%` on Windows, `~/Library/Application Support` on macOS and
//! `$XDG_DATA_HOME` (or `~/.local/share`) elsewhere.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity tag written in front of each line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Panic,
}

impl Level {
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
        }
    }
}

struct SessionLog {
    path: PathBuf,
    file: Mutex<File>,
}

static SESSION: OnceLock<SessionLog> = OnceLock::new();

/// Path of the active session log, if one was opened.
pub fn log_path() -> Option<&'static Path> {
    SESSION.get().map(|s| s.path.as_path())
}

/// Open the session log at its default location and install the panic hook.
/// Failure to open the file is reported on stderr and leaves logging off.
pub fn init() {
    let path = default_log_path();
    if let Err(e) = init_at(&path) {
        eprintln!("[maskfe] could not open log {}: {}", path.display(), e);
    }
}

/// Open (truncating) a session log at `path`.  Only the first successful
/// call takes effect; later calls are no-ops.
pub fn init_at(path: &Path) -> io::Result<()> {
    if SESSION.get().is_some() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let session = SessionLog {
        path: path.to_path_buf(),
        file: Mutex::new(file),
    };
    if SESSION.set(session).is_err() {
        return Ok(());
    }

    append(&format!("=== MaskFE session, unix {} ===", unix_secs()));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log(Level::Panic, format_args!("{}", info));
        prev(info);
    }));
    Ok(())
}

/// Write one timestamped line.  I/O errors are swallowed so logging never
/// interrupts an edit.
pub fn log(level: Level, args: fmt::Arguments<'_>) {
    if SESSION.get().is_none() {
        return;
    }
    append(&format_line(unix_secs(), level, &args.to_string()));
}

fn append(line: &str) {
    if let Some(session) = SESSION.get()
        && let Ok(mut file) = session.file.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, format_args!($($arg)*))
    };
}

/// `[HH:MM:SS] [LEVEL] msg`, clock taken modulo one UTC day.
fn format_line(secs: u64, level: Level, msg: &str) -> String {
    let day = secs % 86_400;
    format!(
        "[{:02}:{:02}:{:02}] [{}] {}",
        day / 3600,
        day % 3600 / 60,
        day % 60,
        level.tag(),
        msg
    )
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn default_log_path() -> PathBuf {
    data_dir().join("MaskFE").join("maskfe.log")
}

fn data_dir() -> PathBuf {
    let env_dir = |key: &str| std::env::var_os(key).map(PathBuf::from);
    let home = env_dir("HOME");

    if cfg!(target_os = "windows")
        && let Some(appdata) = env_dir("APPDATA")
    {
        return appdata;
    }
    if cfg!(target_os = "macos")
        && let Some(home) = &home
    {
        return home.join("Library").join("Application Support");
    }
    env_dir("XDG_DATA_HOME")
        .or_else(|| home.map(|h| h.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format_wraps_at_midnight() {
        assert_eq!(format_line(0, Level::Info, "hi"), "[00:00:00] [INFO] hi");
        assert_eq!(format_line(3661, Level::Warn, "x"), "[01:01:01] [WARN] x");
        assert_eq!(
            format_line(86_400 + 59, Level::Error, "late"),
            "[00:00:59] [ERROR] late"
        );
    }

    #[test]
    fn logging_before_init_is_dropped() {
        if log_path().is_none() {
            crate::log_warn!("still {}", "nothing");
            assert!(log_path().is_none());
        }
    }

    #[test]
    fn default_path_ends_in_app_folder() {
        assert!(default_log_path().ends_with(Path::new("MaskFE").join("maskfe.log")));
    }
}
