//! Size-based rotation for the configured `info.log` / `error.log` sinks.
//!
//! A write that would push the live file past its limit first rotates it:
//!   `info.log` → `info.log.1` → `info.log.2` → … → `info.log.<backups>`
//! then reopens a fresh `info.log`. Rotated copies older than the configured
//! age are deleted after each rotation.

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use watcher_core::LogConfig;

/// Append-only log file that rotates itself by size.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    max_backups: Option<usize>,
    max_age: Option<Duration>,
    file: File,
    size: u64,
}

impl RotatingFile {
    /// Open `<config.path>/<file_name>`, creating the directory if needed.
    pub fn from_config(config: &LogConfig, file_name: &str) -> io::Result<Self> {
        create_log_dir(&config.path)?;
        Self::open(
            config.path.join(file_name),
            config.max_bytes(),
            config.max_backups(),
            config.max_age(),
        )
    }

    /// `max_backups: None` keeps every rotated copy; `max_age: None` never
    /// prunes by age.
    pub fn open(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        max_backups: Option<usize>,
        max_age: Option<Duration>,
    ) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            max_backups,
            max_age,
            file,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        shift_backups(&self.path, self.max_backups)?;
        fs::rename(&self.path, numbered_path(&self.path, 1))?;
        self.file = open_append(&self.path)?;
        self.size = 0;

        if let Some(max_age) = self.max_age {
            prune_expired(&self.path, max_age, SystemTime::now())?;
        }
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // An oversized record still lands in a file of its own.
        if self.size > 0 && self.size.saturating_add(buf.len() as u64) > self.max_bytes {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Create `dir` and any missing parents. A directory created here ends up
/// 0755 regardless of the umask; an existing one is left alone.
pub fn create_log_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o755);
    builder.create(dir)?;
    // `<new>/..` names an existing parent, which keeps its mode.
    #[cfg(unix)]
    if dir.file_name().is_some() {
        fs::set_permissions(dir, std::os::unix::fs::PermissionsExt::from_mode(0o755))?;
    }
    Ok(())
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Move every `<name>.<n>` to `<name>.<n+1>`, dropping the copy that would
/// exceed `max_backups`.
fn shift_backups(base: &Path, max_backups: Option<usize>) -> io::Result<()> {
    let top = match max_backups {
        Some(max) => {
            let oldest = numbered_path(base, max);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            max.saturating_sub(1)
        }
        None => backup_indices(base)?.into_iter().max().unwrap_or(0),
    };

    for n in (1..=top).rev() {
        let src = numbered_path(base, n);
        if src.exists() {
            fs::rename(&src, numbered_path(base, n + 1))?;
        }
    }
    Ok(())
}

/// Delete rotated copies last modified before `now - max_age`.
fn prune_expired(base: &Path, max_age: Duration, now: SystemTime) -> io::Result<()> {
    let Some(cutoff) = now.checked_sub(max_age) else {
        return Ok(());
    };
    for n in backup_indices(base)? {
        let backup = numbered_path(base, n);
        let modified = match fs::metadata(&backup).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        };
        if modified < cutoff {
            fs::remove_file(&backup)?;
        }
    }
    Ok(())
}

/// Indices `n` of the existing `<name>.<n>` siblings of `base`.
fn backup_indices(base: &Path) -> io::Result<Vec<usize>> {
    let Some(name) = base.file_name().and_then(|s| s.to_str()) else {
        return Ok(Vec::new());
    };
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!("{name}.");

    let mut indices = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(suffix) = file_name.to_str().and_then(|s| s.strip_prefix(&prefix)) else {
            continue;
        };
        if let Ok(n) = suffix.parse::<usize>() {
            if n > 0 {
                indices.push(n);
            }
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Build the path for the `n`-th rotated copy of `base` (e.g. `info.log.2`).
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("info.log");
    base.with_file_name(format!("{name}.{n}"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
