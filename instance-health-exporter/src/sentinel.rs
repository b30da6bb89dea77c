use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Line written by the provisioning subsystem when a local provision on an
/// auto-scaled instance fails. Matched as an exact line, terminator excluded.
pub const FAILURE_MARKER: &str = "FAILED SELF-PROVISIONING";

/// A log-like file owned by the provisioning subsystem. The exporter treats
/// it as a queue of status lines: a marker line signals an unhealthy
/// provision and is consumed (deleted in place) once observed.
pub struct SentinelFile {
    path: PathBuf,
}

impl SentinelFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Whether the file currently contains a marker line. An unreadable file
    /// is an error, never a default: absence of evidence is not health.
    pub fn scan(&self) -> Result<bool> {
        let contents = fs::read(&self.path)
            .with_context(|| format!("failed to read sentinel file {}", self.path.display()))?;

        let found = lines_with_terminators(&contents).any(is_marker_line);
        Ok(found)
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Rewrite the file in place, dropping every marker line and keeping all
    /// other lines byte-for-byte, terminators included. Read-all/write-all
    /// replace: not atomic, and a writer racing the rewrite can lose a line.
    pub fn remove_markers(&self) -> Result<()> {
        let contents = fs::read(&self.path)
            .with_context(|| format!("failed to read sentinel file {}", self.path.display()))?;

        let kept: Vec<u8> = lines_with_terminators(&contents)
            .filter(|line| !is_marker_line(line))
            .flatten()
            .copied()
            .collect();

        fs::write(&self.path, kept)
            .with_context(|| format!("failed to rewrite sentinel file {}", self.path.display()))
    }
}

fn lines_with_terminators(contents: &[u8]) -> impl Iterator<Item = &[u8]> {
    contents.split_inclusive(|&b| b == b'\n')
}

fn is_marker_line(line: &[u8]) -> bool {
    let body = line.strip_suffix(b"\n").unwrap_or(line);
    let body = body.strip_suffix(b"\r").unwrap_or(body);
    body == FAILURE_MARKER.as_bytes()
}
