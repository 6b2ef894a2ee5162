//! Append-only request history. Each tool owns one file holding a single JSON array; an
//! append reads the whole array, pushes the entry and swaps in a rewritten file.

use std::{
    fs,
    io::{ErrorKind, Write as _},
    path::{Path, PathBuf},
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::download::timestamp;

#[derive(Debug, Clone)]
pub struct RequestLog {
    path: PathBuf,
}

impl RequestLog {
    pub fn new(logs_dir: &Path, file_name: &str) -> Self {
        Self {
            path: logs_dir.join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> Result<Vec<Value>> {
        match self.read_existing()? {
            None => Ok(vec![]),
            Some(src) => serde_json::from_str(&src)
                .wrap_err_with(|| format!("{} is not a JSON array", self.path.display())),
        }
    }

    pub fn append<T: Serialize>(&self, entry: &T) -> Result<()> {
        let entry = serde_json::to_value(entry)?;
        let dir = self
            .path
            .parent()
            .ok_or_else(|| eyre!("{} has no parent folder", self.path.display()))?;
        fs::create_dir_all(dir)?;

        let mut entries = match self.read_existing()? {
            None => vec![],
            Some(src) => match serde_json::from_str::<Vec<Value>>(&src) {
                Ok(entries) => entries,
                Err(e) => {
                    let backup = self.move_aside()?;
                    warn!(
                        "Existing log file was corrupted ({e}). Moved it to {} and started a new log.",
                        backup.display()
                    );
                    vec![]
                }
            },
        };
        entries.push(entry);

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &entries)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)?;
        debug!("{} now holds {} entries", self.path.display(), entries.len());
        Ok(())
    }

    /// File content, `None` for a missing or blank file
    fn read_existing(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(src) if src.trim().is_empty() => Ok(None),
            Ok(src) => Ok(Some(src)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).wrap_err_with(|| format!("Couldn't read {}", self.path.display())),
        }
    }

    fn move_aside(&self) -> Result<PathBuf> {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".corrupt-{}", timestamp()));
        let backup = self.path.with_file_name(name);
        fs::rename(&self.path, &backup)?;
        Ok(backup)
    }
}
