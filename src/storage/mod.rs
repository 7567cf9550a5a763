//! Storage layer for docvault
//!
//! Whole-file reads, atomic writes and flat directory scans. Nothing in this
//! layer ever sees decrypted bytes on the write path.

pub mod file_io;

pub use file_io::{read_secure, write_atomic};

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{VaultError, VaultResult};

/// Which directory entries a batch operation picks up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileFilter {
    /// Every regular file
    #[default]
    All,
    /// Files with this extension (without the dot), e.g. `txt`
    Extension(String),
}

impl FileFilter {
    /// Build from an optional extension, accepting `txt`, `.txt` or `*.txt`
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext.map(|e| e.trim_start_matches('*').trim_start_matches('.')) {
            Some(e) if !e.is_empty() => Self::Extension(e.to_string()),
            _ => Self::All,
        }
    }

    fn matches(&self, path: &Path) -> bool {
        match self {
            Self::All => true,
            Self::Extension(ext) => path.extension().map_or(false, |e| e == ext.as_str()),
        }
    }
}

/// Report key for a directory entry
///
/// Names that are not valid UTF-8 are kept in their escaped debug form, so
/// two such names never collapse into one key.
fn entry_name(name: OsString) -> String {
    name.into_string().unwrap_or_else(|raw| format!("{:?}", raw))
}

/// List regular files directly inside `dir`, sorted by name
///
/// Hidden files and in-progress temp files are skipped. Symlinks are
/// followed; dangling ones are skipped. Subdirectories are not descended
/// into. Every returned name is unique.
pub fn list_files(dir: &Path, filter: &FileFilter) -> VaultResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| VaultError::io(dir, e))? {
        let entry = entry.map_err(|e| VaultError::io(dir, e))?;
        let path = entry.path();

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(VaultError::io(&path, e)),
        }

        let raw = entry.file_name();
        if file_io::is_candidate_name(&raw.to_string_lossy()) && filter.matches(&path) {
            files.push((entry_name(raw), path));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(pair) = files.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(VaultError::Config(format!(
            "Two files in {} map to the same name {}",
            dir.display(),
            pair[0].0
        )));
    }
    Ok(files)
}
