//! Sharded spool directory, the durable queue of pending PDFs.
//!
//! Files are stored under a two-level hex fan-out derived from the first
//! four characters of their name, e.g. SHA-1
//! `1f09d30c707d53f3d16c530dd73d70a6ce7596a9` lives at
//! `<root>/1f/09/d30c707d53f3d16c530dd73d70a6ce7596a9`. No locking, no
//! caching; the filesystem is authoritative.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Expected length of a lowercase hex SHA-1 digest.
pub const SHA1_HEX_LENGTH: usize = 40;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("name `{0}` too short for sharding, need at least 8 characters")]
    ShortName(String),
    #[error("failed to create shard directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle to the spool root. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SpoolDir {
    root: PathBuf,
}

impl SpoolDir {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full sharded path for a filename. Names longer than a bare digest
    /// keep their suffix in the leaf segment, so
    /// `<digest>.tei.xml` maps to `XX/YY/<rest>.tei.xml`. With `create`
    /// the two shard directories are created; creation is idempotent and
    /// tolerates concurrent creators.
    pub fn sharded_path(&self, name: &str, create: bool) -> Result<PathBuf, SpoolError> {
        let (Some(s0), Some(s1), Some(rest)) = (name.get(0..2), name.get(2..4), name.get(4..))
        else {
            return Err(SpoolError::ShortName(name.to_string()));
        };
        if name.len() < 8 {
            return Err(SpoolError::ShortName(name.to_string()));
        }
        let dir = self.root.join(s0).join(s1);
        if create {
            fs::create_dir_all(&dir).map_err(|source| SpoolError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(dir.join(rest))
    }

    /// Whether the sharded path for `name` exists. An I/O failure other
    /// than "not found" is reported as an error rather than `false`, so
    /// callers can tell "definitively absent" from "cannot decide".
    pub fn exists(&self, name: &str) -> Result<bool, SpoolError> {
        let path = self.sharded_path(name, false)?;
        match fs::metadata(&path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SpoolError::Stat { path, source }),
        }
    }
}

/// Recover the identifier from a sharded path by concatenating its last
/// three segments. Returns the empty string for paths with fewer than
/// three segments.
pub fn identifier_from_path(path: &Path) -> String {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    if parts.len() < 3 {
        return String::new();
    }
    parts[parts.len() - 3..].concat()
}
