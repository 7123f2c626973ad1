//! Once-per-storage guard for catalog dumps.
//!
//! The artifact of a kind doubles as its marker: if it exists the kind has
//! been dumped and extraction is skipped. Artifacts are staged in a temporary
//! file and moved into place without clobbering, so an existing artifact is
//! never rewritten and an interrupted write never leaves a marker behind.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::CatalogKind;

/// Result of one gate invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The artifact already existed; nothing was extracted.
    Skipped {
        /// Existing artifact.
        path: PathBuf,
    },
    /// Extraction ran and the artifact was written.
    Written {
        /// New artifact.
        path: PathBuf,
        /// Number of records in the artifact.
        records: usize,
    },
}

/// Guards catalog artifacts inside the profile directory.
#[derive(Debug, Clone)]
pub struct DumpGate {
    dir: PathBuf,
}

impl DumpGate {
    /// Create a gate storing artifacts in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the artifacts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the artifact for `kind`.
    pub fn artifact_path(&self, kind: CatalogKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Whether `kind` has already been dumped.
    pub fn is_dumped(&self, kind: CatalogKind) -> bool {
        self.artifact_path(kind).exists()
    }

    /// Run `extract` and persist its records unless `kind` was dumped before.
    pub fn run_once<T, F>(&self, kind: CatalogKind, extract: F) -> Result<GateOutcome>
    where
        T: Serialize,
        F: FnOnce() -> Vec<T>,
    {
        let path = self.artifact_path(kind);
        if self.is_dumped(kind) {
            debug!(%kind, path = %path.display(), "catalog already dumped");
            return Ok(GateOutcome::Skipped { path });
        }

        let records = extract();
        let serialized = serde_json::to_vec_pretty(&records)
            .with_context(|| format!("failed to serialize {kind} records"))?;

        if !self.write_new(&path, &serialized)? {
            debug!(%kind, path = %path.display(), "artifact appeared during extraction");
            return Ok(GateOutcome::Skipped { path });
        }

        info!(%kind, records = records.len(), path = %path.display(), "catalog dumped");
        Ok(GateOutcome::Written {
            path,
            records: records.len(),
        })
    }

    /// Stage `contents` and move it to `path`; `false` if `path` already exists.
    fn write_new(&self, path: &Path, contents: &[u8]) -> Result<bool> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let mut staged = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("failed to stage artifact in {}", self.dir.display()))?;
        staged
            .write_all(contents)
            .with_context(|| format!("failed to write staged artifact for {}", path.display()))?;

        match staged.persist_noclobber(path) {
            Ok(_) => Ok(true),
            Err(err) if err.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => {
                Err(err.error).with_context(|| format!("failed to persist {}", path.display()))
            }
        }
    }
}
