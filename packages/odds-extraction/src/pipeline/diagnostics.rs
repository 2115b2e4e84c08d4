//! Diagnostic dumper - page markup snapshots for postmortem debugging.
//!
//! Artifacts are write-once files named by capture time
//! (`2024-05-01_143022.html`). A second capture within the same second gets
//! a numeric suffix instead of overwriting the first.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::DiagnosticError;

/// Sortable date + time, in UTC.
const FILE_STAMP: &str = "%Y-%m-%d_%H%M%S";

const MAX_NAME_TRIES: u32 = 100;

#[derive(Debug, Clone)]
pub struct DiagnosticDumper {
    dir: PathBuf,
}

impl DiagnosticDumper {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `markup` to a new artifact stamped with the current time.
    pub async fn dump(&self, markup: &str) -> Result<PathBuf, DiagnosticError> {
        self.dump_at(markup, Utc::now()).await
    }

    /// Write `markup` to a new artifact stamped with `captured_at`.
    pub async fn dump_at(&self, markup: &str, captured_at: DateTime<Utc>) -> Result<PathBuf, DiagnosticError> {
        let stem = captured_at.format(FILE_STAMP).to_string();

        for n in 0..MAX_NAME_TRIES {
            let name = if n == 0 {
                format!("{}.html", stem)
            } else {
                format!("{}-{}.html", stem, n)
            };
            let path = self.dir.join(name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(DiagnosticError::Io { path, source }),
            };

            let written = async {
                file.write_all(markup.as_bytes()).await?;
                file.flush().await
            }
            .await;
            if let Err(source) = written {
                return Err(DiagnosticError::Io { path, source });
            }

            info!(path = %path.display(), bytes = markup.len(), "Saved page source");
            return Ok(path);
        }

        Err(DiagnosticError::NameExhausted {
            stem,
            tries: MAX_NAME_TRIES,
        })
    }
}
