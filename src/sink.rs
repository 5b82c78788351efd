//! Persistent destinations for extracted assets.
//!
//! The pipeline only decides what to write; an `AssetSink` owns where and how.
//! Sinks must not leave a registered-but-empty entry behind when a write fails.

use crate::bitmap::Bitmap;
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where and under what name one asset should land.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SinkEntry {
    pub file_name: String,
    pub extension: String,
    pub mime_type: String,
    /// Sub-folder of the sink root; `None` writes at the root.
    pub folder: Option<String>,
}

impl SinkEntry {
    pub fn new(
        file_name: impl Into<String>,
        extension: impl Into<String>,
        mime_type: impl Into<String>,
        folder: Option<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            extension: extension.into(),
            mime_type: mime_type.into(),
            folder,
        }
    }

    /// `file_name.extension`
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.file_name, self.extension)
    }
}

/// Payload handed to a sink.
pub enum SinkBody {
    Bytes(Vec<u8>),
    Stream(Box<dyn Read>),
    Pixels(Bitmap),
    Text(String),
}

pub trait AssetSink {
    fn write(&self, entry: &SinkEntry, body: SinkBody) -> Result<()>;
}

#[derive(Clone, Debug)]
/// Writes assets below a root directory (a stand-in for a Downloads folder).
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Final path an entry is written to.
    pub fn destination(&self, entry: &SinkEntry) -> Result<PathBuf> {
        let mut dir = self.root.clone();
        if let Some(folder) = entry.folder.as_deref() {
            ensure_single_component(folder, "folder")?;
            dir.push(folder);
        }
        let name = entry.display_name();
        ensure_single_component(&name, "file name")?;
        Ok(dir.join(name))
    }
}

impl AssetSink for DirectorySink {
    fn write(&self, entry: &SinkEntry, body: SinkBody) -> Result<()> {
        let destination = self.destination(entry)?;
        let dir = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        // Staged next to the destination; dropped (and deleted) on any error.
        let mut staged = NamedTempFile::new_in(&dir)
            .with_context(|| format!("staging write in {}", dir.display()))?;
        match body {
            SinkBody::Bytes(bytes) => staged.write_all(&bytes)?,
            SinkBody::Text(text) => staged.write_all(text.as_bytes())?,
            SinkBody::Stream(mut stream) => {
                io::copy(&mut stream, &mut staged)
                    .with_context(|| format!("copying stream into {}", entry.display_name()))?;
            }
            SinkBody::Pixels(bitmap) => staged.write_all(&bitmap.encode_png()?)?,
        }
        staged.flush()?;
        staged
            .persist(&destination)
            .map_err(|err| err.error)
            .with_context(|| format!("persisting {}", destination.display()))?;
        tracing::debug!(
            path = %destination.display(),
            mime_type = %entry.mime_type,
            "wrote asset"
        );
        Ok(())
    }
}

fn ensure_single_component(value: &str, label: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        bail!("{label} '{value}' must be a single path component");
    }
    Ok(())
}
