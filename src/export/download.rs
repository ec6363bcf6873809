use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::assets::decode::to_data_uri;
use crate::foundation::error::CardResult;

/// One downloadable file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn png(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: "image/png",
            bytes,
        }
    }

    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: "application/pdf",
            bytes,
        }
    }

    /// The form a browser download link carries.
    pub fn data_uri(&self) -> String {
        to_data_uri(self.mime, &self.bytes)
    }
}

/// "Save as" target for finished artifacts.
pub trait DownloadSurface: Send {
    fn save(&mut self, artifact: Artifact) -> CardResult<()>;
}

/// Writes artifacts into a directory. Each file is written under a temporary name and renamed
/// into place, so a failed write never leaves a partial download behind.
#[derive(Clone, Debug)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSurface for DirectoryDownloads {
    fn save(&mut self, artifact: Artifact) -> CardResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create download directory '{}'", self.dir.display()))?;
        let final_path = self.dir.join(&artifact.file_name);
        let tmp_path = self
            .dir
            .join(format!(".{}.part-{}", artifact.file_name, std::process::id()));

        let written = std::fs::write(&tmp_path, &artifact.bytes)
            .and_then(|()| std::fs::rename(&tmp_path, &final_path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(anyhow::Error::new(e)
                .context(format!("save download '{}'", final_path.display()))
                .into());
        }
        tracing::info!(path = %final_path.display(), bytes = artifact.bytes.len(), "download saved");
        Ok(())
    }
}

/// Keeps artifacts in memory; clones share the same list.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDownloads {
    saved: Arc<Mutex<Vec<Artifact>>>,
}

impl InMemoryDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.saved
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.artifacts().into_iter().map(|a| a.file_name).collect()
    }
}

impl DownloadSurface for InMemoryDownloads {
    fn save(&mut self, artifact: Artifact) -> CardResult<()> {
        self.saved
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(artifact);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/download.rs"]
mod tests;
