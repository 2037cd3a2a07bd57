//! Topology file loading with cheap per-tick reload.
//!
//! The configuration surface rewrites the file; the engine re-reads it when
//! the mtime changes. A reload that fails to parse keeps the previous
//! document so a half-written file cannot take the bridge down.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chatlink_core::topology::TopologyDoc;

pub struct TopologyFile {
    path: PathBuf,
    modified: Option<SystemTime>,
    doc: TopologyDoc,
}

impl TopologyFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        let doc = TopologyDoc::parse(&text)?;
        Ok(Self {
            path: path.to_owned(),
            modified: mtime(path),
            doc,
        })
    }

    /// A fixed in-memory topology that never reloads. Used by tests and by
    /// callers that manage configuration themselves.
    #[must_use]
    pub fn fixed(doc: TopologyDoc) -> Self {
        Self {
            path: PathBuf::new(),
            modified: None,
            doc,
        }
    }

    #[must_use]
    pub fn doc(&self) -> &TopologyDoc {
        &self.doc
    }

    /// Re-read the file if its mtime moved. Returns `true` when a new
    /// document was installed.
    pub fn reload_if_changed(&mut self) -> bool {
        if self.path.as_os_str().is_empty() {
            return false;
        }
        let modified = mtime(&self.path);
        if modified == self.modified {
            return false;
        }
        // Record the new mtime either way: a file that fails to parse once
        // should not be retried (and logged) every tick until it changes
        // again.
        self.modified = modified;
        match fs::read_to_string(&self.path)
            .map_err(anyhow::Error::from)
            .and_then(|text| Ok(TopologyDoc::parse(&text)?))
        {
            Ok(doc) => {
                self.doc = doc;
                tracing::info!("topology reloaded from {}", self.path.display());
                true
            }
            Err(err) => {
                tracing::warn!(
                    "failed to reload topology from {}, keeping previous: {err}",
                    self.path.display()
                );
                false
            }
        }
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
