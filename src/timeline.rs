//! Append-only human-readable audit log, one `timeline.md` per initiative.
//!
//! The timeline mirrors the structured `history` entries in the state
//! document as markdown. Entries are only ever appended; the file is never
//! rewritten, truncated, or reordered.

use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::errors::SignoffError;

pub struct Timeline {
    path: PathBuf,
}

impl Timeline {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Write the timeline header with the first entry. Only called at
    /// initiative creation.
    pub fn seed(&self, key: &str, title: &str) -> Result<(), SignoffError> {
        let content = format!(
            "# Timeline: {key}\n\n## {title}\n\n---\n\n### {} — Initiative Initialized\n\n\
             - **Phase:** planning\n- **Step:** prd\n- **Action:** Initiative created\n\n---\n",
            Utc::now().to_rfc3339()
        );
        fs::write(&self.path, content).map_err(|e| SignoffError::storage(&self.path, e))
    }

    /// Append one timestamped entry.
    pub fn append(&self, label: &str, lines: &[String]) -> Result<(), SignoffError> {
        let mut entry = format!("\n### {} — {}\n\n", Utc::now().to_rfc3339(), label);
        for line in lines {
            entry.push_str("- ");
            entry.push_str(line);
            entry.push('\n');
        }
        entry.push_str("\n---\n");

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SignoffError::storage(&self.path, e))?
            .write_all(entry.as_bytes())
            .map_err(|e| SignoffError::storage(&self.path, e))
    }
}
