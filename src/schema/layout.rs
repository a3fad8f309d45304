// layout.rs - Filesystem layout of the typing backend

use crate::error::{Result, TypingError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMAS_DIR: &str = "schemas";
const CLUSTERS_DIR: &str = "clusters";
const REFS_DIR: &str = "refs";
const ARCHIVE_EXTENSION: &str = "npz";

/// Resolves schema, cluster archive and master profile paths under a backend root
#[derive(Debug, Clone)]
pub struct BackendLayout {
    root: PathBuf,
}

impl BackendLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/schemas/<schema>`
    pub fn schema_dir(&self, schema: &str) -> PathBuf {
        self.root.join(SCHEMAS_DIR).join(schema)
    }

    /// `<root>/clusters/<schema>.npz`
    pub fn cluster_archive(&self, schema: &str) -> PathBuf {
        self.root
            .join(CLUSTERS_DIR)
            .join(format!("{}.{}", schema, ARCHIVE_EXTENSION))
    }

    pub fn refs_dir(&self) -> PathBuf {
        self.root.join(REFS_DIR)
    }

    /// `<root>/refs/<schema>_<date>_joined.tsv`; without a date, the latest one present
    pub fn master_profile(&self, schema: &str, date: Option<&str>) -> Result<PathBuf> {
        if let Some(date) = date {
            return Ok(self
                .refs_dir()
                .join(format!("{}_{}_joined.tsv", schema, date)));
        }

        let refs_dir = self.refs_dir();
        let pattern = Regex::new(&format!(r"^{}_(\d{{8}})_joined\.tsv$", regex::escape(schema)))
            .map_err(|e| TypingError::Config(format!("Invalid master table pattern: {}", e)))?;

        let entries = fs::read_dir(&refs_dir).map_err(|e| TypingError::io(&refs_dir, e))?;
        let mut latest: Option<(String, PathBuf)> = None;

        for entry in entries {
            let entry = entry.map_err(|e| TypingError::io(&refs_dir, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(caps) = pattern.captures(name) {
                let date = caps[1].to_string();
                if latest.as_ref().map_or(true, |(best, _)| date > *best) {
                    latest = Some((date, entry.path()));
                }
            }
        }

        match latest {
            Some((date, path)) => {
                log::debug!("Master profile table for {}: {} ({})", schema, path.display(), date);
                Ok(path)
            }
            None => Err(TypingError::MissingOutput(
                refs_dir.join(format!("{}_<date>_joined.tsv", schema)),
            )),
        }
    }
}
