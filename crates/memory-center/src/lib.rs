//! Cross-run memory for the webpilot agent.
//!
//! Three tiers share one JSON document:
//! - `episodic`: append-only log of completed runs ([`MemoryEntry`]);
//! - `semantic`: per-site summary of patterns and common issues;
//! - `procedural`: per-site summary of approaches that actually worked.
//!
//! The semantic and procedural maps are derived caches: each is always a
//! pure function of the episodic entries for its URL at the time it was last
//! recomputed. Recomputation happens on every write (`add_episode`), never
//! lazily on read, so the summaries at rest are always consistent with the
//! log.
//!
//! The store is a single-owner resource: one process holds the backing file
//! for the duration of a load/compute/save cycle. No cross-process locking
//! is provided.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use webpilot_core_types::{Insight, MemoryEntry, Trajectory};

/// Returned by the summary getters when no episode exists for a site.
pub const NO_EXPERIENCE: &str = "No experience with this site yet.";
/// Returned by the procedural getter when no successful episode exists.
pub const NO_APPROACHES: &str = "No successful approaches recorded yet.";

/// Errors emitted by the memory store.
///
/// Reads self-heal (a missing or corrupt file loads as an empty store), so
/// every variant here comes from the write path or from a summarization
/// call. Write failures are fatal to the run that triggered them: losing
/// learned memory silently would defeat the subsystem.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("failed to persist memory store to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode memory store: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("summarization failed: {0}")]
    Summarize(String),
}

impl MemoryError {
    pub fn summarize(message: impl Into<String>) -> Self {
        Self::Summarize(message.into())
    }
}

/// Seam for the two derived-summary model calls issued by `add_episode`.
///
/// Keeps the store free of HTTP concerns; the CLI wires a model-backed
/// implementation, tests use canned text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize patterns and common issues across all episodes for a site.
    async fn summarize_site(
        &self,
        url: &str,
        episodes: &[MemoryEntry],
    ) -> Result<String, MemoryError>;

    /// Summarize effective approaches across the successful episodes only.
    async fn summarize_successes(
        &self,
        url: &str,
        episodes: &[MemoryEntry],
    ) -> Result<String, MemoryError>;
}

/// On-disk document shape: top-level `episodic`, `semantic`, `procedural`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct MemoryData {
    #[serde(default)]
    episodic: Vec<MemoryEntry>,
    #[serde(default)]
    semantic: BTreeMap<String, String>,
    #[serde(default)]
    procedural: BTreeMap<String, String>,
}

/// The three-tier store plus its backing file path.
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    data: MemoryData,
}

impl MemoryStore {
    /// Open the store at `path`, treating a missing or unreadable file as an
    /// empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(err) => {
                    warn!(path = %path.display(), error = %err,
                        "memory file is corrupt; starting from an empty store");
                    MemoryData::default()
                }
            },
            Ok(_) => MemoryData::default(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => MemoryData::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err,
                    "memory file is unreadable; starting from an empty store");
                MemoryData::default()
            }
        };
        debug!(path = %path.display(), episodes = data.episodic.len(), "memory store opened");
        Self { path, data }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached semantic summary for a site, or the documented sentinel.
    pub fn site_summary(&self, url: &str) -> String {
        self.data
            .semantic
            .get(url)
            .cloned()
            .unwrap_or_else(|| NO_EXPERIENCE.to_string())
    }

    /// Cached procedural summary for a site, or the documented sentinel.
    pub fn procedural_summary(&self, url: &str) -> String {
        self.data
            .procedural
            .get(url)
            .cloned()
            .unwrap_or_else(|| NO_APPROACHES.to_string())
    }

    /// Most recent episodes for an exact URL, newest first, at most `limit`.
    ///
    /// Different URLs for the same logical site are distinct keys; no fuzzy
    /// matching is attempted.
    pub fn recent_episodes(&self, url: &str, limit: usize) -> Vec<MemoryEntry> {
        let mut episodes: Vec<MemoryEntry> = self
            .data
            .episodic
            .iter()
            .filter(|entry| entry.url == url)
            .cloned()
            .collect();
        episodes.sort_by_key(|entry| entry.recorded_at);
        episodes.reverse();
        episodes.truncate(limit);
        episodes
    }

    /// All episodes, newest first (CLI inspection surface).
    pub fn all_episodes(&self) -> Vec<MemoryEntry> {
        let mut episodes = self.data.episodic.clone();
        episodes.sort_by_key(|entry| entry.recorded_at);
        episodes.reverse();
        episodes
    }

    /// Total number of stored episodes.
    pub fn episode_count(&self) -> usize {
        self.data.episodic.len()
    }

    /// Concatenation of every non-sentinel procedural summary, keyed by
    /// site. Planner input for start-URL selection.
    pub fn procedural_overview(&self) -> String {
        let mut overview = String::new();
        for (url, summary) in &self.data.procedural {
            if summary.is_empty() || summary == NO_APPROACHES {
                continue;
            }
            overview.push_str(&format!("Site: {url}\n{summary}\n\n"));
        }
        overview.trim_end().to_string()
    }

    /// Append an episode and recompute both derived summaries for its URL.
    ///
    /// The semantic summary is recomputed over every episode for the URL,
    /// the procedural summary over the successful subset only; the full
    /// store is then persisted. Recomputation is O(n) in the stored episodes
    /// for that URL per call, which is fine at expected memory sizes.
    pub async fn add_episode(
        &mut self,
        task: impl Into<String>,
        success: bool,
        trajectory: Trajectory,
        url: impl Into<String>,
        insights: Insight,
        summarizer: &dyn Summarizer,
    ) -> Result<(), MemoryError> {
        let url = url.into();
        let entry = MemoryEntry::new(task, success, trajectory, &url, insights);
        self.data.episodic.push(entry);

        let site_episodes: Vec<MemoryEntry> = self
            .data
            .episodic
            .iter()
            .filter(|entry| entry.url == url)
            .cloned()
            .collect();

        let semantic = summarizer.summarize_site(&url, &site_episodes).await?;
        self.data.semantic.insert(url.clone(), semantic);

        let successful: Vec<MemoryEntry> = site_episodes
            .into_iter()
            .filter(|entry| entry.success)
            .collect();
        let procedural = if successful.is_empty() {
            NO_APPROACHES.to_string()
        } else {
            summarizer.summarize_successes(&url, &successful).await?
        };
        self.data.procedural.insert(url, procedural);

        self.persist()
    }

    /// Write the whole document atomically: serialize to a temp file in the
    /// destination directory, then rename over the target.
    fn persist(&self) -> Result<(), MemoryError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|source| MemoryError::Persist {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|source| MemoryError::Persist {
            path: self.path.clone(),
            source,
        })?;
        let json = serde_json::to_vec_pretty(&self.data)?;
        tmp.write_all(&json).map_err(|source| MemoryError::Persist {
            path: self.path.clone(),
            source,
        })?;
        tmp.persist(&self.path).map_err(|err| MemoryError::Persist {
            path: self.path.clone(),
            source: err.error,
        })?;
        debug!(path = %self.path.display(), episodes = self.data.episodic.len(),
            "memory store persisted");
        Ok(())
    }
}
