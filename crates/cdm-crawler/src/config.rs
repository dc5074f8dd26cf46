use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Page size of root listings, the largest `maxrecs` ContentDM accepts.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// ContentDM refuses listing start positions past this one.
pub const DEFAULT_MAX_START: usize = 10001;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperConfig {
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds, requests never time out when unset
    #[serde(default = "default_timeout")]
    pub timeout: Option<u64>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_max_start")]
    pub max_start: usize,

    #[serde(default = "default_listing_fields")]
    pub listing_fields: Vec<String>,

    #[serde(default = "default_snapshot")]
    pub snapshot: SnapshotMode,

    #[serde(default = "default_on_dl_error")]
    pub on_dl_error: OnError,

    #[serde(default = "default_on_xml_error")]
    pub on_xml_error: OnError,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            repo_dir: default_repo_dir(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            chunk_size: default_chunk_size(),
            max_start: default_max_start(),
            listing_fields: default_listing_fields(),
            snapshot: default_snapshot(),
            on_dl_error: default_on_dl_error(),
            on_xml_error: default_on_xml_error(),
            exclude: default_exclude(),
        }
    }
}

fn default_server() -> String {
    String::new()
}

fn default_repo_dir() -> PathBuf {
    PathBuf::from("Cached_Cdm_files")
}

fn default_user_agent() -> String {
    String::from("cdm-crawler")
}

fn default_timeout() -> Option<u64> {
    None
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_start() -> usize {
    DEFAULT_MAX_START
}

fn default_listing_fields() -> Vec<String> {
    ["source", "dmrecord", "dmimage", "find"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_snapshot() -> SnapshotMode {
    SnapshotMode::Once
}

fn default_on_dl_error() -> OnError {
    OnError::SkipAndLog
}

fn default_on_xml_error() -> OnError {
    OnError::SkipAndLog
}

fn default_exclude() -> Vec<String> {
    vec![]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OnError {
    Fail,
    SkipAndLog,
}

/// How a collection run decides that an artifact is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SnapshotMode {
    /// Only the directory snapshot taken after the root listings are fetched
    Once,
    /// The snapshot plus every artifact written since it was taken
    RefreshOnWrite,
}

impl Default for SnapshotMode {
    fn default() -> Self {
        default_snapshot()
    }
}
