use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_MAX_REDIRECT_HOPS: usize = 10;
pub const DEFAULT_MAX_DEPTH: usize = 32;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

// The AIP server does not answer requests carrying a library user agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Where to mirror from and to, and the limits of the walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Tree root. Refresh redirect targets are always joined to this URL.
    pub root_url: Url,
    pub output_dir: PathBuf,
    #[serde(default = "default_max_redirect_hops")]
    pub max_redirect_hops: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl MirrorConfig {
    pub fn new(root_url: Url, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_url,
            output_dir: output_dir.into(),
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
            max_depth: DEFAULT_MAX_DEPTH,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            root_url = %self.root_url,
            output_dir = %self.output_dir.display(),
            max_redirect_hops = self.max_redirect_hops,
            max_depth = self.max_depth,
            request_timeout_secs = self.request_timeout_secs,
            "Loaded mirror config"
        );
        debug!(?self, "Mirror config loaded (full debug)");
    }
}

/// How rasters become PDFs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembleConfig {
    /// Filename prefixes in page priority order. Files matching none are left out.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
    /// Quality of the JPEG written for each extracted PNG.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl AssembleConfig {
    pub fn trace_loaded(&self) {
        info!(
            prefixes = ?self.prefixes,
            jpeg_quality = self.jpeg_quality,
            "Loaded assemble config"
        );
    }
}

fn default_max_redirect_hops() -> usize {
    DEFAULT_MAX_REDIRECT_HOPS
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// Approach charts (ED*, ET*) first, then the aerodrome text pages.
fn default_prefixes() -> Vec<String> {
    vec!["ED".into(), "ET".into(), "AD 2".into()]
}
