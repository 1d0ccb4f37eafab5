use std::fs;
use std::path::{Path, PathBuf};

use aip2pdf_core::config::{AssembleConfig, MirrorConfig};
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

/// Everything a `sync` run needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mirror: MirrorConfig,
    pub assemble: AssembleConfig,
}

impl AppConfig {
    pub fn trace_loaded(&self) {
        self.mirror.trace_loaded();
        self.assemble.trace_loaded();
    }
}

#[derive(Deserialize)]
struct StaticConfig {
    mirror: MirrorSection,
    #[serde(default)]
    assemble: AssembleConfig,
}

#[derive(Deserialize)]
struct AssembleOnly {
    #[serde(default)]
    assemble: AssembleConfig,
}

#[derive(Deserialize)]
struct MirrorSection {
    root_url: String,
    output_dir: PathBuf,
    max_redirect_hops: Option<usize>,
    max_depth: Option<usize>,
    request_timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

/// Loads and validates a YAML config file with a required `mirror` and an optional `assemble` section.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    let static_conf: StaticConfig = read_yaml(path_ref)?;

    let section = static_conf.mirror;
    let root_url = match Url::parse(&section.root_url) {
        Ok(url) if !url.cannot_be_a_base() => url,
        Ok(url) => {
            error!(root_url = %url, "mirror.root_url cannot be a base URL");
            anyhow::bail!("mirror.root_url {url} cannot be used as a base for relative links");
        }
        Err(e) => {
            error!(error = ?e, root_url = %section.root_url, "mirror.root_url is not an absolute URL");
            anyhow::bail!("mirror.root_url {:?} is not an absolute URL: {e}", section.root_url);
        }
    };

    let mut mirror = MirrorConfig::new(root_url, section.output_dir);
    if let Some(hops) = section.max_redirect_hops {
        mirror.max_redirect_hops = hops;
    }
    if let Some(depth) = section.max_depth {
        mirror.max_depth = depth;
    }
    if let Some(secs) = section.request_timeout_secs {
        mirror.request_timeout_secs = secs;
    }
    if let Some(user_agent) = section.user_agent {
        mirror.user_agent = user_agent;
    }

    validate_assemble(&static_conf.assemble)?;

    info!(config_path = ?path_ref, "Config loaded and validated");
    Ok(AppConfig {
        mirror,
        assemble: static_conf.assemble,
    })
}

/// Loads only the `assemble` section; a file without one yields the defaults.
pub fn load_assemble_config<P: AsRef<Path>>(path: P) -> Result<AssembleConfig> {
    let conf: AssembleOnly = read_yaml(path.as_ref())?;
    validate_assemble(&conf.assemble)?;
    Ok(conf.assemble)
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    match serde_yaml::from_str(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn validate_assemble(conf: &AssembleConfig) -> Result<()> {
    if !(1..=100).contains(&conf.jpeg_quality) {
        error!(jpeg_quality = conf.jpeg_quality, "assemble.jpeg_quality out of range");
        anyhow::bail!(
            "assemble.jpeg_quality must be within 1..=100, got {}",
            conf.jpeg_quality
        );
    }
    if conf.prefixes.is_empty() {
        error!("assemble.prefixes is empty");
        anyhow::bail!("assemble.prefixes must name at least one prefix");
    }
    Ok(())
}
