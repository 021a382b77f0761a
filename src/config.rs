use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TraversalError};
use crate::graph::io::write_atomic;
use crate::types::{Direction, Seeds, Strategy, SuspendPolicy, TraversalOptions};

/// Name of the configuration file stored inside the `.topowalk` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory holding topowalk settings.
pub const TOPOWALK_DIR: &str = ".topowalk";

/// Default traversal settings for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Frontier discipline used when none is given on the command line.
    pub strategy: Strategy,
    /// Which incident edges are followed out of a node.
    pub direction: Direction,
    /// What happens when a visitor asks to suspend.
    pub suspend_policy: SuspendPolicy,
    /// Nodes at this depth are visited but not expanded.
    pub max_depth: Option<u32>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strategy: Strategy::DepthFirst,
            direction: Direction::Outgoing,
            suspend_policy: SuspendPolicy::Block,
            max_depth: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl WalkerConfig {
    /// Traversal options described by this configuration, seeded from every node.
    pub fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            strategy: self.strategy,
            direction: self.direction,
            seeds: Seeds::AllNodes,
            max_depth: self.max_depth,
        }
    }
}

/// Returns the path to the `.topowalk` directory within the given root.
pub fn get_topowalk_dir(root: &Path) -> PathBuf {
    root.join(TOPOWALK_DIR)
}

/// Returns the path to `config.json` within the `.topowalk` directory.
pub fn get_config_path(root: &Path) -> PathBuf {
    get_topowalk_dir(root).join(CONFIG_FILENAME)
}

/// Reads `.topowalk/config.json` under `root`.
///
/// A project without a config file walks with [`WalkerConfig::default`];
/// keys missing from the file take their default values.
pub fn load_config(root: &Path) -> Result<WalkerConfig> {
    let path = get_config_path(root);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(WalkerConfig::default()),
        Err(e) => return Err(config_error(&path, e)),
    };
    serde_json::from_str(&text).map_err(|e| config_error(&path, e))
}

/// Stores `config` under `root`, creating `.topowalk` when needed.
pub fn save_config(root: &Path, config: &WalkerConfig) -> Result<()> {
    let dir = get_topowalk_dir(root);
    fs::create_dir_all(&dir).map_err(|e| config_error(&dir, e))?;

    let path = get_config_path(root);
    let json = serde_json::to_string_pretty(config).map_err(|e| config_error(&path, e))?;
    write_atomic(&path, &json).map_err(|e| config_error(&path, e))
}

fn config_error(path: &Path, cause: impl fmt::Display) -> TraversalError {
    TraversalError::Config {
        message: format!("{}: {}", path.display(), cause),
    }
}
