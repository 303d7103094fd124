use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use canopy_diff::{DiffOptions, TypeConflictPolicy, DEFAULT_IGNORE_FILE};
use canopy_types::CancelToken;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";
pub const HOME_ENV: &str = "CANOPY_HOME";

/// Settings read from `<home>/config.toml`. Relative paths resolve against
/// the home directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanopyConfig {
    pub store_dir: PathBuf,
    pub state_file: PathBuf,
    pub ignore_file: String,
    pub link_file: String,
    pub type_conflict: TypeConflictPolicy,
    /// Target directory that `init` links new projects under.
    pub project_root: String,
}

impl Default for CanopyConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("store"),
            state_file: PathBuf::from("state.json"),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            link_file: ".canopy".to_string(),
            type_conflict: TypeConflictPolicy::Replace,
            project_root: "public".to_string(),
        }
    }
}

impl CanopyConfig {
    /// Load the config under `home`; a missing file yields the defaults.
    pub fn load(home: &Path) -> anyhow::Result<Self> {
        let path = home.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn store_path(&self, home: &Path) -> PathBuf {
        home.join(&self.store_dir)
    }

    pub fn state_path(&self, home: &Path) -> PathBuf {
        home.join(&self.state_file)
    }

    pub fn diff_options(&self, cancel: CancelToken) -> DiffOptions {
        DiffOptions {
            ignore_file: self.ignore_file.clone(),
            reserved: vec![self.link_file.clone()],
            type_conflict: self.type_conflict,
            cancel,
        }
    }
}

/// Pick the home directory: the explicit flag, then `$CANOPY_HOME`, then the
/// platform data directory.
pub fn resolve_home(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(home) = flag {
        return Ok(home);
    }
    if let Some(home) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("org", "canopy", "canopy")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("cannot determine a home directory; set {HOME_ENV} or pass --home"))
}
