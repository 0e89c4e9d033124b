//! Updater configuration.
//!
//! An installation may carry a `keeper.yaml` at its root. Every key is
//! optional; omitted keys take the built-in defaults, which describe the
//! NMS Mod Conflict Suite on its `rewrite` branch.
//!
//! ```yaml
//! repository:
//!   owner: umbraprior
//!   name: NMS_ModConflictScript
//!   branch: rewrite
//!   subtree: NMS_ModConflictSuite
//! timeout_secs: 10
//! tracked_files:
//!   - run_mcs.bat
//!   - finders/steam_finder.py
//! ```

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{CommitId, TrackedFile};

/// File name looked up at the install root by [`UpdaterConfig::load_at`].
pub const CONFIG_FILE_NAME: &str = "keeper.yaml";

const DEFAULT_TRACKED_FILES: &[&str] = &[
    "run_mcs.bat",
    "conflict_checker/check_conflicts.bat",
    "finders/gamedata_finder.py",
    "finders/steam_finder.py",
    "conflict_checker/path_verifier.py",
    "conflict_checker/simple_conflict_checker.py",
    "updater/json_extract.py",
    "updater/auto_updater.py",
];

/// The single repository and branch an installation follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    pub branch: String,
    /// Directory inside the repository that maps onto the install root.
    pub subtree: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: "umbraprior".to_owned(),
            name: "NMS_ModConflictScript".to_owned(),
            branch: "rewrite".to_owned(),
            subtree: Some("NMS_ModConflictSuite".to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    pub repository: RepositoryConfig,
    pub api_base: String,
    pub raw_base: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Version record location, relative to the install root.
    pub version_file: PathBuf,
    pub tracked_files: Vec<TrackedFile>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig::default(),
            api_base: "https://api.github.com".to_owned(),
            raw_base: "https://raw.githubusercontent.com".to_owned(),
            timeout_secs: 10,
            user_agent: concat!("keeper-updater/", env!("CARGO_PKG_VERSION")).to_owned(),
            version_file: PathBuf::from("updater").join("version_info.json"),
            tracked_files: DEFAULT_TRACKED_FILES
                .iter()
                .map(|name| TrackedFile(name.to_string()))
                .collect(),
        }
    }
}

impl UpdaterConfig {
    /// Load `<root>/keeper.yaml`, or the defaults when it does not exist.
    pub fn load_at(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&path, &contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    /// Load an explicit config file; a missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracked_files.is_empty() {
            return Err(ConfigError::NoTrackedFiles);
        }
        let mut seen = HashSet::new();
        for file in &self.tracked_files {
            if !seen.insert(file.as_str()) {
                return Err(ConfigError::DuplicateTrackedFile(file.to_string()));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be at least 1".to_owned(),
            });
        }
        for (field, value) in [
            ("repository.owner", &self.repository.owner),
            ("repository.name", &self.repository.name),
            ("repository.branch", &self.repository.branch),
            ("api_base", &self.api_base),
            ("raw_base", &self.raw_base),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be empty".to_owned(),
                });
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn version_file_at(&self, root: &Path) -> PathBuf {
        root.join(&self.version_file)
    }

    /// `{api_base}/repos/{owner}/{name}/commits/{branch}`
    pub fn commit_url(&self, branch: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base.trim_end_matches('/'),
            self.repository.owner,
            self.repository.name,
            branch
        )
    }

    /// Content-addressed raw URL of `file` at `commit`.
    ///
    /// `{raw_base}/{owner}/{name}/{commit}/{subtree}/{file}`
    pub fn raw_url(&self, commit: &CommitId, file: &TrackedFile) -> String {
        let mut url = format!(
            "{}/{}/{}/{}",
            self.raw_base.trim_end_matches('/'),
            self.repository.owner,
            self.repository.name,
            commit
        );
        if let Some(subtree) = self
            .repository
            .subtree
            .as_deref()
            .map(|s| s.trim_matches('/'))
            .filter(|s| !s.is_empty())
        {
            url.push('/');
            url.push_str(subtree);
        }
        url.push('/');
        url.push_str(file.as_str());
        url
    }
}
