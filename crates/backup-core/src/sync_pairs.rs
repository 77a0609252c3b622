use crate::config::{require, write_private};
use crate::error::{ConfigError, ValidationError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Upload,
    Download,
    Bidirectional,
}

impl SyncDirection {
    pub const ALL: [SyncDirection; 3] = [
        SyncDirection::Upload,
        SyncDirection::Download,
        SyncDirection::Bidirectional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SyncDirection::Upload => "upload",
            SyncDirection::Download => "download",
            SyncDirection::Bidirectional => "bidirectional",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SyncDirection::Upload => "->",
            SyncDirection::Download => "<-",
            SyncDirection::Bidirectional => "<->",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "upload" => Ok(SyncDirection::Upload),
            "download" => Ok(SyncDirection::Download),
            "bidirectional" => Ok(SyncDirection::Bidirectional),
            other => Err(ValidationError::InvalidDirection(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPair {
    pub name: String,
    pub local_path: PathBuf,
    pub remote_name: String,
    pub remote_path: String,
    pub direction: SyncDirection,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl SyncPair {
    pub fn new(
        name: &str,
        local_path: impl Into<PathBuf>,
        remote_name: &str,
        remote_path: &str,
        direction: SyncDirection,
    ) -> Self {
        Self {
            name: name.to_string(),
            local_path: local_path.into(),
            remote_name: remote_name.to_string(),
            remote_path: remote_path.to_string(),
            direction,
            enabled: true,
            exclude: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "name")?;
        require(&self.local_path.to_string_lossy(), "local path")?;
        require(&self.remote_name, "remote name")?;
        require(&self.remote_path, "remote path")?;
        Ok(())
    }

    pub fn remote_spec(&self) -> String {
        format!(
            "{}:{}",
            self.remote_name,
            self.remote_path.trim_start_matches('/')
        )
    }

    pub fn local_spec(&self) -> String {
        self.local_path.to_string_lossy().into_owned()
    }

    pub fn rclone_args(&self) -> Vec<String> {
        let mut args = match self.direction {
            SyncDirection::Upload => vec!["sync".to_string(), self.local_spec(), self.remote_spec()],
            SyncDirection::Download => {
                vec!["sync".to_string(), self.remote_spec(), self.local_spec()]
            }
            SyncDirection::Bidirectional => {
                vec!["bisync".to_string(), self.local_spec(), self.remote_spec()]
            }
        };
        for pattern in &self.exclude {
            args.push("--exclude".to_string());
            args.push(pattern.clone());
        }
        args
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} {}",
            self.local_spec(),
            self.direction.arrow(),
            self.remote_spec()
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SyncPairFile {
    #[serde(default)]
    pairs: Vec<SyncPair>,
}

#[derive(Debug)]
pub struct SyncPairStore {
    path: PathBuf,
    pairs: Vec<SyncPair>,
}

impl SyncPairStore {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let pairs = if path.exists() {
            let data = fs::read_to_string(path).context("read sync pairs")?;
            let file: SyncPairFile = serde_json::from_str(&data).context("parse sync pairs")?;
            file.pairs
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            pairs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pairs(&self) -> &[SyncPair] {
        &self.pairs
    }

    pub fn get(&self, name: &str) -> Option<&SyncPair> {
        self.pairs.iter().find(|pair| pair.name == name)
    }

    pub fn enabled_pairs(&self) -> Vec<SyncPair> {
        self.pairs.iter().filter(|pair| pair.enabled).cloned().collect()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        write_pairs(&self.path, &self.pairs)
    }

    pub fn add(&mut self, pair: SyncPair) -> anyhow::Result<()> {
        pair.validate()?;
        if self.get(&pair.name).is_some() {
            return Err(ConfigError::DuplicatePairName(pair.name).into());
        }
        let local = normalize_local(&pair.local_path);
        if self
            .pairs
            .iter()
            .any(|existing| normalize_local(&existing.local_path) == local)
        {
            return Err(ConfigError::DuplicateLocalPath(pair.local_spec()).into());
        }
        info!(pair = %pair.name, direction = %pair.direction, "Adding sync pair");
        self.commit(|pairs| pairs.push(pair))
    }

    pub fn remove(&mut self, name: &str) -> anyhow::Result<SyncPair> {
        let index = self.index_of(name)?;
        info!(pair = %name, "Removing sync pair");
        self.commit(|pairs| pairs.remove(index))
    }

    pub fn toggle(&mut self, name: &str) -> anyhow::Result<bool> {
        let index = self.index_of(name)?;
        let enabled = self.commit(|pairs| {
            pairs[index].enabled = !pairs[index].enabled;
            pairs[index].enabled
        })?;
        info!(pair = %name, enabled, "Toggled sync pair");
        Ok(enabled)
    }

    fn index_of(&self, name: &str) -> anyhow::Result<usize> {
        self.pairs
            .iter()
            .position(|pair| pair.name == name)
            .ok_or_else(|| ConfigError::PairNotFound(name.to_string()).into())
    }

    fn commit<T>(&mut self, change: impl FnOnce(&mut Vec<SyncPair>) -> T) -> anyhow::Result<T> {
        let mut next = self.pairs.clone();
        let out = change(&mut next);
        write_pairs(&self.path, &next)?;
        self.pairs = next;
        Ok(out)
    }

    pub fn uses_remote(&self, remote: &str) -> bool {
        self.pairs.iter().any(|pair| pair.remote_name == remote)
    }
}

fn write_pairs(path: &Path, pairs: &[SyncPair]) -> anyhow::Result<()> {
    let file = SyncPairFile {
        pairs: pairs.to_vec(),
    };
    let data = serde_json::to_string_pretty(&file).context("serialize sync pairs")?;
    write_private(path, data.as_bytes()).context("write sync pairs")
}

fn normalize_local(path: &Path) -> String {
    let text = path.to_string_lossy();
    let trimmed = text.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pair(name: &str, local: &str) -> SyncPair {
        SyncPair::new(name, local, "b2", "bucket/docs", SyncDirection::Upload)
    }

    #[test]
    fn toggling_twice_restores_enabled_flag() {
        let tmp = TempDir::new().unwrap();
        let mut store = SyncPairStore::load(&tmp.path().join("pairs.json")).unwrap();
        store.add(pair("docs", "/Users/me/Documents")).unwrap();
        assert!(!store.toggle("docs").unwrap());
        assert!(store.toggle("docs").unwrap());
        assert!(store.get("docs").unwrap().enabled);
    }

    #[test]
    fn failed_save_keeps_pairs_in_memory_unchanged() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("pairs.json");
        let mut store = SyncPairStore::load(&good).unwrap();
        store.add(pair("docs", "/Users/me/Documents")).unwrap();

        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let mut store = SyncPairStore {
            path: blocker.join("pairs.json"),
            pairs: store.pairs().to_vec(),
        };

        assert!(store.add(pair("pics", "/Users/me/Pictures")).is_err());
        assert_eq!(store.pairs().len(), 1);
        assert!(store.toggle("docs").is_err());
        assert!(store.get("docs").unwrap().enabled);
        assert!(store.remove("docs").is_err());
        assert!(store.get("docs").is_some());
    }

    #[test]
    fn name_and_local_path_must_be_unique() {
        let tmp = TempDir::new().unwrap();
        let mut store = SyncPairStore::load(&tmp.path().join("pairs.json")).unwrap();
        store.add(pair("docs", "/Users/me/Documents")).unwrap();

        let err = store.add(pair("docs", "/Users/me/Pictures")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicatePairName("docs".to_string()))
        );
        let err = store.add(pair("other", "/Users/me/Documents/")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::DuplicateLocalPath(_))
        ));
        assert_eq!(store.pairs().len(), 1);
    }

    #[test]
    fn validation_rejects_empty_fields() {
        let mut invalid = pair("docs", "/tmp");
        invalid.remote_path = "  ".to_string();
        assert_eq!(
            invalid.validate(),
            Err(ValidationError::Empty("remote path"))
        );
        assert_eq!(
            pair("", "/tmp").validate(),
            Err(ValidationError::Empty("name"))
        );
        assert_eq!(
            pair("docs", "").validate(),
            Err(ValidationError::Empty("local path"))
        );
        let mut no_remote = pair("docs", "/tmp");
        no_remote.remote_name.clear();
        assert_eq!(
            no_remote.validate(),
            Err(ValidationError::Empty("remote name"))
        );
    }

    #[test]
    fn direction_parsing_accepts_only_known_values() {
        assert_eq!("Upload".parse::<SyncDirection>(), Ok(SyncDirection::Upload));
        assert_eq!("download".parse::<SyncDirection>(), Ok(SyncDirection::Download));
        assert_eq!("bidirectional".parse::<SyncDirection>(), Ok(SyncDirection::Bidirectional));
        assert_eq!(
            "sideways".parse::<SyncDirection>(),
            Err(ValidationError::InvalidDirection("sideways".to_string()))
        );
    }

    #[test]
    fn rclone_args_follow_direction() {
        let mut p = pair("docs", "/data");
        p.exclude = vec!["*.tmp".to_string()];
        assert_eq!(
            p.rclone_args(),
            vec!["sync", "/data", "b2:bucket/docs", "--exclude", "*.tmp"]
        );
        p.direction = SyncDirection::Download;
        assert_eq!(&p.rclone_args()[..3], ["sync", "b2:bucket/docs", "/data"]);
        p.direction = SyncDirection::Bidirectional;
        assert_eq!(p.rclone_args()[0], "bisync");
    }

    #[test]
    fn pairs_persist_across_loads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pairs.json");
        let mut store = SyncPairStore::load(&path).unwrap();
        store.add(pair("docs", "/data")).unwrap();
        store.add(pair("photos", "/photos")).unwrap();
        store.toggle("photos").unwrap();
        store.remove("docs").unwrap();

        let reloaded = SyncPairStore::load(&path).unwrap();
        assert_eq!(reloaded.pairs().len(), 1);
        assert!(!reloaded.pairs()[0].enabled);
        assert!(reloaded.enabled_pairs().is_empty());
    }
}
