use crate::error::{ConfigError, ValidationError};
use crate::paths::PathSettings;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: String,
    #[serde(default)]
    pub remotes: Vec<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            remotes: Vec::new(),
            sync: SyncSettings::default(),
            schedule: ScheduleSettings::default(),
            paths: PathSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).context("read config")?;
        let config = serde_json::from_str(&data).context("parse config")?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(self).context("serialize config")?;
        write_private(path, data.as_bytes()).context("write config")?;
        Ok(())
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteConfig> {
        self.remotes.iter().find(|remote| remote.name == name)
    }

    pub fn remote_names(&self) -> Vec<String> {
        self.remotes.iter().map(|remote| remote.name.clone()).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    B2,
    S3,
}

impl RemoteKind {
    pub const ALL: [RemoteKind; 2] = [RemoteKind::B2, RemoteKind::S3];

    pub fn as_str(self) -> &'static str {
        match self {
            RemoteKind::B2 => "b2",
            RemoteKind::S3 => "s3",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RemoteKind::B2 => "Backblaze B2",
            RemoteKind::S3 => "S3 compatible",
        }
    }
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoteKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "b2" => Ok(RemoteKind::B2),
            "s3" => Ok(RemoteKind::S3),
            other => Err(ValidationError::UnknownRemoteKind(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RemoteKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_key_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl RemoteConfig {
    pub fn b2(name: &str, account_id: &str, application_key: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: RemoteKind::B2,
            account_id: account_id.to_string(),
            application_key: application_key.to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: None,
            endpoint: None,
        }
    }

    pub fn s3(name: &str, access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: RemoteKind::S3,
            account_id: String::new(),
            application_key: String::new(),
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            region: None,
            endpoint: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_remote_name(&self.name)?;
        match self.kind {
            RemoteKind::B2 => {
                require(&self.account_id, "account id")?;
                require(&self.application_key, "application key")?;
            }
            RemoteKind::S3 => {
                require(&self.access_key_id, "access key id")?;
                require(&self.secret_access_key, "secret access key")?;
            }
        }
        // Values land verbatim in rclone.conf, one `key = value` per line.
        let values = [
            (self.account_id.as_str(), "account id"),
            (self.application_key.as_str(), "application key"),
            (self.access_key_id.as_str(), "access key id"),
            (self.secret_access_key.as_str(), "secret access key"),
            (self.region.as_deref().unwrap_or(""), "region"),
            (self.endpoint.as_deref().unwrap_or(""), "endpoint"),
        ];
        for (value, field) in values {
            if value.chars().any(char::is_control) {
                return Err(ValidationError::ControlCharacters(field));
            }
        }
        Ok(())
    }
}

pub fn validate_remote_name(name: &str) -> Result<(), ValidationError> {
    require(name, "remote name")?;
    if !name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(ValidationError::InvalidRemoteName);
    }
    Ok(())
}

pub(crate) fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub transfers: u32,
    pub checkers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_limit: Option<String>,
    pub extra_flags: Vec<String>,
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            transfers: 4,
            checkers: 8,
            bandwidth_limit: None,
            extra_flags: Vec::new(),
            dry_run: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
    pub run_at_load: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            hour: 2,
            minute: 0,
            run_at_load: false,
        }
    }
}

impl ScheduleSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("hour", self.hour, 0, 23)?;
        check_range("minute", self.minute, 0, 59)?;
        Ok(())
    }

    pub fn time_label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

pub fn parse_bounded(
    field: &'static str,
    raw: &str,
    min: u32,
    max: u32,
) -> Result<u32, ValidationError> {
    let value = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::OutOfRange { field, min, max })?;
    check_range(field, value, min, max)?;
    Ok(value)
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(())
}

#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigStore {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = AppConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.config.save(&self.path)
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteConfig> {
        self.config.remote(name)
    }

    pub fn add_remote(&mut self, remote: RemoteConfig) -> anyhow::Result<()> {
        remote.validate()?;
        if self.config.remote(&remote.name).is_some() {
            return Err(ConfigError::DuplicateRemote(remote.name).into());
        }
        info!(remote = %remote.name, kind = %remote.kind, "Adding remote");
        self.commit(|config| config.remotes.push(remote))
    }

    pub fn remove_remote(&mut self, name: &str) -> anyhow::Result<RemoteConfig> {
        let index = self
            .config
            .remotes
            .iter()
            .position(|remote| remote.name == name)
            .ok_or_else(|| ConfigError::RemoteNotFound(name.to_string()))?;
        info!(remote = %name, "Removing remote");
        self.commit(|config| config.remotes.remove(index))
    }

    pub fn update_schedule(&mut self, schedule: ScheduleSettings) -> anyhow::Result<()> {
        schedule.validate()?;
        self.commit(|config| config.schedule = schedule)
    }

    pub fn update_sync_settings(&mut self, sync: SyncSettings) -> anyhow::Result<()> {
        self.commit(|config| config.sync = sync)
    }

    /// Applies `change` to a copy and keeps it only once the copy is on disk.
    fn commit<T>(&mut self, change: impl FnOnce(&mut AppConfig) -> T) -> anyhow::Result<T> {
        let mut next = self.config.clone();
        let out = change(&mut next);
        next.save(&self.path)?;
        self.config = next;
        Ok(out)
    }
}

pub(crate) fn write_private(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    set_mode(path, 0o600)
}

pub(crate) fn set_mode(path: &Path, mode: u32) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = ConfigStore::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(store.config().version, "1.0");
        assert!(store.config().remotes.is_empty());
        assert_eq!(store.config().schedule.hour, 2);
    }

    #[test]
    fn added_remote_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let mut store = ConfigStore::load(&path).unwrap();
        let remote = RemoteConfig::b2("b2", "x", "y");
        store.add_remote(remote.clone()).unwrap();

        let reloaded = ConfigStore::load(&path).unwrap();
        assert_eq!(reloaded.config().remotes, vec![remote]);
    }

    #[test]
    fn duplicate_remote_name_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut store = ConfigStore::load(&tmp.path().join("config.json")).unwrap();
        store.add_remote(RemoteConfig::b2("b2", "x", "y")).unwrap();
        let err = store
            .add_remote(RemoteConfig::s3("b2", "key", "secret"))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateRemote("b2".to_string()))
        );
        assert_eq!(store.config().remotes.len(), 1);
    }

    #[test]
    fn remote_validation_checks_provider_keys() {
        assert_eq!(
            RemoteConfig::b2("b2", "", "y").validate(),
            Err(ValidationError::Empty("account id"))
        );
        assert_eq!(
            RemoteConfig::s3("s3", "key", " ").validate(),
            Err(ValidationError::Empty("secret access key"))
        );
        assert_eq!(
            RemoteConfig::b2("my remote", "x", "y").validate(),
            Err(ValidationError::InvalidRemoteName)
        );
        assert!(RemoteConfig::s3("wasabi-eu", "key", "secret").validate().is_ok());
    }

    #[test]
    fn credentials_with_line_breaks_are_rejected() {
        assert_eq!(
            RemoteConfig::b2("b2", "acct", "key\n[evil]").validate(),
            Err(ValidationError::ControlCharacters("application key"))
        );
        let mut remote = RemoteConfig::s3("s3", "key", "secret");
        remote.endpoint = Some("https://s3.example.com\r".to_string());
        assert_eq!(
            remote.validate(),
            Err(ValidationError::ControlCharacters("endpoint"))
        );
        let tmp = TempDir::new().unwrap();
        let mut store = ConfigStore::load(&tmp.path().join("config.json")).unwrap();
        assert!(store.add_remote(remote).is_err());
        assert!(store.config().remotes.is_empty());
    }

    #[test]
    fn failed_save_leaves_config_untouched() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let mut store = ConfigStore::load(&blocker.join("config.json")).unwrap();

        assert!(store.add_remote(RemoteConfig::s3("wasabi", "key", "secret")).is_err());
        assert!(store.config().remotes.is_empty());

        let mut schedule = store.config().schedule.clone();
        schedule.hour = 5;
        assert!(store.update_schedule(schedule).is_err());
        assert_eq!(store.config().schedule.hour, 2);

        let err = store
            .add_remote(RemoteConfig::s3("wasabi", "key", "secret"))
            .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_none());
    }

    #[test]
    fn remove_remote_reports_missing_names() {
        let tmp = TempDir::new().unwrap();
        let mut store = ConfigStore::load(&tmp.path().join("config.json")).unwrap();
        let err = store.remove_remote("nope").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::RemoteNotFound("nope".to_string()))
        );
    }

    #[test]
    fn serialized_remote_uses_type_key() {
        let remote = RemoteConfig::b2("b2", "x", "y");
        let json = serde_json::to_value(&remote).unwrap();
        assert_eq!(json["type"], "b2");
        assert!(json.get("access_key_id").is_none());
    }

    #[test]
    fn schedule_bounds_are_enforced() {
        assert_eq!(parse_bounded("hour", "23", 0, 23), Ok(23));
        assert!(parse_bounded("hour", "24", 0, 23).is_err());
        assert!(parse_bounded("minute", "abc", 0, 59).is_err());
        let schedule = ScheduleSettings {
            minute: 75,
            ..ScheduleSettings::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");
        AppConfig::default().save(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
