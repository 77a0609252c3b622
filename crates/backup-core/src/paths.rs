use anyhow::Context;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "cloud-backup";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub home_dir: PathBuf,
}

impl DefaultDirs {
    pub fn from_system() -> anyhow::Result<Self> {
        let project =
            ProjectDirs::from("com", APP_NAME, APP_NAME).context("resolve project dirs")?;
        let base = BaseDirs::new().context("resolve base dirs")?;
        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_local_dir().to_path_buf(),
            home_dir: base.home_dir().to_path_buf(),
        })
    }

    pub fn under(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            home_dir: root.join("home"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_pairs_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rclone_config: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rclone_binary: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homebrew_prefix: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_agents_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub config_file: PathBuf,
    pub sync_pairs_file: PathBuf,
    pub rclone_config: PathBuf,
    pub rclone_binary: Option<PathBuf>,
    pub homebrew_prefix: PathBuf,
    pub log_file: PathBuf,
    pub lock_file: PathBuf,
    pub scripts_dir: PathBuf,
    pub launch_agents_dir: PathBuf,
    pub home_dir: PathBuf,
}

impl PathSettings {
    pub fn resolve(&self, dirs: &DefaultDirs, config_file: &Path) -> ResolvedPaths {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.config_dir.clone());
        let pick = |value: &Option<PathBuf>, fallback: PathBuf| {
            value
                .as_ref()
                .filter(|path| !path.as_os_str().is_empty())
                .map(|path| expand_home(path, &dirs.home_dir))
                .unwrap_or(fallback)
        };
        ResolvedPaths {
            config_file: config_file.to_path_buf(),
            sync_pairs_file: pick(&self.sync_pairs_file, config_dir.join("sync-pairs.json")),
            rclone_config: pick(&self.rclone_config, config_dir.join("rclone.conf")),
            rclone_binary: self
                .rclone_binary
                .as_ref()
                .filter(|path| !path.as_os_str().is_empty())
                .map(|path| expand_home(path, &dirs.home_dir)),
            homebrew_prefix: pick(&self.homebrew_prefix, default_homebrew_prefix()),
            log_file: pick(&self.log_file, dirs.data_dir.join("logs").join("backup.log")),
            lock_file: pick(&self.lock_file, dirs.data_dir.join("backup.lock")),
            scripts_dir: pick(&self.scripts_dir, dirs.data_dir.join("scripts")),
            launch_agents_dir: pick(
                &self.launch_agents_dir,
                dirs.home_dir.join("Library").join("LaunchAgents"),
            ),
            home_dir: dirs.home_dir.clone(),
        }
    }
}

impl ResolvedPaths {
    pub fn log_dir(&self) -> PathBuf {
        self.log_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.scripts_dir.clone())
    }

    pub fn backup_script(&self) -> PathBuf {
        self.scripts_dir.join("backup.sh")
    }

    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("config", self.config_file.display().to_string()),
            ("sync pairs", self.sync_pairs_file.display().to_string()),
            ("rclone config", self.rclone_config.display().to_string()),
            (
                "rclone binary",
                self.rclone_binary
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "auto-detect".to_string()),
            ),
            ("homebrew prefix", self.homebrew_prefix.display().to_string()),
            ("log file", self.log_file.display().to_string()),
            ("lock file", self.lock_file.display().to_string()),
            ("scripts", self.scripts_dir.display().to_string()),
            ("launch agents", self.launch_agents_dir.display().to_string()),
        ]
    }
}

pub fn default_homebrew_prefix() -> PathBuf {
    if cfg!(target_arch = "aarch64") {
        PathBuf::from("/opt/homebrew")
    } else {
        PathBuf::from("/usr/local")
    }
}

pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_live_next_to_config_and_data_dirs() {
        let tmp = TempDir::new().unwrap();
        let dirs = DefaultDirs::under(tmp.path());
        let resolved = PathSettings::default().resolve(&dirs, &dirs.config_file());
        assert_eq!(
            resolved.sync_pairs_file,
            dirs.config_dir.join("sync-pairs.json")
        );
        assert_eq!(resolved.rclone_config, dirs.config_dir.join("rclone.conf"));
        assert_eq!(
            resolved.log_file,
            dirs.data_dir.join("logs").join("backup.log")
        );
        assert_eq!(resolved.log_dir(), dirs.data_dir.join("logs"));
        assert_eq!(
            resolved.backup_script(),
            dirs.data_dir.join("scripts").join("backup.sh")
        );
        assert_eq!(resolved.rclone_binary, None);
    }

    #[test]
    fn overrides_win_and_empty_values_fall_back() {
        let tmp = TempDir::new().unwrap();
        let dirs = DefaultDirs::under(tmp.path());
        let settings = PathSettings {
            rclone_binary: Some(PathBuf::from("~/bin/rclone")),
            homebrew_prefix: Some(PathBuf::from("/custom/brew")),
            lock_file: Some(PathBuf::new()),
            ..PathSettings::default()
        };
        let resolved = settings.resolve(&dirs, &dirs.config_file());
        assert_eq!(
            resolved.rclone_binary,
            Some(dirs.home_dir.join("bin").join("rclone"))
        );
        assert_eq!(resolved.homebrew_prefix, PathBuf::from("/custom/brew"));
        assert_eq!(resolved.lock_file, dirs.data_dir.join("backup.lock"));
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        let home = Path::new("/Users/me");
        assert_eq!(
            expand_home(Path::new("~/Documents"), home),
            PathBuf::from("/Users/me/Documents")
        );
        assert_eq!(
            expand_home(Path::new("/data"), home),
            PathBuf::from("/data")
        );
    }
}
