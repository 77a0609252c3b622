use anyhow::Context;
use backup_core::backup::BackupPlan;
use backup_core::config::{AppConfig, ConfigStore, RemoteConfig, ScheduleSettings};
use backup_core::error::ConfigError;
use backup_core::exec::SharedRunner;
use backup_core::installer::Installer;
use backup_core::launchd::{LaunchdManager, default_label};
use backup_core::lockfile::{BackupLock, DEFAULT_STALE_AFTER};
use backup_core::logs::LogParser;
use backup_core::paths::{DefaultDirs, ResolvedPaths, expand_home};
use backup_core::rclone::RcloneClient;
use backup_core::rclone_conf;
use backup_core::scripts::{ScriptContext, ScriptGenerator};
use backup_core::sync_pairs::{SyncPair, SyncPairStore};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Owns the persistent stores and hands out the adapters built from the
/// resolved paths. Adapters are cheap clones so jobs can move them onto
/// worker threads.
pub struct Services {
    runner: SharedRunner,
    config: ConfigStore,
    pairs: SyncPairStore,
    paths: ResolvedPaths,
    label: String,
}

impl Services {
    pub fn load(
        runner: SharedRunner,
        dirs: &DefaultDirs,
        config_override: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let config_file = config_override
            .map(|path| expand_home(path, &dirs.home_dir))
            .unwrap_or_else(|| dirs.config_file());
        let config = ConfigStore::load(&config_file)?;
        let paths = config.config().paths.resolve(dirs, &config_file);
        let pairs = SyncPairStore::load(&paths.sync_pairs_file)
            .with_context(|| format!("load sync pairs {}", paths.sync_pairs_file.display()))?;
        info!(
            config = %config_file.display(),
            remotes = config.config().remotes.len(),
            pairs = pairs.pairs().len(),
            "Loaded configuration"
        );
        Ok(Self {
            runner,
            config,
            pairs,
            paths,
            label: default_label(),
        })
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    pub fn config(&self) -> &AppConfig {
        self.config.config()
    }

    pub fn pairs(&self) -> &[SyncPair] {
        self.pairs.pairs()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn installer(&self) -> Installer {
        Installer::new(self.runner.clone(), &self.paths)
    }

    pub fn rclone_binary(&self) -> Option<PathBuf> {
        self.installer().rclone_path()
    }

    pub fn rclone(&self) -> Option<RcloneClient> {
        self.rclone_binary().map(|binary| {
            RcloneClient::new(self.runner.clone(), &binary, &self.paths.rclone_config)
        })
    }

    pub fn launchd(&self) -> LaunchdManager {
        LaunchdManager::new(
            self.runner.clone(),
            &self.label,
            &self.paths.launch_agents_dir,
        )
    }

    pub fn lock(&self) -> BackupLock {
        BackupLock::new(&self.paths.lock_file)
    }

    pub fn log_parser(&self) -> LogParser {
        LogParser::new(&self.paths.log_file)
    }

    pub fn scripts(&self) -> ScriptGenerator {
        ScriptGenerator::new(&self.paths)
    }

    pub fn write_backup_script(&self) -> anyhow::Result<PathBuf> {
        let binary = match self.rclone_binary() {
            Some(binary) => binary,
            None => {
                warn!("rclone not found; backup script falls back to PATH lookup");
                PathBuf::from("rclone")
            }
        };
        let ctx = ScriptContext::new(
            &binary,
            self.pairs.pairs().to_vec(),
            self.config().sync.clone(),
        );
        self.scripts().write_backup_script(&ctx)
    }

    pub fn regenerate_rclone_conf(&self) -> anyhow::Result<PathBuf> {
        let path = self.paths.rclone_config.clone();
        rclone_conf::write(&path, &self.config().remotes)?;
        Ok(path)
    }

    pub fn backup_plan(&self) -> Result<BackupPlan, String> {
        let pairs = self.pairs.enabled_pairs();
        if pairs.is_empty() {
            return Err("No enabled sync pairs. Add one under Configure first.".to_string());
        }
        let binary = self
            .rclone_binary()
            .ok_or_else(|| "rclone not found. Run Install tools first.".to_string())?;
        let mut plan = BackupPlan::with_defaults(
            binary,
            self.paths.rclone_config.clone(),
            self.paths.log_file.clone(),
            self.paths.lock_file.clone(),
        );
        plan.pairs = pairs;
        plan.sync = self.config().sync.clone();
        plan.stale_after = DEFAULT_STALE_AFTER;
        Ok(plan)
    }

    pub fn add_remote(&mut self, remote: RemoteConfig) -> anyhow::Result<()> {
        let name = remote.name.clone();
        self.config.add_remote(remote)?;
        if let Err(err) = self.regenerate_rclone_conf() {
            if let Err(undo) = self.config.remove_remote(&name) {
                warn!(remote = %name, error = %undo, "Rolling back added remote failed");
            }
            return Err(err);
        }
        Ok(())
    }

    pub fn remove_remote(&mut self, name: &str) -> anyhow::Result<()> {
        if self.pairs.uses_remote(name) {
            return Err(ConfigError::RemoteInUse(name.to_string()).into());
        }
        let removed = self.config.remove_remote(name)?;
        if let Err(err) = self.regenerate_rclone_conf() {
            if let Err(undo) = self.config.add_remote(removed) {
                warn!(remote = %name, error = %undo, "Rolling back removed remote failed");
            }
            return Err(err);
        }
        Ok(())
    }

    pub fn add_pair(&mut self, pair: SyncPair) -> anyhow::Result<()> {
        if self.config.remote(&pair.remote_name).is_none() {
            return Err(ConfigError::RemoteNotFound(pair.remote_name).into());
        }
        self.pairs.add(pair)
    }

    pub fn toggle_pair(&mut self, name: &str) -> anyhow::Result<bool> {
        self.pairs.toggle(name)
    }

    pub fn remove_pair(&mut self, name: &str) -> anyhow::Result<SyncPair> {
        self.pairs.remove(name)
    }

    pub fn persist_schedule(&mut self, schedule: ScheduleSettings) -> anyhow::Result<()> {
        self.config.update_schedule(schedule)
    }

    /// Saves the schedule and writes the script the agent will run. Loading
    /// the agent is left to the caller since it shells out to launchctl.
    pub fn prepare_schedule(&mut self, schedule: ScheduleSettings) -> anyhow::Result<PathBuf> {
        self.persist_schedule(ScheduleSettings {
            enabled: true,
            ..schedule
        })?;
        self.write_backup_script()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backup_core::exec::{CommandOutput, CommandRunner};
    use backup_core::sync_pairs::SyncDirection;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct NoTools;

    impl CommandRunner for NoTools {
        fn look_path(&self, _program: &str) -> Option<PathBuf> {
            None
        }

        fn run(&self, _program: &Path, _args: &[String]) -> anyhow::Result<CommandOutput> {
            Ok(CommandOutput::failed(127, "not available in tests"))
        }
    }

    fn services(root: &Path) -> Services {
        Services::load(Arc::new(NoTools), &DefaultDirs::under(root), None).unwrap()
    }

    #[test]
    fn adding_remote_writes_rclone_conf() {
        let tmp = TempDir::new().unwrap();
        let mut services = services(tmp.path());
        services
            .add_remote(RemoteConfig::b2("b2", "acct", "key"))
            .unwrap();
        let sections = rclone_conf::read(&services.paths().rclone_config).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].get("type"), Some("b2"));
    }

    #[test]
    fn rclone_conf_failure_rolls_back_remote_changes() {
        let tmp = TempDir::new().unwrap();
        let mut services = services(tmp.path());
        services
            .add_remote(RemoteConfig::b2("b2", "acct", "key"))
            .unwrap();

        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        services.paths.rclone_config = blocker.join("rclone.conf");

        assert!(services
            .add_remote(RemoteConfig::s3("wasabi", "id", "secret"))
            .is_err());
        assert_eq!(services.config().remote_names(), vec!["b2".to_string()]);
        assert!(services.remove_remote("b2").is_err());
        assert_eq!(services.config().remote_names(), vec!["b2".to_string()]);

        let reloaded = ConfigStore::load(services.config.path()).unwrap();
        assert_eq!(reloaded.config().remote_names(), vec!["b2".to_string()]);
    }

    #[test]
    fn pair_requires_known_remote_and_blocks_remote_removal() {
        let tmp = TempDir::new().unwrap();
        let mut services = services(tmp.path());
        let pair = SyncPair::new("docs", "/data/docs", "b2", "docs", SyncDirection::Upload);
        let err = services.add_pair(pair.clone()).unwrap_err();
        assert!(err.to_string().contains("remote 'b2' not found"));

        services
            .add_remote(RemoteConfig::b2("b2", "acct", "key"))
            .unwrap();
        services.add_pair(pair).unwrap();
        let err = services.remove_remote("b2").unwrap_err();
        assert!(err.to_string().contains("used by a sync pair"));

        services.remove_pair("docs").unwrap();
        services.remove_remote("b2").unwrap();
        assert!(services.config().remotes.is_empty());
    }

    #[test]
    fn backup_plan_needs_enabled_pairs_and_rclone() {
        let tmp = TempDir::new().unwrap();
        let mut services = services(tmp.path());
        let err = services.backup_plan().unwrap_err();
        assert!(err.contains("No enabled sync pairs"));

        services
            .add_remote(RemoteConfig::s3("s3", "id", "secret"))
            .unwrap();
        services
            .add_pair(SyncPair::new(
                "pics",
                "/data/pics",
                "s3",
                "pics",
                SyncDirection::Upload,
            ))
            .unwrap();
        let err = services.backup_plan().unwrap_err();
        assert!(err.contains("rclone not found"));
    }

    #[test]
    fn config_override_is_used_and_reloaded() {
        let tmp = TempDir::new().unwrap();
        let dirs = DefaultDirs::under(tmp.path());
        let custom = tmp.path().join("custom").join("settings.json");
        let mut services = Services::load(Arc::new(NoTools), &dirs, Some(&custom)).unwrap();
        services
            .persist_schedule(ScheduleSettings {
                enabled: true,
                hour: 4,
                minute: 15,
                run_at_load: false,
            })
            .unwrap();
        assert!(custom.exists());

        let reloaded = Services::load(Arc::new(NoTools), &dirs, Some(&custom)).unwrap();
        assert_eq!(reloaded.config().schedule.time_label(), "04:15");
    }

    #[test]
    fn prepare_schedule_enables_and_writes_script() {
        let tmp = TempDir::new().unwrap();
        let mut services = services(tmp.path());
        let script = services
            .prepare_schedule(ScheduleSettings {
                enabled: false,
                hour: 1,
                minute: 5,
                run_at_load: true,
            })
            .unwrap();
        assert!(script.exists());
        assert!(services.config().schedule.enabled);
        let body = std::fs::read_to_string(script).unwrap();
        assert!(body.contains("RCLONE=rclone\n"));
    }
}
