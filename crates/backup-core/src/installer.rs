use crate::error::ToolError;
use crate::exec::{SharedRunner, run_checked, to_args};
use crate::paths::ResolvedPaths;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolStatus {
    pub homebrew: Option<PathBuf>,
    pub rclone: Option<PathBuf>,
    pub rclone_version: Option<String>,
}

impl ToolStatus {
    pub fn rclone_ready(&self) -> bool {
        self.rclone.is_some()
    }
}

#[derive(Clone)]
pub struct Installer {
    runner: SharedRunner,
    homebrew_prefix: PathBuf,
    rclone_override: Option<PathBuf>,
}

impl Installer {
    pub fn new(runner: SharedRunner, paths: &ResolvedPaths) -> Self {
        Self {
            runner,
            homebrew_prefix: paths.homebrew_prefix.clone(),
            rclone_override: paths.rclone_binary.clone(),
        }
    }

    pub fn homebrew_path(&self) -> Option<PathBuf> {
        let candidate = self.homebrew_prefix.join("bin").join("brew");
        self.runner
            .look_path(&candidate.to_string_lossy())
            .or_else(|| self.runner.look_path("brew"))
    }

    pub fn rclone_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.rclone_override {
            return self.runner.look_path(&path.to_string_lossy());
        }
        let candidate = self.homebrew_prefix.join("bin").join("rclone");
        self.runner
            .look_path(&candidate.to_string_lossy())
            .or_else(|| self.runner.look_path("rclone"))
    }

    pub fn rclone_version(&self, binary: &Path) -> anyhow::Result<String> {
        let output = run_checked(
            self.runner.as_ref(),
            "rclone",
            "version",
            binary,
            &to_args(["version"]),
        )?;
        Ok(parse_rclone_version(&output.stdout).unwrap_or_else(|| "unknown".to_string()))
    }

    pub fn check(&self) -> anyhow::Result<ToolStatus> {
        let homebrew = self.homebrew_path();
        let rclone = self.rclone_path();
        let rclone_version = match &rclone {
            Some(binary) => match self.rclone_version(binary) {
                Ok(version) => Some(version),
                Err(err) => {
                    warn!(error = %err, "rclone version check failed");
                    None
                }
            },
            None => None,
        };
        info!(
            homebrew = homebrew.is_some(),
            rclone = rclone.is_some(),
            version = rclone_version.as_deref().unwrap_or("-"),
            "Checked tools"
        );
        Ok(ToolStatus {
            homebrew,
            rclone,
            rclone_version,
        })
    }

    pub fn install_rclone(&self) -> anyhow::Result<String> {
        self.brew("install")
    }

    pub fn upgrade_rclone(&self) -> anyhow::Result<String> {
        self.brew("upgrade")
    }

    fn brew(&self, verb: &str) -> anyhow::Result<String> {
        let brew = self
            .homebrew_path()
            .ok_or_else(|| ToolError::not_found("Homebrew"))?;
        info!(brew = %brew.display(), verb, "Running brew for rclone");
        run_checked(
            self.runner.as_ref(),
            "brew",
            &format!("{verb} rclone"),
            &brew,
            &to_args([verb, "rclone"]),
        )?;
        let rclone = self
            .rclone_path()
            .ok_or_else(|| ToolError::not_found("rclone"))?;
        self.rclone_version(&rclone)
    }
}

pub fn parse_rclone_version(stdout: &str) -> Option<String> {
    let first = stdout.lines().next()?.trim();
    let version = first.strip_prefix("rclone")?.trim();
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{CommandOutput, MockCommandRunner};
    use crate::paths::{DefaultDirs, PathSettings};
    use std::sync::Arc;

    fn paths() -> ResolvedPaths {
        let dirs = DefaultDirs::under(Path::new("/tmp/cb"));
        let settings = PathSettings {
            homebrew_prefix: Some(PathBuf::from("/opt/homebrew")),
            ..PathSettings::default()
        };
        settings.resolve(&dirs, &dirs.config_file())
    }

    #[test]
    fn parses_version_line() {
        assert_eq!(
            parse_rclone_version("rclone v1.65.0\n- os/version: darwin\n"),
            Some("v1.65.0".to_string())
        );
        assert_eq!(parse_rclone_version("garbage"), None);
        assert_eq!(parse_rclone_version(""), None);
    }

    #[test]
    fn check_reports_missing_tools() {
        let mut runner = MockCommandRunner::new();
        runner.expect_look_path().returning(|_| None);
        let installer = Installer::new(Arc::new(runner), &paths());
        let status = installer.check().unwrap();
        assert_eq!(status, ToolStatus::default());
        assert!(!status.rclone_ready());
    }

    #[test]
    fn check_prefers_homebrew_prefix_and_reads_version() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_look_path()
            .returning(|program| match program {
                "/opt/homebrew/bin/brew" => Some(PathBuf::from("/opt/homebrew/bin/brew")),
                "/opt/homebrew/bin/rclone" => Some(PathBuf::from("/opt/homebrew/bin/rclone")),
                _ => None,
            });
        runner
            .expect_run()
            .withf(|program, args| {
                program == Path::new("/opt/homebrew/bin/rclone") && args == ["version"]
            })
            .returning(|_, _| Ok(CommandOutput::ok("rclone v1.66.0\n")));
        let installer = Installer::new(Arc::new(runner), &paths());
        let status = installer.check().unwrap();
        assert_eq!(
            status.homebrew,
            Some(PathBuf::from("/opt/homebrew/bin/brew"))
        );
        assert_eq!(status.rclone_version.as_deref(), Some("v1.66.0"));
    }

    #[test]
    fn install_requires_homebrew() {
        let mut runner = MockCommandRunner::new();
        runner.expect_look_path().returning(|_| None);
        let installer = Installer::new(Arc::new(runner), &paths());
        let err = installer.install_rclone().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::NotFound { tool }) if tool == "Homebrew"
        ));
    }

    #[test]
    fn failed_brew_install_surfaces_output() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_look_path()
            .returning(|program| (program == "brew").then(|| PathBuf::from("/usr/local/bin/brew")));
        runner
            .expect_run()
            .withf(|_, args| args == ["install", "rclone"])
            .times(1)
            .returning(|_, _| Ok(CommandOutput::failed(1, "Error: network down")));
        let installer = Installer::new(Arc::new(runner), &paths());
        let err = installer.install_rclone().unwrap_err();
        assert!(err.to_string().contains("network down"));
    }
}
