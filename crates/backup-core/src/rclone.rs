use crate::config::SyncSettings;
use crate::exec::{SharedRunner, run_checked, to_args};
use crate::installer::parse_rclone_version;
use crate::sync_pairs::SyncPair;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutput {
    JsonStats,
    LogFile(PathBuf),
}

#[derive(Clone)]
pub struct RcloneClient {
    runner: SharedRunner,
    binary: PathBuf,
    config_path: PathBuf,
}

impl RcloneClient {
    pub fn new(runner: SharedRunner, binary: &Path, config_path: &Path) -> Self {
        Self {
            runner,
            binary: binary.to_path_buf(),
            config_path: config_path.to_path_buf(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn run(&self, action: &str, args: Vec<String>) -> anyhow::Result<String> {
        let mut full = vec![
            "--config".to_string(),
            self.config_path.to_string_lossy().into_owned(),
        ];
        full.extend(args);
        let output = run_checked(self.runner.as_ref(), "rclone", action, &self.binary, &full)?;
        Ok(output.stdout)
    }

    pub fn version(&self) -> anyhow::Result<String> {
        let stdout = self.run("version", to_args(["version"]))?;
        Ok(parse_rclone_version(&stdout).unwrap_or_else(|| "unknown".to_string()))
    }

    pub fn list_remotes(&self) -> anyhow::Result<Vec<String>> {
        let stdout = self.run("listremotes", to_args(["listremotes"]))?;
        Ok(parse_listremotes(&stdout))
    }

    pub fn list_dirs(&self, remote: &str, path: &str) -> anyhow::Result<Vec<String>> {
        let target = format!("{remote}:{}", path.trim_start_matches('/'));
        let stdout = self.run(
            "lsd",
            to_args(["lsd", target.as_str(), "--max-depth", "1"]),
        )?;
        Ok(parse_lsd(&stdout))
    }

    pub fn test_remote(&self, remote: &str) -> anyhow::Result<Vec<String>> {
        info!(remote, "Testing remote connection");
        self.list_dirs(remote, "")
    }

    pub fn sync_args(
        &self,
        pair: &SyncPair,
        settings: &SyncSettings,
        output: &SyncOutput,
    ) -> Vec<String> {
        sync_args(pair, settings, &self.config_path, output)
    }
}

pub fn sync_args(
    pair: &SyncPair,
    settings: &SyncSettings,
    config_path: &Path,
    output: &SyncOutput,
) -> Vec<String> {
    let mut args = pair.rclone_args();
    args.push("--config".to_string());
    args.push(config_path.to_string_lossy().into_owned());
    args.extend(tuning_args(settings));
    match output {
        SyncOutput::JsonStats => args.extend(to_args([
            "--stats",
            "1s",
            "--stats-log-level",
            "NOTICE",
            "--use-json-log",
            "-v",
        ])),
        SyncOutput::LogFile(path) => {
            args.push("--log-file".to_string());
            args.push(path.to_string_lossy().into_owned());
            args.push("-v".to_string());
        }
    }
    args
}

pub fn tuning_args(settings: &SyncSettings) -> Vec<String> {
    let mut args = vec![
        "--transfers".to_string(),
        settings.transfers.max(1).to_string(),
        "--checkers".to_string(),
        settings.checkers.max(1).to_string(),
    ];
    if let Some(limit) = settings
        .bandwidth_limit
        .as_deref()
        .filter(|limit| !limit.trim().is_empty())
    {
        args.push("--bwlimit".to_string());
        args.push(limit.trim().to_string());
    }
    if settings.dry_run {
        args.push("--dry-run".to_string());
    }
    args.extend(settings.extra_flags.iter().cloned());
    args
}

pub fn parse_listremotes(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_end_matches(':').to_string())
        .collect()
}

pub fn parse_lsd(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            Some(fields[4..].join(" "))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{CommandOutput, MockCommandRunner};
    use crate::sync_pairs::SyncDirection;
    use std::sync::Arc;

    #[test]
    fn listremotes_strips_colons() {
        assert_eq!(
            parse_listremotes("b2:\nwasabi:\n\n"),
            vec!["b2".to_string(), "wasabi".to_string()]
        );
    }

    #[test]
    fn lsd_keeps_names_with_spaces() {
        let out = "          -1 2024-01-15 10:30:45        -1 photos\n          -1 2024-01-15 10:30:45        -1 tax returns\n";
        assert_eq!(
            parse_lsd(out),
            vec!["photos".to_string(), "tax returns".to_string()]
        );
    }

    #[test]
    fn sync_args_include_settings_and_output() {
        let pair = SyncPair::new("docs", "/data", "b2", "bucket", SyncDirection::Upload);
        let settings = SyncSettings {
            bandwidth_limit: Some("10M".to_string()),
            dry_run: true,
            extra_flags: vec!["--fast-list".to_string()],
            ..SyncSettings::default()
        };
        let args = sync_args(
            &pair,
            &settings,
            Path::new("/cfg/rclone.conf"),
            &SyncOutput::LogFile(PathBuf::from("/logs/backup.log")),
        );
        let joined = args.join(" ");
        assert!(joined.starts_with("sync /data b2:bucket --config /cfg/rclone.conf"));
        assert!(joined.contains("--transfers 4 --checkers 8 --bwlimit 10M --dry-run --fast-list"));
        assert!(joined.ends_with("--log-file /logs/backup.log -v"));

        let json = sync_args(
            &pair,
            &SyncSettings::default(),
            Path::new("/cfg/rclone.conf"),
            &SyncOutput::JsonStats,
        );
        assert!(json.contains(&"--use-json-log".to_string()));
        assert!(!json.contains(&"--dry-run".to_string()));
    }

    #[test]
    fn test_remote_runs_lsd_with_config() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|_, args| {
                args == ["--config", "/cfg/rclone.conf", "lsd", "b2:", "--max-depth", "1"]
            })
            .returning(|_, _| Ok(CommandOutput::ok("  -1 2024-01-15 10:30:45  -1 bucket\n")));
        let client = RcloneClient::new(
            Arc::new(runner),
            Path::new("/usr/local/bin/rclone"),
            Path::new("/cfg/rclone.conf"),
        );
        assert_eq!(client.test_remote("b2").unwrap(), vec!["bucket".to_string()]);
    }

    #[test]
    fn failing_remote_test_is_an_error() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_, _| Ok(CommandOutput::failed(3, "directory not found")));
        let client = RcloneClient::new(
            Arc::new(runner),
            Path::new("rclone"),
            Path::new("/cfg/rclone.conf"),
        );
        let err = client.test_remote("b2").unwrap_err();
        assert!(err.to_string().contains("directory not found"));
    }
}
