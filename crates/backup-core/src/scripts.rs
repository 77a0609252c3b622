use crate::config::{SyncSettings, set_mode};
use crate::lockfile::DEFAULT_STALE_AFTER;
use crate::logs::{finish_marker, start_marker};
use crate::paths::ResolvedPaths;
use crate::rclone::tuning_args;
use crate::sync_pairs::SyncPair;
use anyhow::Context;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug)]
pub struct ScriptContext {
    pub rclone_binary: PathBuf,
    pub pairs: Vec<SyncPair>,
    pub sync: SyncSettings,
    pub stale_after: Duration,
}

impl ScriptContext {
    pub fn new(rclone_binary: &Path, pairs: Vec<SyncPair>, sync: SyncSettings) -> Self {
        Self {
            rclone_binary: rclone_binary.to_path_buf(),
            pairs,
            sync,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScriptGenerator {
    paths: ResolvedPaths,
}

impl ScriptGenerator {
    pub fn new(paths: &ResolvedPaths) -> Self {
        Self {
            paths: paths.clone(),
        }
    }

    pub fn script_path(&self) -> PathBuf {
        self.paths.backup_script()
    }

    pub fn backup_script(&self, ctx: &ScriptContext) -> String {
        let mut script = String::new();
        let _ = write!(
            script,
            r#"#!/bin/bash
# Generated by cloud-backup. Regenerating the script overwrites manual edits.
set -uo pipefail

LOCK_FILE={lock}
LOG_FILE={log}
RCLONE={rclone}
RCLONE_CONFIG={config}
STALE_AFTER_SECONDS={stale}

log() {{
  echo "$(date '+%Y/%m/%d %H:%M:%S') NOTICE : $*" >> "$LOG_FILE"
}}

mkdir -p "$(dirname "$LOG_FILE")" "$(dirname "$LOCK_FILE")"

if [ -e "$LOCK_FILE" ]; then
  lock_mtime=$(stat -f %m "$LOCK_FILE" 2>/dev/null || stat -c %Y "$LOCK_FILE")
  lock_age=$(( $(date +%s) - lock_mtime ))
  if [ "$lock_age" -lt "$STALE_AFTER_SECONDS" ]; then
    log "Backup already running (lock age ${{lock_age}}s), skipping"
    exit 0
  fi
  log "Removing stale lock (age ${{lock_age}}s)"
  rm -f "$LOCK_FILE"
fi

date -u '+%Y-%m-%dT%H:%M:%SZ' > "$LOCK_FILE"
STATUS=ok
finish() {{
  log "{finished}"
  rm -f "$LOCK_FILE"
}}
trap finish EXIT
trap 'STATUS=cancelled; exit 130' INT TERM

log "{started}"
"#,
            lock = shell_quote(&self.paths.lock_file.to_string_lossy()),
            log = shell_quote(&self.paths.log_file.to_string_lossy()),
            rclone = shell_quote(&ctx.rclone_binary.to_string_lossy()),
            config = shell_quote(&self.paths.rclone_config.to_string_lossy()),
            stale = ctx.stale_after.as_secs(),
            finished = finish_marker("${STATUS}"),
            started = start_marker("all"),
        );

        let tuning = tuning_args(&ctx.sync)
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ");
        let enabled: Vec<&SyncPair> = ctx.pairs.iter().filter(|pair| pair.enabled).collect();
        if enabled.is_empty() {
            script.push_str("\nlog \"No enabled sync pairs\"\n");
        }
        for pair in enabled {
            let args = pair
                .rclone_args()
                .iter()
                .map(|arg| shell_quote(arg))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(
                script,
                r#"
# {name}: {summary}
log "Syncing {name}"
if ! "$RCLONE" {args} --config "$RCLONE_CONFIG" {tuning} --log-file "$LOG_FILE" -v; then
  STATUS=failed
fi
"#,
                name = comment_safe(&pair.name),
                summary = comment_safe(&pair.summary()),
            );
        }
        script.push_str("\n[ \"$STATUS\" = ok ]\n");
        script
    }

    pub fn write_backup_script(&self, ctx: &ScriptContext) -> anyhow::Result<PathBuf> {
        let path = self.script_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create scripts dir")?;
        }
        fs::write(&path, self.backup_script(ctx))
            .with_context(|| format!("write backup script {}", path.display()))?;
        set_mode(&path, 0o755)?;
        info!(
            path = %path.display(),
            pairs = ctx.pairs.iter().filter(|pair| pair.enabled).count(),
            "Wrote backup script"
        );
        Ok(path)
    }
}

fn comment_safe(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch == '\n' || ch == '"' || ch == '$' || ch == '`' { '_' } else { ch })
        .collect()
}

pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    let safe = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || "_@%+=:,./-".contains(ch));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{DefaultDirs, PathSettings};
    use crate::sync_pairs::SyncDirection;
    use tempfile::TempDir;

    fn generator(root: &Path) -> ScriptGenerator {
        let dirs = DefaultDirs::under(root);
        ScriptGenerator::new(&PathSettings::default().resolve(&dirs, &dirs.config_file()))
    }

    fn context() -> ScriptContext {
        let mut disabled =
            SyncPair::new("music", "/Users/me/Music", "b2", "music", SyncDirection::Upload);
        disabled.enabled = false;
        ScriptContext::new(
            Path::new("/opt/homebrew/bin/rclone"),
            vec![
                SyncPair::new("docs", "/Users/me/My Docs", "b2", "docs", SyncDirection::Upload),
                SyncPair::new("photos", "/Users/me/Photos", "s3", "pics", SyncDirection::Download),
                disabled,
            ],
            SyncSettings::default(),
        )
    }

    #[test]
    fn quoting_rules() {
        assert_eq!(shell_quote("/usr/local/bin/rclone"), "/usr/local/bin/rclone");
        assert_eq!(shell_quote("b2:bucket/docs"), "b2:bucket/docs");
        assert_eq!(shell_quote("My Docs"), "'My Docs'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn script_has_one_rclone_line_per_enabled_pair() {
        let tmp = TempDir::new().unwrap();
        let script = generator(tmp.path()).backup_script(&context());
        let rclone_lines: Vec<&str> = script
            .lines()
            .filter(|line| line.contains("\"$RCLONE\""))
            .collect();
        assert_eq!(rclone_lines.len(), 2);
        assert!(rclone_lines[0].contains("sync '/Users/me/My Docs' b2:docs"));
        assert!(rclone_lines[1].contains("sync s3:pics /Users/me/Photos"));
        assert!(rclone_lines[0].contains("--transfers 4 --checkers 8"));
        assert!(rclone_lines[0].ends_with("--log-file \"$LOG_FILE\" -v; then"));
        assert!(!script.contains("Music"));
    }

    #[test]
    fn script_declares_paths_lock_handling_and_markers() {
        let tmp = TempDir::new().unwrap();
        let generator = generator(tmp.path());
        let script = generator.backup_script(&context());
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("RCLONE=/opt/homebrew/bin/rclone\n"));
        assert!(script.contains("STALE_AFTER_SECONDS=21600\n"));
        assert!(script.contains(&format!(
            "LOCK_FILE={}",
            tmp.path().join("data").join("backup.lock").display()
        )));
        assert!(script.contains("trap finish EXIT"));
        assert!(script.contains("log \"=== Backup started: all ===\""));
        assert!(script.contains("log \"=== Backup finished: status=${STATUS} ===\""));
    }

    #[test]
    fn empty_pair_list_still_produces_a_valid_script() {
        let tmp = TempDir::new().unwrap();
        let ctx = ScriptContext::new(Path::new("rclone"), Vec::new(), SyncSettings::default());
        let script = generator(tmp.path()).backup_script(&ctx);
        assert!(script.contains("No enabled sync pairs"));
        assert!(!script.contains("\"$RCLONE\" "));
    }

    #[cfg(unix)]
    #[test]
    fn written_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = generator(tmp.path())
            .write_backup_script(&context())
            .unwrap();
        assert_eq!(path, tmp.path().join("data").join("scripts").join("backup.sh"));
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
