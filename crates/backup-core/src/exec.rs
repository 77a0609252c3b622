use crate::error::ToolError;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }

    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn look_path(&self, program: &str) -> Option<PathBuf>;
    fn run(&self, program: &Path, args: &[String]) -> anyhow::Result<CommandOutput>;
}

pub type SharedRunner = Arc<dyn CommandRunner>;

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn shared() -> SharedRunner {
        Arc::new(SystemRunner)
    }
}

impl CommandRunner for SystemRunner {
    fn look_path(&self, program: &str) -> Option<PathBuf> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }
        let search = std::env::var_os("PATH")?;
        std::env::split_paths(&search)
            .map(|dir| dir.join(program))
            .find(|path| is_executable(path))
    }

    fn run(&self, program: &Path, args: &[String]) -> anyhow::Result<CommandOutput> {
        debug!(program = %program.display(), args = ?args, "Running command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("run {}", program.display()))?;
        Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

pub fn run_checked(
    runner: &dyn CommandRunner,
    tool: &str,
    action: &str,
    program: &Path,
    args: &[String],
) -> anyhow::Result<CommandOutput> {
    let output = runner.run(program, args)?;
    if !output.success {
        debug!(tool, action, status = %output.status_label(), "Command failed");
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            action: action.to_string(),
            status: output.status_label(),
            output: output.combined(),
        }
        .into());
    }
    Ok(output)
}

pub fn to_args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
