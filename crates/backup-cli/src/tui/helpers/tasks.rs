use super::*;

pub(in crate::tui) enum TaskOutcome {
    ToolCheck(Result<ToolStatus, String>),
    ToolInstall(Result<String, String>),
    RemoteTest {
        remote: String,
        result: Result<Vec<String>, String>,
    },
    LogLoaded(Result<ParsedLog, String>),
    AgentStatus(Result<AgentStatus, String>),
    AgentAction {
        action: &'static str,
        result: Result<String, String>,
    },
}

impl TaskOutcome {
    pub(in crate::tui) fn name(&self) -> &'static str {
        match self {
            TaskOutcome::ToolCheck(_) => "tool check",
            TaskOutcome::ToolInstall(_) => "tool install",
            TaskOutcome::RemoteTest { .. } => "remote test",
            TaskOutcome::LogLoaded(_) => "log load",
            TaskOutcome::AgentStatus(_) => "agent status",
            TaskOutcome::AgentAction { .. } => "agent action",
        }
    }
}

/// Background jobs report back tagged with the screen epoch they were
/// spawned under; results for an earlier epoch belong to a discarded screen.
pub(in crate::tui) struct TaskQueue {
    tx: mpsc::Sender<(u64, TaskOutcome)>,
    rx: mpsc::Receiver<(u64, TaskOutcome)>,
    epoch: u64,
    pending: usize,
}

impl TaskQueue {
    pub(in crate::tui) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            epoch: 0,
            pending: 0,
        }
    }

    pub(in crate::tui) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(in crate::tui) fn pending(&self) -> usize {
        self.pending
    }

    pub(in crate::tui) fn advance_epoch(&mut self) {
        self.epoch += 1;
    }

    pub(in crate::tui) fn spawn<F>(&mut self, name: &'static str, job: F)
    where
        F: FnOnce() -> TaskOutcome + Send + 'static,
    {
        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.pending += 1;
        debug!(task = name, epoch, "Spawning task");
        thread::spawn(move || {
            let _ = tx.send((epoch, job()));
        });
    }

    pub(in crate::tui) fn drain(&mut self) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::new();
        while let Ok((epoch, outcome)) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            if epoch == self.epoch {
                outcomes.push(outcome);
            } else {
                debug!(task = outcome.name(), epoch, "Dropping stale task result");
            }
        }
        outcomes
    }
}
