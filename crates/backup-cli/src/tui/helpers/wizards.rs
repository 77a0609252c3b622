use super::*;

pub(in crate::tui) enum Advance<T> {
    Stay,
    Finished(T),
}

pub(in crate::tui) fn handle_text_input(field: &mut InputField, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            field.value.clear();
            true
        }
        KeyCode::Backspace => {
            field.pop();
            true
        }
        KeyCode::Char(ch) if !ch.is_control() => {
            field.push(ch);
            true
        }
        _ => false,
    }
}

fn cycle(index: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::tui) enum RemoteStep {
    Name,
    Kind,
    Credentials,
    Confirm,
    Complete,
}

pub(in crate::tui) struct RemoteWizard {
    pub(in crate::tui) step: RemoteStep,
    pub(in crate::tui) name: InputField,
    pub(in crate::tui) kind_index: usize,
    pub(in crate::tui) fields: Vec<InputField>,
    pub(in crate::tui) field_index: usize,
    pub(in crate::tui) error: Option<String>,
    existing: Vec<String>,
}

impl RemoteWizard {
    pub(in crate::tui) fn new(existing: Vec<String>) -> Self {
        Self {
            step: RemoteStep::Name,
            name: InputField::new("Remote name"),
            kind_index: 0,
            fields: Vec::new(),
            field_index: 0,
            error: None,
            existing,
        }
    }

    pub(in crate::tui) fn kind(&self) -> RemoteKind {
        RemoteKind::ALL[self.kind_index % RemoteKind::ALL.len()]
    }

    fn credential_fields(kind: RemoteKind) -> Vec<InputField> {
        match kind {
            RemoteKind::B2 => vec![
                InputField::new("Account ID"),
                InputField::with_mask("Application key"),
            ],
            RemoteKind::S3 => vec![
                InputField::new("Access key ID"),
                InputField::with_mask("Secret access key"),
                InputField::new("Region (optional)"),
                InputField::new("Endpoint (optional)"),
            ],
        }
    }

    fn field(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.trimmed())
            .unwrap_or("")
    }

    pub(in crate::tui) fn build(&self) -> RemoteConfig {
        let name = self.name.trimmed();
        match self.kind() {
            RemoteKind::B2 => RemoteConfig::b2(name, self.field(0), self.field(1)),
            RemoteKind::S3 => {
                let mut remote = RemoteConfig::s3(name, self.field(0), self.field(1));
                remote.region = optional_text(self.field(2));
                remote.endpoint = optional_text(self.field(3));
                remote
            }
        }
    }

    fn submit_name(&self) -> Result<(), String> {
        let name = self.name.trimmed();
        validate_remote_name(name).map_err(|err| err.to_string())?;
        if self.existing.iter().any(|existing| existing == name) {
            return Err(format!("remote '{name}' already exists"));
        }
        Ok(())
    }

    pub(in crate::tui) fn handle_key(&mut self, key: KeyEvent) -> Advance<RemoteConfig> {
        match self.step {
            RemoteStep::Name => {
                if key.code == KeyCode::Enter {
                    match self.submit_name() {
                        Ok(()) => {
                            self.error = None;
                            self.step = RemoteStep::Kind;
                        }
                        Err(err) => self.error = Some(err),
                    }
                } else {
                    handle_text_input(&mut self.name, key);
                }
            }
            RemoteStep::Kind => match key.code {
                KeyCode::Left | KeyCode::Up => {
                    self.kind_index = cycle(self.kind_index, RemoteKind::ALL.len(), false);
                }
                KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                    self.kind_index = cycle(self.kind_index, RemoteKind::ALL.len(), true);
                }
                KeyCode::Enter => {
                    self.fields = Self::credential_fields(self.kind());
                    self.field_index = 0;
                    self.step = RemoteStep::Credentials;
                }
                _ => {}
            },
            RemoteStep::Credentials => match key.code {
                KeyCode::Tab | KeyCode::Down => {
                    self.field_index = cycle(self.field_index, self.fields.len(), true);
                }
                KeyCode::BackTab | KeyCode::Up => {
                    self.field_index = cycle(self.field_index, self.fields.len(), false);
                }
                KeyCode::Enter => {
                    if self.field_index + 1 < self.fields.len() {
                        self.field_index += 1;
                    } else {
                        match self.build().validate() {
                            Ok(()) => {
                                self.error = None;
                                self.step = RemoteStep::Confirm;
                            }
                            Err(err) => self.error = Some(err.to_string()),
                        }
                    }
                }
                _ => {
                    if let Some(field) = self.fields.get_mut(self.field_index) {
                        handle_text_input(field, key);
                    }
                }
            },
            RemoteStep::Confirm => {
                if key.code == KeyCode::Enter {
                    self.step = RemoteStep::Complete;
                    return Advance::Finished(self.build());
                }
            }
            RemoteStep::Complete => {}
        }
        Advance::Stay
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::tui) enum PairStep {
    Name,
    LocalPath,
    Remote,
    RemotePath,
    Direction,
    Confirm,
    Complete,
}

pub(in crate::tui) struct PairWizard {
    pub(in crate::tui) step: PairStep,
    pub(in crate::tui) name: InputField,
    pub(in crate::tui) local_path: InputField,
    pub(in crate::tui) remote_path: InputField,
    pub(in crate::tui) remotes: Vec<String>,
    pub(in crate::tui) remote_index: usize,
    pub(in crate::tui) direction_index: usize,
    pub(in crate::tui) error: Option<String>,
    existing: Vec<String>,
    home: PathBuf,
}

impl PairWizard {
    pub(in crate::tui) fn new(remotes: Vec<String>, existing: Vec<String>, home: PathBuf) -> Self {
        Self {
            step: PairStep::Name,
            name: InputField::new("Pair name"),
            local_path: InputField::new("Local folder"),
            remote_path: InputField::new("Remote path (bucket/folder)"),
            remotes,
            remote_index: 0,
            direction_index: 0,
            error: None,
            existing,
            home,
        }
    }

    pub(in crate::tui) fn direction(&self) -> SyncDirection {
        SyncDirection::ALL[self.direction_index % SyncDirection::ALL.len()]
    }

    pub(in crate::tui) fn remote(&self) -> &str {
        self.remotes
            .get(self.remote_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub(in crate::tui) fn local(&self) -> PathBuf {
        expand_home(std::path::Path::new(self.local_path.trimmed()), &self.home)
    }

    pub(in crate::tui) fn build(&self) -> SyncPair {
        SyncPair::new(
            self.name.trimmed(),
            self.local(),
            self.remote(),
            self.remote_path.trimmed(),
            self.direction(),
        )
    }

    fn check_step(&self) -> Result<(), String> {
        match self.step {
            PairStep::Name => {
                let name = self.name.trimmed();
                if name.is_empty() {
                    return Err("name must not be empty".to_string());
                }
                if self.existing.iter().any(|existing| existing == name) {
                    return Err(format!("sync pair '{name}' already exists"));
                }
            }
            PairStep::LocalPath => {
                if self.local_path.trimmed().is_empty() {
                    return Err("local path must not be empty".to_string());
                }
            }
            PairStep::Remote => {
                if self.remotes.is_empty() {
                    return Err("no remotes configured; add a remote first".to_string());
                }
            }
            PairStep::RemotePath => {
                if self.remote_path.trimmed().is_empty() {
                    return Err("remote path must not be empty".to_string());
                }
            }
            PairStep::Direction => {
                self.build().validate().map_err(|err| err.to_string())?;
            }
            PairStep::Confirm | PairStep::Complete => {}
        }
        Ok(())
    }

    fn next_step(&self) -> PairStep {
        match self.step {
            PairStep::Name => PairStep::LocalPath,
            PairStep::LocalPath => PairStep::Remote,
            PairStep::Remote => PairStep::RemotePath,
            PairStep::RemotePath => PairStep::Direction,
            PairStep::Direction => PairStep::Confirm,
            PairStep::Confirm | PairStep::Complete => PairStep::Complete,
        }
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.step {
            PairStep::Name => Some(&mut self.name),
            PairStep::LocalPath => Some(&mut self.local_path),
            PairStep::RemotePath => Some(&mut self.remote_path),
            _ => None,
        }
    }

    pub(in crate::tui) fn handle_key(&mut self, key: KeyEvent) -> Advance<SyncPair> {
        if key.code == KeyCode::Enter {
            if let Err(err) = self.check_step() {
                self.error = Some(err);
                return Advance::Stay;
            }
            self.error = None;
            self.step = self.next_step();
            if self.step == PairStep::Complete {
                return Advance::Finished(self.build());
            }
            return Advance::Stay;
        }
        match self.step {
            PairStep::Remote => match key.code {
                KeyCode::Up | KeyCode::Left => {
                    self.remote_index = cycle(self.remote_index, self.remotes.len(), false);
                }
                KeyCode::Down | KeyCode::Right | KeyCode::Tab => {
                    self.remote_index = cycle(self.remote_index, self.remotes.len(), true);
                }
                _ => {}
            },
            PairStep::Direction => match key.code {
                KeyCode::Up | KeyCode::Left => {
                    self.direction_index =
                        cycle(self.direction_index, SyncDirection::ALL.len(), false);
                }
                KeyCode::Down | KeyCode::Right | KeyCode::Tab => {
                    self.direction_index =
                        cycle(self.direction_index, SyncDirection::ALL.len(), true);
                }
                _ => {}
            },
            _ => {
                if let Some(field) = self.active_input() {
                    handle_text_input(field, key);
                }
            }
        }
        Advance::Stay
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::tui) enum ScheduleStep {
    Hour,
    Minute,
    RunAtLoad,
    Confirm,
    Complete,
}

pub(in crate::tui) struct ScheduleWizard {
    pub(in crate::tui) step: ScheduleStep,
    pub(in crate::tui) hour: InputField,
    pub(in crate::tui) minute: InputField,
    pub(in crate::tui) run_at_load: bool,
    pub(in crate::tui) error: Option<String>,
    parsed: ScheduleSettings,
}

impl ScheduleWizard {
    pub(in crate::tui) fn new(current: &ScheduleSettings) -> Self {
        Self {
            step: ScheduleStep::Hour,
            hour: InputField::with_value("Hour (0-23)", current.hour.to_string()),
            minute: InputField::with_value("Minute (0-59)", current.minute.to_string()),
            run_at_load: current.run_at_load,
            error: None,
            parsed: current.clone(),
        }
    }

    pub(in crate::tui) fn schedule(&self) -> ScheduleSettings {
        ScheduleSettings {
            enabled: true,
            run_at_load: self.run_at_load,
            ..self.parsed.clone()
        }
    }

    pub(in crate::tui) fn handle_key(&mut self, key: KeyEvent) -> Advance<ScheduleSettings> {
        match self.step {
            ScheduleStep::Hour => {
                if key.code == KeyCode::Enter {
                    match parse_bounded("hour", self.hour.trimmed(), 0, 23) {
                        Ok(hour) => {
                            self.parsed.hour = hour;
                            self.error = None;
                            self.step = ScheduleStep::Minute;
                        }
                        Err(err) => self.error = Some(err.to_string()),
                    }
                } else {
                    handle_text_input(&mut self.hour, key);
                }
            }
            ScheduleStep::Minute => {
                if key.code == KeyCode::Enter {
                    match parse_bounded("minute", self.minute.trimmed(), 0, 59) {
                        Ok(minute) => {
                            self.parsed.minute = minute;
                            self.error = None;
                            self.step = ScheduleStep::RunAtLoad;
                        }
                        Err(err) => self.error = Some(err.to_string()),
                    }
                } else {
                    handle_text_input(&mut self.minute, key);
                }
            }
            ScheduleStep::RunAtLoad => match key.code {
                KeyCode::Left
                | KeyCode::Right
                | KeyCode::Up
                | KeyCode::Down
                | KeyCode::Tab
                | KeyCode::Char(' ') => self.run_at_load = !self.run_at_load,
                KeyCode::Char('y') => self.run_at_load = true,
                KeyCode::Char('n') => self.run_at_load = false,
                KeyCode::Enter => self.step = ScheduleStep::Confirm,
                _ => {}
            },
            ScheduleStep::Confirm => {
                if key.code == KeyCode::Enter {
                    self.step = ScheduleStep::Complete;
                    return Advance::Finished(self.schedule());
                }
            }
            ScheduleStep::Complete => {}
        }
        Advance::Stay
    }
}
