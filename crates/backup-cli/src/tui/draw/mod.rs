use super::*;

mod backup_logs;
mod config_forms;
mod core;
mod launchd_misc;
mod main_install;
