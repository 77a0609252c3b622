use crate::services::Services;
use crate::{logging, tui};
use anyhow::Context;
use backup_core::exec::SystemRunner;
use backup_core::paths::{APP_NAME, DefaultDirs};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

mod app;
mod args;

use args::*;

pub use app::run;
