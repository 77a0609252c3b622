use super::*;

mod layout;
mod log_render;
mod model;
mod progress;
mod tasks;
mod wizards;

pub(in crate::tui) use layout::*;
pub(in crate::tui) use log_render::*;
pub(in crate::tui) use model::*;
pub(in crate::tui) use progress::*;
pub(in crate::tui) use tasks::*;
pub(in crate::tui) use wizards::*;
