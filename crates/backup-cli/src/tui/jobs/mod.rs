use super::*;

mod poll;
mod start;
