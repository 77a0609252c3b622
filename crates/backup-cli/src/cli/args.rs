use super::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal UI for rclone cloud backups on macOS")]
pub(super) struct Cli {
    #[arg(long, help = "Draw in the main screen instead of the alternate screen")]
    pub(super) no_alt_screen: bool,
    #[arg(long, help = "Capture mouse events")]
    pub(super) mouse: bool,
    #[arg(
        long,
        default_value_t = 200,
        value_parser = clap::value_parser!(u64).range(10..=5000),
        help = "Event loop tick rate in milliseconds"
    )]
    pub(super) tick_rate_ms: u64,
    #[arg(long, value_name = "PATH", help = "Use another config file")]
    pub(super) config: Option<PathBuf>,
}

impl Cli {
    pub(super) fn tui_options(&self) -> tui::TuiOptions {
        tui::TuiOptions {
            alt_screen: !self.no_alt_screen,
            mouse: self.mouse,
            tick_rate: Duration::from_millis(self.tick_rate_ms),
        }
    }
}
