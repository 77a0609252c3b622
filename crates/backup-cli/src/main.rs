mod cli;
mod logging;
mod services;
mod tui;

fn main() -> anyhow::Result<()> {
    cli::run()
}
