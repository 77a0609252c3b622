use super::*;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dirs = DefaultDirs::from_system().context("resolve default directories")?;
    let app_log = dirs.data_dir.join(format!("{APP_NAME}.log"));
    let log_buffer = logging::init(&app_log)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        app_log = %app_log.display(),
        "Starting cloud-backup"
    );

    let services = Services::load(SystemRunner::shared(), &dirs, cli.config.as_deref())
        .context("load configuration")?;
    let result = tui::run_tui(services, log_buffer, cli.tui_options());
    if let Err(err) = &result {
        error!(error = %err, "cloud-backup exited with error");
    }
    result
}
