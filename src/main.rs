use edrum_ctl::{app, settings, ui};
use std::fs::File;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "edrum-ctl.log";

/// Logs go to a file; stderr would corrupt the terminal UI.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false);
    match settings::get_config_dir().and_then(|dir| File::create(dir.join(LOG_FILE)).ok()) {
        Some(file) => builder.with_writer(Mutex::new(file)).init(),
        None => builder.with_writer(io::sink).init(),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let settings = settings::load_settings();
    tracing::info!(?settings, "Starting");

    let mut session = app::Session::start(&settings)?;
    let result = ui::run(session.context());
    session.stop();

    settings::save_settings(&settings);
    result
}
