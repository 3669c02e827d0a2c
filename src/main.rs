use anyhow::Result;
use ncpr_summary::{
    aggregate::{self, Outcome},
    config::{Config, CONFIG_FILE},
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();
    info!("startup");

    // ─── 2) configure dirs ───────────────────────────────────────────
    let config = Config::load(Path::new(CONFIG_FILE));
    info!(
        input = %config.input_dir.display(),
        output = %config.output_path().display(),
        "configured"
    );

    // ─── 3) aggregate + write ────────────────────────────────────────
    // per-entry and write failures are reported inside `run`; the exit is always clean
    match aggregate::run(&config) {
        Outcome::Written { path, rows } => {
            info!(path = %path.display(), rows, "done");
        }
        Outcome::NoData => info!("done: nothing to write"),
        Outcome::OutputLocked { path } | Outcome::WriteFailed { path, .. } => {
            warn!(path = %path.display(), "done: summary was not saved");
        }
    }

    Ok(())
}
