//! groove-host: headless host driving the style engine over a test groove

mod groove;
mod session;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use groove_services::config::{self, load_config};
use groove_services::{RemoteControlListener, StyleEngine};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Options {
    config_path: PathBuf,
    seconds: f64,
    paced: bool,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut options = Options {
        config_path: config::config_path(),
        seconds: 10.0,
        paced: true,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                options.config_path = args.next().context("--config needs a path")?.into();
            }
            "--seconds" => {
                let value = args.next().context("--seconds needs a number")?;
                options.seconds = value.parse().with_context(|| format!("bad --seconds value: {value}"))?;
            }
            "--fast" => options.paced = false,
            other => bail!("unknown argument: {other} (expected --config, --seconds, --fast)"),
        }
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("groove=info".parse()?))
        .init();

    let options = parse_args()?;
    let config = load_config(&options.config_path)?;
    info!(config = %options.config_path.display(), seconds = options.seconds, "Starting groove host");

    let StyleEngine { handle, sender, mut processor } = StyleEngine::build(&config);

    if let Some(path) = config.state_path.as_deref().filter(|p| p.exists()) {
        if let Err(err) = handle.load_state_from(path) {
            warn!(%err, path = %path.display(), "Ignoring unreadable engine state");
        }
    }

    let listener = RemoteControlListener::spawn(handle.store(), sender, config.remote.clone())?;

    let samples = options.seconds.max(0.0) * f64::from(config.sample_rate);
    let blocks = (samples / f64::from(config.block_size.max(1))).ceil() as u64;
    let block_config = config.clone();
    let paced = options.paced;
    let worker = thread::Builder::new()
        .name("groove-block".into())
        .spawn(move || session::run(&mut processor, &block_config, blocks, paced))?;

    let mut last = (handle.stats(), handle.style());
    while !worker.is_finished() {
        thread::sleep(POLL_INTERVAL);
        let now = (handle.stats(), handle.style());
        if now != last {
            info!(stats = ?now.0, style = ?now.1, "Engine status changed");
            last = now;
        }
    }

    let summary = worker.join().map_err(|_| anyhow!("block thread panicked"))?;
    let remote = listener.stop()?;

    info!(
        blocks = summary.blocks,
        events_in = summary.events_in,
        events_out = summary.events_out,
        transformed = summary.report.transformed,
        accented = summary.accented,
        shifted = summary.shifted,
        max_shift_ms = summary.max_shift_secs * 1000.0,
        late_blocks = summary.late_blocks,
        applied = summary.report.applied,
        rejected = summary.report.rejected,
        "Session finished"
    );
    info!(?remote, stats = ?handle.stats(), "Remote control summary");

    if let Some(path) = &config.state_path {
        handle.save_state_to(path)?;
    }
    Ok(())
}
