use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use bedview::config::{DrawMethod, ViewerConfig};
use bedview::widget;

/// Interactive terminal view of a printer's build volume
#[derive(Parser)]
#[command(name = "bedview", version)]
#[command(about = "Orbit, pan, zoom and pick objects on a 3D print bed", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured draw method
    #[arg(long, value_enum)]
    draw_method: Option<DrawMethod>,

    /// Override the scheduler tick period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Number of demo cubes placed on the bed
    #[arg(long, default_value_t = 3)]
    cubes: usize,

    /// Write logs to this file; logging is off without it
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Where log lines go while the terminal surface is active
#[derive(Debug, PartialEq)]
enum LogTarget {
    /// stderr is the tty behind the alternate screen, so nothing is written
    Off,
    File(PathBuf),
}

impl Args {
    fn log_target(&self) -> LogTarget {
        match &self.log_file {
            Some(path) => LogTarget::File(path.clone()),
            None => LogTarget::Off,
        }
    }
}

fn init_logging(target: &LogTarget) -> Result<(), Box<dyn Error>> {
    let LogTarget::File(path) = target else {
        return Ok(());
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(File::create(path)?))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args.log_target())?;

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(method) = args.draw_method {
        config.render.draw_method = method;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.render.tick_interval_ms = tick_ms;
    }

    widget::run(config, args.cubes)?;
    Ok(())
}
