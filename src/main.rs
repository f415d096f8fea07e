//! Tracked Input - frame driver
//!
//! Replays a scenario through the input core at the configured frame rate and
//! logs button edges, action edges and hand selection changes.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use tracked_input::config::AppConfig;
use tracked_input::input::{
    print_device_diagnostics, ButtonId, DeviceRelation, FrameReport, InputContext, Scenario,
    ScriptedBackend,
};
use tracked_input::paths::AppPaths;

/// Tracked Input - replay tracked-device scenarios through the input core
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the detected app location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Scenario file to replay (overrides the config, built-in demo otherwise)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Number of frames to run (defaults to the scenario length)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Log to the console as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print connected devices after one frame and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let paths = AppPaths::detect();
    paths.ensure_logs_dir()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&args.log_level, args.json_logs, &paths.logs_dir)?;

    info!("Starting Tracked Input...");
    paths.ensure_config()?;
    let config_path = args.config.clone().unwrap_or_else(|| paths.config.clone());
    info!("Configuration file: {}", config_path.display());

    let config = load_config(&config_path).await?;
    let scenario = load_scenario(&args, &config, &paths).await?;
    scenario
        .validate(config.tracking.max_devices)
        .context("Invalid scenario")?;

    let backend = ScriptedBackend::new(scenario);
    let mut ctx = InputContext::initialize(backend, config.context_settings())
        .context("Failed to initialize input context")?;

    if args.list_devices {
        ctx.tick();
        print_device_diagnostics(ctx.cache(), |slot| {
            ctx.backend().device_name(slot).map(str::to_string)
        });
        return Ok(());
    }

    let frames = args.frames.unwrap_or(ctx.backend().len() as u64);
    run_frames(&mut ctx, frames, config.frame.rate_hz, shutdown_signal()).await;

    ctx.shutdown();
    info!("Tracked Input shutdown complete");
    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        info!("No configuration at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let config = AppConfig::load(path).await?;
    info!("Configuration loaded successfully");
    Ok(config)
}

async fn load_scenario(args: &Args, config: &AppConfig, paths: &AppPaths) -> Result<Scenario> {
    match args.scenario.as_ref().or(config.scenario.as_ref()) {
        Some(path) => {
            let path = paths.resolve_scenario(path);
            info!("Scenario: {}", path.display());
            Scenario::load(&path).await
        },
        None => {
            info!("No scenario given, using the built-in demo");
            Scenario::demo()
        },
    }
}

/// Last hand selection, used to log only changes
#[derive(Debug, Default, PartialEq)]
struct Hands {
    left: Option<usize>,
    right: Option<usize>,
}

async fn run_frames(
    ctx: &mut InputContext<ScriptedBackend>,
    frames: u64,
    rate_hz: u32,
    shutdown: impl std::future::Future<Output = ()>,
) {
    let period = Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!("Running {} frame(s) at {} Hz", frames, rate_hz);

    let mut hands = Hands::default();
    for index in 0..frames {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping after {} frame(s)", index);
                return;
            }
            _ = interval.tick() => {}
        }

        let script_frame = usize::try_from(index).unwrap_or(usize::MAX);
        ctx.backend_mut().seek(script_frame);
        let report = ctx.tick();
        log_frame(ctx, &report, &mut hands);
    }

    info!("✅ Replayed {} frame(s)", frames);
}

fn log_frame(ctx: &InputContext<ScriptedBackend>, report: &FrameReport, hands: &mut Hands) {
    let class = ctx.settings().device_class;

    for device in ctx.cache().connected().filter(|d| d.class == class) {
        for button in ButtonId::ALL {
            if device.is_pressed_edge_down(button.mask()) {
                info!("[{}] slot {} {} pressed", report.frame, device.slot, button.name());
            }
            if device.is_pressed_edge_up(button.mask()) {
                info!("[{}] slot {} {} released", report.frame, device.slot, button.name());
            }
        }
        if device.is_out_of_range() {
            debug!("[{}] slot {} out of range", report.frame, device.slot);
        }
    }

    for change in &report.action_changes {
        info!(
            "[{}] {} {} ({})",
            report.frame,
            change.path,
            if change.active { "started" } else { "ended" },
            change.origin_name
        );
    }

    let current = Hands {
        left: ctx.select(DeviceRelation::Leftmost),
        right: ctx.select(DeviceRelation::Rightmost),
    };
    if current != *hands {
        info!(
            "[{}] left hand: {}, right hand: {}",
            report.frame,
            describe_slot(current.left),
            describe_slot(current.right)
        );
        *hands = current;
    }
}

fn describe_slot(slot: Option<usize>) -> String {
    slot.map_or_else(|| "none".to_string(), |s| format!("slot {}", s))
}

fn init_logging(level: &str, json: bool, logs_dir: &Path) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "tracked-input.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console = if json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
