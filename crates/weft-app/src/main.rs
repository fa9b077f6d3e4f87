mod cli;
mod scenes;

use std::path::Path;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;
use weft_common::{ConfigError, ControlFlow, DispatchError, WeftError};
use weft_config::WeftConfig;
use weft_core::{EventLoop, HeadlessController, LoopSettings};

/// Iteration cap for headless runs started without `--frames`.
const HEADLESS_FRAMES: u64 = 120;

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        eprintln!("\n--- weft crashed ---");
        eprintln!("Run with RUST_LOG=weft=debug for more detail.");
        eprintln!("--------------------\n");
        default_hook(info);
    }));
}

/// Runs before logging exists; the caller reports the outcome.
fn load_config(path: Option<&str>) -> Result<WeftConfig, ConfigError> {
    match path {
        Some(path) => weft_config::load_config_from(Path::new(path)),
        None => weft_config::load_config(),
    }
}

fn init_logging(directive: &str) {
    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    );
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// `--log-level` wins over the configured level.
fn log_directive(args: &cli::Args, config: &WeftConfig) -> String {
    args.log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.as_filter().to_string())
}

fn drain_errors(errors: &mut Option<UnboundedReceiver<DispatchError>>) {
    let Some(rx) = errors else { return };
    while let Ok(e) = rx.try_recv() {
        tracing::warn!(error = %e, "dispatch error");
    }
}

fn run(args: cli::Args, config: WeftConfig) -> Result<(), WeftError> {
    let settings = LoopSettings::from_config(&config);

    let (mut event_loop, controller): (EventLoop, Option<HeadlessController>) = if args.headless {
        let (backend, controller) = weft_core::HeadlessBackend::new();
        (EventLoop::with_settings(Box::new(backend), settings), Some(controller))
    } else {
        let event_loop = EventLoop::new()?;
        event_loop.handle().set_settings(settings)?;
        (event_loop, None)
    };
    tracing::info!(loop_id = %event_loop.id(), headless = args.headless, "event loop created");

    // Animation and the simulation both need iterations without native events.
    if args.headless || args.scene.pixels() {
        event_loop.handle().set_control_flow(ControlFlow::Poll)?;
    }

    let mut scene = scenes::Scene::build(event_loop.handle(), &config, &args)?;
    let mut errors = event_loop.take_error_receiver();

    let frame_limit = args
        .frames
        .or(if controller.is_some() { Some(HEADLESS_FRAMES) } else { None });

    // A simulated page says hello, the way the demo page does natively.
    if let (Some(controller), Some(webview)) = (&controller, &scene.webview) {
        event_loop.run_iteration();
        controller.post_message(webview.id(), "hello from the page");
    }

    let mut tick = 0u64;
    tracing::info!("Entering event loop");
    while event_loop.run_iteration() {
        drain_errors(&mut errors);
        if let Err(e) = scene.tick(tick) {
            tracing::warn!(error = %e, "render failed");
        }
        tick += 1;
        if frame_limit.is_some_and(|limit| tick >= limit) {
            tracing::info!(frames = tick, "frame limit reached");
            if let (Some(controller), Some(webview)) = (&controller, &scene.webview) {
                for payload in controller.delivered(webview.id()) {
                    tracing::info!(reply = ?payload.as_text(), "page received");
                }
            }
            event_loop.exit()?;
        }
    }
    drain_errors(&mut errors);

    tracing::info!(frames = tick, "Shutdown complete");
    Ok(())
}

fn main() {
    install_panic_hook();

    let args = cli::parse();
    let loaded = load_config(args.config.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&log_directive(&args, &config));

    tracing::info!("weft v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!("Using config override: {path}");
    }
    match &loaded {
        Ok(_) => tracing::debug!(config = %weft_config::config_to_json(&config), "Config loaded"),
        Err(e) => tracing::warn!("Config load failed, using defaults: {e}"),
    }

    let platform = weft_core::platform_info();
    tracing::info!(
        display = %platform.display_server,
        transparency = platform.supports_transparency,
        positioning = platform.supports_positioning,
        direct_rendering = platform.supports_direct_rendering,
        "platform"
    );

    if let Err(e) = run(args, config) {
        tracing::error!("weft failed: {e}");
        std::process::exit(1);
    }
}
