mod ui;

use std::{
    path::PathBuf,
    sync::{Arc, OnceLock, mpsc},
};

use clap::{Parser, Subcommand};
use egui::Vec2;
use log::{LevelFilter, error, info, warn};
use pitwall::{
    Dashboard, DashboardConfig, FileSessionProvider, PitwallError, SessionProvider,
    session::ProviderMode,
};
use ui::LiveDashboardApp;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct DisplayArgs {
    /// JSON Lines file of session snapshots
    #[arg(short, long)]
    input: PathBuf,

    /// Config file to use instead of the one in the user's config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured refresh interval
    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(long)]
    light: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow a session file that is being appended to, showing its latest snapshot
    Live {
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Step through a recorded session file, one snapshot per refresh
    Replay {
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Only the car positions of every participant's fastest lap, refreshed more often
    Positions {
        #[command(flatten)]
        display: DisplayArgs,

        #[arg(short, long, value_enum, default_value_t = ProviderMode::Latest)]
        mode: ProviderMode,
    },
    /// Write the default config file to the user's config directory
    Init {
        #[arg(short, long)]
        force: bool,
    },
}

fn load_config(args: &DisplayArgs) -> Result<DashboardConfig, PitwallError> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::from_local_file()
            .unwrap_or_else(|e| {
                warn!("Could not load config file, using defaults: {}", e);
                None
            })
            .unwrap_or_default(),
    };
    if let Some(interval_ms) = args.interval_ms {
        config.refresh_interval_ms = interval_ms;
        config.live_positions_interval_ms = interval_ms;
    }
    if args.light {
        config.dark_mode = false;
    }
    config.validate()?;
    Ok(config)
}

fn display<P: SessionProvider + Send + 'static>(
    dashboard: Dashboard<P>,
    window_title: &str,
) -> Result<(), PitwallError> {
    let config = dashboard.config().clone();
    let (frames_tx, frames_rx) = mpsc::channel();
    let handle = dashboard.start(frames_tx)?;

    // the window closes itself once the token is cancelled, then `handle.stop()` joins the task
    let token = handle.cancel_token();
    let ui_ctx = Arc::new(OnceLock::<egui::Context>::new());
    let handler_ctx = Arc::clone(&ui_ctx);
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        token.cancel();
        if let Some(ctx) = handler_ctx.get() {
            ctx.request_repaint();
        }
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(config.frame_size.width, config.frame_size.height));

    let app_token = handle.cancel_token();
    let dark_mode = config.dark_mode;
    let repaint_after = config.refresh_interval() / 4;
    if let Err(e) = eframe::run_native(
        window_title,
        native_options,
        Box::new(move |cc| {
            let _ = ui_ctx.set(cc.egui_ctx.clone());
            Ok(Box::new(LiveDashboardApp::new(
                frames_rx,
                app_token,
                dark_mode,
                repaint_after,
                cc,
            )))
        }),
    ) {
        error!("Could not start dashboard window: {}", e);
    }

    if let Some(dashboard) = handle.stop() {
        info!(
            "Refresh stopped after {} ticks, {:.1}ms per tick on average",
            dashboard.tick_count(),
            dashboard.average_tick_ms()
        );
    }
    Ok(())
}

fn init(force: bool) -> Result<(), PitwallError> {
    let path = DashboardConfig::local_path()?;
    if path.exists() && !force {
        warn!("Config file {:?} already exists, use --force to overwrite it", path);
        return Ok(());
    }
    DashboardConfig::default().save()?;
    info!("Wrote default config to {:?}", path);
    Ok(())
}

fn run(cli: &Args) -> Result<(), PitwallError> {
    match &cli.command {
        Commands::Live { display: args } => {
            let config = load_config(args)?;
            let provider = FileSessionProvider::new(&args.input, ProviderMode::Latest);
            display(Dashboard::initialize(&config, provider)?, "Pitwall")
        }
        Commands::Replay { display: args } => {
            let config = load_config(args)?;
            let provider = FileSessionProvider::new(&args.input, ProviderMode::Replay);
            display(Dashboard::initialize(&config, provider)?, "Pitwall Replay")
        }
        Commands::Positions {
            display: args,
            mode,
        } => {
            let config = load_config(args)?;
            let provider = FileSessionProvider::new(&args.input, *mode);
            display(
                Dashboard::live_positions(&config, provider)?,
                "Pitwall Positions",
            )
        }
        Commands::Init { force } => init(*force),
    }
}

fn main() {
    let cli = Args::parse();
    let mut logger = colog::default_builder();
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
