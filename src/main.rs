// nook - ambient study companion for the terminal
// A rotating looping scene and a lofi playlist with crossfade, nothing more

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nook::catalog::Catalog;
use nook::config::Config;
use nook::media::MediaResolver;
use nook::playback::{AudioOutput, NullOutput, PlaybackController, PlaybackSettings};
use nook::playlist::PlaylistWindow;
use nook::scene::{discover_scenes, SceneLoop};
use nook::ui::App;

#[derive(Parser)]
#[command(name = "nook")]
#[command(about = "Ambient study companion - rotating scenes and a lofi playlist with crossfade")]
struct Args {
    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    /// Run without audio output
    #[arg(long)]
    mute: bool,

    /// Skip the directory-listing service and probe local files only
    #[arg(long)]
    offline: bool,
}

fn init_logging(dev: bool) -> Result<()> {
    // The TUI owns stdout, so logs go to a file
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "nook.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nook=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("Dev mode: logs also land in ./logs/nook.log with debug detail");
    }

    // Keep the appender alive for the whole process
    std::mem::forget(guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.dev)?;

    info!("nook starting up");

    // Load config - falls back to defaults if missing
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let catalog = Catalog::load(config.library.catalog_path.as_deref())?;
    let resolver = MediaResolver::new(&config.media);

    let scenes = discover_scenes(&config.media, &resolver, args.offline).await;
    let scene = SceneLoop::new(scenes);
    let window = PlaylistWindow::shuffled(&catalog)?;
    let settings = PlaybackSettings::from(&config.playback);

    if args.mute {
        info!("Running muted");
        return run_with(NullOutput::new(), config, catalog, window, scene, resolver, settings).await;
    }

    #[cfg(feature = "audio")]
    match nook::playback::RodioOutput::new() {
        Ok(output) => {
            return run_with(output, config, catalog, window, scene, resolver, settings).await;
        }
        Err(err) => tracing::warn!("No audio device ({err:#}), continuing muted"),
    }

    run_with(NullOutput::new(), config, catalog, window, scene, resolver, settings).await
}

async fn run_with<O: AudioOutput>(
    output: O,
    config: Config,
    catalog: Catalog,
    window: PlaylistWindow,
    scene: SceneLoop,
    resolver: MediaResolver,
    settings: PlaybackSettings,
) -> Result<()> {
    let player = PlaybackController::new(output, resolver.clone(), settings);
    let mut app = App::new(&config, catalog, window, player, scene, resolver)?;
    app.run().await
}
