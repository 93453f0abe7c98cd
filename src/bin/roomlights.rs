use clap::Parser;
use serde::Deserialize;
use std::io::Result;
use std::sync::Arc;

/// Exit status when the led strip cannot be reached at start-up.
const UNREACHABLE_STRIP: i32 = 3;

#[derive(Deserialize, Debug)]
struct RuntimeConfiguration {
  lights: roomlights::lights::LightConfiguration,
  server: roomlights::server::Configuration,
  #[serde(default)]
  display: roomlights::display::DisplayConfiguration,
}

#[derive(Deserialize, clap::Parser)]
#[command(author, version = option_env!("ROOMLIGHTS_VERSION").unwrap_or_else(|| "dev"), about, long_about = None)]
struct CommandLineOptions {
  /// Path to the toml configuration file.
  config: String,

  /// Overrides the serial device from the configuration file.
  #[arg(short = 'd', long)]
  device: Option<String>,
}

/// Logs every loaded value, previewing the colors in the terminal.
fn report(config: &RuntimeConfiguration) {
  let lights = &config.lights;
  let colors = &lights.colors;

  log::info!("device: {} at {} baud", lights.device, lights.baud);
  log::info!(
    "transitions: {}s, hint transitions: {}s, {} samples/s",
    lights.transition,
    lights.hint_transition,
    lights.sample_rate
  );

  for (name, color) in [
    ("base", colors.base),
    ("hint-bright", colors.hint_bright),
    ("hint-dark", colors.hint_dark),
    ("victory", colors.victory),
  ] {
    log::info!("{name}: {}", color.paint(color.encode()));
  }

  for (id, path) in &config.display.slideshows {
    log::info!("slideshow {id}: {path}");
  }
}

async fn serve(config: RuntimeConfiguration) -> Result<()> {
  let controller = Arc::new(roomlights::lights::LightController::from_configuration(&config.lights));

  let init = Arc::clone(&controller);
  if let Err(fault) = async_std::task::spawn_blocking(move || init.initialize()).await {
    log::error!("unable to reach led strip on '{}' - {fault}", config.lights.device);
    std::process::exit(UNREACHABLE_STRIP);
  }

  log::info!("initializing server...");
  let state = roomlights::server::State::builder()
    .lights(controller)
    .display(roomlights::display::Display::new(config.display))
    .build()?;

  let addr = std::env::var("ROOMLIGHTS_ADDR").unwrap_or(config.server.addr);
  log::info!("preparing web thread on addr '{}'", addr);

  roomlights::server::listen(state, addr).await
}

fn main() -> Result<()> {
  if dotenv::dotenv().is_err() {
    eprintln!("warning: no '.env' file detected'");
  }

  env_logger::init();
  let args = CommandLineOptions::parse();

  log::info!("loading config from '{}'", args.config);
  let contents = std::fs::read_to_string(&args.config)?;
  let mut parsed = toml::from_str::<RuntimeConfiguration>(&contents)?;

  if let Some(device) = args.device {
    parsed.lights.device = device;
  }

  report(&parsed);

  log::info!("starting async main thread");
  async_std::task::block_on(serve(parsed))
}
