use serde::Serialize;
use tide::{Request, Response, Result};

use super::{State, INVALID, RECEIVED};
use crate::lights::Target;
use crate::link::Connector;

/// Prefix of the routes presenting a configured slideshow, e.g. `/show-8.1`.
const SLIDESHOW_PREFIX: &str = "show-";

/// Requests to the status api will receive this type serialized as json.
#[derive(Debug, Serialize)]
struct StatusResponse {
  /// Always true; the server is up.
  ok: bool,

  /// The current time.
  timestamp: chrono::DateTime<chrono::Utc>,

  /// Wire encoding of the last color applied to the strip.
  color: String,

  /// Whether a hint pulse is running.
  hint_mode: bool,

  /// Whether the screen is blanked.
  blanked: bool,
}

/// The fixed response for recognized routes.
fn received() -> Response {
  Response::builder(200).body(RECEIVED).build()
}

/// The fixed response for unrecognized routes.
fn invalid() -> Response {
  Response::builder(404).body(INVALID).build()
}

/// Runs a change on a blocking worker; the device writes of a transition may take seconds.
async fn change<C>(state: &State<C>, target: Target) -> Result
where
  C: Connector,
{
  let lights = state.lights();
  let outcome = async_std::task::spawn_blocking(move || lights.change(target.to_string(), false)).await;

  match outcome {
    Ok(smooth) => {
      log::debug!("change to '{target}' finished (smooth: {smooth})");
      Ok(received())
    }
    Err(fault) => {
      log::error!("unrecoverable fault changing to '{target}' - {fault}");
      Ok(Response::builder(500).build())
    }
  }
}

/// ROUTE: fades to the base color and restores a blanked screen.
pub async fn base<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  let state = request.state();
  log::info!("{}", state.lights.palette().base.paint("changing to base color"));
  let response = change(state, Target::Base).await?;

  if let Err(error) = state.display.unblank() {
    log::warn!("couldn't restore screen - {error}");
  }

  Ok(response)
}

/// ROUTE: starts pulsing the hint colors.
pub async fn hint<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  let lights = request.state().lights();
  let palette = lights.palette();
  log::info!(
    "{}{}",
    palette.hint_bright.paint("changing to"),
    palette.hint_dark.paint(" hint color")
  );

  // The pulse runs until the next non-hint change; nobody waits on it.
  drop(lights.start_hint_mode());
  Ok(received())
}

/// ROUTE: fades to the victory color.
pub async fn victory<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  let state = request.state();
  log::info!("{}", state.lights.palette().victory.paint("changing to victory color"));
  change(state, Target::Victory).await
}

/// ROUTE: blanks the screen.
pub async fn blank<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  log::info!("blanking screen");

  if let Err(error) = request.state().display.blank() {
    log::warn!("couldn't blank screen - {error}");
  }

  Ok(received())
}

/// ROUTE: presses the space key.
pub async fn space<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  log::info!("pressing space key");

  if let Err(error) = request.state().display.keystroke() {
    log::warn!("couldn't press space - {error}");
  }

  Ok(received())
}

/// ROUTE: single-segment pages; only `show-<id>` slideshows are recognized.
pub async fn page<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  let page = request.param("page").unwrap_or_default();

  let id = match page.strip_prefix(SLIDESHOW_PREFIX) {
    Some(id) if !id.is_empty() => id,
    _ => {
      log::warn!("unknown request received - '/{page}'");
      return Ok(invalid());
    }
  };

  match request.state().display.slideshow(id) {
    Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
      log::warn!("{error}");
      Ok(invalid())
    }
    Err(error) => {
      log::warn!("couldn't show slideshow '{id}' - {error}");
      Ok(received())
    }
    Ok(_) => {
      log::info!("showing slideshow for hint {id}");
      Ok(received())
    }
  }
}

/// ROUTE: reports the strip's state as json.
pub async fn status<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  let state = request.state();
  let lights = state.lights();
  let (color, hint_mode) = async_std::task::spawn_blocking(move || (lights.current(), lights.hint_mode())).await;

  let response = StatusResponse {
    ok: true,
    timestamp: chrono::Utc::now(),
    color: color.encode(),
    hint_mode,
    blanked: state.display.is_blanked(),
  };

  tide::Body::from_json(&response).map(|body| Response::builder(200).body(body).build())
}

/// ROUTE: everything else.
pub async fn missing<C>(request: Request<State<C>>) -> Result
where
  C: Connector,
{
  log::warn!("unknown request received - '{}'", request.url().path());
  Ok(invalid())
}
