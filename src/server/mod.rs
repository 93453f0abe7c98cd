use std::io::{Error, ErrorKind, Result};
use std::sync::Arc;

use serde::Deserialize;

use crate::display::Display;
use crate::lights::LightController;
use crate::link::Connector;

pub mod control;

/// Body sent for every recognized route.
pub const RECEIVED: &str = "Received request.";

/// Body sent for every unrecognized route.
pub const INVALID: &str = "Invalid request.";

/// The `[server]` table of the configuration file.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
  /// The address the http listener binds to, e.g. `0.0.0.0:8080`.
  pub addr: String,
}

/// Collects the shared handles the http routes operate on.
pub struct StateBuilder<C>
where
  C: Connector,
{
  /// The led strip.
  lights: Option<Arc<LightController<C>>>,

  /// The room's screen.
  display: Option<Arc<Display>>,
}

impl<C> Default for StateBuilder<C>
where
  C: Connector,
{
  fn default() -> Self {
    Self {
      lights: None,
      display: None,
    }
  }
}

impl<C> StateBuilder<C>
where
  C: Connector,
{
  pub fn lights(mut self, lights: Arc<LightController<C>>) -> Self {
    self.lights = Some(lights);
    self
  }

  pub fn display(mut self, display: Display) -> Self {
    self.display = Some(Arc::new(display));
    self
  }

  pub fn build(self) -> Result<State<C>> {
    let lights = self
      .lights
      .ok_or_else(|| Error::new(ErrorKind::Other, "missing light controller"))?;
    let display = self.display.unwrap_or_default();

    Ok(State { lights, display })
  }
}

/// Shared by every request. Cloning is cheap; all clones drive the same strip.
pub struct State<C>
where
  C: Connector,
{
  /// The led strip.
  lights: Arc<LightController<C>>,

  /// The room's screen.
  display: Arc<Display>,
}

impl<C> Clone for State<C>
where
  C: Connector,
{
  fn clone(&self) -> Self {
    Self {
      lights: Arc::clone(&self.lights),
      display: Arc::clone(&self.display),
    }
  }
}

impl<C> State<C>
where
  C: Connector,
{
  pub fn builder() -> StateBuilder<C> {
    StateBuilder::default()
  }

  pub fn lights(&self) -> Arc<LightController<C>> {
    Arc::clone(&self.lights)
  }
}

/// Builds the http application with every route registered.
pub fn app<C>(state: State<C>) -> tide::Server<State<C>>
where
  C: Connector,
{
  let mut app = tide::with_state(state);

  app.at("/base").get(control::base::<C>);
  app.at("/hint").get(control::hint::<C>);
  app.at("/victory").get(control::victory::<C>);
  app.at("/blank").get(control::blank::<C>);
  app.at("/space").get(control::space::<C>);
  app.at("/status").get(control::status::<C>);
  app.at("/:page").get(control::page::<C>);

  app.at("/").all(control::missing::<C>);
  app.at("/*").all(control::missing::<C>);
  app
}

pub async fn listen<C, S>(state: State<C>, addr: S) -> std::io::Result<()>
where
  C: Connector,
  S: std::convert::AsRef<str>,
{
  log::info!("listening on '{}'", addr.as_ref());
  app(state).listen(addr.as_ref()).await
}
