//! The hint pulse: a background task alternating the strip between the two hint colors until it
//! is asked to stop. Stopping is cooperative; the flag is only checked between half-cycles so a
//! transition in progress always finishes writing.

use std::sync::{Arc, Mutex, PoisonError};

use crate::lights::LightController;
use crate::link::Connector;

/// How long to wait before the next half-cycle when a change did not produce a transition, e.g.
/// because the device is unplugged or both hint colors are equal.
pub const FALLBACK_CADENCE: std::time::Duration = std::time::Duration::from_secs(1);

/// The running flag of the hint pulse, behind its own small lock so stop requests never wait on
/// the device.
#[derive(Debug, Default)]
pub struct PulseFlag {
  /// True while the pulse should keep going.
  running: Mutex<bool>,
}

impl PulseFlag {
  pub fn raise(&self) {
    *self.running.lock().unwrap_or_else(PoisonError::into_inner) = true;
  }

  /// Clears the flag, returning whether it was set.
  pub fn lower(&self) -> bool {
    let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *running, false)
  }

  pub fn is_raised(&self) -> bool {
    *self.running.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<C> LightController<C>
where
  C: Connector,
{
  /// Starts pulsing between the hint colors on a blocking worker. Starting while a pulse is
  /// already running spawns a second, independent pulse; both serialize on the device lock and
  /// both stop on the next stop request.
  ///
  /// The running flag is raised before the worker is spawned, so a stop issued right after this
  /// returns is always seen by the pulse.
  pub fn start_hint_mode(self: &Arc<Self>) -> async_std::task::JoinHandle<()> {
    log::info!("starting hint mode");
    self.pulse.raise();
    let controller = Arc::clone(self);
    async_std::task::spawn_blocking(move || pulse(&controller))
  }
}

/// Changes to `target`, sleeping for the fallback cadence when no transition happened. Returns
/// false when the pulse must end because of an unrecoverable fault.
fn half_cycle<C>(controller: &LightController<C>, target: &str, hint_transition: bool) -> bool
where
  C: Connector,
{
  match controller.change(target, hint_transition) {
    Ok(true) => true,
    Ok(false) => {
      std::thread::sleep(FALLBACK_CADENCE);
      true
    }
    Err(fault) => {
      log::error!("hint pulse ended by device fault - {fault}");
      controller.stop_hint_mode();
      false
    }
  }
}

/// The pulse itself. The first move to the bright color uses the regular transition duration, so
/// the pulse fades in gently from whatever was showing before.
fn pulse<C>(controller: &LightController<C>)
where
  C: Connector,
{
  let mut hint_transition = false;

  loop {
    if !half_cycle(controller, "hint-bright", hint_transition) {
      break;
    }

    hint_transition = true;

    if !controller.pulse.is_raised() {
      break;
    }

    if !half_cycle(controller, "hint-dark", hint_transition) {
      break;
    }

    if !controller.pulse.is_raised() {
      break;
    }
  }

  log::debug!("hint pulse exited");
}
