use std::sync::{Mutex, PoisonError};

use serde::Deserialize;

use crate::color::ColorSpec;
use crate::hint::PulseFlag;
use crate::link::{Connector, LinkFault, SerialConnector, SerialLink};
use crate::transition;

/// The `[lights]` table of the configuration file.
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct LightConfiguration {
  /// Path of the serial device the strip's controller is attached to.
  pub device: String,

  pub baud: u32,

  /// Frames written per second during a transition.
  pub sample_rate: u32,

  /// Seconds taken by ordinary transitions.
  pub transition: f64,

  /// Seconds taken by transitions between the two hint colors.
  pub hint_transition: f64,

  pub colors: Palette,
}

impl LightConfiguration {
  pub fn timing(&self) -> Timing {
    Timing {
      transition: self.transition,
      hint_transition: self.hint_transition,
      sample_rate: self.sample_rate,
    }
  }
}

/// The configured colors every target name resolves to.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct Palette {
  pub base: ColorSpec,
  pub hint_bright: ColorSpec,
  pub hint_dark: ColorSpec,
  pub victory: ColorSpec,
}

impl Palette {
  pub fn color(&self, target: Target) -> ColorSpec {
    match target {
      Target::Base => self.base,
      Target::HintBright => self.hint_bright,
      Target::HintDark => self.hint_dark,
      Target::Victory => self.victory,
    }
  }
}

/// How long transitions last and how finely they are sampled.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Timing {
  /// Seconds taken by ordinary transitions.
  pub transition: f64,

  /// Seconds taken by transitions between the two hint colors.
  pub hint_transition: f64,

  /// Frames written per second during a transition.
  pub sample_rate: u32,
}

/// The named colors a change can be requested for.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Target {
  Base,
  HintBright,
  HintDark,
  Victory,
}

impl Target {
  pub fn from_name<S>(name: S) -> Option<Self>
  where
    S: AsRef<str>,
  {
    match name.as_ref() {
      "base" => Some(Target::Base),
      "hint-bright" => Some(Target::HintBright),
      "hint-dark" => Some(Target::HintDark),
      "victory" => Some(Target::Victory),
      _ => None,
    }
  }
}

impl std::fmt::Display for Target {
  fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Target::Base => write!(formatter, "base"),
      Target::HintBright => write!(formatter, "hint-bright"),
      Target::HintDark => write!(formatter, "hint-dark"),
      Target::Victory => write!(formatter, "victory"),
    }
  }
}

/// Owns the led strip. Every operation touching the device is serialized through the lock around
/// the current color; the device itself is opened and closed around each operation.
pub struct LightController<C>
where
  C: Connector,
{
  /// Opens the device.
  connector: C,

  /// Colors the target names resolve to.
  palette: Palette,

  /// Transition durations and sampling.
  timing: Timing,

  /// The last color successfully applied. Its lock is the device lock.
  current: Mutex<ColorSpec>,

  /// Whether a hint pulse should keep running. Guarded separately from the device lock.
  pub(crate) pulse: PulseFlag,
}

impl LightController<SerialConnector> {
  pub fn from_configuration(configuration: &LightConfiguration) -> Self {
    let connector = SerialConnector::new(configuration.device.as_str(), configuration.baud);
    Self::new(connector, configuration.colors, configuration.timing())
  }
}

impl<C> LightController<C>
where
  C: Connector,
{
  /// Builds a controller that believes the strip shows the base color. Nothing is written until
  /// [`LightController::initialize`] or the first change.
  pub fn new(connector: C, palette: Palette, timing: Timing) -> Self {
    Self {
      connector,
      palette,
      timing,
      current: Mutex::new(palette.base),
      pulse: PulseFlag::default(),
    }
  }

  /// Writes the base color once so the strip matches our state. Any fault is returned so start-up
  /// can abort when the strip is unreachable.
  pub fn initialize(&self) -> Result<(), LinkFault> {
    let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
    log::info!("connecting to led strip");

    SerialLink::open(&self.connector)
      .and_then(|mut link| link.send(&current))
      .map_err(|fault| {
        log::error!("could not connect to led strip: {fault}");
        fault
      })
  }

  pub fn palette(&self) -> &Palette {
    &self.palette
  }

  /// The last color successfully applied to the strip.
  pub fn current(&self) -> ColorSpec {
    *self.current.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Moves the strip to the color named by `target`. Same-kind colors are reached through a
  /// smooth transition (the shorter hint duration when `hint_transition` is set), different kinds
  /// are switched instantly.
  ///
  /// Returns `Ok(true)` only when a smooth transition was written. Unknown names, no-op changes and
  /// recoverable device faults all yield `Ok(false)`, leaving the current color untouched. Only
  /// [`LinkFault::Unexpected`] is returned as an error.
  ///
  /// Any name not starting with `hint` cancels an active hint pulse first.
  pub fn change<S>(&self, target: S, hint_transition: bool) -> Result<bool, LinkFault>
  where
    S: AsRef<str>,
  {
    let name = target.as_ref();

    if !name.starts_with("hint") {
      self.stop_hint_mode();
    }

    let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

    let target = match Target::from_name(name) {
      Some(target) => self.palette.color(target),
      None => {
        log::warn!("declined request to change to invalid color target '{name}'");
        return Ok(false);
      }
    };

    if target == *current {
      log::debug!("strip already showing '{name}' ({target}), skipping");
      return Ok(false);
    }

    let outcome = SerialLink::open(&self.connector).and_then(|mut link| {
      let smooth = self.write(&mut link, *current, target, hint_transition)?;
      *current = target;
      log::debug!("changed to '{name}' after {} write(s)", link.written());
      Ok(smooth)
    });

    match outcome {
      Ok(smooth) => Ok(smooth),
      Err(fault) if fault.is_recoverable() => {
        log::warn!("could not change led strip color: {fault}");
        Ok(false)
      }
      Err(fault) => {
        log::error!("aborting color change to '{name}' - {fault}");
        Err(fault)
      }
    }
  }

  /// Writes either every frame of the transition from `from` to `to`, or just `to` when the kinds
  /// differ. Frame `i` is not written before `i / sample_rate` seconds have passed, so the device
  /// lock is held for the full configured duration and other callers wait that long.
  fn write(
    &self,
    link: &mut SerialLink<C::Port>,
    from: ColorSpec,
    to: ColorSpec,
    hint_transition: bool,
  ) -> Result<bool, LinkFault> {
    let duration = if hint_transition {
      self.timing.hint_transition
    } else {
      self.timing.transition
    };

    let frames = match transition::frames(from, to, duration, self.timing.sample_rate) {
      Some(frames) => frames,
      None => {
        log::debug!("instant change {from} -> {to}");
        link.send(&to)?;
        return Ok(false);
      }
    };

    log::debug!("transition {from} -> {to} over {} frame(s)", frames.total());
    let started = std::time::Instant::now();

    for (index, frame) in (1u32..).zip(frames) {
      let deadline = started + std::time::Duration::from_secs_f64(f64::from(index) / f64::from(self.timing.sample_rate));
      std::thread::sleep(deadline.saturating_duration_since(std::time::Instant::now()));
      link.send(&frame)?;
    }

    Ok(true)
  }

  /// Whether a hint pulse is currently asked to keep running.
  pub fn hint_mode(&self) -> bool {
    self.pulse.is_raised()
  }

  /// Asks any running hint pulse to stop at its next check point.
  pub fn stop_hint_mode(&self) {
    if self.pulse.lower() {
      log::info!("stopping hint mode");
    }
  }
}
