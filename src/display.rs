//! Side effects on the room's screen: blanking it, launching slideshows and pressing keys. Each
//! action is an external command from the `[display]` configuration table; actions without a
//! configured command are skipped.

use std::collections::HashMap;
use std::io::{Error, ErrorKind, Result};
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;

/// The `[display]` table of the configuration file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayConfiguration {
  /// Command blanking the screen.
  pub blank: Option<Vec<String>>,

  /// Command run when a blanked screen is restored, e.g. to show the lock screen.
  pub unblank: Option<Vec<String>>,

  /// Command sending a space keystroke to the focused window.
  pub keystroke: Option<Vec<String>>,

  /// Command presenting a slideshow; the slideshow path is appended as the last argument.
  pub slideshow: Option<Vec<String>>,

  /// Slideshow paths by id, served at `/show-<id>`.
  #[serde(default)]
  pub slideshows: HashMap<String, String>,
}

/// Runs the configured display commands and remembers whether the screen is blanked.
#[derive(Debug, Default)]
pub struct Display {
  /// The configured commands.
  config: DisplayConfiguration,

  /// Set by `blank`, cleared by `unblank`.
  blanked: Mutex<bool>,
}

impl Display {
  pub fn new(config: DisplayConfiguration) -> Self {
    Self {
      config,
      blanked: Mutex::new(false),
    }
  }

  /// Blanks the screen. Returns whether a command was launched.
  pub fn blank(&self) -> Result<bool> {
    *self.blanked.lock().unwrap_or_else(PoisonError::into_inner) = true;
    launch(self.config.blank.as_deref(), None)
  }

  /// Restores the screen; the unblank command only runs when the screen was actually blanked.
  pub fn unblank(&self) -> Result<bool> {
    let was_blanked = std::mem::replace(&mut *self.blanked.lock().unwrap_or_else(PoisonError::into_inner), false);

    if !was_blanked {
      return Ok(false);
    }

    log::info!("restoring blanked screen");
    launch(self.config.unblank.as_deref(), None)
  }

  pub fn keystroke(&self) -> Result<bool> {
    launch(self.config.keystroke.as_deref(), None)
  }

  /// Presents the slideshow registered under `id`. Unknown ids are a `NotFound` error.
  pub fn slideshow<S>(&self, id: S) -> Result<bool>
  where
    S: AsRef<str>,
  {
    let path = self.config.slideshows.get(id.as_ref()).ok_or_else(|| {
      Error::new(
        ErrorKind::NotFound,
        format!("no slideshow configured for '{}'", id.as_ref()),
      )
    })?;

    launch(self.config.slideshow.as_deref(), Some(path.as_str()))
  }

  pub fn is_blanked(&self) -> bool {
    *self.blanked.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Spawns `command` (plus an optional trailing argument) without waiting for it; the child is
/// reaped on a blocking worker once it exits.
fn launch(command: Option<&[String]>, argument: Option<&str>) -> Result<bool> {
  let (program, arguments) = match command {
    None => {
      log::debug!("no command configured, skipping");
      return Ok(false);
    }
    Some(parts) => parts
      .split_first()
      .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "empty display command"))?,
  };

  let mut child = std::process::Command::new(program)
    .args(arguments)
    .args(argument)
    .spawn()
    .map_err(|error| {
      log::warn!("unable to launch '{program}' - {error}");
      error
    })?;

  log::debug!("launched '{program}' as pid {}", child.id());

  async_std::task::spawn_blocking(move || {
    if let Err(error) = child.wait() {
      log::warn!("failed waiting on display command - {error}");
    }
  });

  Ok(true)
}
