#![allow(dead_code)]

use std::io::{ErrorKind, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use roomlights::color::ColorSpec;
use roomlights::lights::{LightController, Palette, Timing};
use roomlights::link::{Connector, LinkFault};

/// What a failing open or write should report.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
  Io(ErrorKind),
  Unexpected,
}

impl Fault {
  fn raise(self) -> LinkFault {
    match self {
      Fault::Io(kind) => std::io::Error::new(kind, "simulated").into(),
      Fault::Unexpected => LinkFault::Unexpected("simulated".into()),
    }
  }
}

/// An in-memory device recording every message written to it.
#[derive(Clone, Default)]
pub struct Recorder {
  messages: Arc<Mutex<Vec<String>>>,
  open_fault: Arc<Mutex<Option<Fault>>>,
  write_limit: Arc<Mutex<Option<usize>>>,
  opened: Arc<AtomicUsize>,
  closed: Arc<AtomicUsize>,
  open_now: Arc<AtomicUsize>,
  max_open: Arc<AtomicUsize>,
}

impl Recorder {
  pub fn messages(&self) -> Vec<String> {
    self.messages.lock().expect("messages").clone()
  }

  /// Every subsequent open fails with `fault` until cleared.
  pub fn fail_open(&self, fault: Option<Fault>) {
    *self.open_fault.lock().expect("fault") = fault;
  }

  /// Writes fail once this many messages have been recorded in total.
  pub fn fail_writes_after(&self, limit: Option<usize>) {
    *self.write_limit.lock().expect("limit") = limit;
  }

  pub fn opened(&self) -> usize {
    self.opened.load(Ordering::SeqCst)
  }

  pub fn closed(&self) -> usize {
    self.closed.load(Ordering::SeqCst)
  }

  /// The most ports that were ever open at the same time.
  pub fn max_open(&self) -> usize {
    self.max_open.load(Ordering::SeqCst)
  }
}

pub struct RecordingPort {
  recorder: Recorder,
}

impl Write for RecordingPort {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    let mut messages = self.recorder.messages.lock().expect("messages");

    if let Some(limit) = *self.recorder.write_limit.lock().expect("limit") {
      if messages.len() >= limit {
        return Err(std::io::Error::new(ErrorKind::NotFound, "unplugged"));
      }
    }

    messages.push(String::from_utf8_lossy(buf).into_owned());
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

impl Drop for RecordingPort {
  fn drop(&mut self) {
    self.recorder.open_now.fetch_sub(1, Ordering::SeqCst);
    self.recorder.closed.fetch_add(1, Ordering::SeqCst);
  }
}

impl Connector for Recorder {
  type Port = RecordingPort;

  fn open(&self) -> Result<Self::Port, LinkFault> {
    if let Some(fault) = *self.open_fault.lock().expect("fault") {
      return Err(fault.raise());
    }

    self.opened.fetch_add(1, Ordering::SeqCst);
    let now = self.open_now.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_open.fetch_max(now, Ordering::SeqCst);

    Ok(RecordingPort { recorder: self.clone() })
  }
}

pub fn palette(base: &str, hint_bright: &str, hint_dark: &str, victory: &str) -> Palette {
  Palette {
    base: ColorSpec::parse(base),
    hint_bright: ColorSpec::parse(hint_bright),
    hint_dark: ColorSpec::parse(hint_dark),
    victory: ColorSpec::parse(victory),
  }
}

pub fn timing(transition: f64, hint_transition: f64, sample_rate: u32) -> Timing {
  Timing {
    transition,
    hint_transition,
    sample_rate,
  }
}

/// A controller over a fresh recorder: red base, white/dark-grey hints, rainbow victory, and
/// quick transitions (10 frames regular, 5 frames hint).
pub fn controller() -> (Arc<LightController<Recorder>>, Recorder) {
  controller_with(
    palette("$S#FF0000", "$S#FFFFFF", "$S#202020", "$H#00"),
    timing(0.1, 0.05, 100),
  )
}

pub fn controller_with(palette: Palette, timing: Timing) -> (Arc<LightController<Recorder>>, Recorder) {
  let recorder = Recorder::default();
  let controller = LightController::new(recorder.clone(), palette, timing);
  (Arc::new(controller), recorder)
}

/// Polls `condition` every few milliseconds for up to five seconds.
pub async fn wait_until<F>(mut condition: F) -> bool
where
  F: FnMut() -> bool,
{
  for _ in 0..500 {
    if condition() {
      return true;
    }

    async_std::task::sleep(std::time::Duration::from_millis(10)).await;
  }

  condition()
}
