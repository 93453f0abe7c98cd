//! Scoped access to the serial device driving the led strip. A [`SerialLink`] is opened for the
//! duration of a single operation and closed when dropped, so the physical device can be
//! unplugged and reconnected between operations.

use std::io::Write;

use crate::color::ColorSpec;

/// How long a single write may block before it is reported as an i/o fault.
const WRITE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

/// Everything that can go wrong while talking to the device. All but `Unexpected` are ordinary
/// operating-system faults the lighting server recovers from.
#[derive(Debug)]
pub enum LinkFault {
  /// The device path does not exist; usually the strip was unplugged.
  DeviceNotFound(String),

  /// The process may not open the device.
  PermissionDenied(String),

  /// Any other operating-system level i/o error.
  OtherIo(std::io::Error),

  /// A fault that is not an i/o condition, e.g. an invalid serial configuration.
  Unexpected(String),
}

impl LinkFault {
  /// Returns true for the faults that should be logged and swallowed.
  pub fn is_recoverable(&self) -> bool {
    !matches!(self, LinkFault::Unexpected(_))
  }
}

impl std::fmt::Display for LinkFault {
  fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      LinkFault::DeviceNotFound(detail) => write!(formatter, "device was disconnected ({detail})"),
      LinkFault::PermissionDenied(detail) => write!(formatter, "access denied ({detail})"),
      LinkFault::OtherIo(error) => write!(formatter, "{error}"),
      LinkFault::Unexpected(detail) => write!(formatter, "unexpected device fault - {detail}"),
    }
  }
}

impl std::error::Error for LinkFault {}

impl From<std::io::Error> for LinkFault {
  fn from(error: std::io::Error) -> Self {
    match error.kind() {
      std::io::ErrorKind::NotFound => LinkFault::DeviceNotFound(error.to_string()),
      std::io::ErrorKind::PermissionDenied => LinkFault::PermissionDenied(error.to_string()),
      _ => LinkFault::OtherIo(error),
    }
  }
}

impl From<serialport::Error> for LinkFault {
  fn from(error: serialport::Error) -> Self {
    match error.kind() {
      serialport::ErrorKind::NoDevice => LinkFault::DeviceNotFound(error.description),
      serialport::ErrorKind::Io(kind) => std::io::Error::new(kind, error.description).into(),
      _ => LinkFault::Unexpected(error.description),
    }
  }
}

/// Knows how to open the device. The controller is generic over this so it can be driven by
/// something other than a real serial port.
pub trait Connector: Send + Sync + 'static {
  /// The open handle; closed when dropped.
  type Port: Write;

  fn open(&self) -> Result<Self::Port, LinkFault>;
}

/// Opens a real serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConnector {
  /// Path of the serial device, e.g. `/dev/ttyACM0`.
  device: String,

  /// Baud rate the firmware listens at.
  baud: u32,
}

impl SerialConnector {
  pub fn new<S>(device: S, baud: u32) -> Self
  where
    S: Into<String>,
  {
    Self {
      device: device.into(),
      baud,
    }
  }
}

impl Connector for SerialConnector {
  type Port = Box<dyn serialport::SerialPort>;

  fn open(&self) -> Result<Self::Port, LinkFault> {
    log::trace!("opening serial device '{}' at {} baud", self.device, self.baud);

    serialport::new(&self.device, self.baud)
      .timeout(WRITE_TIMEOUT)
      .open()
      .map_err(LinkFault::from)
  }
}

/// An open connection to the device, closed when dropped.
pub struct SerialLink<P>
where
  P: Write,
{
  /// The underlying handle.
  port: P,

  /// Number of messages written since opening.
  written: usize,
}

impl<P> SerialLink<P>
where
  P: Write,
{
  pub fn open<C>(connector: &C) -> Result<Self, LinkFault>
  where
    C: Connector<Port = P>,
  {
    let port = connector.open()?;
    Ok(Self { port, written: 0 })
  }

  /// Writes the wire encoding of `color` as one discrete message.
  pub fn send(&mut self, color: &ColorSpec) -> Result<(), LinkFault> {
    let message = color.encode();
    log::trace!("writing '{message}'");
    self.port.write_all(message.as_bytes())?;
    self.written += 1;
    Ok(())
  }

  pub fn written(&self) -> usize {
    self.written
  }
}

impl<P> Drop for SerialLink<P>
where
  P: Write,
{
  fn drop(&mut self) {
    log::trace!("closing serial link after {} message(s)", self.written);
  }
}

#[cfg(test)]
mod tests {
  use super::{Connector, LinkFault, SerialLink};
  use crate::color::ColorSpec;
  use std::io::{Error, ErrorKind};

  struct VecConnector;

  impl Connector for VecConnector {
    type Port = Vec<u8>;

    fn open(&self) -> Result<Self::Port, LinkFault> {
      Ok(Vec::new())
    }
  }

  #[test]
  fn classifies_io_errors() {
    let fault = LinkFault::from(Error::new(ErrorKind::NotFound, "gone"));
    assert!(matches!(fault, LinkFault::DeviceNotFound(_)));

    let fault = LinkFault::from(Error::new(ErrorKind::PermissionDenied, "nope"));
    assert!(matches!(fault, LinkFault::PermissionDenied(_)));

    let fault = LinkFault::from(Error::new(ErrorKind::BrokenPipe, "pipe"));
    assert!(matches!(fault, LinkFault::OtherIo(_)));
    assert!(fault.is_recoverable());
  }

  #[test]
  fn classifies_serialport_errors() {
    let fault = LinkFault::from(serialport::Error::new(serialport::ErrorKind::NoDevice, "unplugged"));
    assert!(matches!(fault, LinkFault::DeviceNotFound(_)));

    let fault = LinkFault::from(serialport::Error::new(
      serialport::ErrorKind::Io(ErrorKind::PermissionDenied),
      "denied",
    ));
    assert!(matches!(fault, LinkFault::PermissionDenied(_)));

    let fault = LinkFault::from(serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud"));
    assert!(matches!(fault, LinkFault::Unexpected(_)));
    assert!(!fault.is_recoverable());
  }

  #[test]
  fn sends_discrete_messages() {
    let mut link = SerialLink::open(&VecConnector).expect("open");
    link.send(&ColorSpec::parse("$S#102030")).expect("write");
    link.send(&ColorSpec::Rainbow { phase: 1 }).expect("write");
    assert_eq!(link.written(), 2);
    assert_eq!(link.port, b"$S#102030$H#01".to_vec());
  }
}
