//! Interpolation between two colors of the same kind.

use crate::color::ColorSpec;

/// An iterator over the intermediate colors of a transition. Frame `i` of `N` moves every channel
/// `floor(delta * i / N)` away from the starting color, so the final frame always lands on the
/// target exactly.
#[derive(Debug, Clone)]
pub struct Frames {
  /// The color the transition starts from; never emitted itself.
  from: ColorSpec,

  /// The color of the final frame.
  to: ColorSpec,

  /// The index of the next frame to emit, starting at 1.
  next: i64,

  /// Total number of frames.
  total: i64,
}

impl Frames {
  /// The number of frames this transition produces in total.
  pub fn total(&self) -> usize {
    usize::try_from(self.total).unwrap_or_default()
  }
}

/// Builds the frames of a transition lasting `duration` seconds at `sample_rate` frames per
/// second. Returns `None` when the colors are of different kinds; those can only be switched
/// instantly.
///
/// The frame count is `trunc(sample_rate * duration)`. When that is zero or negative the
/// transition is empty and nothing should be written.
pub fn frames(from: ColorSpec, to: ColorSpec, duration: f64, sample_rate: u32) -> Option<Frames> {
  if from.kind() != to.kind() {
    return None;
  }

  let samples = (f64::from(sample_rate) * duration).trunc();
  // Non-finite or absurd durations degrade to an empty transition.
  let total = if samples.is_finite() && samples > 0.0 {
    samples.min(f64::from(u32::MAX)) as i64
  } else {
    0
  };

  Some(Frames {
    from,
    to,
    next: 1,
    total,
  })
}

/// The value of a single channel at frame `index` of `total`.
fn step(from: u8, to: u8, index: i64, total: i64) -> u8 {
  let delta = i64::from(to) - i64::from(from);
  let value = i64::from(from) + (delta * index).div_euclid(total);
  u8::try_from(value).unwrap_or(to)
}

impl Iterator for Frames {
  type Item = ColorSpec;

  fn next(&mut self) -> Option<Self::Item> {
    if self.next > self.total {
      return None;
    }

    let (index, total) = (self.next, self.total);
    self.next += 1;

    let frame = match (self.from, self.to) {
      (
        ColorSpec::Static { red, green, blue },
        ColorSpec::Static {
          red: to_red,
          green: to_green,
          blue: to_blue,
        },
      ) => ColorSpec::Static {
        red: step(red, to_red, index, total),
        green: step(green, to_green, index, total),
        blue: step(blue, to_blue, index, total),
      },
      (ColorSpec::Rainbow { phase }, ColorSpec::Rainbow { phase: to_phase }) => ColorSpec::Rainbow {
        phase: step(phase, to_phase, index, total),
      },
      // Construction guarantees matching kinds.
      _ => return None,
    };

    Some(frame)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = usize::try_from(self.total - self.next + 1).unwrap_or_default();
    (remaining, Some(remaining))
  }
}

impl ExactSizeIterator for Frames {}
