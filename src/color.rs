//! The color model understood by the led strip firmware, and its ascii wire encoding.

use serde::Deserialize;

/// Wire prefix of a static (solid rgb) color.
const STATIC_PREFIX: &str = "$S#";

/// Wire prefix of a rainbow color.
const RAINBOW_PREFIX: &str = "$H#";

/// Channels that cannot be decoded fall back to this value.
const FALLBACK_CHANNEL: u8 = 255;

/// The two families of color the firmware can display. Transitions are only possible between
/// colors of the same kind.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ColorKind {
  /// A solid rgb color.
  Static,

  /// The firmware's rainbow animation, parameterized by a single phase value.
  Rainbow,
}

/// A target color for the led strip. Built by [`ColorSpec::parse`] from the wire format used by
/// the firmware, or directly.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize)]
#[serde(from = "String")]
pub enum ColorSpec {
  /// A solid color, encoded as `$S#RRGGBB`.
  Static { red: u8, green: u8, blue: u8 },

  /// A rainbow animation, encoded as `$H#VV`.
  Rainbow { phase: u8 },
}

impl ColorSpec {
  /// Opaque white; what any unrecognized wire string decodes to.
  pub const WHITE: ColorSpec = ColorSpec::Static {
    red: 255,
    green: 255,
    blue: 255,
  };

  /// Decodes a wire string. This never fails: every channel that is missing or is not valid
  /// hex is replaced by `255`, and an unknown prefix yields [`ColorSpec::WHITE`].
  pub fn parse<S>(text: S) -> Self
  where
    S: AsRef<str>,
  {
    let text = text.as_ref();

    match text.get(0..3) {
      Some(STATIC_PREFIX) => ColorSpec::Static {
        red: channel(text, 3),
        green: channel(text, 5),
        blue: channel(text, 7),
      },
      Some(RAINBOW_PREFIX) => ColorSpec::Rainbow {
        phase: channel(text, 3),
      },
      _ => ColorSpec::WHITE,
    }
  }

  /// Returns the exact ascii message the firmware expects for this color.
  pub fn encode(&self) -> String {
    match self {
      ColorSpec::Static { red, green, blue } => format!("{STATIC_PREFIX}{red:02X}{green:02X}{blue:02X}"),
      ColorSpec::Rainbow { phase } => format!("{RAINBOW_PREFIX}{phase:02X}"),
    }
  }

  pub fn kind(&self) -> ColorKind {
    match self {
      ColorSpec::Static { .. } => ColorKind::Static,
      ColorSpec::Rainbow { .. } => ColorKind::Rainbow,
    }
  }

  /// Wraps `text` in ansi escape sequences that preview this color in a truecolor terminal.
  /// Static colors become the background, with a dark or bright foreground picked from a rough
  /// luminance estimate; rainbow colors cycle through six hues, one per character.
  pub fn paint<S>(&self, text: S) -> String
  where
    S: AsRef<str>,
  {
    match *self {
      ColorSpec::Static { red, green, blue } => {
        let luminance = [(red, 0.2126), (green, 0.7152), (blue, 0.0722)]
          .iter()
          .map(|(value, weight)| weight * (f64::from(*value) / 255.0).powf(2.4))
          .sum::<f64>();
        let foreground = if luminance > 0.2 { "\x1b[30m" } else { "\x1b[97m" };

        format!(
          "\x1b[48;2;{red};{green};{blue}m{foreground}{}\x1b[0m",
          text.as_ref()
        )
      }
      ColorSpec::Rainbow { .. } => {
        let mut painted = text
          .as_ref()
          .chars()
          .zip(RAINBOW_HUES.iter().cycle())
          .fold(String::new(), |mut out, (character, (background, foreground))| {
            out.push_str(background);
            out.push_str(foreground);
            out.push(character);
            out
          });

        painted.push_str("\x1b[0m");
        painted
      }
    }
  }
}

/// Background and foreground escapes used to preview a rainbow color.
const RAINBOW_HUES: [(&str, &str); 6] = [
  ("\x1b[48;2;255;0;0m", "\x1b[97m"),
  ("\x1b[48;2;255;255;0m", "\x1b[30m"),
  ("\x1b[48;2;0;255;0m", "\x1b[30m"),
  ("\x1b[48;2;0;255;255m", "\x1b[30m"),
  ("\x1b[48;2;0;0;255m", "\x1b[97m"),
  ("\x1b[48;2;255;0;255m", "\x1b[30m"),
];

/// Decodes the (up to) two hex digits starting at character `start`, independently of any other
/// channel. A truncated single digit still decodes.
fn channel(text: &str, start: usize) -> u8 {
  let pair = text.chars().skip(start).take(2).collect::<String>();

  if pair.is_empty() || !pair.chars().all(|character| character.is_ascii_hexdigit()) {
    return FALLBACK_CHANNEL;
  }

  u8::from_str_radix(&pair, 16).unwrap_or(FALLBACK_CHANNEL)
}

impl From<String> for ColorSpec {
  fn from(text: String) -> Self {
    ColorSpec::parse(text)
  }
}

impl std::fmt::Display for ColorSpec {
  fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(formatter, "{}", self.encode())
  }
}

#[cfg(test)]
mod tests {
  use super::{ColorKind, ColorSpec};

  #[test]
  fn parses_static() {
    assert_eq!(
      ColorSpec::parse("$S#FF8000"),
      ColorSpec::Static {
        red: 255,
        green: 128,
        blue: 0
      }
    );
  }

  #[test]
  fn parses_lowercase_hex() {
    assert_eq!(
      ColorSpec::parse("$S#0a0b0c"),
      ColorSpec::Static {
        red: 10,
        green: 11,
        blue: 12
      }
    );
  }

  #[test]
  fn bad_channels_fall_back_independently() {
    assert_eq!(
      ColorSpec::parse("$S#10ZZ30"),
      ColorSpec::Static {
        red: 16,
        green: 255,
        blue: 48
      }
    );
    assert_eq!(
      ColorSpec::parse("$S#10"),
      ColorSpec::Static {
        red: 16,
        green: 255,
        blue: 255
      }
    );
  }

  #[test]
  fn truncated_channel_decodes_single_digit() {
    assert_eq!(
      ColorSpec::parse("$S#A"),
      ColorSpec::Static {
        red: 10,
        green: 255,
        blue: 255
      }
    );
    assert_eq!(ColorSpec::parse("$H#7"), ColorSpec::Rainbow { phase: 7 });
  }

  #[test]
  fn signed_pairs_are_not_hex() {
    assert_eq!(
      ColorSpec::parse("$S#+1-100"),
      ColorSpec::Static {
        red: 255,
        green: 255,
        blue: 0
      }
    );
  }

  #[test]
  fn parses_rainbow() {
    assert_eq!(ColorSpec::parse("$H#3C"), ColorSpec::Rainbow { phase: 60 });
    assert_eq!(ColorSpec::parse("$H#ZZ"), ColorSpec::Rainbow { phase: 255 });
    assert_eq!(ColorSpec::parse("$H#"), ColorSpec::Rainbow { phase: 255 });
  }

  #[test]
  fn unknown_prefix_is_white() {
    assert_eq!(ColorSpec::parse("garbage"), ColorSpec::WHITE);
    assert_eq!(ColorSpec::parse(""), ColorSpec::WHITE);
    assert_eq!(ColorSpec::parse("$X#000000"), ColorSpec::WHITE);
  }

  #[test]
  fn multibyte_input_does_not_panic() {
    assert_eq!(ColorSpec::parse("€"), ColorSpec::WHITE);
    assert_eq!(
      ColorSpec::parse("$S#€0000"),
      ColorSpec::Static {
        red: 255,
        green: 0,
        blue: 0
      }
    );
  }

  #[test]
  fn encodes_uppercase_wire_format() {
    let color = ColorSpec::Static {
      red: 10,
      green: 171,
      blue: 255,
    };
    assert_eq!(color.encode(), "$S#0AABFF");
    assert_eq!(ColorSpec::Rainbow { phase: 7 }.encode(), "$H#07");
  }

  #[test]
  fn fallback_defaults_encode_byte_exact() {
    assert_eq!(ColorSpec::parse("$S#12QQ").encode(), "$S#12FFFF");
    assert_eq!(ColorSpec::parse("nonsense").encode(), "$S#FFFFFF");
  }

  #[test]
  fn equality_is_kind_aware() {
    assert_ne!(
      ColorSpec::Rainbow { phase: 0 },
      ColorSpec::Static {
        red: 0,
        green: 0,
        blue: 0
      }
    );
    assert_eq!(ColorSpec::parse("$S#000000").kind(), ColorKind::Static);
    assert_eq!(ColorSpec::parse("$H#00").kind(), ColorKind::Rainbow);
  }

  #[test]
  fn paint_picks_readable_foreground() {
    assert_eq!(
      ColorSpec::WHITE.paint("hi"),
      "\x1b[48;2;255;255;255m\x1b[30mhi\x1b[0m"
    );
    assert_eq!(
      ColorSpec::parse("$S#000000").paint("hi"),
      "\x1b[48;2;0;0;0m\x1b[97mhi\x1b[0m"
    );
  }

  #[test]
  fn paint_cycles_rainbow() {
    let painted = ColorSpec::Rainbow { phase: 0 }.paint("abcdefg");
    assert!(painted.starts_with("\x1b[48;2;255;0;0m\x1b[97ma"));
    assert!(painted.ends_with("\x1b[48;2;255;0;0m\x1b[97mg\x1b[0m"));
  }
}
