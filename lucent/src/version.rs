//! Driver version tiers.
//!
//! A [`Version`] is an ordered milestone of the OpenGL family. Every extension knows the tier it
//! requires and, optionally, the tier at which it became part of the core API; comparisons
//! between tiers are therefore the backbone of capability detection.

use std::fmt;
use std::str::FromStr;

/// Known version tiers, ordered from the oldest to the newest.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Version {
  /// OpenGL 2.1.
  GL21,
  /// OpenGL 3.0.
  GL30,
  /// OpenGL 3.1.
  GL31,
  /// OpenGL 3.2.
  GL32,
  /// OpenGL 3.3.
  GL33,
  /// OpenGL 4.0.
  GL40,
  /// OpenGL 4.1.
  GL41,
  /// OpenGL 4.2.
  GL42,
  /// OpenGL 4.3.
  GL43,
  /// OpenGL 4.4.
  GL44,
  /// OpenGL 4.5.
  GL45,
  /// OpenGL 4.6.
  GL46,
}

impl Version {
  /// The oldest tier a context can be created with.
  pub const MINIMUM: Version = Version::GL21;

  /// Every tier, oldest first.
  pub const ALL: [Version; 12] = [
    Version::GL21,
    Version::GL30,
    Version::GL31,
    Version::GL32,
    Version::GL33,
    Version::GL40,
    Version::GL41,
    Version::GL42,
    Version::GL43,
    Version::GL44,
    Version::GL45,
    Version::GL46,
  ];

  /// Major and minor numbers of this tier.
  pub fn numbers(self) -> (u32, u32) {
    match self {
      Version::GL21 => (2, 1),
      Version::GL30 => (3, 0),
      Version::GL31 => (3, 1),
      Version::GL32 => (3, 2),
      Version::GL33 => (3, 3),
      Version::GL40 => (4, 0),
      Version::GL41 => (4, 1),
      Version::GL42 => (4, 2),
      Version::GL43 => (4, 3),
      Version::GL44 => (4, 4),
      Version::GL45 => (4, 5),
      Version::GL46 => (4, 6),
    }
  }

  /// Map driver-reported numbers to the highest known tier not above them.
  ///
  /// Drivers newer than the newest known tier map to it. Anything older than
  /// [`Version::MINIMUM`] yields [`None`].
  pub fn from_numbers(major: u32, minor: u32) -> Option<Self> {
    Version::ALL
      .iter()
      .rev()
      .copied()
      .find(|v| v.numbers() <= (major, minor))
  }

  /// The tier after this one, if any.
  pub fn next(self) -> Option<Self> {
    Version::ALL.iter().copied().find(|v| *v > self)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let (major, minor) = self.numbers();
    write!(f, "OpenGL {}.{}", major, minor)
  }
}

/// Parse the leading `major.minor` of a driver version string.
///
/// Drivers append vendor noise after the numbers (`"2.1 Mesa 20.0.8"`, `"4.6.0 NVIDIA 470.57"`);
/// only the first two numeric components are read.
pub fn parse_version_numbers(s: &str) -> Option<(u32, u32)> {
  let numeric = s.trim_start().split_whitespace().next()?;
  let mut parts = numeric.split('.');
  let major = parts.next()?.parse().ok()?;
  let minor = parts
    .next()?
    .chars()
    .take_while(char::is_ascii_digit)
    .collect::<String>()
    .parse()
    .ok()?;

  Some((major, minor))
}

/// Error returned when a string doesn’t name a version tier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseVersionError(pub String);

impl fmt::Display for ParseVersionError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "cannot parse version: {}", self.0)
  }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for Version {
  type Err = ParseVersionError;

  /// Accepts `"3.3"` as well as the `"GL33"` spelling.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let numbers = match s.strip_prefix("GL") {
      Some(digits) if digits.len() == 2 => {
        let mut chars = digits.chars();
        let major = chars.next().and_then(|c| c.to_digit(10));
        let minor = chars.next().and_then(|c| c.to_digit(10));
        major.zip(minor)
      }
      _ => parse_version_numbers(s),
    };

    numbers
      .and_then(|(major, minor)| {
        Version::from_numbers(major, minor).filter(|v| v.numbers() == (major, minor))
      })
      .ok_or_else(|| ParseVersionError(s.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordering() {
    assert!(Version::GL21 < Version::GL30);
    assert!(Version::GL33 < Version::GL40);
    assert!(Version::GL46 > Version::GL45);
    assert_eq!(Version::MINIMUM, Version::GL21);
  }

  #[test]
  fn from_numbers() {
    assert_eq!(Version::from_numbers(3, 3), Some(Version::GL33));
    assert_eq!(Version::from_numbers(3, 4), Some(Version::GL33));
    assert_eq!(Version::from_numbers(5, 0), Some(Version::GL46));
    assert_eq!(Version::from_numbers(2, 0), None);
    assert_eq!(Version::from_numbers(1, 5), None);
  }

  #[test]
  fn version_string() {
    assert_eq!(parse_version_numbers("2.1 Mesa 20.0.8"), Some((2, 1)));
    assert_eq!(parse_version_numbers("4.6.0 NVIDIA 470.57.02"), Some((4, 6)));
    assert_eq!(parse_version_numbers("3.3"), Some((3, 3)));
    assert_eq!(parse_version_numbers("garbage"), None);
    assert_eq!(parse_version_numbers(""), None);
  }

  #[test]
  fn parse() {
    assert_eq!("3.3".parse::<Version>(), Ok(Version::GL33));
    assert_eq!("GL45".parse::<Version>(), Ok(Version::GL45));
    assert!("3.4".parse::<Version>().is_err());
    assert!("GL99".parse::<Version>().is_err());
  }

  #[test]
  fn display() {
    assert_eq!(Version::GL21.to_string(), "OpenGL 2.1");
    assert_eq!(Version::GL46.to_string(), "OpenGL 4.6");
  }

  #[test]
  fn next() {
    assert_eq!(Version::GL21.next(), Some(Version::GL30));
    assert_eq!(Version::GL46.next(), None);
  }
}
