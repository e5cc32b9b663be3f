use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A three-component version number such as `1.20.4` or `17.0.2`.
///
/// Ordering is lexicographic over `(major, minor, patch)`, which matches how
/// both game and runtime versions compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version reported by a Java runtime.
    ///
    /// Runtime versions are looser than game versions: `21` and `17.0`
    /// are padded with zeros, build suffixes such as `_381` or `+7` are
    /// dropped, and `1.8.0_381` keeps its legacy `1.x` form.
    pub fn parse_runtime(text: &str) -> Result<Self> {
        let text = text.trim().trim_matches('"');
        let mut parts = [0u32; 3];
        let mut count = 0;

        for component in text.split('.').take(3) {
            let digits: String = component
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                break;
            }
            parts[count] = digits
                .parse()
                .map_err(|_| Error::Probe(format!("Version component out of range in '{}'", text)))?;
            count += 1;
            // A suffix ends the numeric part, e.g. "1.8.0_381" or "21-ea".
            if digits.len() != component.len() {
                break;
            }
        }

        if count == 0 {
            return Err(Error::Probe(format!("No version number in '{}'", text)));
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Java major release, folding the legacy `1.8` numbering into `8`.
    pub fn java_major(&self) -> u32 {
        if self.major == 1 { self.minor } else { self.major }
    }
}

impl FromStr for Version {
    type Err = Error;

    /// Strict game-version parsing: exactly three non-negative integers.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(Error::ConfigInvalid(format!(
                "Version '{}' must have exactly three components",
                s
            )));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::ConfigInvalid(format!(
                    "Version '{}' has a non-numeric component '{}'",
                    s, part
                )));
            }
            *slot = part.parse().map_err(|_| {
                Error::ConfigInvalid(format!(
                    "Version '{}' has a non-numeric component '{}'",
                    s, part
                ))
            })?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
