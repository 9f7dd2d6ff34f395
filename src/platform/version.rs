//! Dotted package versions.

use super::PlatformError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The numeric dotted prefix of a Debian package version.
///
/// `35.1.0-20220825113828` parses as `35.1.0`. Comparison is component-wise
/// and numeric, with missing trailing components treated as zero, so `35.1`
/// equals `35.1.0` and `32.7.1` is below `35.1`.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    parts: Vec<u64>,
}

impl PackageVersion {
    /// Build a version from its numeric components.
    pub fn new(parts: Vec<u64>) -> Self {
        Self { parts }
    }

    fn component(&self, index: usize) -> u64 {
        self.parts.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for PackageVersion {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || PlatformError::InvalidVersion(trimmed.to_string());

        // Drop a Debian epoch ("1:36.3.0")
        let upstream = match trimmed.split_once(':') {
            Some((epoch, rest)) if epoch.chars().all(|c| c.is_ascii_digit()) => rest,
            _ => trimmed,
        };

        let end = upstream
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(upstream.len());
        let prefix = upstream[..end].trim_end_matches('.');

        if prefix.is_empty() {
            return Err(invalid());
        }

        let parts = prefix
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { parts })
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}
