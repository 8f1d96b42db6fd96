use crate::error::{LedgerError, Result};
use std::fmt;

/// Minor value at which a bump rolls over into the next major.
pub const MINOR_ROLLOVER: u64 = 10;

/// Release version as tracked by the ledger.
///
/// Only major and minor are tracked; patch is always rendered as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseVersion {
    pub major: u64,
    pub minor: u64,
}

impl ReleaseVersion {
    /// Create a new version
    pub fn new(major: u64, minor: u64) -> Self {
        ReleaseVersion { major, minor }
    }

    /// Parse a ledger version string (e.g. "0.2.0" or "v1.3.0").
    ///
    /// The patch component must be present and numeric but is discarded.
    /// Pre-release and build metadata are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let clean = trimmed.trim_start_matches('v').trim_start_matches('V');

        let parsed = semver::Version::parse(clean).map_err(|e| {
            LedgerError::version(format!(
                "Invalid version '{}' - expected MAJOR.MINOR.PATCH: {}",
                input, e
            ))
        })?;

        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(LedgerError::version(format!(
                "Pre-release and build metadata are not supported: '{}'",
                input
            )));
        }

        Ok(ReleaseVersion {
            major: parsed.major,
            minor: parsed.minor,
        })
    }

    /// Compute the next version.
    ///
    /// Minor is incremented; when the incremented minor reaches exactly
    /// [`MINOR_ROLLOVER`] the major is incremented and minor resets to 0.
    /// Fails instead of wrapping when a component is already at `u64::MAX`.
    pub fn bump(&self) -> Result<Self> {
        let overflow = || LedgerError::version(format!("Cannot bump {}: version overflow", self));

        let minor = self.minor.checked_add(1).ok_or_else(overflow)?;
        if minor == MINOR_ROLLOVER {
            let major = self.major.checked_add(1).ok_or_else(overflow)?;
            Ok(ReleaseVersion { major, minor: 0 })
        } else {
            Ok(ReleaseVersion {
                major: self.major,
                minor,
            })
        }
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.0", self.major, self.minor)
    }
}

impl std::str::FromStr for ReleaseVersion {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        ReleaseVersion::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_increments_minor() {
        for major in [0, 1, 7] {
            for minor in 0..=8 {
                let v = ReleaseVersion::new(major, minor);
                assert_eq!(v.bump().unwrap(), ReleaseVersion::new(major, minor + 1));
            }
        }
    }

    #[test]
    fn test_bump_rolls_over_at_nine() {
        for major in [0, 1, 41] {
            let v = ReleaseVersion::new(major, 9);
            assert_eq!(v.bump().unwrap(), ReleaseVersion::new(major + 1, 0));
        }
    }

    #[test]
    fn test_worked_examples() {
        assert_eq!(ReleaseVersion::new(0, 1).bump().unwrap(), ReleaseVersion::new(0, 2));
        assert_eq!(ReleaseVersion::new(0, 9).bump().unwrap(), ReleaseVersion::new(1, 0));
        assert_eq!(ReleaseVersion::new(0, 9).bump().unwrap().to_string(), "1.0.0");
    }

    #[test]
    fn test_minor_above_rollover_keeps_counting() {
        let v = ReleaseVersion::new(2, 37);
        assert_eq!(v.bump().unwrap(), ReleaseVersion::new(2, 38));
    }

    #[test]
    fn test_repeated_bumps_are_monotonic() {
        let mut v = ReleaseVersion::new(0, 0);
        for _ in 0..35 {
            let next = v.bump().unwrap();
            assert!(next > v, "{} should be greater than {}", next, v);
            v = next;
        }
        assert_eq!(v, ReleaseVersion::new(3, 5));
    }

    #[test]
    fn test_parse_plain_and_prefixed() {
        assert_eq!(
            ReleaseVersion::parse("0.2.0").unwrap(),
            ReleaseVersion::new(0, 2)
        );
        assert_eq!(
            ReleaseVersion::parse("v1.3.0").unwrap(),
            ReleaseVersion::new(1, 3)
        );
        assert_eq!(
            ReleaseVersion::parse("V4.0.0").unwrap(),
            ReleaseVersion::new(4, 0)
        );
    }

    #[test]
    fn test_parse_discards_patch() {
        let v = ReleaseVersion::parse("1.4.7").unwrap();
        assert_eq!(v, ReleaseVersion::new(1, 4));
        assert_eq!(v.to_string(), "1.4.0");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ReleaseVersion::parse("").is_err());
        assert!(ReleaseVersion::parse("1.2").is_err());
        assert!(ReleaseVersion::parse("1.2.3.4").is_err());
        assert!(ReleaseVersion::parse("one.2.0").is_err());
        assert!(ReleaseVersion::parse("1.x.0").is_err());
        assert!(ReleaseVersion::parse("-1.2.0").is_err());
    }

    #[test]
    fn test_parse_rejects_prerelease() {
        let err = ReleaseVersion::parse("1.0.0-rc.1").unwrap_err();
        assert!(err.to_string().contains("Pre-release"));
        assert!(ReleaseVersion::parse("1.0.0+build.5").is_err());
    }

    #[test]
    fn test_display_pins_patch_to_zero() {
        assert_eq!(ReleaseVersion::new(3, 1).to_string(), "3.1.0");
    }

    #[test]
    fn test_bump_overflow_is_an_error() {
        let v = ReleaseVersion::parse("0.18446744073709551615.0").unwrap();
        let err = v.bump().unwrap_err();
        assert!(err.to_string().contains("overflow"));

        let v = ReleaseVersion::new(u64::MAX, 9);
        assert!(matches!(v.bump(), Err(LedgerError::Version(_))));
    }
}
