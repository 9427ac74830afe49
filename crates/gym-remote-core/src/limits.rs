//! Session resource limits

use std::time::Duration;

use crate::error::{RemoteError, Result};

/// Timestep and wall-clock budget for one session
///
/// Fixed when the bridge is constructed. The timestep limit counts steps
/// within the current episode; the wall-clock limit runs from session start
/// and is unaffected by resets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Limits {
    /// Maximum steps per episode
    pub timestep_limit: Option<u64>,
    /// Maximum elapsed time since session start
    pub wallclock_limit: Option<Duration>,
}

impl Limits {
    /// No limits
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_timestep_limit(mut self, steps: u64) -> Self {
        self.timestep_limit = Some(steps);
        self
    }

    pub fn with_wallclock_limit(mut self, limit: Duration) -> Self {
        self.wallclock_limit = Some(limit);
        self
    }

    /// Reject zero budgets, which would close the session before it starts
    pub fn validate(&self) -> Result<()> {
        if self.timestep_limit == Some(0) {
            return Err(RemoteError::InvalidConfig(
                "timestep limit must be positive".into(),
            ));
        }
        if self.wallclock_limit.is_some_and(|d| d.is_zero()) {
            return Err(RemoteError::InvalidConfig(
                "wall-clock limit must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Whether `steps` served in this episode exhausts the budget
    pub fn timesteps_exhausted(&self, steps: u64) -> bool {
        self.timestep_limit.is_some_and(|limit| steps >= limit)
    }

    /// Whether `elapsed` since session start exceeds the budget
    pub fn wallclock_exceeded(&self, elapsed: Duration) -> bool {
        self.wallclock_limit.is_some_and(|limit| elapsed > limit)
    }
}

/// Format a duration as decimal seconds without losing precision
///
/// The inverse of [`parse_seconds`]; used to pass the wall-clock limit on a
/// command line.
pub fn format_seconds(duration: Duration) -> String {
    match duration.subsec_nanos() {
        0 => duration.as_secs().to_string(),
        nanos => format!("{}.{:09}", duration.as_secs(), nanos)
            .trim_end_matches('0')
            .to_string(),
    }
}

/// Parse non-negative decimal seconds (`"5"`, `"0.1"`) with nanosecond precision
pub fn parse_seconds(s: &str) -> Result<Duration> {
    let invalid = || RemoteError::InvalidConfig(format!("invalid number of seconds '{}'", s));

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if (whole.is_empty() && frac.is_empty())
        || frac.len() > 9
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let secs = match whole {
        "" => 0,
        digits => digits.parse::<u64>().map_err(|_| invalid())?,
    };
    let nanos = match frac {
        "" => 0,
        digits => format!("{:0<9}", digits).parse::<u32>().map_err(|_| invalid())?,
    };
    Ok(Duration::new(secs, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limits_rejected() {
        assert!(Limits::none().validate().is_ok());
        assert!(Limits::none().with_timestep_limit(0).validate().is_err());
        assert!(
            Limits::none()
                .with_wallclock_limit(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_timestep_limit_is_inclusive() {
        let limits = Limits::none().with_timestep_limit(5);
        assert!(!limits.timesteps_exhausted(4));
        assert!(limits.timesteps_exhausted(5));
        assert!(!Limits::none().timesteps_exhausted(u64::MAX));
    }

    #[test]
    fn test_wallclock_limit_is_strict() {
        let limits = Limits::none().with_wallclock_limit(Duration::from_millis(100));
        assert!(!limits.wallclock_exceeded(Duration::from_millis(100)));
        assert!(limits.wallclock_exceeded(Duration::from_millis(101)));
    }

    #[test]
    fn test_seconds_text_is_exact() {
        for (duration, text) in [
            (Duration::from_millis(100), "0.1"),
            (Duration::from_secs(5), "5"),
            (Duration::from_nanos(1), "0.000000001"),
            (Duration::MAX, "18446744073709551615.999999999"),
        ] {
            assert_eq!(format_seconds(duration), text);
            assert_eq!(parse_seconds(text).unwrap(), duration);
        }
        assert_eq!(parse_seconds(".5").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_malformed_seconds_rejected() {
        for text in ["", ".", "-1", "1e3", "0.1234567891", "18446744073709551616", "1.x"] {
            assert!(parse_seconds(text).is_err(), "{:?} should be rejected", text);
        }
    }
}
