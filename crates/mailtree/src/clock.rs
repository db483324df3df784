//! Timestamp source for the `Date` header.

/// Supplies the formatted value of the `Date` header.
pub trait Clock: Send + Sync {
    /// Current time, formatted for a mail header.
    fn now(&self) -> String;
}

/// Local wall-clock time in RFC 2822 format.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        chrono::Local::now().to_rfc2822()
    }
}

/// Always returns the same timestamp. Useful for reproducible output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock(String);

impl FixedClock {
    /// Creates a clock that always reports `timestamp`.
    #[must_use]
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_rfc2822() {
        let now = SystemClock.now();
        assert!(chrono::DateTime::parse_from_rfc2822(&now).is_ok());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new("Mon, 1 Jan 2024 00:00:00 +0000");
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now(), "Mon, 1 Jan 2024 00:00:00 +0000");
    }
}
