use std::{fmt::Display, str::FromStr, time::Duration as StdDuration};

use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum ParseDurationError {
    #[snafu(display("failed to parse {input:?} as a duration"))]
    Parse {
        source: humantime::DurationError,
        input: String,
    },
}

/// A thin wrapper around [`std::time::Duration`] which supports parsing and displaying
/// durations in the common `1h30m`/`5s` style used throughout Kubernetes manifests, instead of
/// the verbose `Duration { secs: ..., nanos: ... }` representation.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct Duration(StdDuration);

impl Duration {
    pub const fn from_std(duration: StdDuration) -> Self {
        Self(duration)
    }

    pub const fn as_std(self) -> StdDuration {
        self.0
    }

    pub const fn as_secs(self) -> u64 {
        self.0.as_secs()
    }

    pub const fn as_millis(self) -> u128 {
        self.0.as_millis()
    }
}

impl From<StdDuration> for Duration {
    fn from(duration: StdDuration) -> Self {
        Self(duration)
    }
}

impl From<Duration> for StdDuration {
    fn from(duration: Duration) -> Self {
        duration.0
    }
}

impl FromStr for Duration {
    type Err = ParseDurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let duration = humantime::parse_duration(input).context(ParseSnafu { input })?;
        Ok(Self(duration))
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::seconds("5s", StdDuration::from_secs(5))]
    #[case::minutes("3m", StdDuration::from_secs(180))]
    #[case::combined("1h30m", StdDuration::from_secs(5400))]
    fn parses_durations(#[case] input: &str, #[case] expected: StdDuration) {
        let parsed: Duration = input.parse().unwrap();
        assert_eq!(parsed.as_std(), expected);
    }

    #[test]
    fn rejects_invalid_input() {
        assert!("not a duration".parse::<Duration>().is_err());
    }

    #[test]
    fn round_trips_through_display() {
        let duration = Duration::from_std(StdDuration::from_secs(90));
        let rendered = duration.to_string();
        let reparsed: Duration = rendered.parse().unwrap();
        assert_eq!(duration, reparsed);
    }
}
