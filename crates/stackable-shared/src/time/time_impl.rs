use crate::time::Duration;

impl TryFrom<time::Duration> for Duration {
    type Error = time::error::ConversionRange;

    fn try_from(value: time::Duration) -> Result<Self, Self::Error> {
        let std_duration = value.try_into()?;
        Ok(Self::from_std(std_duration))
    }
}

impl TryFrom<Duration> for time::Duration {
    type Error = time::error::ConversionRange;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::try_from(value.as_std())
    }
}
