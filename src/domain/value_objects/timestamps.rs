use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn now_utc() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn from(dt: OffsetDateTime) -> Self {
        Self(dt.to_offset(UtcOffset::UTC))
    }

    /// Returns the inner UTC `OffsetDateTime` without consuming the wrapper.
    pub fn as_inner(&self) -> OffsetDateTime {
        self.0
    }

    pub fn plus(&self, delay: Duration) -> Self {
        Self(self.0 + delay)
    }

    /// Saturates at the earliest representable instant instead of overflowing.
    pub fn minus(&self, delay: Duration) -> Self {
        Self(
            self.0
                .checked_sub(delay)
                .unwrap_or_else(|| PrimitiveDateTime::MIN.assume_utc()),
        )
    }

    /// RFC 3339 rendering used in API responses and notifications.
    pub fn to_rfc3339(&self) -> String {
        self.0.format(&Rfc3339).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_now_utc_when_called_should_return_utc_offset() {
        let result = Timestamp::now_utc();
        assert_eq!(result.as_inner().offset(), UtcOffset::UTC);
    }

    #[test]
    fn given_from_with_non_utc_offset_when_called_should_keep_instant_in_utc() {
        let offset = UtcOffset::from_hms(2, 0, 0).expect("valid offset");
        let dt = OffsetDateTime::now_utc().to_offset(offset);
        let result = Timestamp::from(dt);
        assert_eq!(result.as_inner().offset(), UtcOffset::UTC);
        assert_eq!(result.as_inner().unix_timestamp(), dt.unix_timestamp());
    }

    #[test]
    fn given_delay_when_plus_then_minus_should_return_same_instant() {
        let now = Timestamp::now_utc();
        let later = now.plus(Duration::seconds(90));
        assert!(later > now);
        assert_eq!(later.minus(Duration::seconds(90)), now);
    }

    #[test]
    fn given_delay_beyond_calendar_range_when_minus_should_saturate() {
        let now = Timestamp::now_utc();

        let floor = now.minus(Duration::days(i64::from(u32::MAX)));

        assert_eq!(floor.as_inner(), PrimitiveDateTime::MIN.assume_utc());
        assert!(floor < now);
    }

    #[test]
    fn given_unix_epoch_when_rendered_should_be_rfc3339() {
        let ts = Timestamp::from(OffsetDateTime::UNIX_EPOCH);
        assert_eq!(ts.to_rfc3339(), "1970-01-01T00:00:00Z");
    }
}
