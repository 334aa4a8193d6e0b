//! Conversions between UTC instants and wall-clock time in the site timezone.
use crate::config::ConfigError;
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::Invalid("site.timezone is not a known IANA timezone"))
}

#[must_use]
pub fn to_site_time(utc: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    utc.with_timezone(tz).naive_local()
}

/// Ambiguous local times (DST fall-back) resolve to the earlier instant;
/// times skipped by a DST jump have no instant and return `None`.
#[must_use]
pub fn from_site_time(local: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
