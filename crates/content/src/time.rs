//! Site timestamps are US Central time without a zone marker.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobloxZone {
    Cst,
    Cdt,
}

impl RobloxZone {
    pub fn as_str(self) -> &'static str {
        match self {
            RobloxZone::Cst => "CST",
            RobloxZone::Cdt => "CDT",
        }
    }

    pub fn offset(self) -> Option<FixedOffset> {
        match self {
            RobloxZone::Cst => FixedOffset::west_opt(6 * 3600),
            RobloxZone::Cdt => FixedOffset::west_opt(5 * 3600),
        }
    }
}

/// DST runs from the second Sunday of March, 08:00 UTC, to the first Sunday
/// of November, 07:00 UTC.
pub fn roblox_time_zone(now: DateTime<Utc>) -> RobloxZone {
    let month = now.month();
    let date = now.day() as i64;
    let hour = now.hour();
    let weekday = now.weekday().num_days_from_sunday() as i64;

    let first_sunday = (date - weekday - 1).rem_euclid(7) + 1;
    let second_sunday = first_sunday + 7;

    let daylight = match month {
        4..=10 => true,
        3 => date > second_sunday || (date == second_sunday && hour >= 8),
        11 => date < first_sunday || (date == first_sunday && hour < 7),
        _ => false,
    };
    if daylight { RobloxZone::Cdt } else { RobloxZone::Cst }
}

const DATE_TIME_FORMATS: [&str; 5] = [
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a site timestamp in the zone that is current at `now`.
pub fn roblox_time_to_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(explicit) = DateTime::parse_from_rfc3339(text) {
        return Some(explicit);
    }
    let naive = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%m/%d/%Y")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    roblox_time_zone(now)
        .offset()?
        .from_local_datetime(&naive)
        .single()
}
