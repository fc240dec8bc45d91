//! Shooting timestamp value types.
//!
//! A photo's shooting timestamp is written through the UI as four separate
//! pieces (year, month, day, and a localized time-of-day string), so the
//! types here keep exactly that granularity: seconds never survive.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar date of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build a date, rejecting impossible combinations (month 13, Feb 30, ...).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// 4-digit year as typed into the year field.
    pub fn year_field(&self) -> String {
        format!("{:04}", self.year())
    }

    /// Zero-padded 2-digit month as typed into the month field.
    pub fn month_field(&self) -> String {
        format!("{:02}", self.month())
    }

    /// Zero-padded 2-digit day as typed into the day field.
    pub fn day_field(&self) -> String {
        format!("{:02}", self.day())
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Half of the day (午前 / 午後 in the default locale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Morning,
    Afternoon,
}

/// How the boundary hour is displayed when writing a time.
///
/// Internally the hour within a half is always 0..=11. The two conventions
/// only differ in how that hour 0 is rendered: `ZeroBased` writes `午後0時`
/// for noon, `TwelveBased` writes `午後12時` (and `午前12時` for midnight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourConvention {
    #[default]
    ZeroBased,
    TwelveBased,
}

/// Markers used to render and parse the localized time-of-day form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeLabels {
    pub morning: String,
    pub afternoon: String,
    pub hour_suffix: String,
    pub minute_suffix: String,
}

impl Default for TimeLabels {
    fn default() -> Self {
        Self {
            morning: "午前".to_string(),
            afternoon: "午後".to_string(),
            hour_suffix: "時".to_string(),
            minute_suffix: "分".to_string(),
        }
    }
}

/// Time of day at minute granularity, split into half and hour-in-half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizedTimeOfDay {
    half: Half,
    hour: u32,
    minute: u32,
}

impl LocalizedTimeOfDay {
    /// Build from a 24-hour clock reading. Returns `None` when out of range.
    pub const fn from_24h(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        let half = if hour < 12 { Half::Morning } else { Half::Afternoon };
        Some(Self {
            half,
            hour: hour % 12,
            minute,
        })
    }

    /// Build from a half and a displayed hour. Both 0 and 12 are accepted
    /// for the boundary hour and canonicalize to 0.
    pub const fn from_half(half: Half, hour: u32, minute: u32) -> Option<Self> {
        if hour > 12 || minute > 59 {
            return None;
        }
        Some(Self {
            half,
            hour: hour % 12,
            minute,
        })
    }

    pub const fn half(&self) -> Half {
        self.half
    }

    /// Canonical hour within the half, 0..=11.
    pub const fn hour(&self) -> u32 {
        self.hour
    }

    pub const fn minute(&self) -> u32 {
        self.minute
    }

    pub const fn hour_24(&self) -> u32 {
        match self.half {
            Half::Morning => self.hour,
            Half::Afternoon => self.hour + 12,
        }
    }

    /// Hour as it is displayed under the given convention.
    pub const fn display_hour(&self, convention: HourConvention) -> u32 {
        match convention {
            HourConvention::ZeroBased => self.hour,
            HourConvention::TwelveBased => {
                if self.hour == 0 {
                    12
                } else {
                    self.hour
                }
            }
        }
    }

    /// Render the display form, e.g. `午後2時5分`. Minutes are not padded.
    pub fn render(&self, labels: &TimeLabels, convention: HourConvention) -> String {
        let marker = match self.half {
            Half::Morning => &labels.morning,
            Half::Afternoon => &labels.afternoon,
        };
        format!(
            "{marker}{}{}{}{}",
            self.display_hour(convention),
            labels.hour_suffix,
            self.minute,
            labels.minute_suffix
        )
    }

    /// Parse the display form back (`午後9時10分`). Surrounding whitespace is
    /// ignored; anything else that does not fit the form yields `None`.
    pub fn parse(text: &str, labels: &TimeLabels) -> Option<Self> {
        let text = text.trim();
        let (half, rest) = if let Some(rest) = text.strip_prefix(labels.morning.as_str()) {
            (Half::Morning, rest)
        } else if let Some(rest) = text.strip_prefix(labels.afternoon.as_str()) {
            (Half::Afternoon, rest)
        } else {
            return None;
        };

        let (hour, rest) = rest.split_once(labels.hour_suffix.as_str())?;
        let minute = rest.strip_suffix(labels.minute_suffix.as_str())?;

        let hour = parse_digits(hour)?;
        let minute = parse_digits(minute)?;
        Self::from_half(half, hour, minute)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// The desired (or currently stored) shooting timestamp of one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub date: CalendarDate,
    pub time: LocalizedTimeOfDay,
}

impl ExtractedFact {
    pub const fn new(date: CalendarDate, time: LocalizedTimeOfDay) -> Self {
        Self { date, time }
    }
}

impl fmt::Display for ExtractedFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}",
            self.date,
            self.time.hour_24(),
            self.time.minute()
        )
    }
}
