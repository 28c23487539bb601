//! Company date-format patterns (`MM/DD/YYYY`, `DD-Mon-YYYY HH24:mm`, ...)

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Pattern used when the company configuration carries none
pub const DEFAULT_DATE_FORMAT: &str = "MM-DD-YYYY";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

// Alternation order matters: longer tokens sharing a prefix come first.
static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"HH24|HH|mm|ss|SS|DD|YYYY|YY|MM|MONTH|Month|MON|Mon|DAYOFWEEK|DayOfWeek|DOW|Dow|AM|PM|am|pm")
        .expect("Invalid date token regex")
});

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];

/// Substitutes every pattern token with the matching calendar field of
/// `value`. `zero_pad` applies to day, month and hour tokens; minutes and
/// seconds are always two digits.
pub fn format_date(value: &NaiveDateTime, pattern: &str, zero_pad: bool) -> String {
    DATE_TOKEN
        .replace_all(pattern, |caps: &Captures| render_token(&caps[0], value, zero_pad))
        .into_owned()
}

fn render_token(token: &str, value: &NaiveDateTime, zero_pad: bool) -> String {
    let hours = value.hour();
    let twelve_hour = match hours % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if hours >= 12 { "pm" } else { "am" };
    let month_name = MONTHS[value.month0() as usize];
    let day_name = DAYS[value.weekday().num_days_from_sunday() as usize];
    let year = value.year().to_string();

    match token {
        "DD" => pad(value.day(), zero_pad),
        "MM" => pad(value.month(), zero_pad),
        "YYYY" => year,
        "YY" => year.chars().skip(2).collect(),
        "HH24" => pad(hours, zero_pad),
        "HH" => pad(twelve_hour, zero_pad),
        "mm" => pad(value.minute(), true),
        "ss" | "SS" => pad(value.second(), true),
        "am" | "pm" => meridiem.to_string(),
        "AM" | "PM" => meridiem.to_uppercase(),
        "MON" => month_name[..3].to_uppercase(),
        "Mon" => month_name[..3].to_string(),
        "MONTH" => month_name.to_uppercase(),
        "Month" => month_name.to_string(),
        "DOW" => day_name[..3].to_uppercase(),
        "Dow" => day_name[..3].to_string(),
        "DAYOFWEEK" => day_name.to_uppercase(),
        "DayOfWeek" => day_name.to_string(),
        other => other.to_string(),
    }
}

fn pad(value: u32, zero_pad: bool) -> String {
    if zero_pad {
        format!("{:02}", value)
    } else {
        value.to_string()
    }
}

/// Timestamp for a Unix epoch expressed in seconds (UTC).
pub fn from_epoch_seconds(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Parses the date representations seen in external payloads: RFC 3339,
/// ISO dates with or without time, and US style `MM/DD/YYYY`.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
