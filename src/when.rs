//! Parsing and formatting of human-facing times.
//!
//! Expected start/end times are entered as short phrases ("tomorrow",
//! "in 3d", "next friday", "2026-01-15", "2026-01-15T14:30") and shown back
//! relative to now ("5 min ago", "3 days ago").

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Hour of day used when only a date is given.
const DEFAULT_HOUR: u32 = 9;

/// Parse a time phrase relative to `today` (local date).
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday".."sunday" (or "mon".."sun"), optionally prefixed "this"/"next"
/// - "end of week" / "eow", "end of month" / "eom"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD", "YYYY-MM-DDTHH:MM" / "YYYY-MM-DD HH:MM", RFC 3339
pub fn parse_when(input: &str, today: NaiveDate) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(naive);
        }
    }
    parse_day(&s.to_lowercase(), today).and_then(|d| local_to_utc(d.and_time(default_time())))
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_day(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let weekday = today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(6 - weekday));
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (num, unit) = rest.split_at(rest.len().saturating_sub(1));
        let n: i64 = num.trim().parse().ok()?;
        return match unit {
            "d" => Some(today + Duration::days(n)),
            "w" => Some(today + Duration::weeks(n)),
            // Months are approximated as 30 days.
            "m" => Some(today + Duration::days(n * 30)),
            _ => None,
        };
    }

    let (next_week, name) = if let Some(name) = s.strip_prefix("next ") {
        (true, name)
    } else {
        (false, s.strip_prefix("this ").unwrap_or(s))
    };
    if let Some(target) = weekday_index(name) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target - current).rem_euclid(7);
        let ahead = match (next_week, ahead) {
            (true, 0) => 7,
            (true, a) => a + 7,
            (false, a) => a,
        };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn weekday_index(name: &str) -> Option<i64> {
    const DAYS: [(&str, &str); 7] = [
        ("monday", "mon"),
        ("tuesday", "tue"),
        ("wednesday", "wed"),
        ("thursday", "thu"),
        ("friday", "fri"),
        ("saturday", "sat"),
        ("sunday", "sun"),
    ];
    DAYS.iter()
        .position(|(long, short)| name == *long || name == *short)
        .map(|i| i as i64)
}

/// "Just now", "5 min ago", "2 hours ago", "3 days ago", else a short date.
pub fn format_relative(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "—".into();
    };
    let diff = now - at;
    let min = diff.num_minutes();
    let hr = diff.num_hours();
    let day = diff.num_days();
    if min < 1 {
        "Just now".into()
    } else if min < 60 {
        format!("{min} min ago")
    } else if hr < 24 {
        format!("{hr} hour{} ago", if hr == 1 { "" } else { "s" })
    } else if day < 7 {
        format!("{day} day{} ago", if day == 1 { "" } else { "s" })
    } else {
        at.with_timezone(&Local).format("%d %b %Y").to_string()
    }
}

/// Local "YYYY-MM-DD HH:MM", or a dash.
pub fn format_local(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "—".into(),
    }
}

/// Truncate to `width` characters, ending with an ellipsis when cut.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
    }

    fn day_of(input: &str) -> NaiveDate {
        parse_when(input, monday()).unwrap().with_timezone(&Local).date_naive()
    }

    #[test]
    fn relative_phrases() {
        let today = monday();
        assert_eq!(day_of("today"), today);
        assert_eq!(day_of("Tomorrow"), today + Duration::days(1));
        assert_eq!(day_of("in 3d"), today + Duration::days(3));
        assert_eq!(day_of("in 2w"), today + Duration::days(14));
        assert_eq!(day_of("friday"), today + Duration::days(4));
        assert_eq!(day_of("this mon"), today);
        assert_eq!(day_of("next monday"), today + Duration::days(7));
        assert_eq!(day_of("next wed"), today + Duration::days(9));
        assert_eq!(day_of("eow"), today + Duration::days(6));
        assert_eq!(day_of("eom"), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn absolute_forms() {
        assert_eq!(day_of("2026-01-15"), NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        let exact = parse_when("2026-01-15T14:30:00Z", monday()).unwrap();
        assert_eq!(exact, Utc.with_ymd_and_hms(2026, 1, 15, 14, 30, 0).unwrap());
        assert!(parse_when("2026-01-15T14:30", monday()).is_some());
        assert!(parse_when("someday", monday()).is_none());
        assert!(parse_when("in xd", monday()).is_none());
    }

    #[test]
    fn relative_formatting() {
        let now = Utc.with_ymd_and_hms(2025, 12, 10, 12, 0, 0).unwrap();
        assert_eq!(format_relative(Some(now), now), "Just now");
        assert_eq!(format_relative(Some(now - Duration::minutes(5)), now), "5 min ago");
        assert_eq!(format_relative(Some(now - Duration::hours(1)), now), "1 hour ago");
        assert_eq!(format_relative(Some(now - Duration::days(3)), now), "3 days ago");
        assert_eq!(format_relative(None, now), "—");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Quarterly payroll", 8), "Quarter…");
    }
}
