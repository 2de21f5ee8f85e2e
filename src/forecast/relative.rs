//! Human-readable distance between a past instant and now ("4 days ago").

use time::{Duration, OffsetDateTime};

const MINUTES_IN_HOUR: i64 = 60;
const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2_520;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// Render "now minus `days` days" relative to `now`.
pub fn days_ago(days: u32, now: OffsetDateTime) -> String {
    match now.checked_sub(Duration::days(i64::from(days))) {
        Some(then) => time_ago(then, now),
        // Outside the calendar range; approximate with 365-day years.
        None => {
            let minutes = i64::from(days) * MINUTES_IN_DAY;
            let months = i64::from(days) * 12 / 365;
            format!("{} ago", describe(minutes, months))
        }
    }
}

/// Render the distance from `then` to `now` with an "ago" suffix.
///
/// Instants after `now` are treated as zero distance.
pub fn time_ago(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let seconds = (now - then).whole_seconds().max(0);
    let minutes = round_div(seconds, 60);
    format!("{} ago", describe(minutes, calendar_months_between(then, now)))
}

fn describe(minutes: i64, months: i64) -> String {
    if minutes < 1 {
        return "less than a minute".to_string();
    }
    if minutes < 45 {
        return plural(minutes, "minute");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        return format!("about {}", plural(round_div(minutes, MINUTES_IN_HOUR), "hour"));
    }
    if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        return plural(round_div(minutes, MINUTES_IN_DAY), "day");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        return format!("about {}", plural(round_div(minutes, MINUTES_IN_MONTH), "month"));
    }

    if months < 12 {
        let nearest = round_div(minutes, MINUTES_IN_MONTH).max(1);
        return plural(nearest, "month");
    }

    let years = months / 12;
    match months % 12 {
        0..=2 => format!("about {}", plural(years, "year")),
        3..=8 => format!("over {}", plural(years, "year")),
        _ => format!("almost {}", plural(years + 1, "year")),
    }
}

/// Whole calendar months from `earlier` to `later`, not counting a partial
/// final month.
fn calendar_months_between(earlier: OffsetDateTime, later: OffsetDateTime) -> i64 {
    if later <= earlier {
        return 0;
    }
    let mut months = i64::from(later.year() - earlier.year()) * 12
        + i64::from(u8::from(later.month())) - i64::from(u8::from(earlier.month()));
    if (later.day(), later.time()) < (earlier.day(), earlier.time()) {
        months -= 1;
    }
    months.max(0)
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

fn round_div(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2) / divisor
}
