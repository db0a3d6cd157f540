use chrono::{DateTime, Utc};

/// Coarse "how long ago" label for list rows: `now`, `5m`, `3h`, `2d`,
/// `4w`, then a calendar date.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        return "now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d");
    }
    if days < 56 {
        return format!("{}w", days / 7);
    }
    then.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs_before: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        (now - Duration::seconds(secs_before), now)
    }

    #[test]
    fn buckets() {
        let cases = [
            (0, "now"),
            (59, "now"),
            (60, "1m"),
            (3599, "59m"),
            (3600, "1h"),
            (86_400 * 2, "2d"),
            (86_400 * 14, "2w"),
        ];
        for (secs, expected) in cases {
            let (then, now) = at(secs);
            assert_eq!(relative_age(then, now), expected, "{secs}s");
        }
    }

    #[test]
    fn old_dates_are_absolute() {
        let (then, now) = at(86_400 * 100);
        assert_eq!(relative_age(then, now), "2024-02-22");
    }

    #[test]
    fn future_timestamps_read_as_now() {
        let (then, now) = at(-500);
        assert_eq!(relative_age(then, now), "now");
    }
}
