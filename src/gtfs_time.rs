//! GTFS clock-time helpers.
//!
//! GTFS times do not wrap at midnight: a trip that leaves at 23:50 and
//! arrives ten minutes into the next day writes its arrival as
//! `24:00:00`. These helpers convert between that convention, wall
//! clock display, and a flat sortable second count.

fn split_hms(time: &str) -> Option<(u32, u32, u32)> {
    let mut parts = time.trim().split(':');
    let h = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let s: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || m > 59 || s > 59 {
        return None;
    }
    Some((h, m, s))
}

/// Turns a GTFS time into a wall-clock time plus a next-day flag.
///
/// `"25:30:00"` becomes `("01:30:00", true)`. Empty or unparseable
/// input comes back unchanged with the flag unset, it never fails.
pub fn normalize_gtfs_time(time: &str) -> (String, bool) {
    match split_hms(time) {
        Some((h, m, s)) if h >= 24 => (format!("{:02}:{:02}:{:02}", h - 24, m, s), true),
        _ => (time.to_owned(), false),
    }
}

/// Seconds since the start of the service day, for sorting.
///
/// Hours over 23 count straight through, so next-day times sort after
/// everything of the nominal day. Malformed input yields 0 and
/// therefore sorts first.
pub fn time_to_seconds(time: &str) -> u32 {
    match split_hms(time) {
        // An absurd hour field would overflow; treat it like any other
        // malformed input and sort it first
        Some((h, m, s)) => h
            .checked_mul(3600)
            .and_then(|hours| hours.checked_add(m * 60 + s))
            .unwrap_or(0),
        None => 0,
    }
}

pub fn seconds_to_time(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_day_times_pass_through() {
        assert_eq!(("08:15:30".to_owned(), false), normalize_gtfs_time("08:15:30"));
        assert_eq!(("23:59:59".to_owned(), false), normalize_gtfs_time("23:59:59"));
    }

    #[test]
    fn next_day_times_wrap() {
        assert_eq!(("00:00:00".to_owned(), true), normalize_gtfs_time("24:00:00"));
        assert_eq!(("01:30:00".to_owned(), true), normalize_gtfs_time("25:30:00"));
        assert_eq!(("00:15:00".to_owned(), true), normalize_gtfs_time("24:15:00"));
    }

    #[test]
    fn garbage_passes_through_unchanged() {
        assert_eq!(("".to_owned(), false), normalize_gtfs_time(""));
        assert_eq!(("later".to_owned(), false), normalize_gtfs_time("later"));
        assert_eq!(("12:99:00".to_owned(), false), normalize_gtfs_time("12:99:00"));
    }

    #[test]
    fn seconds_for_sorting() {
        assert_eq!(91800, time_to_seconds("25:30:00"));
        assert_eq!(29730, time_to_seconds("08:15:30"));
        assert_eq!(0, time_to_seconds("not a time"));
        assert_eq!(0, time_to_seconds(""));
    }

    #[test]
    fn oversized_hours_fall_back_to_sentinel() {
        assert_eq!(0, time_to_seconds("1300000:00:00"));
        assert_eq!(0, time_to_seconds("4294967295:59:59"));
    }

    #[test]
    fn seconds_round_trip() {
        assert_eq!("25:30:00", seconds_to_time(91800));
        assert_eq!("00:00:07", seconds_to_time(7));
        assert_eq!(91800, time_to_seconds(&seconds_to_time(91800)));
    }
}
