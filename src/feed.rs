use crate::objects::*;
use crate::raw_feed::RawFeed;
use crate::Error;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::path::Path;

fn to_map<O: Id>(elements: impl IntoIterator<Item = O>) -> HashMap<String, O> {
    elements
        .into_iter()
        .map(|e| (e.id().to_owned(), e))
        .collect()
}

/// Keyed, query-ready view of one loaded feed.
///
/// All tables are read once at construction and never mutated. Every
/// per-date question (active services, trips, stop times) is answered
/// from these in-memory structures.
#[derive(Debug, Default)]
pub struct Feed {
    pub stops: HashMap<String, Stop>,
    pub routes: HashMap<String, Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendar: Vec<Calendar>,
    pub calendar_dates: Vec<CalendarDate>,
    /// Shape id to its polyline, points ordered by sequence.
    pub shapes: HashMap<String, Vec<ShapePoint>>,
}

impl Feed {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        RawFeed::from_dir(path).map(Self::from_raw)
    }

    pub fn from_raw(raw: RawFeed) -> Self {
        let mut shapes: HashMap<String, Vec<ShapePoint>> = HashMap::new();
        for point in raw.shapes {
            shapes.entry(point.id.clone()).or_default().push(point);
        }
        for points in shapes.values_mut() {
            points.sort_by_key(|p| p.sequence);
        }

        Self {
            stops: to_map(raw.stops),
            routes: to_map(raw.routes),
            trips: raw.trips,
            stop_times: raw.stop_times,
            calendar: raw.calendar,
            calendar_dates: raw.calendar_dates,
            shapes,
        }
    }

    /// Services running on `date`.
    ///
    /// Weekly calendar rows contribute by weekday bit alone unless
    /// `enforce_window` also checks the row's validity range. Exception
    /// rows are applied additions first, removals last, so a removal
    /// wins whatever order the file lists them in.
    pub fn active_services(&self, date: NaiveDate, enforce_window: bool) -> HashSet<String> {
        let mut services: HashSet<String> = self
            .calendar
            .iter()
            .filter(|c| c.valid_weekday(date))
            .filter(|c| !enforce_window || (c.start_date <= date && date <= c.end_date))
            .map(|c| c.id.clone())
            .collect();

        for exception in &self.calendar_dates {
            if exception.date == date && exception.exception_type == Exception::Added {
                services.insert(exception.service_id.clone());
            }
        }
        for exception in &self.calendar_dates {
            if exception.date == date && exception.exception_type == Exception::Deleted {
                services.remove(&exception.service_id);
            }
        }
        services
    }

    /// Every date the feed claims to cover: the calendar's full
    /// validity range when present, otherwise the distinct dates with
    /// an addition exception.
    pub fn feed_dates(&self) -> Vec<NaiveDate> {
        let range = self
            .calendar
            .iter()
            .map(|c| c.start_date)
            .min()
            .zip(self.calendar.iter().map(|c| c.end_date).max());
        if let Some((start, end)) = range {
            return start.iter_days().take_while(|d| *d <= end).collect();
        }

        let mut dates: Vec<NaiveDate> = self
            .calendar_dates
            .iter()
            .filter(|e| e.exception_type == Exception::Added)
            .map(|e| e.date)
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Trips grouped by raw service id, preserving file order within
    /// each bucket. Set membership keeps the single scan cheap against
    /// large feeds.
    pub fn trips_for_services<'a>(
        &'a self,
        service_ids: &HashSet<String>,
    ) -> HashMap<&'a str, Vec<&'a Trip>> {
        let mut res: HashMap<&str, Vec<&Trip>> = HashMap::new();
        for trip in &self.trips {
            if service_ids.contains(&trip.service_id) {
                res.entry(&trip.service_id).or_default().push(trip);
            }
        }
        res
    }

    /// Stop times grouped by trip id, sorted by stop sequence whatever
    /// order the file had them in.
    pub fn stop_times_for_trips<'a>(
        &'a self,
        trip_ids: &HashSet<&str>,
    ) -> HashMap<&'a str, Vec<&'a StopTime>> {
        let mut res: HashMap<&str, Vec<&StopTime>> = HashMap::new();
        for st in &self.stop_times {
            if trip_ids.contains(st.trip_id.as_str()) {
                res.entry(&st.trip_id).or_default().push(st);
            }
        }
        for times in res.values_mut() {
            times.sort_by_key(|st| st.stop_sequence);
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture_feed() -> Feed {
        Feed::from_path("fixtures/basic").unwrap()
    }

    #[test]
    fn weekday_services() {
        let feed = fixture_feed();
        // 2025-01-06 is a Monday
        let monday = feed.active_services(date(2025, 1, 6), false);
        assert!(monday.contains("s1"));
        let tuesday = feed.active_services(date(2025, 1, 7), false);
        assert!(!tuesday.contains("s1"));
    }

    #[test]
    fn removal_wins_over_addition() {
        let feed = fixture_feed();
        // s3 has both an addition and a removal for 2025-01-06,
        // with the removal listed first
        let services = feed.active_services(date(2025, 1, 6), false);
        assert!(!services.contains("s3"));
    }

    #[test]
    fn removal_overrides_calendar() {
        let feed = fixture_feed();
        // s1 runs Mondays but is removed on 2025-01-13
        let services = feed.active_services(date(2025, 1, 13), false);
        assert!(!services.contains("s1"));
    }

    #[test]
    fn window_not_enforced_by_default() {
        let feed = fixture_feed();
        // s2 ends 2025-01-20 but stays active past it unless the
        // window check is opted into
        let past_end = date(2025, 2, 3);
        assert!(feed.active_services(past_end, false).contains("s2"));
        assert!(!feed.active_services(past_end, true).contains("s2"));
    }

    #[test]
    fn feed_dates_span_calendar_range() {
        let feed = fixture_feed();
        let dates = feed.feed_dates();
        assert_eq!(date(2025, 1, 1), dates[0]);
        assert_eq!(date(2025, 1, 31), *dates.last().unwrap());
        assert_eq!(31, dates.len());
    }

    #[test]
    fn feed_dates_fall_back_to_exceptions() {
        let mut feed = fixture_feed();
        feed.calendar.clear();
        let dates = feed.feed_dates();
        assert_eq!(vec![date(2025, 1, 6)], dates);
    }

    #[test]
    fn trips_grouped_by_service() {
        let feed = fixture_feed();
        let services: HashSet<String> = ["s1".to_owned()].into();
        let trips = feed.trips_for_services(&services);
        let ids: Vec<&str> = trips["s1"].iter().map(|t| t.id.as_str()).collect();
        assert_eq!(vec!["trip1", "trip2"], ids);
    }

    #[test]
    fn stop_times_sorted_by_sequence() {
        let feed = fixture_feed();
        // trip1's rows are listed out of order in the fixture
        let trip_ids: HashSet<&str> = ["trip1"].into();
        let times = feed.stop_times_for_trips(&trip_ids);
        let sequences: Vec<u32> = times["trip1"].iter().map(|st| st.stop_sequence).collect();
        assert_eq!(vec![1, 2, 3], sequences);
    }

    #[test]
    fn shapes_sorted_by_sequence() {
        let feed = fixture_feed();
        let points = &feed.shapes["shape1"];
        let sequences: Vec<usize> = points.iter().map(|p| p.sequence).collect();
        assert_eq!(vec![1, 2, 3], sequences);
    }
}
