//! Per-date HTML service timetables.
//!
//! Raw service ids active on a date are regrouped into canonical
//! services by the configured extractor; each canonical service gets
//! one HTML page listing its trips with first/last stop, times and
//! distance.

use super::{format_km, render, write_json, ReportOptions};
use crate::extractor::ServiceExtractor;
use crate::feed::Feed;
use crate::gtfs_time::time_to_seconds;
use crate::objects::{StopTime, Trip};
use crate::rolling::RollingDates;
use crate::Error;
use chrono::NaiveDate;
use log::{info, warn};
use rgb::RGB8;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct TripRow {
    pub trip_id: String,
    pub route_short_name: String,
    pub route_color: RGB8,
    pub headsign: String,
    pub first_stop_name: String,
    pub first_stop_code: String,
    pub first_arrival: String,
    pub last_stop_name: String,
    pub last_stop_code: String,
    pub last_arrival: String,
    pub distance: String,
}

/// Everything one timetable page needs, for one canonical service on
/// one date.
#[derive(Debug)]
pub struct ServiceReport {
    pub service_id: String,
    pub service_name: String,
    pub original_service_ids: Vec<String>,
    pub date: NaiveDate,
    pub trip_rows: Vec<TripRow>,
    pub total_distance: String,
    pub total_trips: usize,
}

#[derive(Debug, Serialize)]
struct ServiceIndexEntry {
    service_id: String,
    service_name: String,
    total_trips: usize,
}

#[derive(Debug, Serialize)]
struct DateIndex {
    date: NaiveDate,
    services: Vec<ServiceIndexEntry>,
}

#[derive(Debug, Default, Serialize)]
pub struct ServiceReportSummary {
    pub generated_dates: Vec<NaiveDate>,
    pub total_reports: usize,
    pub failures: usize,
}

/// Applies the extractor with the uniform fallback: any extraction
/// error keeps the raw id for that one service.
fn canonical_parts(extractor: ServiceExtractor, service_id: &str) -> (String, String) {
    let canonical = extractor
        .actual_service_id(service_id)
        .unwrap_or_else(|e| {
            warn!("could not extract canonical id for '{service_id}': {e}, keeping it raw");
            service_id.to_owned()
        });
    let name = extractor.service_name(service_id).unwrap_or_else(|e| {
        warn!("could not extract a name for '{service_id}': {e}, keeping it raw");
        service_id.to_owned()
    });
    (canonical, name)
}

struct CanonicalGroup<'a> {
    name: String,
    original_ids: BTreeSet<&'a str>,
    trips: Vec<&'a Trip>,
}

/// Groups raw-service trip buckets under their canonical key.
fn group_by_canonical<'a>(
    extractor: ServiceExtractor,
    trips_by_service: &HashMap<&'a str, Vec<&'a Trip>>,
) -> BTreeMap<String, CanonicalGroup<'a>> {
    let mut groups: BTreeMap<String, CanonicalGroup> = BTreeMap::new();
    for (&service_id, trips) in trips_by_service {
        let (canonical, name) = canonical_parts(extractor, service_id);
        let group = groups.entry(canonical).or_insert_with(|| CanonicalGroup {
            name,
            original_ids: BTreeSet::new(),
            trips: Vec::new(),
        });
        group.original_ids.insert(service_id);
        group.trips.extend(trips.iter().copied());
    }
    groups
}

fn trip_row(
    feed: &Feed,
    trip: &Trip,
    stop_times: &[&StopTime],
) -> Option<(TripRow, f64)> {
    let first = stop_times.first()?;
    let last = stop_times.last()?;

    let stop_info = |stop_id: &str| -> (String, String) {
        match feed.stops.get(stop_id) {
            Some(s) => (
                s.display_name().to_owned(),
                s.code.clone().unwrap_or_default(),
            ),
            None => ("Unknown".to_owned(), String::new()),
        }
    };
    let (first_stop_name, first_stop_code) = stop_info(&first.stop_id);
    let (last_stop_name, last_stop_code) = stop_info(&last.stop_id);

    let distance_km = match (first.shape_dist_traveled, last.shape_dist_traveled) {
        (Some(start), Some(end)) => (end - start) / 1000.0,
        _ => 0.0,
    };

    let (route_short_name, route_color) = match feed.routes.get(&trip.route_id) {
        Some(route) => (route.short_name.clone(), route.color),
        None => {
            warn!("trip {} references unknown route {}", trip.id, trip.route_id);
            (trip.route_id.clone(), crate::serde_helpers::default_route_color())
        }
    };

    let row = TripRow {
        trip_id: trip.id.clone(),
        route_short_name,
        route_color,
        headsign: trip.headsign.clone(),
        first_stop_name,
        first_stop_code,
        first_arrival: first.arrival_time.clone(),
        last_stop_name,
        last_stop_code,
        last_arrival: last.arrival_time.clone(),
        distance: format_km(distance_km),
    };
    Some((row, distance_km))
}

fn build_report(
    feed: &Feed,
    date: NaiveDate,
    canonical_id: String,
    group: &CanonicalGroup,
    stop_times_by_trip: &HashMap<&str, Vec<&StopTime>>,
) -> ServiceReport {
    let mut trip_rows = Vec::new();
    let mut total_distance = 0.0;
    for trip in &group.trips {
        let Some(stop_times) = stop_times_by_trip.get(trip.id.as_str()) else {
            continue;
        };
        if let Some((row, distance)) = trip_row(feed, trip, stop_times) {
            trip_rows.push(row);
            total_distance += distance;
        }
    }
    trip_rows.sort_by_key(|row| time_to_seconds(&row.first_arrival));

    let total_trips = trip_rows.len();
    ServiceReport {
        service_id: canonical_id,
        service_name: group.name.clone(),
        original_service_ids: group.original_ids.iter().map(|s| s.to_string()).collect(),
        date,
        trip_rows,
        total_distance: format_km(total_distance),
        total_trips,
    }
}

/// Generates timetables for every date, sequentially.
///
/// Trips and stop times are loaded once for the union of services
/// across all dates and filtered per date in memory.
pub fn generate_service_reports(
    feed: &Feed,
    dates: &[NaiveDate],
    rolling: &RollingDates,
    options: &ReportOptions,
) -> Result<ServiceReportSummary, Error> {
    if feed.stops.is_empty() {
        return Err(Error::NoStops);
    }
    if dates.is_empty() {
        return Err(Error::NoDates);
    }

    // Union of active services across all dates, loaded once
    let mut union_services: HashSet<String> = HashSet::new();
    for &date in dates {
        let query = rolling.query_date(date);
        union_services.extend(feed.active_services(query, options.enforce_calendar_window));
    }
    let all_trips = feed.trips_for_services(&union_services);
    let all_trip_ids: HashSet<&str> = all_trips
        .values()
        .flatten()
        .map(|t| t.id.as_str())
        .collect();
    let all_stop_times = feed.stop_times_for_trips(&all_trip_ids);
    info!(
        "loaded {} services, {} trips with stop times for the whole date range",
        union_services.len(),
        all_trip_ids.len()
    );

    let mut summary = ServiceReportSummary::default();
    for &date in dates {
        let query = rolling.query_date(date);
        let active = feed.active_services(query, options.enforce_calendar_window);
        if active.is_empty() {
            info!("no active services on {date}, skipping");
            continue;
        }

        let trips_today: HashMap<&str, Vec<&Trip>> = all_trips
            .iter()
            .filter(|(id, _)| active.contains(**id))
            .map(|(id, trips)| (*id, trips.clone()))
            .collect();
        let groups = group_by_canonical(options.extractor, &trips_today);

        let date_dir = options.output_dir.join("services").join(date.to_string());
        std::fs::create_dir_all(&date_dir)?;

        let mut entries = Vec::new();
        for (canonical_id, group) in &groups {
            let report = build_report(feed, date, canonical_id.clone(), group, &all_stop_times);
            let path = date_dir.join(format!("{canonical_id}.html"));
            match std::fs::write(&path, render::render_service_html(&report)) {
                Ok(()) => {
                    entries.push(ServiceIndexEntry {
                        service_id: report.service_id,
                        service_name: report.service_name,
                        total_trips: report.total_trips,
                    });
                    summary.total_reports += 1;
                }
                Err(e) => {
                    warn!("could not write {}: {e}", path.display());
                    summary.failures += 1;
                }
            }
        }

        write_json(
            &date_dir.join("index.json"),
            &DateIndex {
                date,
                services: entries,
            },
            options.pretty,
        )?;
        summary.generated_dates.push(date);
    }

    info!(
        "service reports done: {} pages over {} dates, {} failures",
        summary.total_reports,
        summary.generated_dates.len(),
        summary.failures
    );
    Ok(summary)
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

    fn rows_for(feed: &Feed, day: NaiveDate, extractor: ServiceExtractor) -> Vec<ServiceReport> {
        let active = feed.active_services(day, false);
        let trips = feed.trips_for_services(&active);
        let trip_ids: HashSet<&str> = trips.values().flatten().map(|t| t.id.as_str()).collect();
        let stop_times = feed.stop_times_for_trips(&trip_ids);
        group_by_canonical(extractor, &trips)
            .into_iter()
            .map(|(id, group)| build_report(feed, day, id, &group, &stop_times))
            .collect()
    }

    #[test]
    fn trip_rows_sorted_by_first_arrival() {
        let feed = fixture_feed();
        let reports = rows_for(&feed, date(2025, 1, 6), ServiceExtractor::Default);
        let report = reports
            .iter()
            .find(|r| r.service_id == "s1")
            .unwrap();
        assert_eq!(2, report.total_trips);
        let first_arrivals: Vec<&str> = report
            .trip_rows
            .iter()
            .map(|r| r.first_arrival.as_str())
            .collect();
        assert_eq!(vec!["08:00:00", "23:50:00"], first_arrivals);
    }

    #[test]
    fn distance_is_km_with_two_decimals() {
        let feed = fixture_feed();
        let reports = rows_for(&feed, date(2025, 1, 6), ServiceExtractor::Default);
        let report = reports
            .iter()
            .find(|r| r.service_id == "s1")
            .unwrap();
        let trip1 = report
            .trip_rows
            .iter()
            .find(|r| r.trip_id == "trip1")
            .unwrap();
        // shape_dist_traveled goes 0 -> 2400 meters
        assert_eq!("2.40", trip1.distance);
    }

    #[test]
    fn unknown_route_degrades_to_route_id() {
        let mut feed = fixture_feed();
        feed.routes.clear();
        let reports = rows_for(&feed, date(2025, 1, 6), ServiceExtractor::Default);
        let report = reports
            .iter()
            .find(|r| r.service_id == "s1")
            .unwrap();
        assert_eq!("R1", report.trip_rows[0].route_short_name);
    }

    #[test]
    fn extraction_error_falls_back_to_raw_id() {
        let feed = fixture_feed();
        // "s1" is shorter than 7 characters, LCG rejects it and
        // the grouping keeps the raw id
        let reports = rows_for(&feed, date(2025, 1, 6), ServiceExtractor::LcgMuni);
        assert!(reports.iter().any(|r| r.service_name == "s1"));
    }

    #[test]
    fn canonical_grouping_merges_and_sorts_originals() {
        // both ids extract to canonical "931001"
        let mut synthetic: HashMap<&str, Vec<&Trip>> = HashMap::new();
        let t1 = Trip {
            id: "a".into(),
            route_id: "R1".into(),
            service_id: "X_931001".into(),
            headsign: String::new(),
            direction_id: -1,
            shape_id: None,
        };
        let t2 = Trip {
            id: "b".into(),
            route_id: "R1".into(),
            service_id: "Y_931001".into(),
            headsign: String::new(),
            direction_id: -1,
            shape_id: None,
        };
        synthetic.insert("Y_931001", vec![&t2]);
        synthetic.insert("X_931001", vec![&t1]);
        let groups = group_by_canonical(ServiceExtractor::VgoMuni, &synthetic);
        assert_eq!(1, groups.len());
        let group = &groups["931001"];
        assert_eq!(
            vec!["X_931001", "Y_931001"],
            group.original_ids.iter().copied().collect::<Vec<_>>()
        );
        assert_eq!(2, group.trips.len());
    }
}
