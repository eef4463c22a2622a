//! Per-stop JSON arrival boards.
//!
//! Each date gets one JSON file per stop code listing every arrival of
//! that day in time order. A day's board mixes two sources: same-day
//! services with ordinary times, and previous-day services whose trips
//! run past midnight (their over-24h times normalize into the small
//! hours of this day). Dates are independent of each other, so they
//! are processed by scoped worker threads and only joined at the end.

use super::{stop_code_index, write_json, ReportOptions};
use crate::feed::Feed;
use crate::gtfs_time::{normalize_gtfs_time, time_to_seconds};
use crate::rolling::RollingDates;
use crate::serde_helpers::format_color;
use crate::street::street_name;
use crate::Error;
use chrono::{Days, NaiveDate};
use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
pub struct Arrival {
    pub trip_id: String,
    pub route_id: String,
    pub line: String,
    pub color: String,
    pub headsign: String,
    pub direction_id: i8,
    pub service_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_sequence: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_dist_traveled: Option<f64>,
    pub next_streets: Vec<String>,
    #[serde(skip)]
    sort_seconds: u32,
}

#[derive(Debug, Serialize)]
struct StopIndexEntry {
    stop_code: String,
    arrivals: usize,
}

#[derive(Debug, Serialize)]
struct DateIndex {
    date: NaiveDate,
    stops: Vec<StopIndexEntry>,
}

#[derive(Debug, Serialize)]
struct TopIndex {
    dates: Vec<NaiveDate>,
}

#[derive(Debug, Default, Serialize)]
pub struct StopReportSummary {
    pub generated_dates: Vec<NaiveDate>,
    pub total_stops: usize,
    pub failures: usize,
}

/// Arrivals for one date, keyed by normalized stop code.
pub fn build_stop_arrivals(
    feed: &Feed,
    date: NaiveDate,
    rolling: &RollingDates,
    options: &ReportOptions,
) -> BTreeMap<String, Vec<Arrival>> {
    let query = rolling.query_date(date);
    // Previous day relative to the date actually queried, so a rolling
    // target borrows its source's overnight trips too
    let previous = query - Days::new(1);

    let active_today = feed.active_services(query, options.enforce_calendar_window);
    let active_previous = feed.active_services(previous, options.enforce_calendar_window);
    if active_today.is_empty() && active_previous.is_empty() {
        info!("no active services around {date}, board will be empty");
        return BTreeMap::new();
    }

    let union: HashSet<String> = active_today
        .iter()
        .chain(active_previous.iter())
        .cloned()
        .collect();
    let trips = feed.trips_for_services(&union);
    let trip_ids: HashSet<&str> = trips.values().flatten().map(|t| t.id.as_str()).collect();
    let stop_times = feed.stop_times_for_trips(&trip_ids);
    let codes = stop_code_index(&feed.stops, options.numeric_stop_code);

    let mut boards: BTreeMap<String, Vec<Arrival>> = BTreeMap::new();
    for (service_id, trip_list) in &trips {
        let runs_today = active_today.contains(*service_id);
        let runs_previous = active_previous.contains(*service_id);
        for trip in trip_list {
            let (line, color) = match feed.routes.get(&trip.route_id) {
                Some(route) => (route.short_name.clone(), format_color(&route.color)),
                None => {
                    warn!("trip {} references unknown route {}", trip.id, trip.route_id);
                    (String::new(), String::new())
                }
            };
            let Some(trip_stops) = stop_times.get(trip.id.as_str()) else {
                continue;
            };

            for (i, stop_time) in trip_stops.iter().enumerate() {
                let Some(code) = codes.get(stop_time.stop_id.as_str()) else {
                    continue;
                };
                let (arrival, next_day) = normalize_gtfs_time(&stop_time.arrival_time);
                // An arrival belongs to this day either as a same-day
                // time of a service running today, or as a next-day
                // time of a service that ran yesterday
                let included = (runs_today && !next_day) || (runs_previous && next_day);
                if !included {
                    continue;
                }
                let (departure, _) = normalize_gtfs_time(&stop_time.departure_time);

                let next_streets: Vec<String> = trip_stops[i + 1..]
                    .iter()
                    .filter_map(|st| feed.stops.get(&st.stop_id))
                    .map(|s| street_name(s.display_name()))
                    .filter(|name| !name.is_empty())
                    .dedup()
                    .collect();

                boards.entry(code.clone()).or_default().push(Arrival {
                    trip_id: trip.id.clone(),
                    route_id: trip.route_id.clone(),
                    line: line.clone(),
                    color: color.clone(),
                    headsign: trip.headsign.clone(),
                    direction_id: trip.direction_id,
                    service_id: (*service_id).to_owned(),
                    sort_seconds: time_to_seconds(&arrival),
                    arrival_time: arrival,
                    departure_time: departure,
                    stop_sequence: stop_time.stop_sequence,
                    shape_dist_traveled: stop_time.shape_dist_traveled,
                    next_streets,
                });
            }
        }
    }

    for arrivals in boards.values_mut() {
        arrivals.sort_by_key(|a| a.sort_seconds);
    }
    boards
}

type DateBoards = (NaiveDate, BTreeMap<String, Vec<Arrival>>);

/// Runs `build_stop_arrivals` for every date across worker threads.
///
/// Dates are split into one chunk per worker; a chunk whose thread
/// cannot be spawned is processed inline instead, so a failing
/// dispatch degrades to sequential work rather than losing dates.
fn compute_all_dates(
    feed: &Feed,
    dates: &[NaiveDate],
    rolling: &RollingDates,
    options: &ReportOptions,
) -> Vec<DateBoards> {
    let jobs = if options.jobs > 0 {
        options.jobs
    } else {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    };
    let jobs = jobs.min(dates.len()).max(1);

    if jobs == 1 {
        return dates
            .iter()
            .map(|&d| (d, build_stop_arrivals(feed, d, rolling, options)))
            .collect();
    }

    let chunk_size = dates.len().div_ceil(jobs);
    let results: Mutex<Vec<DateBoards>> = Mutex::new(Vec::with_capacity(dates.len()));
    let process = |chunk: &[NaiveDate]| {
        for &date in chunk {
            let boards = build_stop_arrivals(feed, date, rolling, options);
            // A poisoned lock must not lose the date, the data itself
            // is still sound
            results
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((date, boards));
        }
    };
    std::thread::scope(|scope| {
        for chunk in dates.chunks(chunk_size) {
            let spawned = std::thread::Builder::new()
                .name("stop-report-worker".to_owned())
                .spawn_scoped(scope, || process(chunk));
            if let Err(e) = spawned {
                warn!("could not spawn a worker thread ({e}), processing chunk inline");
                process(chunk);
            }
        }
    });

    let mut results = results.into_inner().unwrap_or_else(|e| e.into_inner());
    results.sort_by_key(|(date, _)| *date);
    results
}

/// Generates the stop boards for every date and the index files tying
/// them together.
pub fn generate_stop_reports(
    feed: &Feed,
    dates: &[NaiveDate],
    rolling: &RollingDates,
    options: &ReportOptions,
) -> Result<StopReportSummary, Error> {
    if feed.stops.is_empty() {
        return Err(Error::NoStops);
    }
    if dates.is_empty() {
        return Err(Error::NoDates);
    }
    info!("generating stop boards for {} dates", dates.len());

    let results = compute_all_dates(feed, dates, rolling, options);

    let mut summary = StopReportSummary::default();
    let stops_dir = options.output_dir.join("stops");
    for (date, boards) in results {
        if boards.is_empty() {
            continue;
        }
        let date_dir = stops_dir.join(date.to_string());
        let mut entries = Vec::new();
        for (code, arrivals) in &boards {
            let path = date_dir.join(format!("{code}.json"));
            match write_json(&path, arrivals, options.pretty) {
                Ok(()) => {
                    entries.push(StopIndexEntry {
                        stop_code: code.clone(),
                        arrivals: arrivals.len(),
                    });
                    summary.total_stops += 1;
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
                stops: entries,
            },
            options.pretty,
        )?;
        summary.generated_dates.push(date);
    }

    write_json(
        &stops_dir.join("index.json"),
        &TopIndex {
            dates: summary.generated_dates.clone(),
        },
        options.pretty,
    )?;
    info!(
        "stop boards done: {} files over {} dates, {} failures",
        summary.total_stops,
        summary.generated_dates.len(),
        summary.failures
    );
    Ok(summary)
}
