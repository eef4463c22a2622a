use crate::objects::*;
use crate::Error;
use log::{error, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Row-level view of a feed directory, one `Vec` per table.
///
/// Loading is deliberately lenient: a missing table or a missing
/// required column yields an empty `Vec` and a log line, and malformed
/// rows are skipped individually, so one bad line never takes down a
/// whole run. Only a feed path that is not a directory at all is a
/// hard error.
#[derive(Debug, Default)]
pub struct RawFeed {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendar: Vec<Calendar>,
    pub calendar_dates: Vec<CalendarDate>,
    pub shapes: Vec<ShapePoint>,
}

fn read_objs<T, O>(mut reader: T, file_name: &str, required: &[&str]) -> Vec<O>
where
    for<'de> O: Deserialize<'de>,
    T: Read,
{
    // Some feeds start with a UTF-8 BOM
    let mut bom = [0; 3];
    if reader.read_exact(&mut bom).is_err() {
        warn!("{file_name} is empty, continuing with an empty table");
        return Vec::new();
    }
    let chained = if bom != [0xefu8, 0xbbu8, 0xbfu8] {
        bom.chain(reader)
    } else {
        [].chain(reader)
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(chained);

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            error!("{file_name}: could not read header: {e}");
            return Vec::new();
        }
    };

    let missing: Vec<&&str> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .collect();
    if !missing.is_empty() {
        error!("{file_name}: required columns missing from header: {missing:?}");
        return Vec::new();
    }

    let mut res = Vec::new();
    for (idx, rec) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let line = idx + 2;
        let record = match rec {
            Ok(r) => r,
            Err(e) => {
                warn!("{file_name}: skipping unreadable line {line}: {e}");
                continue;
            }
        };
        match record.deserialize(Some(&headers)) {
            Ok(o) => res.push(o),
            Err(e) => warn!("{file_name}: skipping malformed line {line}: {e}"),
        }
    }
    res
}

fn read_objs_from_path<O>(dir: &Path, file_name: &str) -> Vec<O>
where
    for<'de> O: Deserialize<'de>,
{
    read_objs_from_path_with_required(dir, file_name, &[])
}

fn read_objs_from_path_with_required<O>(dir: &Path, file_name: &str, required: &[&str]) -> Vec<O>
where
    for<'de> O: Deserialize<'de>,
{
    match File::open(dir.join(file_name)) {
        Ok(f) => read_objs(f, file_name, required),
        Err(_) => {
            warn!("{file_name} not found in feed, continuing with an empty table");
            Vec::new()
        }
    }
}

/// Checks one header column without parsing the table, so loaders can
/// warn once per feed about an absent optional column.
fn header_has_column(dir: &Path, file_name: &str, column: &str) -> bool {
    let file = match File::open(dir.join(file_name)) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(file);
    match reader.headers() {
        Ok(h) => h.iter().any(|c| c.trim_start_matches('\u{feff}') == column),
        Err(_) => false,
    }
}

impl RawFeed {
    /// Reads every table of an extracted feed directory.
    pub fn from_dir<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let p = path.as_ref();
        if !p.is_dir() {
            return Err(Error::NotFileNorDirectory(p.display().to_string()));
        }

        if p.join("routes.txt").is_file() && !header_has_column(p, "routes.txt", "route_color") {
            warn!("routes.txt has no route_color column, defaulting every route to 000000");
        }
        if p.join("stop_times.txt").is_file()
            && !header_has_column(p, "stop_times.txt", "shape_dist_traveled")
        {
            warn!("stop_times.txt has no shape_dist_traveled column, trip distances will be empty");
        }

        Ok(Self {
            stops: read_objs_from_path_with_required(p, "stops.txt", &["stop_id"]),
            routes: read_objs_from_path_with_required(
                p,
                "routes.txt",
                &["route_id", "route_short_name"],
            ),
            trips: read_objs_from_path_with_required(
                p,
                "trips.txt",
                &["trip_id", "route_id", "service_id"],
            ),
            stop_times: read_objs_from_path_with_required(
                p,
                "stop_times.txt",
                &[
                    "trip_id",
                    "arrival_time",
                    "departure_time",
                    "stop_id",
                    "stop_sequence",
                ],
            ),
            calendar: read_objs_from_path(p, "calendar.txt"),
            calendar_dates: read_objs_from_path(p, "calendar_dates.txt"),
            shapes: read_objs_from_path_with_required(
                p,
                "shapes.txt",
                &["shape_id", "shape_pt_lat", "shape_pt_lon", "shape_pt_sequence"],
            ),
        })
    }
}
