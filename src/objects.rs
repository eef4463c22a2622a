use crate::serde_helpers::*;
use chrono::{Datelike, NaiveDate, Weekday};
use rgb::RGB8;
use serde::Deserialize;
use std::fmt;

pub trait Id {
    fn id(&self) -> &str;
}

/// A transit stop from `stops.txt`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Stop {
    #[serde(rename = "stop_id")]
    pub id: String,
    /// Rider-facing code, used as the sharding key for stop boards.
    #[serde(rename = "stop_code", deserialize_with = "de_with_empty_string_none", default)]
    pub code: Option<String>,
    #[serde(rename = "stop_name", default)]
    pub name: String,
    #[serde(rename = "stop_desc", default)]
    pub description: String,
    #[serde(rename = "stop_lat", deserialize_with = "de_with_lenient_float", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "stop_lon", deserialize_with = "de_with_lenient_float", default)]
    pub longitude: Option<f64>,
}

impl Stop {
    /// The description wins over the name when it carries anything.
    pub fn display_name(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.name
        } else {
            &self.description
        }
    }
}

impl Id for Stop {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Route {
    #[serde(rename = "route_id")]
    pub id: String,
    #[serde(rename = "route_short_name", default)]
    pub short_name: String,
    #[serde(
        rename = "route_color",
        deserialize_with = "deserialize_route_color",
        default = "default_route_color"
    )]
    pub color: RGB8,
}

impl Id for Route {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.short_name)
    }
}

/// One scheduled vehicle journey from `trips.txt`.
///
/// `service_id` is the raw calendar identifier, not the canonical
/// grouping key an extractor may later derive from it.
#[derive(Debug, Deserialize, Clone)]
pub struct Trip {
    #[serde(rename = "trip_id")]
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    #[serde(rename = "trip_headsign", default)]
    pub headsign: String,
    #[serde(
        rename = "direction_id",
        deserialize_with = "deserialize_direction",
        default = "unknown_direction"
    )]
    pub direction_id: i8,
    #[serde(rename = "shape_id", deserialize_with = "de_with_empty_string_none", default)]
    pub shape_id: Option<String>,
}

impl Id for Trip {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "route id: {}, service id: {}",
            self.route_id, self.service_id
        )
    }
}

/// One row of `stop_times.txt`.
///
/// Times are kept as the raw GTFS strings: hours may exceed 23 for
/// trips running past midnight, and report code decides how to
/// normalize or sort them (see [crate::gtfs_time]).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StopTime {
    pub trip_id: String,
    #[serde(default)]
    pub arrival_time: String,
    #[serde(default)]
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    /// Cumulative distance along the trip's shape, in meters.
    #[serde(deserialize_with = "de_with_optional_float", default)]
    pub shape_dist_traveled: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Calendar {
    #[serde(rename = "service_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_bool")]
    pub monday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub tuesday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub wednesday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub thursday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub friday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub saturday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub sunday: bool,
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub end_date: NaiveDate,
}

impl Calendar {
    pub fn valid_weekday(&self, date: NaiveDate) -> bool {
        match date.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

impl Id for Calendar {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}—{}", self.start_date, self.end_date)
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Exception {
    #[serde(rename = "1")]
    Added,
    #[serde(rename = "2")]
    Deleted,
}

#[derive(Debug, Deserialize)]
pub struct CalendarDate {
    pub service_id: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub exception_type: Exception,
}

/// One vertex of a shape polyline from `shapes.txt`.
#[derive(Debug, Deserialize, Clone)]
pub struct ShapePoint {
    #[serde(rename = "shape_id")]
    pub id: String,
    #[serde(rename = "shape_pt_lat", default)]
    pub latitude: f64,
    #[serde(rename = "shape_pt_lon", default)]
    pub longitude: f64,
    #[serde(rename = "shape_pt_sequence")]
    pub sequence: usize,
}

impl Id for ShapePoint {
    fn id(&self) -> &str {
        &self.id
    }
}
