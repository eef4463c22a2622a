//! Generate reports from [GTFS](https://gtfs.org/) public transit
//! feeds: HTML timetables per service, JSON arrival boards per stop,
//! and GeoJSON exports of the route shapes.
//!
//! The pipeline loads the feed's flat tables once into a [Feed],
//! resolves which services run on each requested date (including
//! calendar exceptions and rolling-date substitution), correlates
//! services to trips and ordered stop times, and hands the result to
//! the report builders under [report].
//!
//! ```no_run
//! use gtfs_reports::Feed;
//!
//! let feed = Feed::from_path("path/to/feed").unwrap();
//! println!("there are {} stops in the feed", feed.stops.len());
//! ```

#[cfg(feature = "read-url")]
pub mod download;
pub mod error;
pub mod extractor;
pub mod feed;
pub mod gtfs_time;
pub mod objects;
pub mod raw_feed;
pub mod report;
pub mod rolling;
pub mod serde_helpers;
pub mod street;

pub use error::Error;
pub use extractor::ServiceExtractor;
pub use feed::Feed;
pub use raw_feed::RawFeed;
pub use rolling::RollingDates;
