use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use gtfs_reports::report::{service, shapes, stop, ReportOptions};
use gtfs_reports::{Error, Feed, RollingDates, ServiceExtractor};
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gtfs-reports",
    about = "Generate timetable, stop-board and shape reports from a GTFS feed",
    version
)]
#[command(group(ArgGroup::new("source").required(true).args(["feed_dir", "feed_url"])))]
#[command(group(ArgGroup::new("dates").args(["all_dates", "start_date"])))]
struct Args {
    /// Directory with extracted GTFS tables
    #[arg(long)]
    feed_dir: Option<PathBuf>,

    /// URL of a GTFS zip to download (conditionally, unless forced)
    #[arg(long)]
    feed_url: Option<String>,

    /// Download even when the stored ETag/Last-Modified still matches
    #[arg(long)]
    force_download: bool,

    /// Generate for every date the feed's calendar covers
    #[arg(long)]
    all_dates: bool,

    /// First date to generate, YYYY-MM-DD
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last date to generate, defaults to the start date
    #[arg(long, requires = "start_date")]
    end_date: Option<NaiveDate>,

    /// Where the report trees are written
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Pretty-print generated JSON
    #[arg(long)]
    pretty: bool,

    /// Worker threads for per-date stop boards, 0 = all cores
    #[arg(long, default_value_t = 0)]
    jobs: usize,

    /// How raw service ids are grouped and named
    #[arg(long, value_enum, default_value_t = ServiceExtractor::Default)]
    service_extractor: ServiceExtractor,

    /// Reduce stop codes to bare digits without leading zeros
    #[arg(long)]
    numeric_stop_code: bool,

    /// JSON mapping of target dates to the source dates they borrow
    #[arg(long)]
    rolling_dates: Option<PathBuf>,

    /// Also check calendar rows' validity window, not just weekday bits
    #[arg(long)]
    enforce_calendar_window: bool,

    /// Generate HTML service timetables
    #[arg(long)]
    service_reports: bool,

    /// Generate per-stop JSON arrival boards
    #[arg(long)]
    stop_reports: bool,

    /// Generate GeoJSON shape files
    #[arg(long)]
    shape_reports: bool,
}

fn resolve_feed_dir(args: &Args) -> Result<Option<PathBuf>, Error> {
    if let Some(dir) = &args.feed_dir {
        return Ok(Some(dir.clone()));
    }
    #[cfg(feature = "read-url")]
    if let Some(url) = &args.feed_url {
        info!("downloading feed from {url}");
        let feed_dir = args.output_dir.join("feed");
        return gtfs_reports::download::download_feed(url, &feed_dir, args.force_download);
    }
    Err(Error::MissingFile("no feed source given".to_owned()))
}

fn date_list(args: &Args, feed: &Feed) -> Result<Vec<NaiveDate>, Error> {
    if args.all_dates {
        return Ok(feed.feed_dates());
    }
    // No explicit range: rolling-date expansion alone decides
    let Some(start) = args.start_date else {
        return Ok(Vec::new());
    };
    let end = args.end_date.unwrap_or(start);
    if end < start {
        return Err(Error::InvalidDate(format!(
            "end date {end} is before start date {start}"
        )));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

/// Runs every requested report family; returns how many per-unit
/// failures were recorded across all of them.
fn run(args: &Args) -> Result<usize, Error> {
    let Some(feed_dir) = resolve_feed_dir(args)? else {
        info!("remote feed unchanged, nothing to regenerate");
        return Ok(0);
    };

    let rolling = match &args.rolling_dates {
        Some(path) => RollingDates::from_path(path)?,
        None => RollingDates::empty(),
    };

    let feed = Feed::from_path(&feed_dir)?;
    if feed.stops.is_empty() {
        return Err(Error::NoStops);
    }
    info!(
        "feed loaded: {} stops, {} routes, {} trips, {} stop times",
        feed.stops.len(),
        feed.routes.len(),
        feed.trips.len(),
        feed.stop_times.len()
    );

    let dates = rolling.expand_date_list(&date_list(args, &feed)?);
    if dates.is_empty() {
        return Err(Error::NoDates);
    }
    info!("processing {} dates ({} to {})", dates.len(), dates[0], dates[dates.len() - 1]);

    let options = ReportOptions {
        output_dir: args.output_dir.clone(),
        pretty: args.pretty,
        extractor: args.service_extractor,
        numeric_stop_code: args.numeric_stop_code,
        jobs: args.jobs,
        enforce_calendar_window: args.enforce_calendar_window,
    };

    let mut failures = 0;
    if args.service_reports {
        failures += service::generate_service_reports(&feed, &dates, &rolling, &options)?.failures;
    }
    if args.stop_reports {
        failures += stop::generate_stop_reports(&feed, &dates, &rolling, &options)?.failures;
    }
    if args.shape_reports {
        failures += shapes::generate_shape_reports(&feed, &options)?.failures;
    }
    Ok(failures)
}

fn main() {
    if SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .is_err()
    {
        eprintln!("could not initialize logging");
    }

    let args = Args::parse();

    if !args.service_reports && !args.stop_reports && !args.shape_reports {
        error!("nothing to do: pass at least one of --service-reports, --stop-reports, --shape-reports");
        std::process::exit(1);
    }
    if !args.all_dates && args.start_date.is_none() && args.rolling_dates.is_none() {
        error!("nothing to generate for: pass --all-dates, --start-date or --rolling-dates");
        std::process::exit(1);
    }
    #[cfg(not(feature = "read-url"))]
    if args.feed_url.is_some() {
        error!("this build has no download support, use --feed-dir");
        std::process::exit(1);
    }

    match run(&args) {
        Ok(0) => {}
        Ok(failures) => {
            error!("completed with {failures} failed report units");
            std::process::exit(1);
        }
        Err(e) => {
            error!("fatal: {e}");
            std::process::exit(1);
        }
    }
}
