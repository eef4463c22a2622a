pub mod render;
pub mod service;
pub mod shapes;
pub mod stop;

use crate::extractor::ServiceExtractor;
use crate::objects::Stop;
use crate::Error;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Settings shared by every report family, resolved once from the CLI
/// and passed explicitly down the pipeline.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_dir: PathBuf,
    pub pretty: bool,
    pub extractor: ServiceExtractor,
    pub numeric_stop_code: bool,
    pub jobs: usize,
    pub enforce_calendar_window: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            pretty: false,
            extractor: ServiceExtractor::Default,
            numeric_stop_code: false,
            jobs: 0,
            enforce_calendar_window: false,
        }
    }
}

/// Serializes `value` to `path`, compact or pretty per the options.
pub fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    if pretty {
        serde_json::to_writer_pretty(file, value)?;
    } else {
        serde_json::to_writer(file, value)?;
    }
    Ok(())
}

/// Normalizes a rider-facing stop code, optionally to bare digits with
/// leading zeros dropped. Returns `None` when nothing survives.
pub fn normalize_stop_code(code: &str, numeric_only: bool) -> Option<String> {
    if !numeric_only {
        return if code.is_empty() {
            None
        } else {
            Some(code.to_owned())
        };
    }
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    let trimmed = digits.trim_start_matches('0');
    match (trimmed, digits.as_str()) {
        ("", "") => None,
        ("", _) => Some("0".to_owned()),
        (t, _) => Some(t.to_owned()),
    }
}

/// Reverse lookup from stop id to its normalized code; stops with no
/// usable code are absent and never shard a board file.
pub fn stop_code_index(
    stops: &HashMap<String, Stop>,
    numeric_only: bool,
) -> HashMap<&str, String> {
    stops
        .iter()
        .filter_map(|(id, stop)| {
            let code = stop.code.as_deref()?;
            Some((id.as_str(), normalize_stop_code(code, numeric_only)?))
        })
        .collect()
}

/// Kilometers with two decimals, the display convention of every
/// distance in the reports.
pub fn format_km(km: f64) -> String {
    format!("{km:.2}")
}
