use crate::Error;
use chrono::NaiveDate;
use log::info;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Target-to-source date substitutions for dates the feed does not
/// cover yet.
///
/// A "rolling" target date borrows the schedule of its configured
/// source date, but every output for it is still filed under the
/// target date. The mapping is loaded once and validated eagerly, a
/// malformed config is fatal before any processing starts.
#[derive(Debug, Default, Clone)]
pub struct RollingDates {
    mappings: BTreeMap<NaiveDate, NaiveDate>,
}

fn parse_config_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_owned()))
}

impl RollingDates {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a JSON object of `"YYYY-MM-DD": "YYYY-MM-DD"` entries.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let p = path.as_ref();
        let file = File::open(p).map_err(|source| Error::NamedFileIO {
            file_name: p.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_reader(file)?;
        let object = value.as_object().ok_or_else(|| {
            Error::RollingConfig("top level must be a JSON object".to_owned())
        })?;

        let mut mappings = BTreeMap::new();
        for (target, source) in object {
            let source = source.as_str().ok_or_else(|| {
                Error::RollingConfig(format!("value for '{target}' must be a date string"))
            })?;
            mappings.insert(parse_config_date(target)?, parse_config_date(source)?);
        }
        info!("loaded {} rolling date substitutions", mappings.len());
        Ok(Self { mappings })
    }

    pub fn is_rolling(&self, date: NaiveDate) -> bool {
        self.mappings.contains_key(&date)
    }

    pub fn source_for(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.mappings.get(&date).copied()
    }

    /// The date whose feed data answers queries for `date`: its
    /// configured source when rolling, otherwise `date` itself.
    pub fn query_date(&self, date: NaiveDate) -> NaiveDate {
        self.source_for(date).unwrap_or(date)
    }

    /// Sorted, de-duplicated union of the requested dates and every
    /// configured target date. Targets are always generated, even when
    /// nobody asked for them.
    pub fn expand_date_list(&self, requested: &[NaiveDate]) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = requested
            .iter()
            .copied()
            .chain(self.mappings.keys().copied())
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn loads_and_substitutes() {
        let rolling = RollingDates::from_path("fixtures/rolling/valid.json").unwrap();
        assert!(rolling.is_rolling(date(2025, 5, 1)));
        assert_eq!(Some(date(2025, 1, 6)), rolling.source_for(date(2025, 5, 1)));
        assert_eq!(date(2025, 1, 6), rolling.query_date(date(2025, 5, 1)));
        assert_eq!(date(2025, 1, 7), rolling.query_date(date(2025, 1, 7)));
    }

    #[test]
    fn rejects_non_object_top_level() {
        assert!(matches!(
            RollingDates::from_path("fixtures/rolling/non_object.json"),
            Err(Error::RollingConfig(_))
        ));
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(matches!(
            RollingDates::from_path("fixtures/rolling/bad_value.json"),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(
            RollingDates::from_path("fixtures/rolling/bad_key.json"),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            RollingDates::from_path("fixtures/rolling/malformed.json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn missing_config_is_fatal() {
        assert!(matches!(
            RollingDates::from_path("fixtures/rolling/no_such.json"),
            Err(Error::NamedFileIO { .. })
        ));
    }

    #[test]
    fn expansion_unions_targets_and_is_idempotent() {
        let rolling = RollingDates::from_path("fixtures/rolling/valid.json").unwrap();
        let requested = vec![date(2025, 5, 1), date(2025, 1, 10)];
        let expanded = rolling.expand_date_list(&requested);
        assert_eq!(
            vec![date(2025, 1, 10), date(2025, 5, 1), date(2025, 5, 2)],
            expanded
        );
        assert_eq!(expanded, rolling.expand_date_list(&expanded));
    }
}
