use crate::Error;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

lazy_static! {
    static ref VGO_SERVICE_ID: Regex = Regex::new(r"^.*_(\d{6})$").unwrap();
}

/// Strategy for turning opaque GTFS service identifiers into a
/// canonical grouping key and a display name.
///
/// Several trips of one line/shift often hide behind distinct raw
/// service ids; the extractor decides which of those ids mean "the
/// same service" and what to call the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ServiceExtractor {
    /// Canonical id and name are the raw id itself.
    #[default]
    Default,
    /// `[service_code][calendar_type:2][departure_time:4]`, name drops
    /// the trailing 6 characters.
    #[value(name = "lcg_muni")]
    LcgMuni,
    /// `<free text>_<6 digits>`, canonical id is the suffix; name is
    /// built from its line and shift halves.
    #[value(name = "vgo_muni")]
    VgoMuni,
}

impl ServiceExtractor {
    /// Canonical grouping key for a raw service id.
    pub fn actual_service_id(&self, service_id: &str) -> Result<String, Error> {
        match self {
            Self::Default | Self::LcgMuni => Ok(service_id.to_owned()),
            Self::VgoMuni => match VGO_SERVICE_ID.captures(service_id) {
                Some(captures) => Ok(captures[1].to_owned()),
                None => {
                    warn!("service id '{service_id}' does not look like a VGO id, keeping it raw");
                    Ok(service_id.to_owned())
                }
            },
        }
    }

    /// Human-readable name for a raw service id.
    pub fn service_name(&self, service_id: &str) -> Result<String, Error> {
        match self {
            Self::Default => Ok(service_id.to_owned()),
            Self::LcgMuni => {
                if service_id.len() < 7 {
                    return Err(Error::InvalidServiceId(service_id.to_owned()));
                }
                Ok(service_id[..service_id.len() - 6].to_owned())
            }
            Self::VgoMuni => match VGO_SERVICE_ID.captures(service_id) {
                Some(captures) => {
                    let code = &captures[1];
                    let line = &code[..3];
                    let shift = code[3..].trim_start_matches('0');
                    let shift = if shift.is_empty() { "0" } else { shift };
                    Ok(format!("{}-{}º ({})", vgo_line_name(line), shift, code))
                }
                None => {
                    warn!("service id '{service_id}' does not look like a VGO id, keeping it raw");
                    Ok(service_id.to_owned())
                }
            },
        }
    }
}

/// Display names for VGO line numbers; lines without a special name
/// are shown as `L{number}`.
fn vgo_line_name(line: &str) -> String {
    match line {
        "931" => "N1".to_owned(),
        "932" => "N2".to_owned(),
        "933" => "N4".to_owned(),
        "934" => "C3".to_owned(),
        _ => format!("L{}", line.trim_start_matches('0')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let e = ServiceExtractor::Default;
        assert_eq!("S_42", e.actual_service_id("S_42").unwrap());
        assert_eq!("S_42", e.service_name("S_42").unwrap());
    }

    #[test]
    fn lcg_drops_calendar_and_departure_suffix() {
        let e = ServiceExtractor::LcgMuni;
        assert_eq!("100", e.service_name("100010731").unwrap());
        assert_eq!("100010731", e.actual_service_id("100010731").unwrap());
    }

    #[test]
    fn lcg_rejects_short_ids() {
        let e = ServiceExtractor::LcgMuni;
        assert!(matches!(
            e.service_name("100"),
            Err(Error::InvalidServiceId(_))
        ));
    }

    #[test]
    fn vgo_splits_line_and_shift() {
        let e = ServiceExtractor::VgoMuni;
        assert_eq!("001001", e.actual_service_id("C1 01LPV00_001001").unwrap());
        assert_eq!(
            "L1-1º (001001)",
            e.service_name("C1 01LPV00_001001").unwrap()
        );
    }

    #[test]
    fn vgo_named_night_line() {
        let e = ServiceExtractor::VgoMuni;
        assert_eq!("N1-3º (931003)", e.service_name("X_931003").unwrap());
    }

    #[test]
    fn vgo_malformed_id_passes_through() {
        let e = ServiceExtractor::VgoMuni;
        assert_eq!("no suffix here", e.actual_service_id("no suffix here").unwrap());
        assert_eq!("no suffix here", e.service_name("no suffix here").unwrap());
    }
}
