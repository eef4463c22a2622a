use chrono::NaiveDate;
use rgb::RGB8;
use serde::de::{Deserialize, Deserializer};

/// Parses a GTFS date column (`YYYYMMDD`, no separators).
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&s, "%Y%m%d").map_err(serde::de::Error::custom)
}

pub fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.as_str() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(serde::de::Error::custom(format!(
            "Invalid value `{s}`, expected 0 or 1"
        ))),
    }
}

pub fn de_with_optional_float<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(de)?.unwrap_or_default();
    let s = s.trim();
    if s.is_empty() {
        Ok(None)
    } else {
        s.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

/// Like [de_with_optional_float] but an unparseable value becomes `None`
/// instead of rejecting the row. Used for stop coordinates, which are
/// allowed to be garbage in real-world feeds.
pub fn de_with_lenient_float<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(de)?.unwrap_or_default();
    Ok(s.trim().parse().ok())
}

/// An empty string column becomes `None`.
pub fn de_with_empty_string_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(de)?.unwrap_or_default();
    if s.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(s))
    }
}

/// `direction_id` is 0 or 1; anything else (including absence) is the
/// "unknown" sentinel -1.
pub fn deserialize_direction<'de, D>(de: D) -> Result<i8, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(de)?.unwrap_or_default();
    Ok(match s.trim() {
        "0" => 0,
        "1" => 1,
        _ => -1,
    })
}

pub fn unknown_direction() -> i8 {
    -1
}

/// Parses a 6-hex-digit color, tolerating a leading `#`.
pub fn parse_color(s: &str) -> Option<RGB8> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some(RGB8::new(r, g, b))
}

/// Empty or malformed colors degrade to the default rather than
/// rejecting the whole row.
pub fn deserialize_route_color<'de, D>(de: D) -> Result<RGB8, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(de)?.unwrap_or_default();
    Ok(parse_color(&s).unwrap_or_else(default_route_color))
}

pub fn default_route_color() -> RGB8 {
    RGB8::new(0, 0, 0)
}

pub fn format_color(color: &RGB8) -> String {
    format!("{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_color_variants() {
        assert_eq!(Some(RGB8::new(255, 0, 0)), parse_color("FF0000"));
        assert_eq!(Some(RGB8::new(255, 0, 0)), parse_color("#ff0000"));
        assert_eq!(None, parse_color(""));
        assert_eq!(None, parse_color("ff00"));
        assert_eq!(None, parse_color("zzzzzz"));
    }

    #[test]
    fn color_round_trip() {
        let c = parse_color("1A2B3C").unwrap();
        assert_eq!("1a2b3c", format_color(&c));
    }

    #[test]
    fn date_from_csv() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize_date")]
            date: NaiveDate,
        }
        let parsed: Row = csv::Reader::from_reader("date\n20250106\n".as_bytes())
            .deserialize()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), parsed.date);
    }
}
