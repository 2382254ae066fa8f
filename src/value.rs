//! Tag values as read from a file, and coercion of their textual form into
//! typed values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Tags of one file, keyed by tag name.
pub type TagMap = BTreeMap<String, TagValue>;

/// Tags of many files, keyed by absolute file path.
pub type ExifMap = BTreeMap<PathBuf, TagMap>;

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    ZonedDateTime(DateTime<FixedOffset>),
    List(Vec<TagValue>),
    Struct(BTreeMap<String, TagValue>),
}

impl TagValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Text(s)
    }
}

impl Serialize for TagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TagValue::Null => serializer.serialize_none(),
            TagValue::Bool(b) => serializer.serialize_bool(*b),
            TagValue::Int(i) => serializer.serialize_i64(*i),
            TagValue::Float(f) => serializer.serialize_f64(*f),
            TagValue::Text(s) => serializer.serialize_str(s),
            TagValue::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            TagValue::DateTime(dt) => serializer.collect_str(&dt.format("%Y-%m-%d %H:%M:%S%.f")),
            TagValue::ZonedDateTime(dt) => {
                serializer.collect_str(&dt.format("%Y-%m-%d %H:%M:%S%.f%:z"))
            }
            TagValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TagValue::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Bool,
    Float,
    Int,
    DateTime,
    Date,
    Str,
}

lazy_static! {
    static ref INT_RE: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
    static ref FLOAT_RE: Regex =
        Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+(\.\d*)?[eE][+-]?\d+)$").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"^(\d{4})[:-](\d{2})[:-](\d{2})$").unwrap();
    static ref DATETIME_RE: Regex = Regex::new(
        r"^(\d{4})[:-](\d{2})[:-](\d{2})[ T](\d{2}:\d{2}:\d{2}(?:\.\d+)?)(Z|[+-]\d{2}:\d{2})?$"
    )
    .unwrap();
}

const DETECTION_ORDER: [Dtype; 5] = [
    Dtype::Bool,
    Dtype::Float,
    Dtype::Int,
    Dtype::DateTime,
    Dtype::Date,
];

/// First dtype in detection order that `raw` coerces to, `Str` otherwise.
pub fn detect_dtype(raw: &str) -> Dtype {
    DETECTION_ORDER
        .iter()
        .copied()
        .find(|dtype| coerce(raw, *dtype).is_some())
        .unwrap_or(Dtype::Str)
}

pub fn coerce(raw: &str, dtype: Dtype) -> Option<TagValue> {
    let raw = raw.trim();
    match dtype {
        Dtype::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(TagValue::Bool(true)),
            "false" | "no" => Some(TagValue::Bool(false)),
            _ => None,
        },
        Dtype::Float => FLOAT_RE
            .is_match(raw)
            .then(|| raw.parse::<f64>().ok())
            .flatten()
            .filter(|f| f.is_finite())
            .map(TagValue::Float),
        Dtype::Int => INT_RE
            .is_match(raw)
            .then(|| raw.trim_start_matches('+').parse::<i64>().ok())
            .flatten()
            .map(TagValue::Int),
        Dtype::DateTime => parse_datetime(raw),
        Dtype::Date => {
            let caps = DATE_RE.captures(raw)?;
            let iso = format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
            NaiveDate::parse_from_str(&iso, "%Y-%m-%d")
                .ok()
                .map(TagValue::Date)
        }
        Dtype::Str => Some(TagValue::Text(raw.to_string())),
    }
}

fn parse_datetime(raw: &str) -> Option<TagValue> {
    let caps = DATETIME_RE.captures(raw)?;
    let iso = format!("{}-{}-{} {}", &caps[1], &caps[2], &caps[3], &caps[4]);
    match caps.get(5).map(|m| m.as_str()) {
        Some(offset) => {
            let offset = if offset == "Z" { "+00:00" } else { offset };
            DateTime::parse_from_str(&format!("{}{}", iso, offset), "%Y-%m-%d %H:%M:%S%.f%:z")
                .ok()
                .map(TagValue::ZonedDateTime)
        }
        None => NaiveDateTime::parse_from_str(&iso, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(TagValue::DateTime),
    }
}

/// Coerce a single value. Text is converted when a dtype other than `Str`
/// is detected; lists and structs are cleaned element-wise.
pub fn clean_value(value: TagValue) -> TagValue {
    match value {
        TagValue::Text(raw) => match detect_dtype(&raw) {
            Dtype::Str => TagValue::Text(raw),
            dtype => coerce(&raw, dtype).unwrap_or(TagValue::Text(raw)),
        },
        TagValue::List(items) => TagValue::List(items.into_iter().map(clean_value).collect()),
        TagValue::Struct(fields) => TagValue::Struct(
            fields
                .into_iter()
                .map(|(k, v)| (k, clean_value(v)))
                .collect(),
        ),
        other => other,
    }
}

pub fn clean_values(exifd: ExifMap) -> ExifMap {
    exifd
        .into_iter()
        .map(|(path, tags)| {
            let cleaned = tags.into_iter().map(|(k, v)| (k, clean_value(v))).collect();
            (path, cleaned)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaned(raw: &str) -> TagValue {
        clean_value(TagValue::from(raw))
    }

    #[test]
    fn integers_keep_their_sign() {
        assert_eq!(cleaned("+7"), TagValue::Int(7));
        assert_eq!(cleaned("-7"), TagValue::Int(-7));
        assert_eq!(cleaned("0"), TagValue::Int(0));
    }

    #[test]
    fn floats_need_a_fraction_or_exponent() {
        assert_eq!(cleaned("11.11"), TagValue::Float(11.11));
        assert_eq!(cleaned("1e3"), TagValue::Float(1000.0));
        assert_eq!(detect_dtype("42"), Dtype::Int);
    }

    #[test]
    fn colon_and_dash_datetimes_are_equivalent() {
        let colon = cleaned("2018:02:28 01:28:10");
        let dash = cleaned("2018-02-28 01:28:10");
        assert_eq!(colon, dash);
        assert_eq!(
            serde_json::to_string(&colon).unwrap(),
            "\"2018-02-28 01:28:10\""
        );
    }

    #[test]
    fn datetime_with_offset() {
        let value = cleaned("2021:07:04 12:00:00+02:00");
        assert!(matches!(value, TagValue::ZonedDateTime(_)));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            "\"2021-07-04 12:00:00+02:00\""
        );
    }

    #[test]
    fn invalid_calendar_dates_stay_text() {
        assert_eq!(
            cleaned("2018:02:29 01:28:10"),
            TagValue::Text("2018:02:29 01:28:10".into())
        );
        assert_eq!(cleaned("2020:13:01"), TagValue::Text("2020:13:01".into()));
    }

    #[test]
    fn dates_and_bools() {
        assert_eq!(
            cleaned("2020:01:31"),
            TagValue::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap())
        );
        assert_eq!(cleaned("True"), TagValue::Bool(true));
        assert_eq!(cleaned("no"), TagValue::Bool(false));
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(cleaned("Canon EOS 5D"), TagValue::Text("Canon EOS 5D".into()));
        assert_eq!(cleaned("1/250"), TagValue::Text("1/250".into()));
    }

    #[test]
    fn lists_are_cleaned_recursively() {
        let list = TagValue::List(vec!["1".into(), "beach".into()]);
        assert_eq!(
            clean_value(list),
            TagValue::List(vec![TagValue::Int(1), TagValue::Text("beach".into())])
        );
    }

    #[test]
    fn clean_values_covers_every_file() {
        let mut exifd = ExifMap::new();
        for name in ["a.jpg", "b.jpg"] {
            let mut tags = TagMap::new();
            tags.insert("ISO".into(), "400".into());
            exifd.insert(PathBuf::from(name), tags);
        }
        let out = clean_values(exifd);
        assert!(out.values().all(|tags| tags["ISO"] == TagValue::Int(400)));
    }
}
