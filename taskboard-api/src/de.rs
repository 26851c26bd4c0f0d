/// Lenient deserializers for request bodies
///
/// Browser forms send `""` for an untouched date or select field and plain
/// `YYYY-MM-DD` strings from date inputs. These helpers accept both and
/// normalize them, so request DTOs can stay strongly typed.
///
/// The `nullable_*` variants are for update bodies, used together with
/// `#[serde(default)]`: an absent field stays `None`, an explicit `null` or
/// `""` becomes `Some(None)` (clear the column).
///
/// Postgres text cannot hold NUL, so `text` and `optional_text` reject it
/// for any string that ends up in a query.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{de::Error, Deserialize, Deserializer};
use uuid::Uuid;

/// Parses RFC 3339 timestamps and bare dates (midnight UTC)
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Some(datetime.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn reject_nul<E: Error>(value: String) -> Result<String, E> {
    if value.contains('\0') {
        return Err(E::custom("text must not contain NUL characters"));
    }
    Ok(value)
}

pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).and_then(reject_nul)
}

pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(reject_nul)
        .transpose()
}

fn blank_to_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

pub fn optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_to_none(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_datetime(raw.trim())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))),
    }
}

pub fn nullable_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_datetime(deserializer).map(Some)
}

pub fn optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_to_none(deserializer)? {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw.trim())
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid id: {raw}"))),
    }
}

pub fn nullable_uuid<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_uuid(deserializer).map(Some)
}
