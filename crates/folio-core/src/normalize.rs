//! Field normalization.
//!
//! Pure functions that canonicalize front-matter and config values: key
//! spelling, fuzzy dates, tag lists and site-relative URL paths.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// Time-of-day formats, combined with every date format. `%.f` is optional
/// when parsing and `%p` accepts either case.
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Separators tried between the date and the time of day.
const TIME_SEPARATORS: &[&str] = &[" ", "T"];

/// Words dropped before the second parsing pass.
const FILLER: &[&str] = &[
    "on", "at", "the", "of", "posted", "published", "monday", "tuesday", "wednesday",
    "thursday", "friday", "saturday", "sunday", "mon", "tue", "tues", "wed", "thu", "thur",
    "thurs", "fri", "sat", "sun",
];

static KEY_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[- ]+").expect("key separator pattern is valid"));

static REPEATED_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//+").expect("slash pattern is valid"));

/// Formats tried, in order, for dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %B %Y",
    "%B %d %Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
];

/// Canonicalize a key: lower-case it and replace runs of `-` or space with `_`.
///
/// `"Pub Date"`, `"pub-date"` and `"pub - date"` all become `"pub_date"`.
pub fn norm_key(key: &str) -> String {
    KEY_SEPARATOR
        .replace_all(&key.to_lowercase(), "_")
        .into_owned()
}

/// Parse a front-matter value into a timestamp.
///
/// Null, `false`, `0` and empty strings yield `None`. Anything else must parse,
/// otherwise the whole build fails.
pub fn norm_time(value: &Value) -> Result<Option<NaiveDateTime>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::Bool(false) => return Ok(None),
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) if n.as_i64() == Some(0) => return Ok(None),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => return norm_time(&tagged.value),
        other => return Err(CoreError::Date(format!("{other:?}"))),
    };

    parse_time(&text)
}

/// Fuzzy parse of a date or date/time string. Empty input yields `None`.
pub fn parse_time(text: &str) -> Result<Option<NaiveDateTime>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(dt) = parse_exact(text) {
        return Ok(Some(dt));
    }

    // Second pass: drop commas, weekdays, ordinal suffixes and filler words
    // such as "on" or "at", and split "9:05pm" into "9:05 pm".
    let relaxed = relax(text);
    if let Some(dt) = parse_exact(&relaxed) {
        return Ok(Some(dt));
    }

    Err(CoreError::Date(text.to_string()))
}

fn parse_exact(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_local());
    }

    for date in DATE_FORMATS {
        for sep in TIME_SEPARATORS {
            for time in TIME_FORMATS {
                let fmt = format!("{date}{sep}{time}");
                if let Ok(dt) = NaiveDateTime::parse_from_str(text, &fmt) {
                    return Some(dt);
                }
                // Numeric offset after the time: the wall-clock time is kept.
                if let Ok(dt) = DateTime::parse_from_str(text, &format!("{fmt} %z")) {
                    return Some(dt.naive_local());
                }
            }
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // A bare year stands for its first day.
    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        let year = text.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }

    None
}

fn relax(text: &str) -> String {
    let text = text.replace(',', " ");
    let mut words = Vec::new();

    for word in text.split_whitespace() {
        let lower = word.to_lowercase();
        if FILLER.contains(&lower.trim_end_matches('.')) {
            continue;
        }
        let word = strip_ordinal(word);
        match split_meridiem(word) {
            Some((time, meridiem)) => words.extend([time, meridiem]),
            None => words.push(word),
        }
    }

    words.join(" ")
}

/// `"9:05pm"` becomes `("9:05", "pm")`.
fn split_meridiem(word: &str) -> Option<(&str, &str)> {
    if !word.contains(':') || word.len() <= 2 {
        return None;
    }
    let (time, suffix) = word.split_at_checked(word.len() - 2)?;
    matches!(suffix.to_ascii_lowercase().as_str(), "am" | "pm").then_some((time, suffix))
}

fn strip_ordinal(word: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(number) = word.strip_suffix(suffix)
            && !number.is_empty()
            && number.chars().all(|c| c.is_ascii_digit())
        {
            return number;
        }
    }
    word
}

/// Normalize a tag or category value into an ordered list of alphanumeric tokens.
///
/// A string is split on commas when it contains any, otherwise on whitespace.
/// A sequence is taken item by item. Non-alphanumeric characters are removed
/// from every token, empty tokens are dropped, repeats are kept.
pub fn norm_tags(value: &Value) -> Vec<String> {
    let tokens: Vec<String> = match value {
        Value::String(s) if s.contains(',') => s.split(',').map(str::to_string).collect(),
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
        Value::Tagged(tagged) => return norm_tags(&tagged.value),
        other => scalar_text(other).into_iter().collect(),
    };

    tokens
        .iter()
        .map(|token| alphanum(token))
        .filter(|token| !token.is_empty())
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Keep only ASCII letters and digits.
pub fn alphanum(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Seconds since the epoch for sorting; absent timestamps sort as zero.
pub fn timestamp(dt: Option<NaiveDateTime>) -> i64 {
    dt.map_or(0, |dt| dt.and_utc().timestamp())
}

/// Join non-empty path segments with `/` and collapse repeated slashes.
///
/// `.html` is appended only when `ext` is set and the site does not use
/// clean URLs.
pub fn join_path<S: AsRef<str>>(parts: &[S], ext: bool, clean_urls: bool) -> String {
    let joined = parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    let mut out = REPEATED_SLASH.replace_all(&joined, "/").into_owned();

    if ext && !clean_urls {
        out.push_str(".html");
    }
    out
}
