use crate::constants::NA;
use crate::extract::StudyRecord;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static AGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(Years|Months|Days|Hours)?").unwrap());

/// Converts the extracted string fields of every record into their
/// typed forms, in place. No rows are added or removed.
pub fn normalize_records(records: &mut [StudyRecord]) {
    for record in records.iter_mut() {
        record.start_date = parse_partial_date(&record.start_date_text);
        record.completion_date = parse_partial_date(&record.completion_date_text);

        if let Some(gender) = canonical_gender(&record.gender) {
            record.gender = gender.to_string();
        }

        let (value, unit) = parse_age(&record.minimum_age);
        record.minimum_age_value = value;
        record.minimum_age_unit = unit;
        let (value, unit) = parse_age(&record.maximum_age);
        record.maximum_age_value = value;
        record.maximum_age_unit = unit;

        // First listed phase, or a true null for an empty list
        record.phase = record.phases.first().cloned();

        // Safety net; extraction already defaults these
        if record.location.is_empty() {
            record.location = NA.to_string();
        }
        if record.city.is_empty() {
            record.city = NA.to_string();
        }

        record.conditions = record.conditions.to_lowercase();
    }
}

/// Extracts the numeric age and its unit from text like `"25 Years"`.
/// Anything without a digit sequence resolves to `(None, "N/A")`; a
/// bare number keeps its value but gets the sentinel unit.
pub fn parse_age(age_text: &str) -> (Option<u32>, String) {
    let Some(caps) = AGE_PATTERN.captures(age_text) else {
        return (None, NA.to_string());
    };
    let value = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let unit = caps
        .get(2)
        .map(|m| capitalize(m.as_str()))
        .unwrap_or_else(|| NA.to_string());
    (value, unit)
}

/// Exact-match gender canonicalization; anything else passes through.
fn canonical_gender(raw: &str) -> Option<&'static str> {
    match raw {
        "ALL" => Some("All"),
        "M" => Some("Male"),
        "F" => Some("Female"),
        _ => None,
    }
}

/// The registry emits full dates and `YYYY-MM` partials; partials
/// resolve to the first of the month. Anything else is a true null.
fn parse_partial_date(date_text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(date_text, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("{date_text}-01"), "%Y-%m-%d").ok()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
