use crate::constants::{MSD_SPONSOR, MSD_SPONSOR_PATTERN};
use crate::extract::StudyRecord;

/// Canonicalizes a free-text sponsor name against the allow-list.
/// The Merck Sharp & Dohme family always maps to `MSD`; otherwise the
/// first allow-list entry occurring case-insensitively as a substring
/// wins ("Janssen-Cilag" matches "Janssen"). Unmatched names pass
/// through unchanged; exclusion happens later in `retain_allowed`.
pub fn homogenize(sponsor_name: &str, sponsors: &[String]) -> String {
    let name_lower = sponsor_name.to_lowercase();
    if name_lower.contains(MSD_SPONSOR_PATTERN) {
        return MSD_SPONSOR.to_string();
    }
    for sponsor in sponsors {
        if name_lower.contains(&sponsor.to_lowercase()) {
            return sponsor.clone();
        }
    }
    sponsor_name.to_string()
}

/// Canonicalizes the sponsor of every record in place.
pub fn homogenize_records(records: &mut [StudyRecord], sponsors: &[String]) {
    for record in records.iter_mut() {
        record.sponsor = homogenize(&record.sponsor, sponsors);
    }
}

/// Keeps only records whose (homogenized) sponsor is an allow-list
/// member, by exact comparison.
pub fn retain_allowed(records: &mut Vec<StudyRecord>, sponsors: &[String]) {
    records.retain(|record| sponsors.iter().any(|sponsor| *sponsor == record.sponsor));
}
