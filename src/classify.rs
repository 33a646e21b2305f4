use crate::constants::{
    ADVANCED_THERAPIES_COLUMN, CANCER_COLUMN, CONDITION_GROUPED_COLUMN, DIABETES_COLUMN,
    GENETIC_COLUMN, RARE_DISEASES_COLUMN, TAXONOMY_FILES,
};
use crate::error::{Result, ScraperError};
use crate::extract::StudyRecord;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{error, warn};

/// One keyword taxonomy: ordered groups of keywords plus the label
/// assigned when no group matches. Groups keep the key order of the
/// taxonomy file, which makes first-match-wins deterministic.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    /// Output column this taxonomy fills, e.g. "Condition Grouped".
    pub column: String,
    /// Label assigned when no group matches.
    pub fallback: String,
    /// Group label -> keyword entries. Entries stay raw JSON values so
    /// a malformed file surfaces as a classification error, not a
    /// load-time panic.
    pub groups: Vec<(String, Vec<Value>)>,
}

impl Taxonomy {
    pub fn from_value(column: &str, fallback: &str, value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            ScraperError::Classification(format!(
                "taxonomy for '{column}' is not a JSON object"
            ))
        })?;

        let groups = object
            .iter()
            .map(|(group, keywords)| {
                let entries = keywords.as_array().cloned().ok_or_else(|| {
                    ScraperError::Classification(format!(
                        "group '{group}' in taxonomy for '{column}' is not an array"
                    ))
                })?;
                Ok((group.clone(), entries))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            column: column.to_string(),
            fallback: fallback.to_string(),
            groups,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, column: &str, fallback: &str) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(column, fallback, &value)
    }
}

/// Loads the six taxonomies from `keywords_dir` in their fixed order.
pub fn load_taxonomies<P: AsRef<Path>>(keywords_dir: P) -> Result<Vec<Taxonomy>> {
    TAXONOMY_FILES
        .iter()
        .map(|(file_name, column, fallback)| {
            Taxonomy::load(keywords_dir.as_ref().join(file_name), column, fallback)
        })
        .collect()
}

/// Lower-cased concatenation of the searchable columns of one record.
pub fn search_text(record: &StudyRecord) -> String {
    [
        record.conditions.as_str(),
        record.official_title.as_str(),
        record.title.as_str(),
        record.brief_summary.as_str(),
        record.detailed_summary.as_str(),
        record.keywords.as_str(),
        record.inclusion_criteria.as_str(),
        record.intervention_name.as_str(),
        record.intervention_description.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

/// Returns the first group whose keywords contain a substring match in
/// the lowered search text, or the taxonomy's fallback label. Keywords
/// are matched as-is, so a keyword with uppercase letters never hits.
pub fn classify(text_lower: &str, taxonomy: &Taxonomy) -> Result<String> {
    for (group, keywords) in &taxonomy.groups {
        for keyword in keywords {
            let keyword = keyword.as_str().ok_or_else(|| {
                ScraperError::Classification(format!(
                    "non-string keyword in group '{group}' of taxonomy for '{}'",
                    taxonomy.column
                ))
            })?;
            if text_lower.contains(keyword) {
                return Ok(group.clone());
            }
        }
    }
    Ok(taxonomy.fallback.clone())
}

/// Applies every taxonomy to every record, best effort: a defective
/// taxonomy entry is logged and classification stops there, leaving
/// the labels written so far in place.
pub fn classify_records(records: &mut [StudyRecord], taxonomies: &[Taxonomy]) {
    let texts: Vec<String> = records.iter().map(search_text).collect();

    for taxonomy in taxonomies {
        for (record, text) in records.iter_mut().zip(&texts) {
            match classify(text, taxonomy) {
                Ok(label) => assign_label(record, &taxonomy.column, label),
                Err(err) => {
                    error!("Error classifying keywords: {}", err);
                    return;
                }
            }
        }
    }
}

fn assign_label(record: &mut StudyRecord, column: &str, label: String) {
    match column {
        c if c == CONDITION_GROUPED_COLUMN => record.condition_grouped = label,
        c if c == GENETIC_COLUMN => record.genetic = label,
        c if c == ADVANCED_THERAPIES_COLUMN => record.advanced_therapies = label,
        c if c == CANCER_COLUMN => record.cancer = label,
        c if c == RARE_DISEASES_COLUMN => record.rare_diseases = label,
        c if c == DIABETES_COLUMN => record.diabetes = label,
        other => warn!("No output column for taxonomy '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NA;
    use serde_json::json;

    fn condition_taxonomy() -> Taxonomy {
        Taxonomy::from_value(
            CONDITION_GROUPED_COLUMN,
            "OTHER",
            &json!({
                "Cardiovascular": ["heart failure", "hypertension"],
                "Metabolic": ["diabetes", "obesity"]
            }),
        )
        .unwrap()
    }

    fn diabetes_taxonomy() -> Taxonomy {
        Taxonomy::from_value(
            DIABETES_COLUMN,
            "NO",
            &json!({ "YES": ["diabetes", "insulin"] }),
        )
        .unwrap()
    }

    fn record_about(conditions: &str) -> StudyRecord {
        StudyRecord {
            conditions: conditions.to_string(),
            official_title: NA.to_string(),
            title: NA.to_string(),
            brief_summary: NA.to_string(),
            detailed_summary: NA.to_string(),
            keywords: NA.to_string(),
            inclusion_criteria: NA.to_string(),
            intervention_name: NA.to_string(),
            intervention_description: NA.to_string(),
            ..StudyRecord::default()
        }
    }

    #[test]
    fn first_matching_group_wins() {
        let record = record_about("chronic heart failure and diabetes");
        let label = classify(&search_text(&record), &condition_taxonomy()).unwrap();
        assert_eq!(label, "Cardiovascular");
    }

    #[test]
    fn group_order_follows_file_key_order() {
        // "diabetes" appears in both groups' reach; the earlier group
        // is scanned first, so a diabetes-only record lands in the
        // later group only because Cardiovascular has no match.
        let record = record_about("type 2 diabetes");
        let label = classify(&search_text(&record), &condition_taxonomy()).unwrap();
        assert_eq!(label, "Metabolic");
    }

    #[test]
    fn condition_taxonomy_falls_back_to_other() {
        let record = record_about("rhinitis");
        let label = classify(&search_text(&record), &condition_taxonomy()).unwrap();
        assert_eq!(label, "OTHER");
    }

    #[test]
    fn secondary_taxonomy_falls_back_to_no() {
        let record = record_about("rhinitis");
        let label = classify(&search_text(&record), &diabetes_taxonomy()).unwrap();
        assert_eq!(label, "NO");
    }

    #[test]
    fn keywords_are_matched_case_sensitively_against_lowered_text() {
        let taxonomy = Taxonomy::from_value(
            DIABETES_COLUMN,
            "NO",
            &json!({ "YES": ["Diabetes"] }),
        )
        .unwrap();
        let record = record_about("Diabetes");
        // search text is lowered, the keyword is not, so it never hits
        let label = classify(&search_text(&record), &taxonomy).unwrap();
        assert_eq!(label, "NO");
    }

    #[test]
    fn non_string_keyword_is_a_classification_error() {
        let taxonomy = Taxonomy::from_value(
            DIABETES_COLUMN,
            "NO",
            &json!({ "YES": ["insulin", 42] }),
        )
        .unwrap();
        let record = record_about("rhinitis");
        let err = classify(&search_text(&record), &taxonomy).unwrap_err();
        assert!(matches!(err, ScraperError::Classification(_)));
    }

    #[test]
    fn classify_records_keeps_labels_written_before_a_failure() {
        let broken = Taxonomy::from_value(
            GENETIC_COLUMN,
            "NO",
            &json!({ "YES": [1] }),
        )
        .unwrap();
        let mut records = vec![record_about("type 2 diabetes")];
        classify_records(&mut records, &[diabetes_taxonomy(), broken]);
        // first taxonomy landed, the broken one was dropped
        assert_eq!(records[0].diabetes, "YES");
        assert_eq!(records[0].genetic, "");
    }

    #[test]
    fn classify_records_fills_every_record() {
        let mut records = vec![
            record_about("obesity"),
            record_about("nothing relevant"),
        ];
        classify_records(&mut records, &[condition_taxonomy(), diabetes_taxonomy()]);
        assert_eq!(records[0].condition_grouped, "Metabolic");
        assert_eq!(records[0].diabetes, "NO");
        assert_eq!(records[1].condition_grouped, "OTHER");
        assert_eq!(records[1].diabetes, "NO");
    }

    #[test]
    fn taxonomy_group_must_be_an_array() {
        let err =
            Taxonomy::from_value(DIABETES_COLUMN, "NO", &json!({ "YES": "insulin" }))
                .unwrap_err();
        assert!(matches!(err, ScraperError::Classification(_)));
    }
}
