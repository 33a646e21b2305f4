use crate::constants::{NA, STUDY_URL_PREFIX};
use crate::registry::PageToken;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const INCLUSION_MARKER: &str = "Inclusion Criteria:";
const EXCLUSION_MARKER: &str = "Exclusion Criteria:";

/// One flattened study row. Extraction fills the string fields with the
/// `"N/A"` sentinel wherever the source document is missing a value;
/// normalization and classification fill the typed and label fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub nct_id: String,
    pub url: String,
    pub study_type: String,
    pub official_title: String,
    pub title: String,
    pub status: String,
    pub start_date_text: String,
    pub completion_date_text: String,
    pub phases: Vec<String>,
    pub sponsor: String,
    pub location: String,
    pub city: String,
    pub organization_class: String,
    pub keywords: String,
    pub brief_summary: String,
    pub detailed_summary: String,
    pub intervention_name: String,
    pub intervention_type: String,
    pub intervention_description: String,
    pub gender: String,
    pub minimum_age: String,
    pub maximum_age: String,
    pub conditions: String,
    pub enrollment: String,
    pub inclusion_criteria: String,
    pub exclusion_criteria: String,
    pub healthy_volunteers: String,

    // Filled by normalization
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub phase: Option<String>,
    pub minimum_age_value: Option<u32>,
    pub minimum_age_unit: String,
    pub maximum_age_value: Option<u32>,
    pub maximum_age_unit: String,

    // Filled by classification
    pub condition_grouped: String,
    pub genetic: String,
    pub advanced_therapies: String,
    pub cancer: String,
    pub rare_diseases: String,
    pub diabetes: String,
}

/// Result of flattening one page body.
#[derive(Debug)]
pub struct ExtractedPage {
    pub next_token: PageToken,
    pub records: Vec<StudyRecord>,
    pub study_count: usize,
}

/// Flattens one page of raw studies. A page with no `nextPageToken`
/// reports `PageToken::Exhausted`, which terminates pagination.
pub fn extract_page(body: &Value) -> ExtractedPage {
    let studies: &[Value] = body
        .get("studies")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let next_token = body
        .get("nextPageToken")
        .and_then(Value::as_str)
        .map(|token| PageToken::Next(token.to_string()))
        .unwrap_or(PageToken::Exhausted);

    let records = studies.iter().map(extract_study).collect::<Vec<_>>();
    debug!("Flattened {} studies from page", records.len());

    ExtractedPage {
        next_token,
        study_count: records.len(),
        records,
    }
}

/// Flattens one raw study. Any key missing at any nesting depth
/// degrades to the sentinel, never to an error.
pub fn extract_study(study: &Value) -> StudyRecord {
    let nct_id = text_at(study, &["protocolSection", "identificationModule", "nctId"]);
    let url = format!("{STUDY_URL_PREFIX}/{nct_id}");

    let criteria = text_at(
        study,
        &["protocolSection", "eligibilityModule", "eligibilityCriteria"],
    );
    let (inclusion_criteria, exclusion_criteria) = split_criteria(&criteria);

    let mut record = StudyRecord {
        nct_id,
        url,
        study_type: text_at(study, &["protocolSection", "designModule", "studyType"]),
        official_title: text_at(
            study,
            &["protocolSection", "identificationModule", "officialTitle"],
        ),
        title: text_at(
            study,
            &["protocolSection", "identificationModule", "briefTitle"],
        ),
        status: text_at(study, &["protocolSection", "statusModule", "overallStatus"]),
        start_date_text: text_at(
            study,
            &["protocolSection", "statusModule", "startDateStruct", "date"],
        ),
        completion_date_text: text_at(
            study,
            &[
                "protocolSection",
                "statusModule",
                "completionDateStruct",
                "date",
            ],
        ),
        phases: string_list_at(study, &["protocolSection", "designModule", "phases"])
            .unwrap_or_else(|| vec![NA.to_string()]),
        sponsor: text_at(
            study,
            &[
                "protocolSection",
                "sponsorCollaboratorsModule",
                "leadSponsor",
                "name",
            ],
        ),
        location: NA.to_string(),
        city: NA.to_string(),
        organization_class: text_at(
            study,
            &[
                "protocolSection",
                "identificationModule",
                "organization",
                "class",
            ],
        ),
        keywords: joined_list_at(study, &["protocolSection", "conditionsModule", "keywords"]),
        brief_summary: text_at(
            study,
            &["protocolSection", "descriptionModule", "briefSummary"],
        ),
        detailed_summary: text_at(
            study,
            &["protocolSection", "descriptionModule", "detailedDescription"],
        ),
        intervention_name: NA.to_string(),
        intervention_type: NA.to_string(),
        intervention_description: NA.to_string(),
        gender: text_at(study, &["protocolSection", "eligibilityModule", "sex"]),
        minimum_age: text_at(study, &["protocolSection", "eligibilityModule", "minimumAge"]),
        maximum_age: text_at(study, &["protocolSection", "eligibilityModule", "maximumAge"]),
        conditions: joined_list_at(study, &["protocolSection", "conditionsModule", "conditions"]),
        enrollment: scalar_at(
            study,
            &["protocolSection", "designModule", "enrollmentInfo", "count"],
        ),
        inclusion_criteria,
        exclusion_criteria,
        healthy_volunteers: scalar_at(
            study,
            &["protocolSection", "eligibilityModule", "healthyVolunteers"],
        ),
        minimum_age_unit: NA.to_string(),
        maximum_age_unit: NA.to_string(),
        ..StudyRecord::default()
    };

    // Only the first listed site feeds the location columns
    if let Some(site) = first_entry_at(
        study,
        &["protocolSection", "contactsLocationsModule", "locations"],
    ) {
        record.location = text_at(site, &["country"]);
        record.city = text_at(site, &["city"]);
    }

    // Only the first listed intervention is kept
    if let Some(intervention) = first_entry_at(
        study,
        &["protocolSection", "armsInterventionsModule", "interventions"],
    ) {
        record.intervention_name = text_at(intervention, &["name"]);
        record.intervention_type = text_at(intervention, &["type"]);
        record.intervention_description = text_at(intervention, &["description"]);
    }

    record
}

/// Separates eligibility text into inclusion and exclusion parts. Both
/// literal markers must be present; otherwise the text is treated as
/// absent and both parts degrade to the sentinel.
fn split_criteria(criteria: &str) -> (String, String) {
    if !criteria.contains(INCLUSION_MARKER) || !criteria.contains(EXCLUSION_MARKER) {
        return (NA.to_string(), NA.to_string());
    }
    match criteria.split_once(EXCLUSION_MARKER) {
        Some((before, after)) => (
            before.replace(INCLUSION_MARKER, "").trim().to_string(),
            after.trim().to_string(),
        ),
        None => (NA.to_string(), NA.to_string()),
    }
}

/// Walks `path` through nested objects. Resolution of the lookup result
/// is left to the callers below; absence is always `None` here.
fn lookup<'a>(study: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(study, |node, key| node.get(key))
}

/// String value at `path`, or the sentinel.
fn text_at(study: &Value, path: &[&str]) -> String {
    lookup(study, path)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| NA.to_string())
}

/// Scalar value at `path` rendered as text (string, number, or bool),
/// or the sentinel.
fn scalar_at(study: &Value, path: &[&str]) -> String {
    match lookup(study, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => NA.to_string(),
    }
}

/// String array at `path`, or `None` when the key is absent. A present
/// but empty array stays empty; the caller decides the default.
fn string_list_at(study: &Value, path: &[&str]) -> Option<Vec<String>> {
    lookup(study, path).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// Comma-space join of the string array at `path`. An absent array
/// joins the one-element sentinel list, yielding the literal `"N/A"`.
fn joined_list_at(study: &Value, path: &[&str]) -> String {
    string_list_at(study, path)
        .unwrap_or_else(|| vec![NA.to_string()])
        .join(", ")
}

/// First element of the array at `path`, if any.
fn first_entry_at<'a>(study: &'a Value, path: &[&str]) -> Option<&'a Value> {
    lookup(study, path)
        .and_then(Value::as_array)
        .and_then(|items| items.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn study_with_sections() -> Value {
        json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT01234567",
                    "briefTitle": "A Trial",
                    "officialTitle": "A Very Official Trial",
                    "organization": { "class": "INDUSTRY" }
                },
                "statusModule": {
                    "overallStatus": "RECRUITING",
                    "startDateStruct": { "date": "2024-02-01" },
                    "completionDateStruct": { "date": "2026-07" }
                },
                "designModule": {
                    "studyType": "INTERVENTIONAL",
                    "phases": ["PHASE2", "PHASE3"],
                    "enrollmentInfo": { "count": 250 }
                },
                "sponsorCollaboratorsModule": {
                    "leadSponsor": { "name": "Novo Nordisk A/S" }
                },
                "conditionsModule": {
                    "conditions": ["Type 2 Diabetes", "Obesity"],
                    "keywords": ["GLP-1"]
                },
                "descriptionModule": {
                    "briefSummary": "Short summary.",
                    "detailedDescription": "Long description."
                },
                "eligibilityModule": {
                    "sex": "ALL",
                    "minimumAge": "18 Years",
                    "maximumAge": "75 Years",
                    "healthyVolunteers": false,
                    "eligibilityCriteria":
                        "Inclusion Criteria:\nAge 18+\nExclusion Criteria:\nPregnant"
                },
                "contactsLocationsModule": {
                    "locations": [
                        { "city": "Copenhagen", "country": "Denmark" },
                        { "city": "Aarhus", "country": "Denmark" }
                    ]
                },
                "armsInterventionsModule": {
                    "interventions": [
                        {
                            "name": "Semaglutide",
                            "type": "DRUG",
                            "description": "Weekly injection."
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn extracts_all_fields_from_complete_study() {
        let record = extract_study(&study_with_sections());
        assert_eq!(record.nct_id, "NCT01234567");
        assert_eq!(record.url, "https://clinicaltrials.gov/study/NCT01234567");
        assert_eq!(record.study_type, "INTERVENTIONAL");
        assert_eq!(record.status, "RECRUITING");
        assert_eq!(record.phases, vec!["PHASE2", "PHASE3"]);
        assert_eq!(record.sponsor, "Novo Nordisk A/S");
        assert_eq!(record.conditions, "Type 2 Diabetes, Obesity");
        assert_eq!(record.keywords, "GLP-1");
        assert_eq!(record.enrollment, "250");
        assert_eq!(record.healthy_volunteers, "false");
        // only the first site is used
        assert_eq!(record.location, "Denmark");
        assert_eq!(record.city, "Copenhagen");
        assert_eq!(record.intervention_name, "Semaglutide");
        assert_eq!(record.inclusion_criteria, "Age 18+");
        assert_eq!(record.exclusion_criteria, "Pregnant");
    }

    #[test]
    fn missing_sections_degrade_to_sentinel() {
        let record = extract_study(&json!({ "protocolSection": {} }));
        assert_eq!(record.nct_id, NA);
        assert_eq!(record.study_type, NA);
        assert_eq!(record.status, NA);
        assert_eq!(record.sponsor, NA);
        assert_eq!(record.location, NA);
        assert_eq!(record.city, NA);
        assert_eq!(record.intervention_name, NA);
        assert_eq!(record.intervention_type, NA);
        assert_eq!(record.intervention_description, NA);
        assert_eq!(record.gender, NA);
        assert_eq!(record.minimum_age, NA);
        assert_eq!(record.enrollment, NA);
        assert_eq!(record.healthy_volunteers, NA);
        assert_eq!(record.inclusion_criteria, NA);
        assert_eq!(record.exclusion_criteria, NA);
        assert_eq!(record.phases, vec![NA]);
    }

    #[test]
    fn entirely_empty_study_does_not_panic() {
        let record = extract_study(&json!({}));
        assert_eq!(record.nct_id, NA);
        assert_eq!(record.url, "https://clinicaltrials.gov/study/N/A");
    }

    #[test]
    fn absent_condition_list_joins_sentinel_element() {
        // The join runs over a one-element ["N/A"] default, so the
        // output is the literal sentinel, not an empty string.
        let record = extract_study(&json!({ "protocolSection": {} }));
        assert_eq!(record.conditions, NA);
        assert_eq!(record.keywords, NA);
    }

    #[test]
    fn empty_location_list_keeps_sentinel() {
        let record = extract_study(&json!({
            "protocolSection": {
                "contactsLocationsModule": { "locations": [] }
            }
        }));
        assert_eq!(record.location, NA);
        assert_eq!(record.city, NA);
    }

    #[test]
    fn criteria_with_only_inclusion_marker_is_treated_as_absent() {
        let (inclusion, exclusion) = split_criteria("Inclusion Criteria:\nAge 18+");
        assert_eq!(inclusion, NA);
        assert_eq!(exclusion, NA);
    }

    #[test]
    fn criteria_with_both_markers_splits_once() {
        let (inclusion, exclusion) =
            split_criteria("Inclusion Criteria:\nAge 18+\nExclusion Criteria:\nPregnant");
        assert_eq!(inclusion, "Age 18+");
        assert_eq!(exclusion, "Pregnant");
    }

    #[test]
    fn page_without_next_token_is_exhausted() {
        let page = extract_page(&json!({ "studies": [ { "protocolSection": {} } ] }));
        assert_eq!(page.next_token, PageToken::Exhausted);
        assert_eq!(page.study_count, 1);
        assert_eq!(page.records.len(), 1);
    }

    #[test]
    fn page_with_next_token_continues() {
        let page = extract_page(&json!({
            "studies": [],
            "nextPageToken": "tok42"
        }));
        assert_eq!(page.next_token, PageToken::Next("tok42".to_string()));
        assert_eq!(page.study_count, 0);
    }
}
