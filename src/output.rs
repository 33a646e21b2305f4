use crate::error::Result;
use crate::extract::StudyRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column order of both output tables. The first 27 columns are the
/// extracted fields; the rest are derived during normalization and
/// classification.
pub const HEADERS: [&str; 37] = [
    "NCT ID",
    "URL",
    "Study Type",
    "Official_title",
    "Title",
    "Status",
    "Start Date",
    "Completion Date",
    "Phase",
    "Sponsor",
    "Location",
    "City",
    "Organization Class",
    "Keywords",
    "Brief Summary",
    "Detailed_summary",
    "Intervention Name",
    "Intervention Type",
    "Intervention Description",
    "Gender",
    "Minimum Age",
    "Maximum Age",
    "Conditions",
    "Enrollment",
    "Inclusion Criteria",
    "Exclusion Criteria",
    "Healthy Volunteers",
    "Minimum Age Value",
    "Minimum Age Unit",
    "Maximum Age Value",
    "Maximum Age Unit",
    "Condition Grouped",
    "Genetic",
    "Advanced Therapies",
    "Cancer",
    "Enfermedades Raras",
    "Diabetes",
];

/// Writes the table to `<output_dir>/<table_name>.csv` with a header
/// row, returning the written path. True nulls (dates, phase, age
/// values) render as empty cells.
pub fn write_csv<P: AsRef<Path>>(
    records: &[StudyRecord],
    table_name: &str,
    output_dir: P,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir.as_ref())?;
    let path = output_dir.as_ref().join(format!("{table_name}.csv"));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(HEADERS)?;
    for record in records {
        writer.write_record(record_row(record))?;
    }
    writer.flush()?;

    info!("Saved {} rows to {}", records.len(), path.display());
    Ok(path)
}

fn record_row(record: &StudyRecord) -> Vec<String> {
    vec![
        record.nct_id.clone(),
        record.url.clone(),
        record.study_type.clone(),
        record.official_title.clone(),
        record.title.clone(),
        record.status.clone(),
        record
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record
            .completion_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record.phase.clone().unwrap_or_default(),
        record.sponsor.clone(),
        record.location.clone(),
        record.city.clone(),
        record.organization_class.clone(),
        record.keywords.clone(),
        record.brief_summary.clone(),
        record.detailed_summary.clone(),
        record.intervention_name.clone(),
        record.intervention_type.clone(),
        record.intervention_description.clone(),
        record.gender.clone(),
        record.minimum_age.clone(),
        record.maximum_age.clone(),
        record.conditions.clone(),
        record.enrollment.clone(),
        record.inclusion_criteria.clone(),
        record.exclusion_criteria.clone(),
        record.healthy_volunteers.clone(),
        record
            .minimum_age_value
            .map(|v| v.to_string())
            .unwrap_or_default(),
        record.minimum_age_unit.clone(),
        record
            .maximum_age_value
            .map(|v| v.to_string())
            .unwrap_or_default(),
        record.maximum_age_unit.clone(),
        record.condition_grouped.clone(),
        record.genetic.clone(),
        record.advanced_therapies.clone(),
        record.cancer.clone(),
        record.rare_diseases.clone(),
        record.diabetes.clone(),
    ]
}
