/// Fixed vocabulary for the ClinicalTrials.gov pipeline: endpoint shape,
/// output table names, taxonomy wiring, and the default sponsor allow-list.

/// Base endpoint of the v2 studies API.
pub const STUDIES_ENDPOINT: &str = "https://clinicaltrials.gov/api/v2/studies";

/// Sort order requested from the registry.
pub const SORT_ORDER: &str = "LastUpdatePostDate";

/// Study detail pages live here, keyed by NCT ID.
pub const STUDY_URL_PREFIX: &str = "https://clinicaltrials.gov/study";

/// Sentinel substituted for any absent extracted field.
pub const NA: &str = "N/A";

// Output table names; the sink appends the extension.
pub const ALL_SPONSORS_TABLE: &str = "clinical_trials_cleaned_all_sponsors";
pub const SPONSOR_FILTERED_TABLE: &str = "clinical_trials_sponsorFiltered";

// Derived classification columns.
pub const CONDITION_GROUPED_COLUMN: &str = "Condition Grouped";
pub const GENETIC_COLUMN: &str = "Genetic";
pub const ADVANCED_THERAPIES_COLUMN: &str = "Advanced Therapies";
pub const CANCER_COLUMN: &str = "Cancer";
pub const RARE_DISEASES_COLUMN: &str = "Enfermedades Raras";
pub const DIABETES_COLUMN: &str = "Diabetes";

/// Label returned when the condition taxonomy matches no group.
pub const CONDITION_FALLBACK: &str = "OTHER";

/// Label returned when any other taxonomy matches no group.
pub const DEFAULT_FALLBACK: &str = "NO";

/// Taxonomy input files with their output column and no-match label.
pub const TAXONOMY_FILES: [(&str, &str, &str); 6] = [
    (
        "condition_keywords.json",
        CONDITION_GROUPED_COLUMN,
        CONDITION_FALLBACK,
    ),
    ("genetic_keywords.json", GENETIC_COLUMN, DEFAULT_FALLBACK),
    (
        "advanced_therapies_keywords.json",
        ADVANCED_THERAPIES_COLUMN,
        DEFAULT_FALLBACK,
    ),
    ("cancer_keywords.json", CANCER_COLUMN, DEFAULT_FALLBACK),
    (
        "rare_diseases_keywords.json",
        RARE_DISEASES_COLUMN,
        DEFAULT_FALLBACK,
    ),
    ("diabetes_keywords.json", DIABETES_COLUMN, DEFAULT_FALLBACK),
];

/// Sponsor name that always canonicalizes to `MSD`, ahead of the
/// general allow-list scan.
pub const MSD_SPONSOR_PATTERN: &str = "merck sharp & dohme";

/// Canonical name for the pattern above.
pub const MSD_SPONSOR: &str = "MSD";

/// Default sponsor allow-list used when the config file does not
/// provide one. Order matters: homogenization returns the first
/// case-insensitive substring match.
pub const DEFAULT_SPONSORS: [&str; 14] = [
    "Novo Nordisk",
    "Pfizer",
    "Takeda",
    "MSD",
    "Merck Sharp & Dohme",
    "Novartis",
    "Astrazeneca",
    "Bayer",
    "Abbvie",
    "Amgen",
    "Bristol",
    "Glaxosmithkline",
    "Janssen",
    "Roche",
];
