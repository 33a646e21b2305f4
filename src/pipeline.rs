use crate::classify::{classify_records, Taxonomy};
use crate::config::Config;
use crate::constants::{ALL_SPONSORS_TABLE, SPONSOR_FILTERED_TABLE};
use crate::error::Result;
use crate::extract::{extract_page, StudyRecord};
use crate::normalize::normalize_records;
use crate::output::write_csv;
use crate::registry::{PageToken, StudyFetcher};
use crate::sponsor::{homogenize_records, retain_allowed};
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Result of a complete pipeline run.
#[derive(Debug, Serialize)]
pub struct PipelineSummary {
    pub run_id: Uuid,
    pub pages_fetched: usize,
    pub records_extracted: usize,
    pub records_filtered: usize,
    pub all_sponsors_file: PathBuf,
    pub sponsor_filtered_file: PathBuf,
}

/// Drives one fetch→extract→normalize→classify→export run. The record
/// accumulator is local to `run`, so repeated scheduled runs never see
/// each other's data.
pub struct PipelineDriver {
    fetcher: Box<dyn StudyFetcher>,
    taxonomies: Vec<Taxonomy>,
    config: Config,
}

impl PipelineDriver {
    pub fn new(fetcher: Box<dyn StudyFetcher>, taxonomies: Vec<Taxonomy>, config: Config) -> Self {
        Self {
            fetcher,
            taxonomies,
            config,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<PipelineSummary> {
        let run_id = Uuid::new_v4();
        info!("Starting pipeline run {}", run_id);
        counter!("ct_pipeline_runs_total").increment(1);
        let t_run = std::time::Instant::now();

        let (records, pages_fetched) = self.download_records().await;
        let records_extracted = records.len();
        counter!("ct_records_extracted_total").increment(records_extracted as u64);
        info!(
            "Accumulated {} records across {} pages",
            records_extracted, pages_fetched
        );

        let mut records = records;
        normalize_records(&mut records);
        classify_records(&mut records, &self.taxonomies);

        let output_dir = &self.config.paths.output_dir;
        let all_sponsors_file = write_csv(&records, ALL_SPONSORS_TABLE, output_dir)?;

        homogenize_records(&mut records, &self.config.sponsors);
        retain_allowed(&mut records, &self.config.sponsors);
        let sponsor_filtered_file = write_csv(&records, SPONSOR_FILTERED_TABLE, output_dir)?;
        counter!("ct_records_filtered_total").increment(records.len() as u64);

        histogram!("ct_pipeline_duration_seconds").record(t_run.elapsed().as_secs_f64());
        info!("Pipeline run {} finished", run_id);

        Ok(PipelineSummary {
            run_id,
            pages_fetched,
            records_extracted,
            records_filtered: records.len(),
            all_sponsors_file,
            sponsor_filtered_file,
        })
    }

    /// Fetch/extract loop. Stops at page exhaustion, at the record cap
    /// (truncating to exactly the cap), or at the first page left
    /// unavailable after retries; in every case the records accumulated
    /// so far are returned for processing.
    async fn download_records(&self) -> (Vec<StudyRecord>, usize) {
        let max_records = self.config.registry.max_records;
        let mut records: Vec<StudyRecord> = Vec::new();
        let mut token = PageToken::Start;
        let mut pages_fetched = 0usize;

        while records.len() < max_records {
            let t_fetch = std::time::Instant::now();
            let body = match self.fetcher.fetch_page(&token).await {
                Ok(Some(body)) => body,
                Ok(None) => break,
                Err(err) => {
                    warn!("Stopping pagination after fetch failure: {}", err);
                    counter!("ct_fetch_failures_total").increment(1);
                    break;
                }
            };
            histogram!("ct_fetch_page_duration_seconds").record(t_fetch.elapsed().as_secs_f64());
            pages_fetched += 1;

            let page = extract_page(&body);
            debug!(
                "Page {} contained {} studies",
                pages_fetched, page.study_count
            );
            records.extend(page.records);
            token = page.next_token;

            if records.len() >= max_records {
                records.truncate(max_records);
                info!("The maximum number of records has been reached");
                break;
            }
            if token.is_exhausted() {
                info!("There are no more pages to process");
                break;
            }
        }

        (records, pages_fetched)
    }
}
