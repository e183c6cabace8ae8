//! Scrape → transform → upload.
//!
//! Phases hand over through files, not memory: the scrape writes the raw
//! table into the output path, the process phase reads every table in the
//! data directory (that one included) and overwrites the output path with
//! canonical records, and the upload phase reads a separately managed
//! upload table. Each phase absorbs its own failures so a run always
//! reaches the end.

use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::batch::BatchProcessor;
use crate::config::Config;
use crate::extractor::{Extractor, ExtractorSettings};
use crate::fetcher::{FetchError, Fetcher};
use crate::listings::fetch_open_calls;
use crate::llm::{CompletionBackend, LlmError, OpenAiClient};
use crate::table;
use crate::transform::{RecordTransformer, RetryPolicy};
use crate::uploader::{UploadError, UploadReport, UploadSettings, Uploader};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("fetcher setup failed: {0}")]
    Fetcher(#[from] FetchError),

    #[error("backend setup failed: {0}")]
    Backend(#[from] LlmError),

    #[error("uploader setup failed: {0}")]
    Uploader(#[from] UploadError),
}

#[derive(Debug, Default)]
pub struct PipelineSummary {
    /// Raw records scraped (before dedup).
    pub scraped: usize,
    /// Raw rows persisted by the scrape phase.
    pub scraped_saved: usize,
    /// Canonical records produced (before dedup).
    pub processed: usize,
    /// Canonical rows persisted by the process phase.
    pub processed_saved: usize,
    pub skipped_files: usize,
    /// `None` when the upload table could not be used at all.
    pub upload: Option<UploadReport>,
}

pub struct Pipeline {
    config: Config,
    fetcher: Fetcher,
    processor: BatchProcessor,
    uploader: Uploader,
}

impl Pipeline {
    /// Build every component against the chat-completions API named in `config`.
    pub fn from_config(config: Config) -> Result<Self, PipelineError> {
        let backend = OpenAiClient::new(
            config.openai_base_url(),
            config.openai_api_key(),
            config.http_timeout(),
        )?;
        Self::new(config, Arc::new(backend))
    }

    pub fn new(config: Config, backend: Arc<dyn CompletionBackend>) -> Result<Self, PipelineError> {
        let fetcher = Fetcher::new(config.http_timeout())?;

        let extractor = Extractor::new(
            backend,
            ExtractorSettings::new(config.model(), config.max_tokens(), config.temperature()),
            config.extraction_concurrency(),
        );
        let retry = RetryPolicy {
            max_retries: config.extraction_retries(),
            base_delay: config.retry_base_delay(),
        };
        let processor = BatchProcessor::new(
            RecordTransformer::new(extractor, retry),
            config.record_concurrency(),
        );

        let uploader = Uploader::new(UploadSettings {
            endpoint: config.upload_endpoint().to_string(),
            token: config.upload_token().to_string(),
            concurrency: config.upload_concurrency(),
            timeout: config.http_timeout(),
        })?;

        Ok(Self {
            config,
            fetcher,
            processor,
            uploader,
        })
    }

    /// Run all three phases unconditionally, in order.
    pub async fn run(&self) -> PipelineSummary {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id);

        async {
            let mut summary = PipelineSummary::default();

            info!("starting scrape");
            let (scraped, scraped_saved) = self
                .scrape()
                .instrument(info_span!("phase", name = "scrape"))
                .await;
            summary.scraped = scraped;
            summary.scraped_saved = scraped_saved;

            info!("starting extraction");
            let (processed, processed_saved, skipped) = self
                .process()
                .instrument(info_span!("phase", name = "process"))
                .await;
            summary.processed = processed;
            summary.processed_saved = processed_saved;
            summary.skipped_files = skipped;

            info!("starting upload");
            summary.upload = self
                .upload()
                .instrument(info_span!("phase", name = "upload"))
                .await;

            info!(
                scraped = summary.scraped,
                processed = summary.processed,
                uploaded = summary.upload.as_ref().map_or(0, UploadReport::succeeded),
                "pipeline finished"
            );
            summary
        }
        .instrument(span)
        .await
    }

    /// Scrape the listing page and save the raw table if anything was found.
    /// Returns `(scraped, saved)`.
    pub async fn scrape(&self) -> (usize, usize) {
        let outcome = fetch_open_calls(&self.fetcher, self.config.listing_url()).await;
        let scraped = outcome.records.len();
        if outcome.is_empty() {
            info!("no listings scraped; keeping existing output");
            return (0, 0);
        }
        (scraped, self.save(outcome.records))
    }

    /// Transform every input table and save the canonical table if anything
    /// was produced. Returns `(produced, saved, skipped_files)`.
    pub async fn process(&self) -> (usize, usize, usize) {
        let outcome = self.processor.process_dir(self.config.data_dir()).await;
        let produced = outcome.records.len();
        let skipped = outcome.skipped.len();
        if produced == 0 {
            info!("no canonical records produced; keeping existing output");
            return (0, 0, skipped);
        }
        (produced, self.save(outcome.records), skipped)
    }

    pub async fn upload(&self) -> Option<UploadReport> {
        match self.uploader.upload(self.config.upload_file()).await {
            Ok(report) => Some(report),
            Err(err) => {
                error!(error = %err, file = %self.config.upload_file().display(), "upload phase failed");
                None
            }
        }
    }

    fn save<T>(&self, records: Vec<T>) -> usize
    where
        T: serde::Serialize + Eq + std::hash::Hash + Clone,
    {
        let path = self.config.output_file();
        match table::persist(records, path) {
            Ok(written) => {
                info!(rows = written, file = %path.display(), "results saved");
                written
            }
            Err(err) => {
                warn!(error = %err, file = %path.display(), "failed to save results");
                0
            }
        }
    }
}
