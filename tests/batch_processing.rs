use async_trait::async_trait;
use opencalls::batch::BatchProcessor;
use opencalls::entities::CanonicalRecord;
use opencalls::extractor::{EXTRACTION_ERROR, Extractor, ExtractorSettings};
use opencalls::llm::{ChatRequest, CompletionBackend, LlmError};
use opencalls::table::{self, Table};
use opencalls::transform::{RecordTransformer, RetryPolicy};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

/// Echoes the user instruction back; fails for rows mentioning "outage".
#[derive(Default)]
struct EchoBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionBackend for EchoBackend {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = request.user_content().unwrap_or_default().to_string();
        if user.contains("outage") {
            return Err(LlmError::Network("connection reset".into()));
        }
        Ok(user)
    }
}

fn processor(backend: Arc<EchoBackend>, record_concurrency: usize) -> BatchProcessor {
    let extractor = Extractor::new(backend, ExtractorSettings::new("gpt-4o", 4000, 1.0), 4);
    BatchProcessor::new(
        RecordTransformer::new(extractor, RetryPolicy::none()),
        record_concurrency,
    )
}

#[tokio::test]
async fn test_processes_all_tables_in_name_order() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.csv"), "Title,Body\nSecond,Text two\n").unwrap();
    fs::write(
        dir.path().join("a.csv"),
        "Title,Notes\nFirst,\nAlso first,Has notes\n",
    )
    .unwrap();
    fs::write(dir.path().join("readme.txt"), "Title\nIgnored\n").unwrap();

    let backend = Arc::new(EchoBackend::default());
    let outcome = processor(backend.clone(), 2).process_dir(dir.path()).await;

    assert_eq!(outcome.files_processed, 2);
    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 27);

    assert_eq!(
        outcome.records[0].open_call_title,
        "Extract only open call title: Title: First"
    );
    assert_eq!(
        outcome.records[1].fee,
        "Extract only fee information: Title: Also first Notes: Has notes"
    );
    assert_eq!(
        outcome.records[2].city_country,
        "Extract only country name: Title: Second Body: Text two"
    );
}

#[tokio::test]
async fn test_unreadable_table_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_broken.csv"), b"Ti\xfftle,Body\nx,y\n").unwrap();
    fs::write(dir.path().join("b_good.csv"), "Title\nWorks\n").unwrap();

    let outcome = processor(Arc::new(EchoBackend::default()), 1)
        .process_dir(dir.path())
        .await;

    assert_eq!(outcome.files_processed, 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert!(outcome.skipped[0].path.ends_with("a_broken.csv"));
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_malformed_rows_do_not_cost_the_file() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("in.csv"),
        "Title,Body\nGood,Row\nShort\nToo,Many,Cells\nAlso good,Row\n",
    )
    .unwrap();

    let backend = Arc::new(EchoBackend::default());
    let outcome = processor(backend.clone(), 1).process_dir(dir.path()).await;

    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.files_processed, 1);
    assert_eq!(outcome.skipped_rows, 1);
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(
        outcome.records[1].open_call_title,
        "Extract only open call title: Title: Short"
    );
    assert_eq!(backend.calls.load(Ordering::SeqCst), 27);
}

#[tokio::test]
async fn test_backend_failures_fill_sentinels() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("calls.csv"), "Title\nService outage\nFine\n").unwrap();

    let outcome = processor(Arc::new(EchoBackend::default()), 1)
        .process_dir(dir.path())
        .await;

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0], CanonicalRecord::from_values(
        std::array::from_fn(|_| EXTRACTION_ERROR.to_string())
    ));
    assert_ne!(outcome.records[1].faq, EXTRACTION_ERROR);
}

#[tokio::test]
async fn test_blank_row_still_produces_a_record() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("blank.csv"), "Title,Body\n\"\",\"\"\n").unwrap();

    let backend = Arc::new(EchoBackend::default());
    let outcome = processor(backend.clone(), 1).process_dir(dir.path()).await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 9);
    assert_eq!(outcome.records[0].city_country, "Extract only country name:");
}

#[tokio::test]
async fn test_missing_directory_yields_nothing() {
    let dir = tempdir().unwrap();
    let outcome = processor(Arc::new(EchoBackend::default()), 1)
        .process_dir(&dir.path().join("missing"))
        .await;

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.files_processed, 0);
}

#[tokio::test]
async fn test_persisted_output_matches_deduplicated_records() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("dupes.csv"), "Title\nSame\nSame\nOther\n").unwrap();

    let outcome = processor(Arc::new(EchoBackend::default()), 1)
        .process_dir(dir.path())
        .await;
    assert_eq!(outcome.records.len(), 3);

    let out = dir.path().join("out").join("results.csv");
    let written = table::persist(outcome.records.clone(), &out).unwrap();
    assert_eq!(written, 2);

    let loaded: Vec<CanonicalRecord> = Table::read(&out)
        .unwrap()
        .deserialize()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(loaded, table::dedup(outcome.records));
}
