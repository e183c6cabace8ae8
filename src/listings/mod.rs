pub mod parser;

pub use parser::parse_listing;

use tracing::{info, instrument, warn};

use crate::entities::RawRecord;
use crate::fetcher::{FetchError, Fetcher};

/// Result of one scrape. A transport failure is reported alongside an empty
/// record list rather than raised.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub records: Vec<RawRecord>,
    pub error: Option<FetchError>,
}

impl ScrapeOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fetch the listing page once and parse it into raw records.
#[instrument(skip(fetcher))]
pub async fn fetch_open_calls(fetcher: &Fetcher, url: &str) -> ScrapeOutcome {
    match fetcher.fetch(url).await {
        Ok(page) => {
            let records = parse_listing(&page.body_utf8, Some(&page.url_final));
            info!(
                count = records.len(),
                status = %page.status,
                charset = ?page.charset,
                fetched_at = %page.fetched_at,
                "parsed open call listings"
            );
            ScrapeOutcome {
                records,
                error: None,
            }
        }
        Err(error) => {
            warn!(error = %error, "failed to fetch listing page");
            ScrapeOutcome {
                records: Vec::new(),
                error: Some(error),
            }
        }
    }
}
