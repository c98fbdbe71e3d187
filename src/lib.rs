use itertools::Itertools;
use tracing::{debug, info, warn};

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod normalize;
pub mod notify;
pub mod persistent;
pub mod sites;

mod utils;

pub use error::ScrapeError;
pub use fetch::{FetchConfig, Fetcher};
pub use listing::{FilterPolicy, ListingRecord, Status};

/// One developer site.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;
    async fn extract(&self, http: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError>;
}

/// Accepted listings of one site, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub site: &'static str,
    pub accepted: Vec<ListingRecord>,
}

/// Runs every extractor in turn. A failing site is logged and reported empty
/// so the others still get their say.
pub async fn run_extractors(
    extractors: &[Box<dyn Extractor>],
    http: &Fetcher,
    policy: &FilterPolicy,
) -> Vec<SiteReport> {
    let mut reports = Vec::with_capacity(extractors.len());

    for extractor in extractors {
        let site = extractor.name();
        let records = match extractor.extract(http).await {
            Ok(records) => records,
            Err(e) => {
                warn!("{} failed: {}", site, e);
                vec![]
            }
        };

        let total = records.len();
        let accepted: Vec<ListingRecord> = records
            .into_iter()
            .inspect(|r| debug!("{}: {}", site, r))
            .filter(|r| policy.accept(r))
            .unique_by(|r| r.url.clone())
            .collect();

        info!("{}: {} listings, {} accepted", site, total, accepted.len());
        reports.push(SiteReport { site, accepted });
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Stub {
        name: &'static str,
        records: Vec<ListingRecord>,
    }

    #[async_trait::async_trait]
    impl Extractor for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn extract(&self, _: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
            Ok(self.records.clone())
        }
    }

    struct Broken;

    #[async_trait::async_trait]
    impl Extractor for Broken {
        fn name(&self) -> &'static str {
            "Broken"
        }

        async fn extract(&self, _: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
            Err(ScrapeError::Status {
                url: "https://broken.example".to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }

    fn record(location: &str, price: u32, url: &str) -> ListingRecord {
        ListingRecord {
            developer: "Stub",
            name: "Residencial".to_string(),
            location: location.to_string(),
            price: Some(price),
            bedrooms: Some(3),
            status: Status::OnSale,
            label: None,
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn failing_site_does_not_stop_the_others() {
        let http = Fetcher::new(FetchConfig::default()).expect("client");
        let policy = FilterPolicy::new(["valencia"], 270_000, 2);
        let extractors: Vec<Box<dyn Extractor>> = vec![
            Box::new(Broken),
            Box::new(Stub {
                name: "Stub",
                records: vec![
                    record("Valencia", 250_000, "https://stub.example/a"),
                    record("Valencia", 250_000, "https://stub.example/a"),
                    record("Alicante", 250_000, "https://stub.example/b"),
                    record("Valencia", 300_000, "https://stub.example/c"),
                    record("València", 199_000, "https://stub.example/d"),
                ],
            }),
        ];

        let reports = run_extractors(&extractors, &http, &policy).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0],
            SiteReport {
                site: "Broken",
                accepted: vec![]
            }
        );
        assert_eq!(reports[1].site, "Stub");
        let urls: Vec<_> = reports[1].accepted.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://stub.example/a", "https://stub.example/d"]);
    }
}
