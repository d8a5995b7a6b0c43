use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::config::ScrapeConfig;
use crate::discover::{self, DiscoveryError};
use crate::extract::{ExtractionRecord, PatternSet};
use crate::fetch::Fetcher;

/// Counters reported in the end-of-run summary.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Candidate links found on the base page, before any cap.
    pub discovered: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Records surviving deduplication.
    pub records: usize,
    pub duplicates_removed: usize,
}

pub struct RunOutcome {
    pub records: Vec<ExtractionRecord>,
    pub stats: RunStats,
}

impl RunOutcome {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            stats: RunStats::default(),
        }
    }
}

/// Fetch the base page and collect candidate detail-page URLs.
pub async fn discover_links(
    fetcher: &Fetcher,
    config: &ScrapeConfig,
) -> Result<Vec<String>, DiscoveryError> {
    info!("Fetching base page: {}", config.base_url);
    let document = fetcher
        .get_text(&config.base_url, config.base_timeout)
        .await?;
    debug!("Retrieved base page ({} bytes)", document.len());
    discover::collect_links(&document, &config.base_url, &config.section_marker)
}

/// Full pipeline: discover, fetch each page sequentially with a politeness
/// pause, extract records, deduplicate.
///
/// Per-page fetch failures are logged and skipped. A failed or empty
/// discovery terminates the run cleanly with an empty outcome.
pub async fn run(config: &ScrapeConfig) -> Result<RunOutcome> {
    let fetcher = Fetcher::new()?;
    let patterns = PatternSet::compile(&config.variables)?;

    let mut links = match discover_links(&fetcher, config).await {
        Ok(links) => links,
        Err(e) => {
            warn!("Discovery failed: {}", e);
            return Ok(RunOutcome::empty());
        }
    };

    if links.is_empty() {
        warn!("No detail-page links discovered, nothing to process");
        return Ok(RunOutcome::empty());
    }

    let discovered = links.len();
    if let Some(limit) = config.limit {
        if discovered > limit {
            info!("Limiting to first {} of {} URLs", limit, discovered);
            links.truncate(limit);
        }
    }

    info!("Processing {} pages", links.len());
    for url in links.iter().take(5) {
        debug!("  {}", url);
    }

    let total = links.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut accumulator: Vec<ExtractionRecord> = Vec::new();
    let mut fetched = 0usize;
    let mut failed = 0usize;

    for (idx, url) in links.iter().enumerate() {
        match fetcher.get_text(url, config.page_timeout).await {
            Ok(document) => {
                fetched += 1;
                let records = patterns.extract_records(&document, url);
                if records.is_empty() {
                    debug!("[{}/{}] {}: no download link", idx + 1, total, url);
                } else {
                    info!("[{}/{}] {}: {} link(s)", idx + 1, total, url, records.len());
                }
                accumulator.extend(records);

                // Politeness pause before the next fetch.
                if idx + 1 < total {
                    let (min, max) = config.delay_secs;
                    let secs = rand::thread_rng().gen_range(min..=max);
                    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                }
            }
            Err(e) => {
                failed += 1;
                warn!("[{}/{}] {} skipped: {}", idx + 1, total, url, e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let (records, duplicates_removed) = aggregate::dedupe(accumulator);
    if duplicates_removed > 0 {
        info!("Removed {} duplicate download URLs", duplicates_removed);
    }

    let stats = RunStats {
        discovered,
        fetched,
        failed,
        records: records.len(),
        duplicates_removed,
    };
    Ok(RunOutcome { records, stats })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> ScrapeConfig {
        ScrapeConfig {
            base_url,
            delay_secs: (0.0, 0.0),
            ..ScrapeConfig::default()
        }
    }

    fn listing(anchors: &[&str]) -> String {
        let links: String = anchors
            .iter()
            .map(|href| format!(r#"<a href="{}">link</a>"#, href))
            .collect();
        format!(
            r#"<html><body><div class="section_label_v2">{}</div></body></html>"#,
            links
        )
    }

    fn detail(title: &str, download_url: &str) -> String {
        format!(
            r#"<html><head><title>Download {t}</title></head>
               <body><h1>Download {t} for Windows</h1>
               <script>const downloadUrl = "{u}";</script></body></html>"#,
            t = title,
            u = download_url
        )
    }

    async fn mount(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn anchor_duplicates_collapse_before_fetching() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/",
            listing(&["/en/windows/foo", "/en/mac/bar", "/en/windows/foo"]),
        )
        .await;
        mount(
            &server,
            "/en/windows/foo",
            detail("Foo", "https://dl.example.com/foo.exe"),
        )
        .await;
        mount(
            &server,
            "/en/mac/bar",
            detail("Bar", "https://dl.example.com/bar.dmg"),
        )
        .await;

        let outcome = run(&test_config(format!("{}/", server.uri()))).await.unwrap();

        assert_eq!(outcome.stats.discovered, 2);
        assert_eq!(outcome.stats.fetched, 2);
        assert_eq!(outcome.stats.failed, 0);
        assert_eq!(outcome.stats.duplicates_removed, 0);
        let titles: Vec<&str> = outcome.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Foo", "Bar"]);
    }

    #[tokio::test]
    async fn shared_download_url_deduplicated_across_pages() {
        let server = MockServer::start().await;
        mount(&server, "/", listing(&["/en/windows/foo", "/en/windows/foo-pro"])).await;
        mount(
            &server,
            "/en/windows/foo",
            detail("Foo", "https://dl.example.com/shared.exe"),
        )
        .await;
        mount(
            &server,
            "/en/windows/foo-pro",
            detail("Foo Pro", "https://dl.example.com/shared.exe"),
        )
        .await;

        let outcome = run(&test_config(format!("{}/", server.uri()))).await.unwrap();

        assert_eq!(outcome.stats.duplicates_removed, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].title, "Foo");
    }

    #[tokio::test]
    async fn failed_page_is_skipped_without_aborting() {
        let server = MockServer::start().await;
        mount(&server, "/", listing(&["/en/windows/missing", "/en/mac/bar"])).await;
        // No mock for /en/windows/missing: wiremock answers 404.
        mount(
            &server,
            "/en/mac/bar",
            detail("Bar", "https://dl.example.com/bar.dmg"),
        )
        .await;

        let outcome = run(&test_config(format!("{}/", server.uri()))).await.unwrap();

        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.stats.fetched, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].title, "Bar");
    }

    #[tokio::test]
    async fn limit_caps_pages_processed() {
        let server = MockServer::start().await;
        mount(&server, "/", listing(&["/en/windows/foo", "/en/mac/bar"])).await;
        mount(
            &server,
            "/en/windows/foo",
            detail("Foo", "https://dl.example.com/foo.exe"),
        )
        .await;

        let mut config = test_config(format!("{}/", server.uri()));
        config.limit = Some(1);
        let outcome = run(&config).await.unwrap();

        assert_eq!(outcome.stats.discovered, 2);
        assert_eq!(outcome.stats.fetched, 1);
        assert_eq!(outcome.records.len(), 1);
    }

    #[tokio::test]
    async fn unreachable_base_page_ends_run_cleanly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = run(&test_config(format!("{}/", server.uri()))).await.unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.discovered, 0);
    }

    #[tokio::test]
    async fn page_without_assignment_yields_no_record() {
        let server = MockServer::start().await;
        mount(&server, "/", listing(&["/en/windows/foo"])).await;
        mount(
            &server,
            "/en/windows/foo",
            "<html><h1>Download Foo for Windows</h1></html>".to_string(),
        )
        .await;

        let outcome = run(&test_config(format!("{}/", server.uri()))).await.unwrap();

        assert_eq!(outcome.stats.fetched, 1);
        assert!(outcome.records.is_empty());
    }
}
