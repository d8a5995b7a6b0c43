use std::path::PathBuf;
use std::time::Duration;

/// Fixed request header profile sent with every fetch. The site serves
/// detail pages normally to browsers but blocks bare HTTP clients, so the
/// profile mirrors a real navigation request. Header names must be
/// lowercase (`HeaderName::from_static` requirement).
pub const HEADER_PROFILE: &[(&str, &str)] = &[
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.5"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
];

/// Run configuration, passed into the pipeline at construction.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Listing page to discover detail links from.
    pub base_url: String,
    /// Class-attribute marker identifying the listing containers.
    pub section_marker: String,
    /// Script variable names scanned for on each detail page.
    pub variables: Vec<String>,
    /// Cap on detail pages processed (None = all discovered).
    pub limit: Option<usize>,
    /// Inter-request pause, uniform seconds within [min, max].
    pub delay_secs: (f64, f64),
    /// Timeout for the base page fetch.
    pub base_timeout: Duration,
    /// Timeout for each detail page fetch.
    pub page_timeout: Duration,
    /// Directory the timestamped run folder is created under.
    pub out_root: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pesktop.com/".into(),
            section_marker: "section_label_v2".into(),
            variables: vec!["downloadUrl".into()],
            limit: None,
            delay_secs: (1.5, 3.0),
            base_timeout: Duration::from_secs(10),
            page_timeout: Duration::from_secs(15),
            out_root: PathBuf::from("."),
        }
    }
}
