use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetch::FetchError;

/// Shape of a software detail page path: /en/<platform>/<slug>.
static DETAIL_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/en/(windows|mac|systems|android)/[a-z0-9_-]+$").unwrap());

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to fetch base page: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid base URL {url}: {source}")]
    BadBaseUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Collect detail-page URLs from the listing page.
///
/// Anchors inside containers whose class contains `section_marker` are
/// preferred; when no such container exists the whole document is scanned.
/// Hrefs must match the detail path shape, tag-listing paths are rejected,
/// and results are absolute URLs in first-discovery order without
/// duplicates.
pub fn collect_links(
    document: &str,
    base_url: &str,
    section_marker: &str,
) -> Result<Vec<String>, DiscoveryError> {
    let base = Url::parse(base_url).map_err(|source| DiscoveryError::BadBaseUrl {
        url: base_url.to_string(),
        source,
    })?;

    let doc = Html::parse_document(document);
    let div_sel = Selector::parse("div").unwrap();
    let anchor_sel = Selector::parse("a[href]").unwrap();

    let mut seen: HashSet<String> = HashSet::new();
    let mut links: Vec<String> = Vec::new();

    let sections: Vec<_> = doc
        .select(&div_sel)
        .filter(|el| {
            el.value()
                .attr("class")
                .map_or(false, |c| c.contains(section_marker))
        })
        .collect();

    if sections.is_empty() {
        // Fallback: sitewide anchor scan with the same filtering rules.
        warn!(
            "No '{}' containers found, scanning whole document",
            section_marker
        );
        for anchor in doc.select(&anchor_sel) {
            if let Some(href) = anchor.value().attr("href") {
                add_candidate(&base, href, &mut seen, &mut links);
            }
        }
    } else {
        info!("Found {} '{}' containers", sections.len(), section_marker);
        for (idx, section) in sections.iter().enumerate() {
            let before = links.len();
            for anchor in section.select(&anchor_sel) {
                if let Some(href) = anchor.value().attr("href") {
                    add_candidate(&base, href, &mut seen, &mut links);
                }
            }
            debug!("Section {}: {} new links", idx + 1, links.len() - before);
        }
    }

    Ok(links)
}

fn add_candidate(base: &Url, href: &str, seen: &mut HashSet<String>, links: &mut Vec<String>) {
    let href = href.trim();
    if href.contains("/tag/") || !DETAIL_HREF_RE.is_match(href) {
        return;
    }
    if let Ok(abs) = base.join(href) {
        let abs = abs.to_string();
        if seen.insert(abs.clone()) {
            links.push(abs);
        }
    }
}

// ── Tests ──
