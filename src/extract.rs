use std::sync::LazyLock;

use regex::Regex;

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.+?)</h1>").unwrap());
static TITLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title>(.+?)</title>").unwrap());
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static DOWNLOAD_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Download\s+").unwrap());
static PLATFORM_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+for\s+(Windows|Mac|Android).*$").unwrap());

/// Values considered semantically empty when captured from an assignment.
const PLACEHOLDER_SENTINELS: &[&str] = &["", "#", "null", "undefined", "javascript:void(0)"];

/// One extracted download link, bound to the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    pub title: String,
    pub page_url: String,
    pub variable: String,
    pub download_url: String,
}

/// Human-readable page title: first `<h1>` with markup stripped and the
/// "Download …" / "… for <platform>" decorations trimmed, falling back to
/// the `<title>` element, then to the literal `"Unknown"`.
pub fn extract_title(document: &str) -> String {
    title_from_h1(document)
        .or_else(|| title_from_title_tag(document))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn title_from_h1(document: &str) -> Option<String> {
    let cap = H1_RE.captures(document)?;
    let inner = MARKUP_RE.replace_all(&cap[1], "");
    let trimmed = inner.trim();
    let trimmed = DOWNLOAD_PREFIX_RE.replace(trimmed, "");
    let trimmed = PLATFORM_SUFFIX_RE.replace(&trimmed, "");
    Some(trimmed.trim().to_string())
}

fn title_from_title_tag(document: &str) -> Option<String> {
    let cap = TITLE_TAG_RE.captures(document)?;
    let trimmed = DOWNLOAD_PREFIX_RE.replace(cap[1].trim(), "");
    Some(trimmed.trim().to_string())
}

/// Compiled assignment patterns, one per scanned variable name.
///
/// Each pattern matches `const <name> = "<value>"` (case-insensitive,
/// single- or double-quoted) at most once per page.
pub struct PatternSet {
    patterns: Vec<(String, Regex)>,
}

impl PatternSet {
    pub fn compile(variables: &[String]) -> Result<Self, regex::Error> {
        let mut patterns = Vec::with_capacity(variables.len());
        for var in variables {
            let re = Regex::new(&format!(
                r#"(?i)const\s+{}\s*=\s*["']([^"']+)["']"#,
                regex::escape(var)
            ))?;
            patterns.push((var.clone(), re));
        }
        Ok(Self { patterns })
    }

    /// Scan one page's raw text, yielding at most one record per variable.
    /// Placeholder values are dropped.
    pub fn extract_records(&self, document: &str, page_url: &str) -> Vec<ExtractionRecord> {
        let title = extract_title(document);
        let mut records = Vec::new();

        for (var, re) in &self.patterns {
            if let Some(cap) = re.captures(document) {
                let value = cap[1].trim();
                if is_placeholder(value) {
                    continue;
                }
                records.push(ExtractionRecord {
                    title: title.clone(),
                    page_url: page_url.to_string(),
                    variable: var.clone(),
                    download_url: value.to_string(),
                });
            }
        }

        records
    }
}

fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_SENTINELS.contains(&value)
}

// ── Tests ──
