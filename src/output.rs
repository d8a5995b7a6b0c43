use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::extract::ExtractionRecord;

pub const CSV_COLUMNS: [&str; 4] = ["Title", "Page URL", "Variable", "Download URL"];

const CSV_FILE: &str = "download_links.csv";

/// Create the timestamped folder this run's files go into. Never reused:
/// each run gets its own `pesktop_samples_YYYY-MM-DD_HHMMSS`.
pub fn create_run_dir(root: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
    let dir = root.join(format!("pesktop_samples_{}", timestamp));
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating output folder {}", dir.display()))?;
    info!("Created output folder: {}", dir.display());
    Ok(dir)
}

/// Write the CSV table plus one newline-delimited URL list per distinct
/// variable name. Returns the CSV path.
pub fn write_results(dir: &Path, records: &[ExtractionRecord]) -> Result<PathBuf> {
    let csv_path = dir.join(CSV_FILE);
    let mut writer =
        csv::Writer::from_path(&csv_path).with_context(|| format!("creating {}", csv_path.display()))?;
    writer.write_record(CSV_COLUMNS)?;
    for record in records {
        writer.write_record([
            &record.title,
            &record.page_url,
            &record.variable,
            &record.download_url,
        ])?;
    }
    writer.flush()?;

    let mut by_variable: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in records {
        by_variable
            .entry(record.variable.as_str())
            .or_default()
            .push(record.download_url.as_str());
    }
    for (variable, urls) in by_variable {
        let path = dir.join(format!("{}_urls.txt", variable.to_lowercase()));
        let mut body = urls.join("\n");
        body.push('\n');
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(csv_path)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, variable: &str, download_url: &str) -> ExtractionRecord {
        ExtractionRecord {
            title: title.to_string(),
            page_url: format!("https://pesktop.com/en/windows/{}", title.to_lowercase()),
            variable: variable.to_string(),
            download_url: download_url.to_string(),
        }
    }

    #[test]
    fn run_dir_is_timestamped() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_run_dir(root.path()).unwrap();
        assert!(dir.is_dir());
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("pesktop_samples_"));
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("Foo", "downloadUrl", "https://dl.example.com/foo.exe"),
            record("Bar", "downloadUrl", "https://dl.example.com/bar.dmg"),
        ];
        let csv_path = write_results(dir.path(), &records).unwrap();

        let csv = fs::read_to_string(csv_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Title,Page URL,Variable,Download URL"));
        assert_eq!(
            lines.next(),
            Some("Foo,https://pesktop.com/en/windows/foo,downloadUrl,https://dl.example.com/foo.exe")
        );
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn url_list_per_variable() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("Foo", "downloadUrl", "https://dl.example.com/foo.exe"),
            record("Bar", "mirrorUrl", "https://mirror.example.com/bar.dmg"),
            record("Baz", "downloadUrl", "https://dl.example.com/baz.exe"),
        ];
        write_results(dir.path(), &records).unwrap();

        let main_list = fs::read_to_string(dir.path().join("downloadurl_urls.txt")).unwrap();
        assert_eq!(
            main_list,
            "https://dl.example.com/foo.exe\nhttps://dl.example.com/baz.exe\n"
        );
        let mirror_list = fs::read_to_string(dir.path().join("mirrorurl_urls.txt")).unwrap();
        assert_eq!(mirror_list, "https://mirror.example.com/bar.dmg\n");
    }
}
