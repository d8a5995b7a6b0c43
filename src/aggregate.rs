use std::collections::HashSet;

use crate::extract::ExtractionRecord;

/// Drop records whose download URL was already seen, keeping the first
/// occurrence. Returns the surviving records in arrival order plus the
/// number removed.
pub fn dedupe(records: Vec<ExtractionRecord>) -> (Vec<ExtractionRecord>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());
    let mut removed = 0usize;

    for record in records {
        if seen.insert(record.download_url.clone()) {
            unique.push(record);
        } else {
            removed += 1;
        }
    }

    (unique, removed)
}

// ── Tests ──
