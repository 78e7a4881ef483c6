//! Keyword matching.

use super::types::NewsRecord;

/// Whether any keyword occurs as a case-insensitive substring of the
/// record's title or description.
pub fn matches_any(record: &NewsRecord, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let text = format!("{} {}", record.title, record.description).to_lowercase();
    keywords
        .iter()
        .map(|k| k.to_lowercase())
        .any(|k| !k.is_empty() && text.contains(&k))
}

/// Select the records matching at least one keyword, keeping their order.
///
/// An empty keyword list selects nothing.
pub fn match_keywords<'r>(records: &'r [NewsRecord], keywords: &[String]) -> Vec<&'r NewsRecord> {
    records
        .iter()
        .filter(|r| matches_any(r, keywords))
        .collect()
}
