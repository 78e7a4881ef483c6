//! Normalization and fingerprinting of raw entries.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::types::{NewsRecord, RawEntry, MAX_DESCRIPTION_CHARS, TRUNCATION_MARKER};

/// Separates title and identity in the fingerprint input.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Turn a raw entry into a record.
///
/// `now` is used when the entry carries no publication time.
pub fn normalize(entry: RawEntry, now: DateTime<Utc>) -> NewsRecord {
    let title = strip_html(&entry.title);
    let description = entry
        .description
        .map(|d| truncate_description(&strip_html(&d)))
        .unwrap_or_default();
    let hash = fingerprint(&title, &entry.identity);

    NewsRecord {
        title,
        link: entry.link,
        description,
        published: entry.published.unwrap_or(now),
        hash,
        kind: entry.kind,
        source_name: entry.source_name,
    }
}

/// SHA-256 hex digest over the title and the entry's identity.
pub fn fingerprint(title: &str, identity: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(FIELD_SEPARATOR.to_string().as_bytes());
    hasher.update(identity.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Truncate to 200 characters followed by the marker.
///
/// Text that already fits is returned unchanged.
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Strip HTML tags, decode common entities and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        match ch {
            '<' if !in_entity => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // Tags separate words
                result.push(' ');
            }
            '&' if !in_tag => {
                if in_entity {
                    // "&&": the first one was a literal
                    result.push('&');
                    result.push_str(&entity);
                }
                in_entity = true;
                entity.clear();
            }
            ';' if in_entity => {
                in_entity = false;
                push_entity(&mut result, &entity);
            }
            _ if in_entity => {
                if ch.is_alphanumeric() || ch == '#' {
                    entity.push(ch);
                } else {
                    // Not an entity after all
                    in_entity = false;
                    result.push('&');
                    result.push_str(&entity);
                    if ch == '<' {
                        in_tag = true;
                    } else {
                        result.push(ch);
                    }
                }
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    if in_entity {
        result.push('&');
        result.push_str(&entity);
    }

    result.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn push_entity(out: &mut String, entity: &str) {
    match entity {
        "amp" => out.push('&'),
        "lt" => out.push('<'),
        "gt" => out.push('>'),
        "quot" => out.push('"'),
        "apos" | "#39" => out.push('\''),
        "nbsp" => out.push(' '),
        "mdash" => out.push('\u{2014}'),
        "ndash" => out.push('\u{2013}'),
        "hellip" => out.push('\u{2026}'),
        "laquo" => out.push('\u{ab}'),
        "raquo" => out.push('\u{bb}'),
        _ => match parse_numeric_entity(entity).and_then(char::from_u32) {
            Some(c) => out.push(c),
            None => {
                out.push('&');
                out.push_str(entity);
                out.push(';');
            }
        },
    }
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    let digits = entity.strip_prefix('#')?;
    match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => digits.parse().ok(),
    }
}
