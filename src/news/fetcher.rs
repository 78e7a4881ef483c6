//! Source fetcher with security measures.
//!
//! Fetches RSS/Atom feeds and exchange announcement pages with SSRF
//! protection and resource limits.

use std::net::IpAddr;
use std::time::Duration;

use feed_rs::parser;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::types::RawEntry;
use crate::config::FeedsConfig;
use crate::datetime::from_millis;
use crate::error::{NewsbotError, Result};
use crate::subscription::{Source, SourceKind};

/// Success code returned by the announcement API.
const ANNOUNCEMENT_OK_CODE: &str = "000000";

/// Announcement catalog type requested from the API.
const ANNOUNCEMENT_TYPE: u32 = 1;

/// Source fetcher.
pub struct NewsFetcher {
    client: Client,
    max_entries: usize,
    max_size: u64,
    allow_private_hosts: bool,
    announcement_link_base: String,
}

impl NewsFetcher {
    /// Create a new fetcher from the feeds configuration.
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(redirect_policy(
                config.max_redirects,
                config.allow_private_hosts,
            ))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| NewsbotError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_entries: config.max_entries,
            max_size: config.max_feed_size_bytes,
            allow_private_hosts: config.allow_private_hosts,
            announcement_link_base: config.announcement_link_base.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the newest entries of a source.
    pub async fn fetch(&self, source: &Source) -> Result<Vec<RawEntry>> {
        validate_url(&source.url, self.allow_private_hosts)?;

        let entries = match source.kind {
            SourceKind::Rss => self.fetch_rss(source).await?,
            SourceKind::ExchangeAnnouncements => self.fetch_announcements(source).await?,
        };
        debug!(source = %source.name, entries = entries.len(), "Source fetched");
        Ok(entries)
    }

    async fn fetch_rss(&self, source: &Source) -> Result<Vec<RawEntry>> {
        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| NewsbotError::Fetch(format!("failed to fetch feed: {}", e)))?;

        let bytes = self.read_body(response).await?;
        parse_feed(&bytes, &source.name, self.max_entries)
    }

    async fn fetch_announcements(&self, source: &Source) -> Result<Vec<RawEntry>> {
        let body = serde_json::json!({
            "type": ANNOUNCEMENT_TYPE,
            "pageSize": self.max_entries,
            "pageNo": 1,
        });

        let response = self
            .client
            .post(&source.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NewsbotError::Fetch(format!("failed to fetch announcements: {}", e)))?;

        let bytes = self.read_body(response).await?;
        parse_announcements(
            &bytes,
            &source.name,
            &self.announcement_link_base,
            self.max_entries,
        )
    }

    /// Check status and size limits and read the body.
    async fn read_body(&self, response: Response) -> Result<Vec<u8>> {
        if !response.status().is_success() {
            return Err(NewsbotError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(NewsbotError::Fetch(format!(
                    "response too large: {} bytes (max {} bytes)",
                    content_length, self.max_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NewsbotError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > self.max_size {
            return Err(NewsbotError::Fetch(format!(
                "response too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_size
            )));
        }

        Ok(bytes.to_vec())
    }
}

/// Redirect policy that applies the URL checks to every hop.
fn redirect_policy(max_redirects: usize, allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        let hops = attempt.previous().len();
        match check_redirect(attempt.url(), hops, max_redirects, allow_private_hosts) {
            Ok(()) => attempt.follow(),
            Err(e) => attempt.error(e),
        }
    })
}

/// Check one redirect hop. `hops` counts the URLs already visited.
fn check_redirect(
    target: &url::Url,
    hops: usize,
    max_redirects: usize,
    allow_private_hosts: bool,
) -> Result<()> {
    if hops > max_redirects {
        return Err(NewsbotError::Fetch(format!(
            "too many redirects (max {})",
            max_redirects
        )));
    }
    validate_url(target.as_str(), allow_private_hosts)
        .map_err(|e| NewsbotError::Fetch(format!("redirect rejected: {}", e)))
}

/// Validate a URL for SSRF protection.
///
/// This function checks that:
/// - The URL uses http or https scheme
/// - The host is not a private/loopback address or internal hostname,
///   unless `allow_private_hosts` is set
pub fn validate_url(url: &str, allow_private_hosts: bool) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| NewsbotError::Fetch(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(NewsbotError::Fetch(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| NewsbotError::Fetch("URL has no host".to_string()))?;

    if allow_private_hosts {
        return Ok(());
    }

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(NewsbotError::Fetch(format!("forbidden host: {}", domain)));
            }
        }
        url::Host::Ipv4(ipv4) => {
            let ip = IpAddr::V4(ipv4);
            if is_private_ip(&ip) {
                return Err(NewsbotError::Fetch(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
        url::Host::Ipv6(ipv6) => {
            let ip = IpAddr::V6(ipv6);
            if is_private_ip(&ip) {
                return Err(NewsbotError::Fetch(format!(
                    "private IP address not allowed: {}",
                    ip
                )));
            }
        }
    }

    Ok(())
}

/// Check if a hostname is forbidden.
fn is_forbidden_hostname(host: &str) -> bool {
    let host_lower = host.to_lowercase();

    if host_lower == "localhost" {
        return true;
    }

    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    FORBIDDEN_SUFFIXES
        .iter()
        .any(|suffix| host_lower.ends_with(suffix))
}

/// Check if an IP address is private/reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // Documentation: 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24
                || (octets[0] == 192 && octets[1] == 0 && octets[2] == 2)
                || (octets[0] == 198 && octets[1] == 51 && octets[2] == 100)
                || (octets[0] == 203 && octets[1] == 0 && octets[2] == 113)
        }
        IpAddr::V6(ipv6) => {
            let segments = ipv6.segments();
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Parse RSS/Atom bytes into raw entries, newest first, at most `max_entries`.
pub fn parse_feed(bytes: &[u8], source_name: &str, max_entries: usize) -> Result<Vec<RawEntry>> {
    let feed = parser::parse(bytes)
        .map_err(|e| NewsbotError::Fetch(format!("failed to parse feed: {}", e)))?;

    let mut entries: Vec<RawEntry> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone())?;
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            let description = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body));

            Some(RawEntry {
                title,
                identity: link.clone(),
                link,
                description,
                published: entry.published.or(entry.updated),
                kind: SourceKind::Rss,
                source_name: source_name.to_string(),
            })
        })
        .collect();

    // Entries without a date keep their feed order after dated ones
    entries.sort_by(|a, b| b.published.cmp(&a.published));
    entries.truncate(max_entries);
    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct AnnouncementResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<AnnouncementData>,
}

#[derive(Debug, Deserialize)]
struct AnnouncementData {
    #[serde(default)]
    catalogs: Vec<AnnouncementItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnouncementItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    release_date: Option<i64>,
}

/// Parse an announcement API response into raw entries.
pub fn parse_announcements(
    bytes: &[u8],
    source_name: &str,
    link_base: &str,
    max_entries: usize,
) -> Result<Vec<RawEntry>> {
    let response: AnnouncementResponse = serde_json::from_slice(bytes)
        .map_err(|e| NewsbotError::Fetch(format!("failed to parse announcements: {}", e)))?;

    if response.code != ANNOUNCEMENT_OK_CODE {
        return Err(NewsbotError::Fetch(format!(
            "announcement API returned code {}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let entries = response
        .data
        .map(|d| d.catalogs)
        .unwrap_or_default()
        .into_iter()
        .filter(|item| !item.code.is_empty() && !item.title.is_empty())
        .take(max_entries)
        .map(|item| RawEntry {
            link: format!("{}/{}", link_base, item.code),
            title: item.title,
            identity: item.code,
            description: item.description,
            published: item.release_date.and_then(from_millis),
            kind: SourceKind::ExchangeAnnouncements,
            source_name: source_name.to_string(),
        })
        .collect();

    Ok(entries)
}
