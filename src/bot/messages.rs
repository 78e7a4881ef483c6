//! Reply texts and keyboards.

use crate::news::dispatcher::escape_html;
use crate::subscription::{AddKeywordsOutcome, Source, SourceKind};
use crate::telegram::ReplyKeyboardMarkup;

pub const BTN_KEYWORDS: &str = "\u{1f4cb} My keywords";
pub const BTN_ADD: &str = "\u{2795} Add keywords";
pub const BTN_REMOVE: &str = "\u{2796} Remove keyword";
pub const BTN_CLEAR: &str = "\u{1f5d1} Clear keywords";
pub const BTN_SOURCES: &str = "\u{1f4f0} Sources";
pub const BTN_ADD_SOURCE: &str = "\u{2795} Add source";
pub const BTN_REMOVE_SOURCE: &str = "\u{2796} Remove source";
pub const BTN_INTERVAL: &str = "\u{23f1} Interval";
pub const BTN_HELP: &str = "\u{2753} Help";
pub const BTN_CANCEL: &str = "\u{274c} Cancel";
pub const BTN_KIND_RSS: &str = "RSS feed";
pub const BTN_KIND_ANNOUNCEMENTS: &str = "Exchange announcements";

/// Keyboard shown while idle.
pub fn main_keyboard() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup::from_rows(&[
        &[BTN_KEYWORDS, BTN_ADD, BTN_REMOVE],
        &[BTN_SOURCES, BTN_ADD_SOURCE, BTN_REMOVE_SOURCE],
        &[BTN_INTERVAL, BTN_CLEAR, BTN_HELP],
    ])
}

/// Keyboard shown while waiting for input.
pub fn cancel_keyboard() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup::from_rows(&[&[BTN_CANCEL]])
}

/// Keyboard for choosing the kind of a new source.
pub fn source_kind_keyboard() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup::from_rows(&[&[BTN_KIND_RSS, BTN_KIND_ANNOUNCEMENTS], &[BTN_CANCEL]])
}

pub fn welcome(first_name: &str) -> String {
    let name = if first_name.is_empty() {
        "there".to_string()
    } else {
        escape_html(first_name)
    };
    format!(
        "Hi, {name}! I watch crypto news sources and send you items that mention your keywords.\n\n\
         Add a few keywords to get started."
    )
}

pub fn help(max_keywords: usize) -> String {
    format!(
        "<b>Commands</b>\n\
         /keywords - show your keywords\n\
         /add - add keywords (comma-separated)\n\
         /remove - remove a keyword\n\
         /clear - remove all keywords\n\
         /sources - show news sources\n\
         /add_source - add a news source\n\
         /remove_source - remove a news source\n\
         /interval - set how often you get updates\n\
         /cancel - cancel the current action\n\n\
         Keywords match anywhere in a title or description, ignoring case. \
         You can keep up to {max_keywords} keywords."
    )
}

pub fn keyword_list(keywords: &[String]) -> String {
    if keywords.is_empty() {
        return "You have no keywords yet. Use /add to add some.".to_string();
    }
    let lines: Vec<String> = keywords
        .iter()
        .map(|k| format!("\u{2022} {}", escape_html(k)))
        .collect();
    format!("<b>Your keywords</b>\n{}", lines.join("\n"))
}

pub const PROMPT_ADD_KEYWORDS: &str =
    "Send keywords separated by commas, e.g. <i>bitcoin, eth, etf</i>";

pub fn prompt_remove_keyword(keywords: &[String]) -> String {
    format!("{}\n\nSend the keyword to remove.", keyword_list(keywords))
}

pub fn keywords_added(outcome: &AddKeywordsOutcome) -> String {
    let mut parts = Vec::new();
    if !outcome.added.is_empty() {
        parts.push(format!(
            "\u{2705} Added: {}",
            escape_html(&outcome.added.join(", "))
        ));
    }
    if !outcome.skipped.is_empty() {
        parts.push(format!(
            "Already in your list: {}",
            escape_html(&outcome.skipped.join(", "))
        ));
    }
    for (input, reason) in &outcome.invalid {
        parts.push(format!(
            "\u{26a0}\u{fe0f} {}: {}",
            escape_html(input),
            escape_html(reason)
        ));
    }
    parts.join("\n")
}

pub fn keyword_removed(word: &str) -> String {
    format!("\u{2705} Removed: {}", escape_html(word.trim()))
}

pub fn keyword_not_found(word: &str) -> String {
    format!(
        "You have no keyword \"{}\". Send another one or /cancel.",
        escape_html(word.trim())
    )
}

pub fn keywords_cleared(count: u64) -> String {
    format!("\u{2705} Removed {count} keywords.")
}

fn kind_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Rss => "RSS",
        SourceKind::ExchangeAnnouncements => "announcements",
    }
}

pub fn source_list(sources: &[Source]) -> String {
    if sources.is_empty() {
        return "No news sources are configured. Use /add_source to add one.".to_string();
    }
    let lines: Vec<String> = sources
        .iter()
        .map(|s| {
            format!(
                "#{} <b>{}</b> ({})\n{}",
                s.id,
                escape_html(&s.name),
                kind_label(s.kind),
                escape_html(&s.url)
            )
        })
        .collect();
    format!("<b>News sources</b>\n\n{}", lines.join("\n\n"))
}

pub const PROMPT_SOURCE_KIND: &str = "What kind of source do you want to add?";

pub const PROMPT_RSS_SOURCE: &str =
    "Send the feed as <i>name | url</i>, e.g. <i>Decrypt | https://decrypt.co/feed</i>";

pub const INVALID_SOURCE_KIND: &str = "Please choose one of the buttons below.";

pub fn prompt_remove_source(sources: &[Source]) -> String {
    format!(
        "{}\n\nSend the number of the source to remove.",
        source_list(sources)
    )
}

pub fn source_added(source: &Source) -> String {
    format!(
        "\u{2705} Source added: <b>{}</b>",
        escape_html(&source.name)
    )
}

pub fn source_removed(source: &Source) -> String {
    format!(
        "\u{2705} Source removed: <b>{}</b>",
        escape_html(&source.name)
    )
}

pub fn source_not_found(id: i64) -> String {
    format!("There is no source #{id}. Send another number or /cancel.")
}

pub fn prompt_interval(current: i64) -> String {
    format!(
        "Your updates come every {current} seconds.\n\
         Send a new interval in seconds, from 60 to 3600."
    )
}

pub fn interval_set(seconds: i64) -> String {
    format!("\u{2705} You will get updates every {seconds} seconds.")
}

pub const CANCELLED: &str = "Cancelled.";

pub const UNRECOGNIZED: &str = "Use the menu below or /help.";

pub fn unknown_command(name: &str) -> String {
    format!("Unknown command /{}. See /help.", escape_html(name))
}

pub fn invalid_input(reason: &str) -> String {
    format!("\u{26a0}\u{fe0f} {}", escape_html(reason))
}

pub const INTERNAL_ERROR: &str = "Something went wrong, please try again later.";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_keyword_list() {
        assert!(keyword_list(&[]).contains("no keywords"));
        let text = keyword_list(&["eth".to_string(), "btc".to_string()]);
        assert!(text.contains("\u{2022} eth\n\u{2022} btc"));
    }

    #[test]
    fn test_keywords_added() {
        let outcome = AddKeywordsOutcome {
            added: vec!["eth".to_string(), "btc".to_string()],
            skipped: vec!["sol".to_string()],
            invalid: vec![("x".to_string(), "too short".to_string())],
        };
        let text = keywords_added(&outcome);
        assert!(text.contains("Added: eth, btc"));
        assert!(text.contains("Already in your list: sol"));
        assert!(text.contains("x: too short"));
    }

    #[test]
    fn test_source_list_escapes() {
        let sources = vec![Source {
            id: 3,
            name: "A <b> feed".to_string(),
            url: "https://example.com/rss?a=1&b=2".to_string(),
            kind: SourceKind::Rss,
            is_active: true,
            added_at: Utc::now(),
            last_fetch_at: None,
        }];
        let text = source_list(&sources);
        assert!(text.contains("#3 <b>A &lt;b&gt; feed</b> (RSS)"));
        assert!(text.contains("a=1&amp;b=2"));
    }

    #[test]
    fn test_welcome_escapes_name() {
        assert!(welcome("<Ann>").contains("&lt;Ann&gt;"));
        assert!(welcome("").contains("Hi, there!"));
    }

    #[test]
    fn test_main_keyboard_layout() {
        let keyboard = main_keyboard();
        assert_eq!(keyboard.keyboard.len(), 3);
        assert!(keyboard.resize_keyboard);
    }
}
