//! Decodes syndication documents into the channel/item shape the aggregator ingests.
//!
//! Structural decoding is delegated to `feed_rs`; afterwards every text field is run
//! through HTML entity decoding so that titles escaped twice by the publisher
//! (`&amp;amp;`) still come out readable.

use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;

use crate::errors::AppResult;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedItem {
    pub title: String,
    /// Empty when the entry carries no link
    pub link: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Parses raw document bytes. Malformed input is a `FeedParseError`.
pub fn parse_feed(body: &[u8]) -> AppResult<ParsedFeed> {
    let parsed = feed_rs::parser::parse(body)?;
    log::debug!("Parsed feed with {} entries", parsed.entries.len());
    Ok(ParsedFeed::from(parsed).unescaped())
}

impl From<feed_rs::model::Feed> for ParsedFeed {
    fn from(feed: feed_rs::model::Feed) -> Self {
        let title = feed.title.map(|t| t.content).unwrap_or_default();
        let link = feed
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        let description = feed.description.map(|d| d.content).unwrap_or_default();

        let items = feed
            .entries
            .into_iter()
            .map(|entry| {
                let summary = entry.summary.map(|s| s.content);
                let description = summary
                    .clone()
                    .or_else(|| entry.content.and_then(|c| c.body));
                let item_title = entry
                    .title
                    .map(|t| t.content)
                    .or(summary)
                    .unwrap_or_else(|| title.clone());

                ParsedItem {
                    title: item_title,
                    link: entry
                        .links
                        .first()
                        .map(|l| l.href.clone())
                        .unwrap_or_default(),
                    description,
                    published_at: entry.published.or(entry.updated),
                }
            })
            .collect();

        ParsedFeed {
            title,
            link,
            description,
            items,
        }
    }
}

impl ParsedFeed {
    /// Reverses character-reference escaping in every text field of the channel and its items.
    pub fn unescaped(mut self) -> Self {
        unescape_in_place(&mut self.title);
        unescape_in_place(&mut self.link);
        unescape_in_place(&mut self.description);
        for item in &mut self.items {
            unescape_in_place(&mut item.title);
            unescape_in_place(&mut item.link);
            if let Some(description) = item.description.as_mut() {
                unescape_in_place(description);
            }
        }
        self
    }
}

fn unescape_in_place(text: &mut String) {
    let decoded = decode_html_entities(text.as_str());
    if decoded != text.as_str() {
        *text = decoded.into_owned();
    }
}
