//! Feed document parsing.
//!
//! Delegates format detection (RSS 0.9x/1.0/2.0, Atom, JSON Feed) to `feed-rs`
//! and flattens each item into a [`FeedEntry`], keeping the parser's order.

use feed_rs::model::{Entry, Link};
use newsdesk_shared::{FeedEntry, NewsdeskError, Result};

/// Parse a raw feed document fetched from `source_url`.
pub(crate) fn parse_feed(bytes: &[u8], source_url: &str) -> Result<Vec<FeedEntry>> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| NewsdeskError::parse(format!("{source_url}: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| to_feed_entry(entry, source_url))
        .collect())
}

fn to_feed_entry(entry: Entry, source_url: &str) -> FeedEntry {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    let link = preferred_link(entry.links);

    // Atom entries often carry only <content>; use it when <summary> is missing.
    let summary = entry
        .summary
        .map(|t| t.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    FeedEntry {
        title,
        link,
        summary,
        source: source_url.to_string(),
        published: entry.published.or(entry.updated),
    }
}

/// First `alternate` (or untyped) link, else the first link of any kind.
fn preferred_link(links: Vec<Link>) -> String {
    let index = links
        .iter()
        .position(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .unwrap_or(0);
    links
        .into_iter()
        .nth(index)
        .map(|l| l.href)
        .unwrap_or_default()
}
