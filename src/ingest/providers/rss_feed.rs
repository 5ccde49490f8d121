// src/ingest/providers/rss_feed.rs
//! Feed adapter for RSS 2.0 and Atom documents.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{clean_opt, clean_text, parse_timestamp};

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    enclosure: Vec<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<AtomText>,
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

pub struct RssFeedProvider {
    /// Feed URL, or a label for fixtures. Doubles as provider name.
    origin: String,
    mode: Mode,
    max_items: usize,
}

impl RssFeedProvider {
    pub fn from_url(url: &str, client: reqwest::Client, max_items: usize) -> Self {
        Self {
            origin: url.to_string(),
            mode: Mode::Http { client },
            max_items: max_items.max(1),
        }
    }

    pub fn from_fixture(origin: &str, xml: &str, max_items: usize) -> Self {
        Self {
            origin: origin.to_string(),
            mode: Mode::Fixture(xml.to_string()),
            max_items: max_items.max(1),
        }
    }

    /// Parse an RSS or Atom document into at most `max_items` raw items,
    /// keeping document order. `origin` labels items when the feed has no title.
    pub fn parse_feed(xml: &str, origin: &str, max_items: usize) -> Result<Vec<RawItem>> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        match root_element(&xml_clean)?.as_str() {
            "rss" => parse_rss(&xml_clean, origin, max_items),
            "feed" => parse_atom(&xml_clean, origin, max_items),
            other => bail!("unsupported feed root element <{other}>"),
        }
    }
}

#[async_trait]
impl SourceProvider for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_feed(s, &self.origin, self.max_items),
            Mode::Http { client } => {
                let body = client
                    .get(&self.origin)
                    .send()
                    .await
                    .with_context(|| format!("feed get() {}", self.origin))?
                    .error_for_status()
                    .with_context(|| format!("feed status {}", self.origin))?
                    .text()
                    .await
                    .with_context(|| format!("feed .text() {}", self.origin))?;
                Self::parse_feed(&body, &self.origin, self.max_items)
            }
        }
    }

    fn name(&self) -> &str {
        &self.origin
    }
}

fn parse_rss(xml: &str, origin: &str, max_items: usize) -> Result<Vec<RawItem>> {
    let rss: Rss = from_str(xml).context("parsing rss xml")?;
    let source = feed_label(rss.channel.title.as_deref(), origin);

    let out = rss
        .channel
        .item
        .into_iter()
        .take(max_items)
        .filter_map(|it| {
            let title = clean_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                return None;
            }
            Some(RawItem {
                title,
                description: clean_opt(it.description.as_deref()),
                url: non_blank(it.link),
                image: it.enclosure.into_iter().find_map(|e| non_blank(e.url)),
                source: Some(source.clone()),
                published_at: it.pub_date.as_deref().and_then(parse_timestamp),
            })
        })
        .collect();
    Ok(out)
}

fn parse_atom(xml: &str, origin: &str, max_items: usize) -> Result<Vec<RawItem>> {
    let feed: AtomFeed = from_str(xml).context("parsing atom xml")?;
    let source = feed_label(feed.title.as_ref().map(|t| t.value.as_str()), origin);

    let out = feed
        .entry
        .into_iter()
        .take(max_items)
        .filter_map(|e| {
            let title = clean_text(e.title.as_ref().map(|t| t.value.as_str()).unwrap_or_default());
            if title.is_empty() {
                return None;
            }
            let url = e
                .link
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .and_then(|l| l.href.clone());
            let image = e
                .link
                .iter()
                .find(|l| l.rel.as_deref() == Some("enclosure"))
                .and_then(|l| l.href.clone());
            Some(RawItem {
                title,
                description: clean_opt(e.summary.as_ref().map(|t| t.value.as_str()))
                    .or_else(|| clean_opt(e.content.as_ref().map(|t| t.value.as_str()))),
                url: non_blank(url),
                image: non_blank(image),
                source: Some(source.clone()),
                published_at: e
                    .published
                    .as_deref()
                    .or(e.updated.as_deref())
                    .and_then(parse_timestamp),
            })
        })
        .collect();
    Ok(out)
}

/// Local name of the first element in the document.
fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().context("scanning feed xml")? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase());
            }
            Event::Eof => return Err(anyhow!("empty feed document")),
            _ => {}
        }
    }
}

/// Feed title, else the URL host, else the raw origin string.
fn feed_label(title: Option<&str>, origin: &str) -> String {
    if let Some(t) = clean_opt(title) {
        return t;
    }
    reqwest::Url::parse(origin)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| origin.to_string())
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// HTML entities that feeds use but XML does not define.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>BBC News</title>
    <link>https://www.bbc.co.uk/news</link>
    <item>
      <title>Rain in Delhi</title>
      <link>https://bbc.example/rain</link>
      <description><![CDATA[<p>Heavy rain&nbsp;floods roads.</p>]]></description>
      <pubDate>Wed, 01 May 2024 10:30:00 +0000</pubDate>
      <enclosure url="https://bbc.example/rain.jpg" type="image/jpeg" length="0"/>
    </item>
    <item>
      <title></title>
      <link>https://bbc.example/empty</link>
    </item>
    <item>
      <title>Election results</title>
      <link>https://bbc.example/poll</link>
      <pubDate>sometime</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">Example Wire</title>
  <link href="https://wire.example/"/>
  <entry>
    <title type="html">Markets &amp;amp; more</title>
    <link rel="alternate" href="https://wire.example/m"/>
    <link rel="enclosure" href="https://wire.example/m.png"/>
    <updated>2024-05-01T09:00:00Z</updated>
    <summary>Stocks rose.</summary>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_are_mapped_and_blank_titles_dropped() {
        let items = RssFeedProvider::parse_feed(RSS, "https://bbc.example/rss", 20).unwrap();
        assert_eq!(items.len(), 2);
        let rain = &items[0];
        assert_eq!(rain.source.as_deref(), Some("BBC News"));
        assert_eq!(rain.description.as_deref(), Some("Heavy rain floods roads."));
        assert_eq!(rain.image.as_deref(), Some("https://bbc.example/rain.jpg"));
        assert!(rain.published_at.is_some());
        assert_eq!(items[1].title, "Election results");
        assert_eq!(items[1].published_at, None);
    }

    #[test]
    fn rss_cap_counts_entries_in_document_order() {
        let items = RssFeedProvider::parse_feed(RSS, "x", 1).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Rain in Delhi");
    }

    #[test]
    fn atom_entries_are_mapped() {
        let items = RssFeedProvider::parse_feed(ATOM, "https://wire.example/atom", 20).unwrap();
        assert_eq!(items.len(), 1);
        let m = &items[0];
        assert_eq!(m.title, "Markets & more");
        assert_eq!(m.source.as_deref(), Some("Example Wire"));
        assert_eq!(m.url.as_deref(), Some("https://wire.example/m"));
        assert_eq!(m.image.as_deref(), Some("https://wire.example/m.png"));
        assert_eq!(m.description.as_deref(), Some("Stocks rose."));
        assert!(m.published_at.is_some());
    }

    #[test]
    fn untitled_feed_is_labelled_by_host() {
        let xml = r#"<rss><channel><item><title>A</title></item></channel></rss>"#;
        let items = RssFeedProvider::parse_feed(xml, "https://feeds.example.org/top.rss", 5).unwrap();
        assert_eq!(items[0].source.as_deref(), Some("feeds.example.org"));
    }

    #[test]
    fn non_feed_documents_are_errors() {
        assert!(RssFeedProvider::parse_feed("<html><body/></html>", "x", 5).is_err());
        assert!(RssFeedProvider::parse_feed("", "x", 5).is_err());
        assert!(RssFeedProvider::parse_feed("<rss><channel>", "x", 5).is_err());
    }
}
