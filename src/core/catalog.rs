use crate::adapters::http;
use crate::domain::model::YearEntry;
use crate::domain::ports::{ConfigProvider, ListingParser};
use crate::utils::error::{EtlError, Result};
use chrono::Datelike;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Picks yearly CSV links out of the portal's listing page.
///
/// A link qualifies when its text is a year ("2023") or a year range
/// ("1941-1979"), or failing that when its file name carries a year; the href
/// must point at a `.csv`, and when keywords are configured the href must
/// contain one of them.
#[derive(Debug, Clone)]
pub struct AnchorListingParser {
    min_year: i32,
    max_year: i32,
    keywords: Vec<String>,
    label_pattern: Regex,
    href_year_pattern: Regex,
}

impl AnchorListingParser {
    pub fn new(min_year: i32, max_year: i32, keywords: &[String]) -> Self {
        Self {
            min_year,
            max_year,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            label_pattern: Regex::new(r"^(\d{4})(?:-(\d{4}))?$").expect("valid regex"),
            href_year_pattern: Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)")
                .expect("valid regex"),
        }
    }

    /// Years from `min_year` up to the current calendar year.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        let current_year = chrono::Local::now().year();
        Self::new(config.min_year(), current_year, config.link_keywords())
    }

    fn in_range(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }

    fn href_accepted(&self, href: &str) -> bool {
        let href = href.to_lowercase();
        if !href.contains(".csv") {
            return false;
        }
        self.keywords.is_empty() || self.keywords.iter().any(|k| href.contains(k.as_str()))
    }

    fn years_from_label(&self, text: &str) -> Option<(i32, Option<i32>)> {
        let caps = self.label_pattern.captures(text)?;
        let start: i32 = caps.get(1)?.as_str().parse().ok()?;
        let end = match caps.get(2) {
            Some(m) => {
                let end: i32 = m.as_str().parse().ok()?;
                if end < start || !self.in_range(end) {
                    return None;
                }
                Some(end)
            }
            None => None,
        };
        self.in_range(start).then_some((start, end))
    }

    fn year_from_href(&self, url: &Url) -> Option<i32> {
        let file_name = url.path_segments()?.next_back()?;
        self.href_year_pattern
            .captures_iter(file_name)
            .filter_map(|c| c.get(1)?.as_str().parse::<i32>().ok())
            .find(|y| self.in_range(*y))
    }
}

impl ListingParser for AnchorListingParser {
    fn parse_listing(&self, html: &str, base_url: &Url) -> Result<Vec<YearEntry>> {
        let document = Html::parse_document(html);
        let anchors = Selector::parse("a[href]").map_err(|e| EtlError::ParseError {
            message: format!("Invalid selector: {:?}", e),
        })?;

        let mut found: BTreeMap<(i32, Option<i32>), YearEntry> = BTreeMap::new();

        for anchor in document.select(&anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !self.href_accepted(href) {
                continue;
            }

            let source_url = match base_url.join(href.trim()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Skipping unresolvable link {:?}: {}", href, e);
                    continue;
                }
            };

            let text = anchor.text().collect::<String>();
            let text = text.trim();

            let (key, label) = match self.years_from_label(text) {
                Some(years) => (years, text.to_string()),
                None => match self.year_from_href(&source_url) {
                    Some(year) => ((year, None), year.to_string()),
                    None => continue,
                },
            };

            if found.contains_key(&key) {
                tracing::debug!("Duplicate link for {}, keeping the first: {}", label, source_url);
                continue;
            }

            found.insert(
                key,
                YearEntry {
                    year: key.0,
                    end_year: key.1,
                    label,
                    source_url: source_url.to_string(),
                },
            );
        }

        if found.is_empty() {
            return Err(EtlError::ParseError {
                message: format!("No yearly CSV links found on {}", base_url),
            });
        }

        // 年份由新到舊
        Ok(found.into_values().rev().collect())
    }
}

/// Fetches the listing page and hands its markup to a [`ListingParser`].
pub struct CatalogDiscoverer<P: ListingParser = AnchorListingParser> {
    client: Client,
    listing_url: Url,
    parser: P,
}

impl CatalogDiscoverer<AnchorListingParser> {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = http::build_client(config)?;
        Self::with_parser(
            client,
            config.listing_url(),
            AnchorListingParser::from_config(config),
        )
    }
}

impl<P: ListingParser> CatalogDiscoverer<P> {
    pub fn with_parser(client: Client, listing_url: &str, parser: P) -> Result<Self> {
        let listing_url = Url::parse(listing_url).map_err(|e| EtlError::InvalidConfigValueError {
            field: "source.listing_url".to_string(),
            value: listing_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            listing_url,
            parser,
        })
    }

    pub async fn discover(&self) -> Result<Vec<YearEntry>> {
        tracing::info!("🔎 Looking for available years on {}", self.listing_url);

        let html = http::get_text(&self.client, self.listing_url.as_str()).await?;
        let entries = self.parser.parse_listing(&html, &self.listing_url)?;

        tracing::info!("📅 Found {} downloadable years", entries.len());
        Ok(entries)
    }

    /// Entry whose year (or range) covers `year`.
    pub async fn find(&self, year: i32) -> Result<YearEntry> {
        self.discover()
            .await?
            .into_iter()
            .find(|e| e.covers(year))
            .ok_or_else(|| EtlError::ParseError {
                message: format!("Year {} is not listed on {}", year, self.listing_url),
            })
    }
}
