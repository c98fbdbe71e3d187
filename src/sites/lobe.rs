use super::{absolute_url, css, select_text, UNNAMED};
use crate::{
    error::ScrapeError,
    fetch::Fetcher,
    listing::{ListingRecord, Status},
    Extractor,
};
use scraper::{Html, Selector};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LobeConfig {
    pub url: String,
    pub base_url: String,
    pub card: String,
    pub title: String,
    pub location: String,
    pub slug: String,
}

impl Default for LobeConfig {
    fn default() -> Self {
        LobeConfig {
            url: "https://www.grupolobe.com/pisos-obra-nueva-valencia/".to_string(),
            base_url: "https://www.grupolobe.com/".to_string(),
            card: "label.container-check".to_string(),
            title: "span.promo".to_string(),
            location: "span.zona".to_string(),
            slug: "input[value]".to_string(),
        }
    }
}

/// Grupo LOBE lists its developments as a checkbox filter with neither price
/// nor bedrooms, so every card is kept as upcoming and only the location
/// decides.
#[derive(Debug)]
pub struct Lobe {
    config: LobeConfig,
    card: Selector,
    title: Selector,
    location: Selector,
    slug: Selector,
}

impl Lobe {
    pub fn new(config: LobeConfig) -> Result<Self, ScrapeError> {
        Ok(Lobe {
            card: css(&config.card)?,
            title: css(&config.title)?,
            location: css(&config.location)?,
            slug: css(&config.slug)?,
            config,
        })
    }

    pub fn parse(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        doc.select(&self.card)
            .map(|card| {
                let url = card
                    .select(&self.slug)
                    .next()
                    .and_then(|input| input.value().attr("value"))
                    .filter(|v| !v.trim().is_empty())
                    .map(|slug| absolute_url(&self.config.base_url, slug))
                    .unwrap_or_else(|| self.config.url.clone());

                ListingRecord {
                    developer: self.name(),
                    name: select_text(card, &self.title).unwrap_or_else(|| UNNAMED.to_string()),
                    location: select_text(card, &self.location).unwrap_or_default(),
                    price: None,
                    bedrooms: None,
                    status: Status::Upcoming,
                    label: None,
                    url,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Extractor for Lobe {
    fn name(&self) -> &'static str {
        "LOBE"
    }

    async fn extract(&self, http: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
        let html = http.get_text(&self.config.url).await?;
        Ok(self.parse(&html))
    }
}
