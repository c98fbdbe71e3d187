use super::{absolute_url, css, select_text, text_of, UNNAMED};
use crate::{
    error::ScrapeError,
    fetch::Fetcher,
    listing::{ListingRecord, Status},
    normalize::{fold, parse_bedrooms, parse_price},
    Extractor,
};
use scraper::{Html, Selector};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AedasConfig {
    pub url: String,
    pub base_url: String,
    pub card: String,
    pub title: String,
    pub description_item: String,
    pub price: String,
}

impl Default for AedasConfig {
    fn default() -> Self {
        AedasConfig {
            url: "https://www.aedashomes.com/viviendas-obra-nueva?province=2509951".to_string(),
            base_url: "https://www.aedashomes.com".to_string(),
            card: "a.card-promo.card".to_string(),
            title: "span.promo-title".to_string(),
            description_item: "ul.promo-description li".to_string(),
            price: "span.promo-price".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Aedas {
    config: AedasConfig,
    card: Selector,
    title: Selector,
    description_item: Selector,
    price: Selector,
}

impl Aedas {
    pub fn new(config: AedasConfig) -> Result<Self, ScrapeError> {
        Ok(Aedas {
            card: css(&config.card)?,
            title: css(&config.title)?,
            description_item: css(&config.description_item)?,
            price: css(&config.price)?,
            config,
        })
    }

    /// The description list mixes location ("Valencia, Valencia"), bedrooms
    /// and the "Próximamente" flag without any class to tell them apart.
    pub fn parse(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        doc.select(&self.card)
            .map(|card| {
                let items: Vec<String> = card.select(&self.description_item).map(text_of).collect();
                let location = items.iter().find(|d| d.contains(',')).cloned();
                let bedrooms = items
                    .iter()
                    .find(|d| fold(d).contains("dormitorio"))
                    .and_then(|d| parse_bedrooms(d));
                let upcoming = items.iter().any(|d| fold(d).contains("proxim"));
                let price = select_text(card, &self.price).and_then(|p| parse_price(&p));
                let url = card
                    .value()
                    .attr("href")
                    .map(|href| absolute_url(&self.config.base_url, href))
                    .unwrap_or_else(|| self.config.url.clone());

                ListingRecord {
                    developer: self.name(),
                    name: select_text(card, &self.title).unwrap_or_else(|| UNNAMED.to_string()),
                    location: location.unwrap_or_default(),
                    price,
                    bedrooms,
                    status: if upcoming { Status::Upcoming } else { Status::OnSale },
                    label: upcoming.then(|| "Próximamente".to_string()),
                    url,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Extractor for Aedas {
    fn name(&self) -> &'static str {
        "AEDAS"
    }

    async fn extract(&self, http: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
        let html = http.get_text(&self.config.url).await?;
        Ok(self.parse(&html))
    }
}
