use super::{absolute_url, css, enclosing_link, select_text, UNNAMED};
use crate::{
    error::ScrapeError,
    fetch::Fetcher,
    listing::{ListingRecord, Status},
    normalize::{parse_bedrooms, parse_price},
    Extractor,
};
use scraper::{Html, Selector};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UrbaniaConfig {
    pub url: String,
    pub card: String,
    pub title: String,
    pub location: String,
    pub bedrooms: String,
    pub price: String,
}

impl Default for UrbaniaConfig {
    fn default() -> Self {
        UrbaniaConfig {
            url: "https://urbania.es/proyectos/valencia/".to_string(),
            card: "div.vivienda div.row".to_string(),
            title: "h2".to_string(),
            location: "h3".to_string(),
            bedrooms: "p[class*=carac]".to_string(),
            price: "strong".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Urbania {
    config: UrbaniaConfig,
    card: Selector,
    title: Selector,
    location: Selector,
    bedrooms: Selector,
    price: Selector,
}

impl Urbania {
    pub fn new(config: UrbaniaConfig) -> Result<Self, ScrapeError> {
        Ok(Urbania {
            card: css(&config.card)?,
            title: css(&config.title)?,
            location: css(&config.location)?,
            bedrooms: css(&config.bedrooms)?,
            price: css(&config.price)?,
            config,
        })
    }

    /// Urbania only publishes price and bedrooms once a project is on sale,
    /// a card missing either of them is a coming-soon project.
    pub fn parse(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        doc.select(&self.card)
            .map(|card| {
                let bedrooms = select_text(card, &self.bedrooms).and_then(|b| parse_bedrooms(&b));
                let price = select_text(card, &self.price).and_then(|p| parse_price(&p));
                let upcoming = price.is_none() || bedrooms.is_none();

                let url = enclosing_link(card)
                    .map(|href| absolute_url(&self.config.url, href))
                    .unwrap_or_else(|| self.config.url.clone());

                ListingRecord {
                    developer: self.name(),
                    name: select_text(card, &self.title).unwrap_or_else(|| UNNAMED.to_string()),
                    location: select_text(card, &self.location).unwrap_or_default(),
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
impl Extractor for Urbania {
    fn name(&self) -> &'static str {
        "Urbania"
    }

    async fn extract(&self, http: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
        let html = http.get_text(&self.config.url).await?;
        Ok(self.parse(&html))
    }
}
