use super::{absolute_url, css, enclosing_link, find_text, select_text, UNNAMED};
use crate::{
    error::ScrapeError,
    fetch::Fetcher,
    listing::{ListingRecord, Status},
    normalize::{fold, parse_bedrooms, parse_price},
    Extractor,
};
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde::Deserialize;

const E: &str = "Invalid selector";
lazy_static! {
    static ref A: Selector = Selector::parse("a[href]").expect(E);
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlbaluzConfig {
    pub url: String,
    pub card: String,
    pub title: String,
    /// Folded word identifying the text node that holds the locality.
    pub locality: String,
}

impl Default for AlbaluzConfig {
    fn default() -> Self {
        AlbaluzConfig {
            url: "https://www.albaluz.es/promociones-obra-nueva/?_localidad=valencia".to_string(),
            card: "div.promo-item, div.promocion, div.card".to_string(),
            title: "h2, h3".to_string(),
            locality: "valencia".to_string(),
        }
    }
}

/// The cards carry almost no classes, fields are found by their wording.
#[derive(Debug)]
pub struct Albaluz {
    config: AlbaluzConfig,
    card: Selector,
    title: Selector,
}

impl Albaluz {
    pub fn new(config: AlbaluzConfig) -> Result<Self, ScrapeError> {
        Ok(Albaluz {
            card: css(&config.card)?,
            title: css(&config.title)?,
            config,
        })
    }

    pub fn parse(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        doc.select(&self.card)
            .map(|card| {
                // The listing URL is already restricted to the locality, a card
                // that does not repeat it is still inside it.
                let location = find_text(card, |t| fold(t).contains(&self.config.locality))
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Valencia".to_string());
                let bedrooms = find_text(card, |t| fold(t).contains("dorm")).and_then(parse_bedrooms);
                let price = find_text(card, |t| t.contains('€')).and_then(parse_price);

                let url = enclosing_link(card)
                    .or_else(|| card.select(&A).next().and_then(|a| a.value().attr("href")))
                    .map(|href| absolute_url(&self.config.url, href))
                    .unwrap_or_else(|| self.config.url.clone());

                ListingRecord {
                    developer: self.name(),
                    name: select_text(card, &self.title).unwrap_or_else(|| UNNAMED.to_string()),
                    location,
                    price,
                    bedrooms,
                    status: Status::OnSale,
                    label: None,
                    url,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Extractor for Albaluz {
    fn name(&self) -> &'static str {
        "Albaluz"
    }

    async fn extract(&self, http: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
        let html = http.get_text(&self.config.url).await?;
        Ok(self.parse(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parsing_loose_cards() {
        let albaluz = Albaluz::new(AlbaluzConfig::default()).unwrap();
        let records = albaluz.parse(&fixture("albaluz.html"));

        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "Albaluz Campanar");
        assert_eq!(records[0].location, "Campanar, Valencia");
        assert_eq!(records[0].bedrooms, Some(4));
        assert_eq!(records[0].price, Some(259_000));
        assert_eq!(records[0].url, "https://www.albaluz.es/promocion/albaluz-campanar/");

        // No locality, no price: location falls back, price stays unknown.
        assert_eq!(records[1].name, "Albaluz Ruzafa");
        assert_eq!(records[1].location, "Valencia");
        assert_eq!(records[1].bedrooms, Some(2));
        assert_eq!(records[1].price, None);
        assert_eq!(records[1].status, Status::OnSale);
    }
}
