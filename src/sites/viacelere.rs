use super::{absolute_url, css, enclosing_link, select_text, text_of, UNNAMED};
use crate::{
    error::ScrapeError,
    fetch::Fetcher,
    listing::{ListingRecord, Status},
    normalize::{fold, parse_bedrooms, parse_price},
    Extractor,
};
use lazy_regex::regex;
use scraper::{Html, Selector};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViaCelereConfig {
    pub url: String,
    pub card: String,
    pub title: String,
    pub description: String,
    pub price: String,
    /// Folded text that marks the description line holding the location.
    pub location_hint: String,
}

impl Default for ViaCelereConfig {
    fn default() -> Self {
        ViaCelereConfig {
            url: "https://www.viacelere.com/promociones?provincia_id=46".to_string(),
            card: "div.card-promocion".to_string(),
            title: "div.title h2".to_string(),
            description: "div.desc p".to_string(),
            price: "div.precio p.paragraph-size--2:last-child".to_string(),
            location_hint: "espana, valencia".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ViaCelere {
    config: ViaCelereConfig,
    card: Selector,
    title: Selector,
    description: Selector,
    price: Selector,
}

impl ViaCelere {
    pub fn new(config: ViaCelereConfig) -> Result<Self, ScrapeError> {
        Ok(ViaCelere {
            card: css(&config.card)?,
            title: css(&config.title)?,
            description: css(&config.description)?,
            price: css(&config.price)?,
            config,
        })
    }

    pub fn parse(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        let mut records = vec![];

        for card in doc.select(&self.card) {
            // Every title starts with the brand, "Célere Benimaclet".
            let name = select_text(card, &self.title)
                .map(|t| regex!(r"(?i)^\s*c[eé]lere\s+").replace(&t, "").trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNNAMED.to_string());

            let (mut location, mut bedrooms, mut status) = (None, None, Status::Unknown);
            for p in card.select(&self.description) {
                let text = text_of(p);
                let folded = fold(&text);
                if folded.contains(&self.config.location_hint) {
                    location = Some(text);
                } else if folded.contains("dormitorio") {
                    bedrooms = parse_bedrooms(&text);
                } else if folded.contains("proximamente") {
                    status = Status::Upcoming;
                } else if folded.contains("comercializacion") {
                    status = Status::OnSale;
                }
            }

            let price = select_text(card, &self.price).and_then(|p| parse_price(&p));
            let url = enclosing_link(card)
                .map(|href| absolute_url(&self.config.url, href))
                .unwrap_or_else(|| self.config.url.clone());

            records.push(ListingRecord {
                developer: self.name(),
                name,
                location: location.unwrap_or_default(),
                price,
                bedrooms,
                status,
                label: (status == Status::Upcoming).then(|| "Próximamente".to_string()),
                url,
            });
        }
        records
    }
}

#[async_trait::async_trait]
impl Extractor for ViaCelere {
    fn name(&self) -> &'static str {
        "Vía Célere"
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
    fn test_parsing_cards_and_status() {
        let celere = ViaCelere::new(ViaCelereConfig::default()).unwrap();
        let records = celere.parse(&fixture("viacelere.html"));

        assert_eq!(records.len(), 3);

        assert_eq!(records[0].name, "Benimaclet");
        assert_eq!(records[0].location, "Valencia, España, Valencia");
        assert_eq!(records[0].price, Some(255_000));
        assert_eq!(records[0].bedrooms, Some(3));
        assert_eq!(records[0].status, Status::OnSale);
        assert_eq!(records[0].label, None);
        assert_eq!(records[0].url, "https://www.viacelere.com/promociones/celere-benimaclet");

        assert_eq!(records[1].name, "Paterna Nature");
        assert_eq!(records[1].status, Status::Upcoming);
        assert_eq!(records[1].label.as_deref(), Some("Próximamente"));
        assert_eq!(records[1].price, None);

        // No recognisable status line.
        assert_eq!(records[2].status, Status::Unknown);
        assert_eq!(records[2].location, "");
    }
}
