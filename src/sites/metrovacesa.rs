use super::{absolute_url, css, select_text, UNNAMED};
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
pub struct MetrovacesaConfig {
    pub url: String,
    pub card: String,
    pub title: String,
    pub location: String,
    pub badge: String,
    pub link: String,
}

impl Default for MetrovacesaConfig {
    fn default() -> Self {
        MetrovacesaConfig {
            url: "https://metrovacesa.com/promociones/valencia".to_string(),
            card: "div.card[data-provincia]".to_string(),
            title: "p.card-text.title-rel".to_string(),
            location: "p.card-text.mb-0".to_string(),
            badge: "span.badge".to_string(),
            link: "a[href]".to_string(),
        }
    }
}

/// Price and bedroom figures come from data attributes on the card itself.
#[derive(Debug)]
pub struct Metrovacesa {
    config: MetrovacesaConfig,
    card: Selector,
    title: Selector,
    location: Selector,
    badge: Selector,
    link: Selector,
}

impl Metrovacesa {
    pub fn new(config: MetrovacesaConfig) -> Result<Self, ScrapeError> {
        Ok(Metrovacesa {
            card: css(&config.card)?,
            title: css(&config.title)?,
            location: css(&config.location)?,
            badge: css(&config.badge)?,
            link: css(&config.link)?,
            config,
        })
    }

    pub fn parse(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        doc.select(&self.card)
            .map(|card| {
                let attrs = card.value();
                let price = attrs
                    .attr("data-preciomin")
                    .filter(|p| !p.trim().is_empty())
                    .or_else(|| attrs.attr("data-preciomax"))
                    .and_then(parse_price);
                let bedrooms = attrs.attr("data-numhabitaciones").and_then(parse_bedrooms);

                let new_project = select_text(card, &self.badge)
                    .map(|b| fold(&b).contains("nuevo proyecto"))
                    .unwrap_or(false);

                let url = card
                    .select(&self.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| absolute_url(&self.config.url, href))
                    .unwrap_or_else(|| self.config.url.clone());

                ListingRecord {
                    developer: self.name(),
                    name: select_text(card, &self.title).unwrap_or_else(|| UNNAMED.to_string()),
                    location: select_text(card, &self.location).unwrap_or_default(),
                    price,
                    bedrooms,
                    status: if new_project { Status::Upcoming } else { Status::OnSale },
                    label: new_project.then(|| "Nuevo proyecto".to_string()),
                    url,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Extractor for Metrovacesa {
    fn name(&self) -> &'static str {
        "Metrovacesa"
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
    fn test_parsing_data_attributes() {
        let metrovacesa = Metrovacesa::new(MetrovacesaConfig::default()).unwrap();
        let records = metrovacesa.parse(&fixture("metrovacesa.html"));

        assert_eq!(
            records,
            vec![
                ListingRecord {
                    developer: "Metrovacesa",
                    name: "Residencial Nou Campanar".to_string(),
                    location: "VALENCIA / VALENCIA".to_string(),
                    price: Some(262_000),
                    bedrooms: Some(3),
                    status: Status::OnSale,
                    label: None,
                    url: "https://metrovacesa.com/promociones/valencia/nou-campanar".to_string(),
                },
                ListingRecord {
                    developer: "Metrovacesa",
                    name: "Jardines de Manises".to_string(),
                    location: "VALENCIA / MANISES".to_string(),
                    price: None,
                    bedrooms: None,
                    status: Status::Upcoming,
                    label: Some("Nuevo proyecto".to_string()),
                    url: "https://metrovacesa.com/promociones/valencia".to_string(),
                },
                ListingRecord {
                    developer: "Metrovacesa",
                    name: "Sin nombre".to_string(),
                    location: "VALENCIA / SAGUNTO/SAGUNT".to_string(),
                    price: Some(410_000),
                    bedrooms: Some(4),
                    status: Status::OnSale,
                    label: None,
                    url: "https://metrovacesa.com/promociones/valencia/sagunt".to_string(),
                },
            ]
        );
    }
}
