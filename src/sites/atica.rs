use super::{absolute_url, css, select_text, text_of, UNNAMED};
use crate::{
    error::ScrapeError,
    fetch::Fetcher,
    listing::{ListingRecord, Status},
    normalize::{fold, parse_bedrooms, parse_price, squash},
    Extractor,
};
use lazy_regex::regex;
use scraper::{Html, Selector};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AticaConfig {
    pub url: String,
    pub card: String,
    pub title: String,
    pub location: String,
    pub link: String,
    pub badge: String,
    pub bedrooms: String,
    /// Province named on every card next to the municipality. It is dropped
    /// from the location, otherwise a desired "valencia" matches them all.
    pub province: String,
}

impl Default for AticaConfig {
    fn default() -> Self {
        AticaConfig {
            url: "https://grupo-atica.com/propiedades/public/\
                  ?obranueva_viviendas=2&order=&quantity=&disposicion=listado\
                  &tipologia=&comprar_alquilar=&tipo_inmueble=0\
                  &provincia=Valencia&localidad=&habitaciones=&banyos=\
                  &price=0%2C270000"
                .to_string(),
            card: "div.item-vivienda".to_string(),
            title: "h3".to_string(),
            location: "div.col-md-7".to_string(),
            link: "a.cont[href]".to_string(),
            badge: "span[class*=badge]".to_string(),
            bedrooms: "span[class*=habitaciones]".to_string(),
            province: "valencia".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Atica {
    config: AticaConfig,
    card: Selector,
    title: Selector,
    location: Selector,
    link: Selector,
    badge: Selector,
    bedrooms: Selector,
}

impl Atica {
    pub fn new(config: AticaConfig) -> Result<Self, ScrapeError> {
        Ok(Atica {
            card: css(&config.card)?,
            title: css(&config.title)?,
            location: css(&config.location)?,
            link: css(&config.link)?,
            badge: css(&config.badge)?,
            bedrooms: css(&config.bedrooms)?,
            config,
        })
    }

    /// "Alboraya · Valencia" -> "Alboraya": separators become spaces and the
    /// province words go, whatever their case or accents.
    fn municipality(&self, raw: &str) -> String {
        let province: Vec<String> = fold(&self.config.province)
            .split_whitespace()
            .map(ToString::to_string)
            .collect();
        let spaced = regex!(r"[.\-·|]").replace_all(raw, " ");
        let words: Vec<&str> = spaced.split_whitespace().collect();

        let is_province_at = |i: usize| {
            !province.is_empty()
                && words.len() >= i + province.len()
                && words[i..i + province.len()]
                    .iter()
                    .zip(&province)
                    .all(|(w, p)| fold(w.trim_matches(|c: char| !c.is_alphanumeric())) == *p)
        };

        let mut kept = vec![];
        let mut i = 0;
        while i < words.len() {
            if is_province_at(i) {
                i += province.len();
            } else {
                kept.push(words[i]);
                i += 1;
            }
        }
        squash(&kept.join(" "))
    }

    pub fn parse(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        doc.select(&self.card)
            .map(|card| {
                let location = select_text(card, &self.location)
                    .map(|l| self.municipality(&l))
                    .unwrap_or_default();

                let new_project = select_text(card, &self.badge)
                    .map(|b| fold(&b).contains("nuevo proyecto"))
                    .unwrap_or(false);

                let bedrooms = card
                    .value()
                    .attr("data-numhabitaciones")
                    .and_then(parse_bedrooms)
                    .or_else(|| select_text(card, &self.bedrooms).and_then(|b| parse_bedrooms(&b)));

                // The price has no element of its own, take the first "N €" of the card.
                let price = regex!(r"\d[\d.]*\s*€")
                    .find(&text_of(card))
                    .and_then(|m| parse_price(m.as_str()));

                let url = card
                    .select(&self.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| absolute_url(&self.config.url, href))
                    .unwrap_or_else(|| self.config.url.clone());

                ListingRecord {
                    developer: self.name(),
                    name: select_text(card, &self.title).unwrap_or_else(|| UNNAMED.to_string()),
                    location,
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

/// Served behind an anti-bot layer that mostly lets browser user agents through.
#[async_trait::async_trait]
impl Extractor for Atica {
    fn name(&self) -> &'static str {
        "Ática"
    }

    async fn extract(&self, http: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
        let html = http.get_text(&self.config.url).await?;
        Ok(self.parse(&html))
    }
}
