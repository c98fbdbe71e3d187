use super::{absolute_url, css, enclosing_link, select_text, text_of};
use crate::{
    error::ScrapeError,
    fetch::Fetcher,
    listing::{ListingRecord, Status},
    normalize::squash,
    Extractor,
};
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const E: &str = "Invalid selector";
lazy_static! {
    static ref A: Selector = Selector::parse("a[href]").expect(E);
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FicsaConfig {
    pub api_url: String,
    pub html_url: String,
    pub card: String,
    pub title: String,
    pub location: String,
}

impl Default for FicsaConfig {
    fn default() -> Self {
        FicsaConfig {
            api_url: "https://www.ficsa.es/wp-json/wp/v2/promociones?per_page=100&_fields=title,acf,link"
                .to_string(),
            html_url: "https://www.ficsa.es/promociones-valencia".to_string(),
            card: "div.tilter".to_string(),
            title: "h3.tilter__title".to_string(),
            location: "p.tilter__description".to_string(),
        }
    }
}

/// FICSA publishes no prices, only name and locality, so every development
/// is kept as upcoming and filtered on location alone.
#[derive(Debug)]
pub struct Ficsa {
    config: FicsaConfig,
    card: Selector,
    title: Selector,
    location: Selector,
}

impl Ficsa {
    pub fn new(config: FicsaConfig) -> Result<Self, ScrapeError> {
        Ok(Ficsa {
            card: css(&config.card)?,
            title: css(&config.title)?,
            location: css(&config.location)?,
            config,
        })
    }

    fn record(&self, name: String, location: String, url: String) -> ListingRecord {
        ListingRecord {
            developer: self.name(),
            name,
            location,
            price: None,
            bedrooms: None,
            status: Status::Upcoming,
            label: None,
            url,
        }
    }

    /// WordPress answers with a list of posts, or a single object when only
    /// one matches. Entries that do not look like posts are skipped.
    pub fn parse_api(&self, body: Value) -> Vec<ListingRecord> {
        let posts = match body {
            Value::Array(posts) => posts,
            post @ Value::Object(_) => vec![post],
            _ => vec![],
        };

        posts
            .iter()
            .filter_map(|post| {
                let name = post
                    .pointer("/title/rendered")
                    .and_then(Value::as_str)
                    .map(decode_entities)
                    .filter(|n| !n.is_empty())?;
                let location = post
                    .pointer("/acf/localizacion")
                    .and_then(Value::as_str)
                    .map(squash)
                    .filter(|l| !l.is_empty())?;
                let url = post
                    .get("link")
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| self.config.html_url.clone());
                Some(self.record(name, location, url))
            })
            .collect()
    }

    pub fn parse_html(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        doc.select(&self.card)
            .filter_map(|card| {
                let name = select_text(card, &self.title)?;
                let location = select_text(card, &self.location)?;
                let url = enclosing_link(card)
                    .or_else(|| card.select(&A).next().and_then(|a| a.value().attr("href")))
                    .map(|href| absolute_url(&self.config.html_url, href))
                    .unwrap_or_else(|| self.config.html_url.clone());
                Some(self.record(name, location, url))
            })
            .collect()
    }
}

/// `title.rendered` comes HTML encoded ("Residencial &#8220;Mar&#8221;").
fn decode_entities(raw: &str) -> String {
    text_of(Html::parse_fragment(raw).root_element())
}

#[async_trait::async_trait]
impl Extractor for Ficsa {
    fn name(&self) -> &'static str {
        "FICSA"
    }

    /// The REST API first, the public listing page when it fails or is empty.
    async fn extract(&self, http: &Fetcher) -> Result<Vec<ListingRecord>, ScrapeError> {
        match http.get_json::<Value>(&self.config.api_url).await {
            Ok(body) => {
                let records = self.parse_api(body);
                if !records.is_empty() {
                    return Ok(records);
                }
                debug!("FICSA API returned no promotions, falling back to HTML");
            }
            Err(e) => warn!("FICSA API error: {}, falling back to HTML", e),
        }

        let html = http.get_text(&self.config.html_url).await?;
        Ok(self.parse_html(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::fixture;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ficsa() -> Ficsa {
        Ficsa::new(FicsaConfig::default()).unwrap()
    }

    #[test]
    fn test_parsing_api_posts() {
        let body = json!([
            {
                "title": {"rendered": "Residencial &#8220;Mar&#8221;"},
                "acf": {"localizacion": "Valencia,  Malvarrosa"},
                "link": "https://www.ficsa.es/promociones/residencial-mar/"
            },
            {
                "title": {"rendered": "Sin localidad"},
                "acf": false,
                "link": "https://www.ficsa.es/promociones/sin-localidad/"
            },
            "not a post",
            {
                "title": {"rendered": "Torre Manises"},
                "acf": {"localizacion": "Manises"}
            }
        ]);

        assert_eq!(
            ficsa().parse_api(body),
            vec![
                ListingRecord {
                    developer: "FICSA",
                    name: "Residencial \u{201c}Mar\u{201d}".to_string(),
                    location: "Valencia, Malvarrosa".to_string(),
                    price: None,
                    bedrooms: None,
                    status: Status::Upcoming,
                    label: None,
                    url: "https://www.ficsa.es/promociones/residencial-mar/".to_string(),
                },
                ListingRecord {
                    developer: "FICSA",
                    name: "Torre Manises".to_string(),
                    location: "Manises".to_string(),
                    price: None,
                    bedrooms: None,
                    status: Status::Upcoming,
                    label: None,
                    url: "https://www.ficsa.es/promociones-valencia".to_string(),
                },
            ]
        );
    }

    #[test]
    fn single_object_answer() {
        let body = json!({
            "title": {"rendered": "Edificio Paterna"},
            "acf": {"localizacion": "Paterna"},
            "link": "https://www.ficsa.es/promociones/paterna/"
        });
        let records = ficsa().parse_api(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Edificio Paterna");
        assert!(ficsa().parse_api(json!(null)).is_empty());
    }

    #[test]
    fn test_parsing_html_fallback() {
        let records = ficsa().parse_html(&fixture("ficsa.html"));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Residencial Mislata Centro");
        assert_eq!(records[0].location, "Mislata, Valencia");
        assert_eq!(records[0].url, "https://www.ficsa.es/promociones/mislata-centro");
        assert_eq!(records[1].name, "Edificio Alboraya");
        assert_eq!(records[1].url, "https://www.ficsa.es/promociones/alboraya");
    }
}
