//! One adapter per developer site. Every adapter keeps its selectors and
//! URLs in a `*Config` struct so a markup change can be patched from the
//! sites file instead of a new build.

mod aedas;
mod albaluz;
mod atica;
mod ficsa;
mod lobe;
mod metrovacesa;
mod urbania;
mod viacelere;

pub use aedas::{Aedas, AedasConfig};
pub use albaluz::{Albaluz, AlbaluzConfig};
pub use atica::{Atica, AticaConfig};
pub use ficsa::{Ficsa, FicsaConfig};
pub use lobe::{Lobe, LobeConfig};
pub use metrovacesa::{Metrovacesa, MetrovacesaConfig};
pub use urbania::{Urbania, UrbaniaConfig};
pub use viacelere::{ViaCelere, ViaCelereConfig};

use crate::{error::ScrapeError, normalize::squash, Extractor};
use scraper::{ElementRef, Selector};
use serde::Deserialize;
use std::path::Path;

/// Shown when a card has no readable title.
pub(crate) const UNNAMED: &str = "Sin nombre";

/// Selector and URL overrides for every site, read from a JSON file whose
/// keys are the lower-case site names. Missing keys keep the built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    pub aedas: AedasConfig,
    pub viacelere: ViaCelereConfig,
    pub metrovacesa: MetrovacesaConfig,
    pub atica: AticaConfig,
    pub urbania: UrbaniaConfig,
    pub albaluz: AlbaluzConfig,
    pub lobe: LobeConfig,
    pub ficsa: FicsaConfig,
}

impl SitesConfig {
    pub fn load(path: &Path) -> Result<SitesConfig, ScrapeError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScrapeError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ScrapeError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// All extractors in the order their results appear in the message.
pub fn extractors(config: &SitesConfig) -> Result<Vec<Box<dyn Extractor>>, ScrapeError> {
    Ok(vec![
        Box::new(Aedas::new(config.aedas.clone())?),
        Box::new(ViaCelere::new(config.viacelere.clone())?),
        Box::new(Metrovacesa::new(config.metrovacesa.clone())?),
        Box::new(Atica::new(config.atica.clone())?),
        Box::new(Urbania::new(config.urbania.clone())?),
        Box::new(Albaluz::new(config.albaluz.clone())?),
        Box::new(Lobe::new(config.lobe.clone())?),
        Box::new(Ficsa::new(config.ficsa.clone())?),
    ])
}

pub(crate) fn css(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Visible text of an element, whitespace collapsed.
pub(crate) fn text_of(el: ElementRef) -> String {
    squash(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first match of `selector` below `el`, if not blank.
pub(crate) fn select_text(el: ElementRef, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// First text node below `el` satisfying `pred`.
pub(crate) fn find_text<'a, P>(el: ElementRef<'a>, pred: P) -> Option<&'a str>
where
    P: Fn(&str) -> bool,
{
    el.text().map(str::trim).find(|t| !t.is_empty() && pred(t))
}

/// `href` of the closest enclosing `<a>`.
pub(crate) fn enclosing_link<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a" && a.value().attr("href").is_some())
        .and_then(|a| a.value().attr("href"))
}

/// Resolves `href` against `base`; unparsable input is returned untouched.
pub(crate) fn absolute_url(base: &str, href: &str) -> String {
    reqwest::Url::parse(base)
        .and_then(|b| b.join(href.trim()))
        .map(String::from)
        .unwrap_or_else(|_| href.trim().to_string())
}

#[cfg(test)]
pub(crate) fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/htmls/{}", name)).expect("Invalid file path")
}
