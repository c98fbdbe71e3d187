//! Builds the single Telegram message (legacy Markdown) out of the accepted
//! listings of every site.

use crate::{
    listing::{ListingRecord, Status},
    normalize::title_case,
    SiteReport,
};
use itertools::Itertools;
use std::fmt::Write;

pub const NOTHING_FOUND: &str =
    "✅ Scrapers finalizados.\n\nNo se encontró ninguna promoción nueva que cumpla tus filtros.";

/// `249000` → `249.000`
pub fn thousands(n: u32) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut groups = Vec::with_capacity(digits.len() / 3 + 1);
    if head > 0 {
        groups.push(&digits[..head]);
    }
    groups.extend((head..digits.len()).step_by(3).map(|i| &digits[i..i + 3]));
    groups.join(".")
}

pub fn format_listing(record: &ListingRecord) -> String {
    let mut out = String::new();

    let _ = write!(out, "\n*{} ({}", record.name, record.developer);
    if let Some(label) = &record.label {
        let _ = write!(out, " – {}", label);
    }
    out.push_str(")*");

    let _ = write!(out, "\n📍 {}", title_case(&record.location));
    // Upcoming cards show only location and link.
    if record.status != Status::Upcoming {
        if let Some(price) = record.price {
            let _ = write!(out, "\n💶 Desde: {}€", thousands(price));
        }
        if let Some(bedrooms) = record.bedrooms {
            let _ = write!(out, "\n🛏️ Dorms: {}", bedrooms);
        }
    }
    let _ = write!(out, "\n🔗 [Ver promoción]({})", record.url);

    out
}

/// Reports are rendered in the order given, which is the fixed site order.
pub fn build_message(reports: &[SiteReport]) -> String {
    let total: usize = reports.iter().map(|r| r.accepted.len()).sum();
    if total == 0 {
        return NOTHING_FOUND.to_string();
    }

    let body = reports
        .iter()
        .flat_map(|r| r.accepted.iter())
        .map(format_listing)
        .join("");

    format!("📢 ¡{} promociones cumplen tus filtros! 🚀\n{}", total, body)
}
