use crate::normalize::{self, fold};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    OnSale,
    /// No public price or unit configuration yet.
    Upcoming,
    Unknown,
}

/// One development card as read from a developer site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub developer: &'static str,
    pub name: String,
    pub location: String,
    pub price: Option<u32>,
    pub bedrooms: Option<u32>,
    pub status: Status,
    /// Marketing badge shown next to the developer, e.g. "Próximamente".
    pub label: Option<String>,
    pub url: String,
}

impl fmt::Display for ListingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) @ {}", self.name, self.developer, self.location)?;
        if let Some(price) = self.price {
            write!(f, ", {} €", price)?;
        }
        if let Some(bedrooms) = self.bedrooms {
            write!(f, ", {} dorms", bedrooms)?;
        }
        write!(f, " [{:?}]", self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    desired_locations: Vec<String>,
    pub max_price: u32,
    pub min_bedrooms: u32,
}

impl FilterPolicy {
    pub fn new<I, S>(desired_locations: I, max_price: u32, min_bedrooms: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let desired_locations = desired_locations
            .into_iter()
            .map(|l| fold(l.as_ref()))
            .filter(|l| !l.is_empty())
            .collect();
        FilterPolicy {
            desired_locations,
            max_price,
            min_bedrooms,
        }
    }

    pub fn desired_locations(&self) -> &[String] {
        &self.desired_locations
    }

    pub fn location_ok(&self, location: &str) -> bool {
        normalize::location_matches(location, &self.desired_locations)
    }

    /// Upcoming developments only need a matching location. Everything else
    /// must advertise both a bedroom count and a price inside the limits.
    pub fn accept(&self, record: &ListingRecord) -> bool {
        if !self.location_ok(&record.location) {
            return false;
        }
        if record.status == Status::Upcoming {
            return true;
        }
        matches!(record.bedrooms, Some(b) if b >= self.min_bedrooms)
            && matches!(record.price, Some(p) if p <= self.max_price)
    }
}
