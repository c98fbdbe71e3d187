//! Turns locale formatted text ("270.000 €", "2 y 3 dormitorios",
//! "València") into values the filter can compare.

use lazy_regex::regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Integer tokens of `text` with thousand separators removed, `None` for a
/// token that does not fit a `u32`.
///
/// A `.` or `,` only counts as a separator when exactly three digits follow,
/// so decimals such as `240.900,50` stop at `240900`.
fn numbers(text: &str) -> impl Iterator<Item = Option<u32>> + '_ {
    regex!(r"\d+(?:[.,]\d{3})*")
        .find_iter(text)
        .map(|m| m.as_str().replace(['.', ','], "").parse().ok())
}

/// An unreadable first token makes the whole text unknown, the next token
/// never stands in for it.
pub fn first_number(text: &str) -> Option<u32> {
    numbers(text).next().flatten()
}

pub fn max_number(text: &str) -> Option<u32> {
    numbers(text).collect::<Option<Vec<u32>>>()?.into_iter().max()
}

/// Prices are advertised as "Desde X €", the first figure is the one that counts.
pub fn parse_price(text: &str) -> Option<u32> {
    first_number(text)
}

/// Developments often advertise a range ("2, 3 o 4 dormitorios"). The largest
/// count is used so a development is not excluded by its smallest unit.
pub fn parse_bedrooms(text: &str) -> Option<u32> {
    max_number(text)
}

/// Lower-case, diacritic free, single spaced.
pub fn fold(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `desired` must already be folded.
pub fn location_matches(location: &str, desired: &[String]) -> bool {
    let location = fold(location);
    desired.iter().any(|d| location.contains(d.as_str()))
}

/// Upper-cases the first letter of every alphabetic run, the way locations
/// are shown in the notification ("quart de poblet" -> "Quart De Poblet").
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn price_with_thousand_separators() {
        assert_eq!(parse_price("270.000 €"), Some(270_000));
        assert_eq!(parse_price("Desde 1.234.567€"), Some(1_234_567));
        assert_eq!(parse_price("240.900,50 €"), Some(240_900));
        assert_eq!(parse_price("Desde 199,000 €"), Some(199_000));
    }

    #[test]
    fn no_digits_is_unknown() {
        assert_eq!(parse_price("Consultar"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_bedrooms("dormitorios"), None);
    }

    #[test]
    fn overflow_is_unknown() {
        assert_eq!(first_number("99999999999999"), None);
        assert_eq!(first_number("99999999999 € y 3 dormitorios"), None);
        assert_eq!(parse_price("Desde 4.294.967.296 €, 2 dorm"), None);
        assert_eq!(parse_bedrooms("2 a 99999999999 dormitorios"), None);
        assert_eq!(parse_price("Desde 4.294.967.295 €"), Some(u32::MAX));
    }

    #[test]
    fn bedroom_ranges_take_the_maximum() {
        assert_eq!(parse_bedrooms("2 a 4 dormitorios"), Some(4));
        assert_eq!(parse_bedrooms("Dormitorios: 2 y 3"), Some(3));
        assert_eq!(parse_bedrooms("1, 2, 3 o 4 dormitorios"), Some(4));
        assert_eq!(first_number("2 a 4 dormitorios"), Some(2));
    }

    #[test]
    fn folding_drops_accents_and_case() {
        assert_eq!(fold("  València,   España "), "valencia, espana");
        assert_eq!(fold("QUART DE POBLET"), "quart de poblet");
        assert_eq!(fold("Alacant/Alicante"), "alacant/alicante");
    }

    #[test]
    fn location_is_a_substring_match() {
        let desired = vec!["valencia".to_string(), "mislata".to_string()];
        assert!(location_matches("València, España, Valencia", &desired));
        assert!(location_matches("MISLATA / VALENCIA", &desired));
        assert!(!location_matches("Alicante", &desired));
        assert!(!location_matches("", &desired));
    }

    #[test]
    fn title_case_like_the_messages() {
        assert_eq!(title_case("quart de poblet"), "Quart De Poblet");
        assert_eq!(title_case("valencia / sagunto/sagunt"), "Valencia / Sagunto/Sagunt");
        assert_eq!(title_case("l'eliana"), "L'Eliana");
    }
}
