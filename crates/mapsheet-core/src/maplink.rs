//! Coordinate extraction from map-service URLs
//!
//! Map links come in many shapes depending on the product surface that
//! produced them and on the redirect chain behind short links. Each shape is
//! a [`CoordinatePattern`]; [`extract_coordinates`] tries them in
//! [`CoordinatePattern::PRIORITY`] order and stops at the first match. The
//! loose numeric pair is last so that other numbers embedded in a URL do not
//! win over an explicit marker.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::coords::Coordinates;

lazy_static! {
    static ref AT_SIGN: Regex = Regex::new(r"@(-?\d+\.?\d*),(-?\d+\.?\d*)").unwrap();
    static ref SEARCH_PATH: Regex =
        Regex::new(r"/search/(-?\d+\.?\d*),\+?(-?\d+\.?\d*)").unwrap();
    static ref DIR_PATH: Regex = Regex::new(r"/dir/(-?\d+\.?\d*),\+?(-?\d+\.?\d*)").unwrap();
    static ref PLACE_PATH: Regex = Regex::new(r"/place/(-?\d+\.?\d*),(-?\d+\.?\d*)").unwrap();
    static ref DATA_LAT: Regex = Regex::new(r"!3d(-?\d+\.?\d*)").unwrap();
    static ref DATA_LNG: Regex = Regex::new(r"!4d(-?\d+\.?\d*)").unwrap();
    static ref LOOSE_PAIR: Regex =
        Regex::new(r"(-?\d{1,3}\.\d{3,}),\s?\+?(-?\d{1,3}\.\d{3,})").unwrap();
    static ref QUERY_PAIR: Regex = Regex::new(r"^(-?\d+\.?\d*),\s*(-?\d+\.?\d*)$").unwrap();
}

/// One way a map URL can carry a coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatePattern {
    /// `.../@35.6812,139.7671,17z`
    AtSign,
    /// `.../maps/search/35.1,+136.9`
    SearchPath,
    /// `.../maps/dir/35.1,139.7`
    DirPath,
    /// `?q=35.1,139.7`
    QueryQ,
    /// `?ll=35.1,139.7`
    QueryLl,
    /// `.../place/35.1,139.7`
    PlacePath,
    /// `.../data=!3d35.1!4d139.7`
    DataParams,
    /// Any `dd.ddd,ddd.ddd` looking pair
    LoosePair,
}

impl CoordinatePattern {
    /// Evaluation order, most specific first
    pub const PRIORITY: [CoordinatePattern; 8] = [
        CoordinatePattern::AtSign,
        CoordinatePattern::SearchPath,
        CoordinatePattern::DirPath,
        CoordinatePattern::QueryQ,
        CoordinatePattern::QueryLl,
        CoordinatePattern::PlacePath,
        CoordinatePattern::DataParams,
        CoordinatePattern::LoosePair,
    ];

    /// Try this pattern against a URL. Pairs outside the valid ranges never match.
    pub fn extract(self, url: &str) -> Option<Coordinates> {
        match self {
            CoordinatePattern::AtSign => capture_pair(&AT_SIGN, url),
            CoordinatePattern::SearchPath => capture_pair(&SEARCH_PATH, url),
            CoordinatePattern::DirPath => capture_pair(&DIR_PATH, url),
            CoordinatePattern::QueryQ => query_param(url, "q").and_then(|v| parse_query_pair(&v)),
            CoordinatePattern::QueryLl => query_param(url, "ll").and_then(|v| parse_query_pair(&v)),
            CoordinatePattern::PlacePath => capture_pair(&PLACE_PATH, url),
            CoordinatePattern::DataParams => {
                let lat = DATA_LAT.captures(url)?.get(1)?.as_str().parse().ok()?;
                let lng = DATA_LNG.captures(url)?.get(1)?.as_str().parse().ok()?;
                Coordinates::new(lat, lng)
            }
            CoordinatePattern::LoosePair => capture_pair(&LOOSE_PAIR, url),
        }
    }
}

/// Run the pattern cascade and report which pattern produced the pair
pub fn extract_coordinates(url: &str) -> Option<(CoordinatePattern, Coordinates)> {
    CoordinatePattern::PRIORITY
        .iter()
        .find_map(|pattern| pattern.extract(url).map(|c| (*pattern, c)))
}

/// The `q` parameter of a map link when it names a place rather than a pair
pub fn address_query(url: &str) -> Option<String> {
    let q = query_param(url, "q")?;
    let q = q.trim();
    if q.is_empty() || QUERY_PAIR.is_match(q) {
        return None;
    }
    Some(q.to_string())
}

/// True for text the resolver should treat as a link rather than a raw pair
pub fn looks_like_url(text: &str) -> bool {
    let lower = text.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn capture_pair(re: &Regex, haystack: &str) -> Option<Coordinates> {
    let caps = re.captures(haystack)?;
    let lat = caps.get(1)?.as_str().parse().ok()?;
    let lng = caps.get(2)?.as_str().parse().ok()?;
    Coordinates::new(lat, lng)
}

fn parse_query_pair(value: &str) -> Option<Coordinates> {
    capture_pair(&QUERY_PAIR, value.trim())
}

/// First decoded value of a query parameter
fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
