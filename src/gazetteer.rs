use std::collections::BTreeMap;

use crate::geo::Coordinate;

/// Specificity rank of a gazetteer entry. Declaration order is search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Marine,
    County,
    Metro,
    StateName,
    StateAbbreviation,
    Country,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Marine,
        Tier::County,
        Tier::Metro,
        Tier::StateName,
        Tier::StateAbbreviation,
        Tier::Country,
    ];

    /// Largest jitter offset, in degrees, applied to a match in this tier.
    pub fn jitter_degrees(self) -> f64 {
        match self {
            Tier::Marine => 0.2,
            Tier::County => 0.3,
            Tier::Metro => 0.2,
            Tier::StateName => 1.0,
            Tier::StateAbbreviation => 1.5,
            Tier::Country => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Marine => "marine/coastal",
            Tier::County => "county",
            Tier::Metro => "metro",
            Tier::StateName => "state",
            Tier::StateAbbreviation => "state abbreviation",
            Tier::Country => "country",
        }
    }
}

/// One named place.
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerEntry {
    key: String,
    needle: String,
    coordinate: Coordinate,
}

impl GazetteerEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

/// Lower-cases `text`, turns punctuation into word breaks and pads the
/// result with a space on each side, so whole-word containment is a plain
/// substring test: `"St. Louis, MO"` becomes `" st louis mo "`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut pending_space = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_space && out.len() > 1 {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out.push(' ');
    out
}

/// A location string prepared for lookup.
///
/// State abbreviations collide with common words (`in`, `or`, `me`), so
/// free text only offers them from its final comma-separated segment and
/// only when written in capitals, as in `"East Carteret, NC"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    words: String,
    codes: String,
}

impl Query {
    pub fn text(text: &str) -> Self {
        let tail = text.rsplit(',').next().unwrap_or_default();
        let codes: Vec<&str> = tail
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_uppercase()))
            .collect();
        Self {
            words: normalize(text),
            codes: normalize(&codes.join(" ")),
        }
    }

    /// A region field such as `"nc"` or `"North Carolina"`, where any word
    /// may be an abbreviation.
    pub fn region(text: &str) -> Self {
        let words = normalize(text);
        Self {
            codes: words.clone(),
            words,
        }
    }

    /// The [`normalize`]d input.
    pub fn words(&self) -> &str {
        &self.words
    }

    fn haystack(&self, tier: Tier) -> &str {
        match tier {
            Tier::StateAbbreviation => &self.codes,
            _ => &self.words,
        }
    }
}

/// Ordered lookup table, most specific tier first.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    tiers: BTreeMap<Tier, Vec<GazetteerEntry>>,
}

impl Gazetteer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in North American table.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        let groups: [(Tier, &[(&str, f64, f64)]); 4] = [
            (Tier::Marine, MARINE),
            (Tier::County, COUNTIES),
            (Tier::Metro, METROS),
            (Tier::Country, COUNTRIES),
        ];
        for (tier, places) in groups {
            for &(name, lon, lat) in places {
                table.insert(tier, name, Coordinate::fixed(lon, lat));
            }
        }
        for &(name, abbr, lon, lat) in STATES {
            let at = Coordinate::fixed(lon, lat);
            table.insert(Tier::StateName, name, at);
            table.insert(Tier::StateAbbreviation, abbr, at);
        }
        for &(name, abbr, lon, lat) in PROVINCES {
            let at = Coordinate::fixed(lon, lat);
            table.insert(Tier::StateName, name, at);
            if let Some(abbr) = abbr {
                table.insert(Tier::StateAbbreviation, abbr, at);
            }
        }
        table
    }

    /// Adds or replaces a place in `tier`.
    ///
    /// The entry is slotted in front of the first shorter key so the tier
    /// stays longest-first; existing entries keep their relative order.
    pub fn insert(&mut self, tier: Tier, name: &str, coordinate: Coordinate) {
        let needle = normalize(name);
        if needle.trim().is_empty() {
            return;
        }
        let entries = self.tiers.entry(tier).or_default();
        if let Some(existing) = entries.iter_mut().find(|e| e.needle == needle) {
            existing.coordinate = coordinate;
            return;
        }
        let at = entries
            .iter()
            .position(|e| e.needle.len() < needle.len())
            .unwrap_or(entries.len());
        entries.insert(
            at,
            GazetteerEntry {
                key: needle.trim().to_string(),
                needle,
                coordinate,
            },
        );
    }

    /// Finds the most specific entry contained in `query`.
    pub fn find(&self, query: &Query) -> Option<(Tier, &GazetteerEntry)> {
        self.tiers.iter().find_map(|(tier, entries)| {
            let haystack = query.haystack(*tier);
            entries
                .iter()
                .find(|e| haystack.contains(e.needle.as_str()))
                .map(|e| (*tier, e))
        })
    }

    /// Entries of one tier in search order.
    pub fn tier(&self, tier: Tier) -> &[GazetteerEntry] {
        self.tiers.get(&tier).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// (name, lon, lat)
const MARINE: &[(&str, f64, f64)] = &[
    ("hatteras", -75.70, 35.22),
    ("outer banks", -75.60, 35.56),
    ("ocracoke", -75.98, 35.11),
    ("pamlico sound", -76.00, 35.30),
    ("albemarle sound", -76.10, 36.05),
    ("cape fear", -77.96, 33.84),
    ("cape lookout", -76.53, 34.62),
    ("chesapeake bay", -76.20, 37.80),
    ("delaware bay", -75.20, 39.05),
    ("long island sound", -73.00, 41.08),
    ("cape cod", -70.30, 41.68),
    ("florida keys", -81.10, 24.70),
    ("biscayne bay", -80.22, 25.60),
    ("tampa bay", -82.60, 27.75),
    ("mobile bay", -88.00, 30.45),
    ("galveston bay", -94.90, 29.50),
    ("gulf of mexico", -90.00, 25.00),
    ("lake okeechobee", -80.83, 26.95),
    ("lake michigan", -87.00, 44.00),
    ("lake superior", -87.50, 47.70),
    ("lake huron", -82.40, 44.80),
    ("lake erie", -81.20, 42.20),
    ("lake ontario", -77.90, 43.70),
    ("puget sound", -122.45, 47.60),
    ("san francisco bay", -122.30, 37.70),
    ("monterey bay", -121.95, 36.80),
    ("cook inlet", -151.50, 60.20),
];

const COUNTIES: &[(&str, f64, f64)] = &[
    ("carteret", -76.65, 34.78),
    ("dare county", -75.85, 35.80),
    ("hyde county", -76.15, 35.40),
    ("currituck", -75.95, 36.37),
    ("onslow", -77.40, 34.73),
    ("pender", -77.90, 34.52),
    ("new hanover", -77.87, 34.18),
    ("brunswick county", -78.20, 34.05),
    ("horry", -79.02, 33.90),
    ("miami dade", -80.50, 25.60),
    ("broward", -80.45, 26.15),
    ("palm beach", -80.45, 26.65),
    ("monroe county", -81.10, 24.90),
    ("collier", -81.40, 26.10),
    ("lee county", -81.85, 26.55),
    ("harris county", -95.40, 29.85),
    ("galveston county", -94.95, 29.40),
    ("jefferson parish", -90.10, 29.70),
    ("orleans parish", -89.95, 30.05),
    ("cook county", -87.75, 41.85),
    ("maricopa", -112.50, 33.35),
    ("los angeles county", -118.20, 34.30),
    ("orange county", -117.77, 33.70),
    ("ventura county", -119.08, 34.45),
    ("sonoma", -122.90, 38.52),
    ("napa", -122.33, 38.50),
    ("butte county", -121.60, 39.67),
    ("shasta", -122.04, 40.76),
    ("king county", -121.84, 47.49),
];

const METROS: &[(&str, f64, f64)] = &[
    ("new york city", -74.0060, 40.7128),
    ("nyc", -74.0060, 40.7128),
    ("manhattan", -73.9712, 40.7831),
    ("brooklyn", -73.9442, 40.6782),
    ("los angeles", -118.2437, 34.0522),
    ("chicago", -87.6298, 41.8781),
    ("houston", -95.3698, 29.7604),
    ("phoenix", -112.0740, 33.4484),
    ("philadelphia", -75.1652, 39.9526),
    ("san antonio", -98.4936, 29.4241),
    ("san diego", -117.1611, 32.7157),
    ("dallas", -96.7970, 32.7767),
    ("austin", -97.7431, 30.2672),
    ("jacksonville", -81.6557, 30.3322),
    ("san francisco", -122.4194, 37.7749),
    ("seattle", -122.3321, 47.6062),
    ("denver", -104.9903, 39.7392),
    ("boston", -71.0589, 42.3601),
    ("miami", -80.1918, 25.7617),
    ("atlanta", -84.3880, 33.7490),
    ("new orleans", -90.0715, 29.9511),
    ("tampa", -82.4572, 27.9506),
    ("charlotte", -80.8431, 35.2271),
    ("raleigh", -78.6382, 35.7796),
    ("wilmington", -77.9447, 34.2257),
    ("charleston", -79.9311, 32.7765),
    ("nashville", -86.7816, 36.1627),
    ("memphis", -90.0490, 35.1495),
    ("oklahoma city", -97.5164, 35.4676),
    ("kansas city", -94.5786, 39.0997),
    ("st louis", -90.1994, 38.6270),
    ("portland", -122.6765, 45.5231),
    ("las vegas", -115.1398, 36.1699),
    ("salt lake city", -111.8910, 40.7608),
    ("anchorage", -149.9003, 61.2181),
    ("honolulu", -157.8583, 21.3069),
    ("detroit", -83.0458, 42.3314),
    ("minneapolis", -93.2650, 44.9778),
    ("baltimore", -76.6122, 39.2904),
    ("washington dc", -77.0369, 38.9072),
    ("washington d c", -77.0369, 38.9072),
];

// (name, abbreviation, lon, lat)
const STATES: &[(&str, &str, f64, f64)] = &[
    ("alabama", "al", -86.79, 32.81),
    ("alaska", "ak", -152.40, 61.37),
    ("arizona", "az", -111.43, 33.73),
    ("arkansas", "ar", -92.37, 34.97),
    ("california", "ca", -119.68, 36.12),
    ("colorado", "co", -105.31, 39.06),
    ("connecticut", "ct", -72.76, 41.60),
    ("delaware", "de", -75.51, 39.32),
    ("florida", "fl", -81.69, 27.77),
    ("georgia", "ga", -83.64, 33.04),
    ("hawaii", "hi", -157.50, 21.09),
    ("idaho", "id", -114.48, 44.24),
    ("illinois", "il", -88.99, 40.35),
    ("indiana", "in", -86.26, 39.85),
    ("iowa", "ia", -93.21, 42.01),
    ("kansas", "ks", -96.73, 38.53),
    ("kentucky", "ky", -84.67, 37.67),
    ("louisiana", "la", -91.87, 31.17),
    ("maine", "me", -69.38, 44.69),
    ("maryland", "md", -76.80, 39.06),
    ("massachusetts", "ma", -71.53, 42.23),
    ("michigan", "mi", -84.54, 43.33),
    ("minnesota", "mn", -93.90, 45.69),
    ("mississippi", "ms", -89.68, 32.74),
    ("missouri", "mo", -92.29, 38.46),
    ("montana", "mt", -110.45, 46.92),
    ("nebraska", "ne", -98.27, 41.13),
    ("nevada", "nv", -117.06, 38.31),
    ("new hampshire", "nh", -71.56, 43.45),
    ("new jersey", "nj", -74.52, 40.30),
    ("new mexico", "nm", -106.25, 34.84),
    ("new york", "ny", -74.95, 42.17),
    ("north carolina", "nc", -79.81, 35.63),
    ("north dakota", "nd", -99.78, 47.53),
    ("ohio", "oh", -82.76, 40.39),
    ("oklahoma", "ok", -96.93, 35.57),
    ("oregon", "or", -122.07, 44.57),
    ("pennsylvania", "pa", -77.21, 40.59),
    ("rhode island", "ri", -71.51, 41.68),
    ("south carolina", "sc", -80.95, 33.86),
    ("south dakota", "sd", -99.44, 44.30),
    ("tennessee", "tn", -86.69, 35.75),
    ("texas", "tx", -97.56, 31.05),
    ("utah", "ut", -111.86, 40.15),
    ("vermont", "vt", -72.71, 44.05),
    ("virginia", "va", -78.17, 37.77),
    ("washington", "wa", -121.49, 47.40),
    ("west virginia", "wv", -80.95, 38.49),
    ("wisconsin", "wi", -89.62, 44.27),
    ("wyoming", "wy", -107.30, 42.76),
    ("district of columbia", "dc", -77.03, 38.90),
    ("puerto rico", "pr", -66.59, 18.22),
];

// "on" is left out: as a bare word it shows up in free text far more
// often than it means Ontario.
const PROVINCES: &[(&str, Option<&str>, f64, f64)] = &[
    ("british columbia", Some("bc"), -125.00, 53.70),
    ("alberta", Some("ab"), -115.00, 55.00),
    ("saskatchewan", Some("sk"), -106.00, 55.00),
    ("manitoba", Some("mb"), -98.00, 55.00),
    ("ontario", None, -85.00, 50.00),
    ("quebec", Some("qc"), -72.00, 53.00),
    ("nova scotia", Some("ns"), -63.00, 45.00),
    ("new brunswick", Some("nb"), -66.00, 46.50),
    ("newfoundland", Some("nl"), -57.00, 53.00),
    ("prince edward island", Some("pe"), -63.00, 46.30),
];

const COUNTRIES: &[(&str, f64, f64)] = &[
    ("united states", -98.5795, 39.8283),
    ("usa", -98.5795, 39.8283),
    ("u s", -98.5795, 39.8283),
    ("canada", -106.35, 56.13),
    ("mexico", -102.55, 23.63),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pads_and_splits_on_punctuation() {
        assert_eq!(normalize("St. Louis, MO"), " st louis mo ");
        assert_eq!(normalize("  Hatteras Island,NC "), " hatteras island nc ");
        assert_eq!(normalize(""), "  ");
        assert_eq!(normalize("Miami-Dade"), " miami dade ");
    }

    #[test]
    fn every_builtin_coordinate_is_in_bounds() {
        let table = Gazetteer::builtin();
        assert!(!table.is_empty());
        for tier in Tier::ALL {
            for entry in table.tier(tier) {
                let c = entry.coordinate();
                assert!(
                    Coordinate::new(c.lon(), c.lat()).is_ok(),
                    "{} out of bounds",
                    entry.key()
                );
            }
        }
    }

    #[test]
    fn keys_are_unique_within_a_tier() {
        let table = Gazetteer::builtin();
        for tier in Tier::ALL {
            let keys: Vec<_> = table.tier(tier).iter().map(|e| e.key()).collect();
            let mut deduped = keys.clone();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(keys.len(), deduped.len(), "duplicate key in {tier:?}");
        }
    }

    #[test]
    fn tiers_are_longest_key_first() {
        let table = Gazetteer::builtin();
        for tier in Tier::ALL {
            let lens: Vec<_> = table.tier(tier).iter().map(|e| e.key().len()).collect();
            assert!(lens.windows(2).all(|w| w[0] >= w[1]), "{tier:?} not sorted");
        }
    }

    #[test]
    fn longer_state_name_wins() {
        let table = Gazetteer::builtin();
        let (tier, entry) = table.find(&Query::text("Charleston, West Virginia")).unwrap();
        // "charleston" is a metro, which outranks any state name
        assert_eq!(tier, Tier::Metro);
        assert_eq!(entry.key(), "charleston");

        let (tier, entry) = table.find(&Query::text("rural West Virginia")).unwrap();
        assert_eq!(tier, Tier::StateName);
        assert_eq!(entry.key(), "west virginia");
    }

    #[test]
    fn abbreviations_match_whole_words_only() {
        let table = Gazetteer::builtin();
        // "place" contains "la" but not as a word
        assert!(table.find(&Query::text("Unknown Place")).is_none());
        let (tier, entry) = table.find(&Query::text("somewhere, LA")).unwrap();
        assert_eq!(tier, Tier::StateAbbreviation);
        assert_eq!(entry.key(), "la");
    }

    #[test]
    fn common_words_are_not_abbreviations() {
        let table = Gazetteer::builtin();
        for text in ["Hail in Springfield", "Flooding or washout", "call me maybe"] {
            assert!(table.find(&Query::text(text)).is_none(), "{text}");
        }
        // "Co" is a county suffix, not Colorado
        let (_, entry) = table.find(&Query::text("Harris Co., TX")).unwrap();
        assert_eq!(entry.key(), "tx");
        // only the final segment can carry a code
        assert!(table.find(&Query::text("WIND DAMAGE IN TOWN, near the river")).is_none());
    }

    #[test]
    fn region_fields_match_abbreviations_in_any_case() {
        let table = Gazetteer::builtin();
        let (tier, entry) = table.find(&Query::region("mo")).unwrap();
        assert_eq!(tier, Tier::StateAbbreviation);
        assert_eq!(entry.key(), "mo");
    }

    #[test]
    fn insert_replaces_and_keeps_order() {
        let mut table = Gazetteer::empty();
        table.insert(Tier::County, "Dare County", Coordinate::fixed(-75.0, 35.0));
        table.insert(Tier::County, "Hyde", Coordinate::fixed(-76.0, 35.0));
        table.insert(Tier::County, "Pamlico County", Coordinate::fixed(-76.5, 35.1));
        let keys: Vec<_> = table.tier(Tier::County).iter().map(|e| e.key()).collect();
        assert_eq!(keys, ["pamlico county", "dare county", "hyde"]);

        table.insert(Tier::County, "dare county", Coordinate::fixed(-75.5, 35.5));
        assert_eq!(table.len(), 3);
        assert_eq!(table.tier(Tier::County)[1].coordinate().lon(), -75.5);
    }
}
