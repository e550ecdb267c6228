use std::sync::Arc;

use crate::gazetteer::{Gazetteer, Query, Tier};
use crate::geo::Coordinate;

/// How a location string was placed.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeMatch {
    /// A gazetteer key matched, either in the location itself or in the
    /// separately supplied fallback region.
    Tier {
        tier: Tier,
        key: String,
        via_fallback: bool,
    },
    /// Nothing matched; the default center was used.
    Miss,
}

impl GeocodeMatch {
    pub fn is_miss(&self) -> bool {
        matches!(self, GeocodeMatch::Miss)
    }
}

/// Output of [`GeocodeResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub coordinate: Coordinate,
    pub matched: GeocodeMatch,
}

/// Tiered lookup over an injected [`Gazetteer`].
#[derive(Debug, Clone)]
pub struct GeocodeResolver {
    gazetteer: Arc<Gazetteer>,
    default_center: Coordinate,
}

impl GeocodeResolver {
    pub fn new(gazetteer: Arc<Gazetteer>, default_center: Coordinate) -> Self {
        Self {
            gazetteer,
            default_center,
        }
    }

    pub fn default_center(&self) -> Coordinate {
        self.default_center
    }

    /// Resolves `location`, then `fallback_region`, then the default center.
    ///
    /// Identical inputs always produce identical output.
    pub fn resolve(&self, location: Option<&str>, fallback_region: Option<&str>) -> Resolution {
        self.resolve_salted(location, fallback_region, 0)
    }

    /// Like [`resolve`](Self::resolve), with `salt` mixed into the jitter so
    /// distinct records sharing a location string do not stack exactly.
    pub fn resolve_salted(
        &self,
        location: Option<&str>,
        fallback_region: Option<&str>,
        salt: u64,
    ) -> Resolution {
        let attempts = [
            (location.map(Query::text), false),
            (fallback_region.map(Query::region), true),
        ];
        for (query, via_fallback) in attempts {
            let Some(query) = query else { continue };
            if let Some((tier, entry)) = self.gazetteer.find(&query) {
                let (dlon, dlat) = jitter(query.words(), salt, tier.jitter_degrees());
                return Resolution {
                    coordinate: entry.coordinate().offset(dlon, dlat),
                    matched: GeocodeMatch::Tier {
                        tier,
                        key: entry.key().to_string(),
                        via_fallback,
                    },
                };
            }
        }

        tracing::warn!(
            location = location.unwrap_or_default(),
            fallback_region = fallback_region.unwrap_or_default(),
            "geocode miss, using default center"
        );
        Resolution {
            coordinate: self.default_center,
            matched: GeocodeMatch::Miss,
        }
    }
}

/// FNV-1a over the bytes of `text`.
pub(crate) fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// splitmix64 mapped onto `[0, 1)`.
fn unit(seed: u64) -> f64 {
    let mut x = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^= x >> 31;
    (x >> 11) as f64 / 9_007_199_254_740_992.0
}

/// Deterministic `(dlon, dlat)` offset, each within `±max_degrees`.
fn jitter(normalized: &str, salt: u64, max_degrees: f64) -> (f64, f64) {
    let seed = fnv1a(normalized) ^ salt.rotate_left(32);
    let dlon = (unit(seed) * 2.0 - 1.0) * max_degrees;
    let dlat = (unit(seed ^ 0x5bd1_e995) * 2.0 - 1.0) * max_degrees;
    (dlon, dlat)
}
