use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::geo::{Coordinate, RawCoordinates};
use crate::geocode::{fnv1a, GeocodeMatch, GeocodeResolver};
use crate::severity::{assess, style, Assessment, MarkerStyle, ScoreRange, SeverityInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Alerts,
    Earthquakes,
    StormEvents,
}

impl LayerKind {
    pub const ALL: [LayerKind; 3] = [
        LayerKind::Alerts,
        LayerKind::Earthquakes,
        LayerKind::StormEvents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Alerts => "alerts",
            LayerKind::Earthquakes => "earthquakes",
            LayerKind::StormEvents => "storm_events",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown layer '{0}', expected one of: alerts, earthquakes, storm_events")]
pub struct UnknownLayer(pub String);

impl FromStr for LayerKind {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "alerts" => Ok(LayerKind::Alerts),
            "earthquakes" => Ok(LayerKind::Earthquakes),
            "storm_events" => Ok(LayerKind::StormEvents),
            _ => Err(UnknownLayer(s.to_string())),
        }
    }
}

/// Popup shown when a marker is clicked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Popup {
    pub title: String,
    /// Labelled, already formatted values in display order.
    pub fields: Vec<(String, String)>,
    pub attribution: String,
    pub link: Option<String>,
}

/// A feed record ready for placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRecord {
    pub id: Option<String>,
    /// Free text handed to the geocoder when `coordinates` is absent.
    pub location: Option<String>,
    pub fallback_region: Option<String>,
    /// Upstream position. Bypasses the geocoder entirely.
    pub coordinates: Option<RawCoordinates>,
    pub severity: SeverityInput,
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Upstream,
    Geocoded { matched: GeocodeMatch },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub id: String,
    pub coordinate: Coordinate,
    pub style: MarkerStyle,
    pub placement: Placement,
    pub popup: Popup,
}

/// What a rebuild did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: usize,
    pub added: usize,
    /// Records dropped for carrying out-of-range upstream coordinates.
    pub skipped_invalid: usize,
    pub geocode_misses: usize,
}

/// A layer's records and the markers built from them, rebuilt from scratch on every change.
#[derive(Debug, Clone)]
pub struct MarkerLayer {
    kind: LayerKind,
    visible: bool,
    records: Vec<PlacementRecord>,
    markers: Vec<MapMarker>,
}

impl MarkerLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            visible: true,
            records: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn records(&self) -> &[PlacementRecord] {
        &self.records
    }

    /// Markers currently on the map; empty while hidden.
    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    fn rebuild(&mut self, resolver: &GeocodeResolver, min_score: f64) -> ReconcileReport {
        let mut report = ReconcileReport {
            removed: self.markers.len(),
            ..ReconcileReport::default()
        };
        self.markers.clear();
        if !self.visible {
            return report;
        }

        let assessments: Vec<Assessment> = self
            .records
            .iter()
            .map(|r| assess(&r.severity, min_score))
            .collect();
        let range = ScoreRange::from_scores(assessments.iter().filter_map(|a| match a {
            Assessment::Scored { score } => Some(*score),
            Assessment::Categorical(_) => None,
        }));

        let mut seen = HashSet::with_capacity(self.records.len());
        for (index, (record, assessment)) in self.records.iter().zip(&assessments).enumerate() {
            let local_id = record.id.clone().unwrap_or_else(|| index.to_string());
            let mut id = format!("{}:{local_id}", self.kind);
            if !seen.insert(id.clone()) {
                id = format!("{id}#{index}");
                seen.insert(id.clone());
            }

            let (coordinate, placement) = match record.coordinates {
                Some(raw) => match raw.validate() {
                    Ok(coordinate) => (coordinate, Placement::Upstream),
                    Err(e) => {
                        tracing::warn!(layer = %self.kind, id = %id, "skipping record: {e}");
                        report.skipped_invalid += 1;
                        continue;
                    }
                },
                None => {
                    let resolution = resolver.resolve_salted(
                        record.location.as_deref(),
                        record.fallback_region.as_deref(),
                        fnv1a(&id),
                    );
                    if resolution.matched.is_miss() {
                        report.geocode_misses += 1;
                    }
                    (
                        resolution.coordinate,
                        Placement::Geocoded {
                            matched: resolution.matched,
                        },
                    )
                }
            };

            self.markers.push(MapMarker {
                id,
                coordinate,
                style: style(assessment, range),
                placement,
                popup: record.popup.clone(),
            });
        }
        report.added = self.markers.len();
        report
    }
}

/// All marker layers of one map instance.
#[derive(Debug, Clone)]
pub struct MarkerMap {
    resolver: GeocodeResolver,
    min_score: f64,
    layers: BTreeMap<LayerKind, MarkerLayer>,
}

impl MarkerMap {
    pub fn new(resolver: GeocodeResolver, min_score: f64) -> Self {
        let layers = LayerKind::ALL
            .into_iter()
            .map(|kind| (kind, MarkerLayer::new(kind)))
            .collect();
        Self {
            resolver,
            min_score,
            layers,
        }
    }

    pub fn resolver(&self) -> &GeocodeResolver {
        &self.resolver
    }

    pub fn layer(&self, kind: LayerKind) -> &MarkerLayer {
        &self.layers[&kind]
    }

    fn layer_mut(&mut self, kind: LayerKind) -> &mut MarkerLayer {
        self.layers
            .entry(kind)
            .or_insert_with(|| MarkerLayer::new(kind))
    }

    /// Replaces a layer's records and rebuilds its markers.
    pub fn replace_records(
        &mut self,
        kind: LayerKind,
        records: Vec<PlacementRecord>,
    ) -> ReconcileReport {
        let resolver = self.resolver.clone();
        let min_score = self.min_score;
        let layer = self.layer_mut(kind);
        layer.records = records;
        let report = layer.rebuild(&resolver, min_score);
        tracing::info!(
            layer = %kind,
            removed = report.removed,
            added = report.added,
            skipped = report.skipped_invalid,
            misses = report.geocode_misses,
            "layer rebuilt"
        );
        report
    }

    /// Shows or hides a layer, rebuilding it either way.
    pub fn set_visible(&mut self, kind: LayerKind, visible: bool) -> ReconcileReport {
        let resolver = self.resolver.clone();
        let min_score = self.min_score;
        let layer = self.layer_mut(kind);
        layer.visible = visible;
        layer.rebuild(&resolver, min_score)
    }

    /// Every marker on the map across visible layers.
    pub fn rendered(&self) -> impl Iterator<Item = &MapMarker> {
        self.layers.values().flat_map(|l| l.markers.iter())
    }

    pub fn rendered_counts(&self) -> BTreeMap<LayerKind, usize> {
        self.layers
            .iter()
            .map(|(kind, layer)| (*kind, layer.markers.len()))
            .collect()
    }

    pub fn hidden_layers(&self) -> BTreeSet<LayerKind> {
        self.layers
            .values()
            .filter(|l| !l.visible)
            .map(|l| l.kind)
            .collect()
    }
}
