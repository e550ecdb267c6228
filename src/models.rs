use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geo::RawCoordinates;

// ============================================================================
// National Weather Service API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AlertResponse {
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    /// Canonical alert URL.
    pub id: Option<String>,
    pub properties: AlertProperties,
    /// GeoJSON geometry; `null` for zone-based alerts.
    #[serde(default)]
    pub geometry: Option<AlertGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum AlertGeometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
    #[serde(other)]
    Other,
}

impl AlertGeometry {
    /// The outer ring of the (first) polygon.
    pub fn outer_ring(&self) -> Option<&[[f64; 2]]> {
        match self {
            AlertGeometry::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
            AlertGeometry::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|polygon| polygon.first())
                .map(Vec::as_slice),
            AlertGeometry::Other => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertProperties {
    pub event: String,
    pub headline: Option<String>,
    pub severity: String,
    pub urgency: Option<String>,
    #[serde(rename = "areaDesc")]
    pub area_desc: String,
    #[serde(rename = "senderName")]
    pub sender_name: Option<String>,
}

// ============================================================================
// USGS Earthquake Feed Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EarthquakeResponse {
    pub features: Vec<EarthquakeFeature>,
}

#[derive(Debug, Deserialize)]
pub struct EarthquakeFeature {
    pub id: String,
    pub properties: EarthquakeProperties,
    pub geometry: Option<PointGeometry>,
}

#[derive(Debug, Deserialize)]
pub struct EarthquakeProperties {
    pub mag: Option<f64>,
    pub place: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    /// PAGER alert level: green, yellow, orange or red.
    pub alert: Option<String>,
    #[serde(default)]
    pub tsunami: i32,
}

#[derive(Debug, Deserialize)]
pub struct PointGeometry {
    /// `[longitude, latitude, depth_km]`
    pub coordinates: Vec<f64>,
}

// ============================================================================
// NOAA Storm Event Records
// ============================================================================

/// One storm-event row as the dashboard receives it.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct StormEventInput {
    pub id: Option<String>,
    pub event_type: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub begin_date: Option<String>,
    pub deaths: Option<f64>,
    pub injuries: Option<f64>,
    pub damage_property: Option<f64>,
    pub damage_crops: Option<f64>,
    /// Authoritative position, used instead of geocoding when present.
    pub coordinates: Option<RawCoordinates>,
    pub source_url: Option<String>,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetAlertMarkersRequest {
    /// Two-letter state code, or several joined with commas (e.g. "NC,SC").
    pub state: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetEarthquakeMarkersRequest {
    /// USGS summary feed name, e.g. "all_day" or "significant_week".
    pub feed: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct PlaceStormEventsRequest {
    pub events: Vec<StormEventInput>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ResolveLocationRequest {
    pub location: String,
    /// Region carried separately on the record, such as a state code.
    pub fallback_region: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SetLayerVisibilityRequest {
    /// One of "alerts", "earthquakes", "storm_events".
    pub layer: String,
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_geometry_variants() {
        let feature: AlertFeature = serde_json::from_str(
            r#"{
                "id": "https://api.weather.gov/alerts/urn:1",
                "geometry": {"type": "Polygon", "coordinates": [[[-76.0, 35.0], [-75.0, 35.0], [-75.0, 36.0], [-76.0, 35.0]]]},
                "properties": {"event": "Storm Surge Warning", "severity": "Severe", "urgency": "Expected", "areaDesc": "Dare; Hyde"}
            }"#,
        )
        .unwrap();
        assert_eq!(feature.geometry.unwrap().outer_ring().unwrap().len(), 4);

        let feature: AlertFeature = serde_json::from_str(
            r#"{"geometry": null, "properties": {"event": "Heat Advisory", "severity": "Minor", "areaDesc": "Wake"}}"#,
        )
        .unwrap();
        assert!(feature.geometry.is_none());
        assert!(feature.properties.urgency.is_none());

        let geometry: AlertGeometry =
            serde_json::from_str(r#"{"type": "GeometryCollection"}"#).unwrap();
        assert!(geometry.outer_ring().is_none());
    }

    #[test]
    fn storm_event_fields_are_optional() {
        let event: StormEventInput = serde_json::from_str(
            r#"{"location": "Hatteras Island, NC", "damageProperty": 1500000}"#,
        )
        .unwrap();
        assert_eq!(event.location.as_deref(), Some("Hatteras Island, NC"));
        assert_eq!(event.damage_property, Some(1_500_000.0));
        assert!(event.deaths.is_none());
        assert!(event.coordinates.is_none());
    }
}
