use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::USGS_FEED_BASE;
use crate::formatters::{format_casualties, format_currency};
use crate::geo::{ring_centroid, RawCoordinates};
use crate::markers::{PlacementRecord, Popup};
use crate::models::{AlertResponse, EarthquakeFeature, EarthquakeResponse, StormEventInput};
use crate::severity::{AlertSeverity, CategoricalSeverity, DamageSeverity, SeverityInput, Urgency};

/// USGS GeoJSON summary feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarthquakeFeed {
    magnitude: &'static str,
    period: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown earthquake feed '{0}', expected <significant|4.5|2.5|1.0|all>_<hour|day|week|month>")]
pub struct UnknownFeed(pub String);

impl EarthquakeFeed {
    pub fn url(&self) -> String {
        format!("{}/{}_{}.geojson", USGS_FEED_BASE, self.magnitude, self.period)
    }
}

impl Default for EarthquakeFeed {
    fn default() -> Self {
        Self {
            magnitude: "all",
            period: "day",
        }
    }
}

impl fmt::Display for EarthquakeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.magnitude, self.period)
    }
}

impl FromStr for EarthquakeFeed {
    type Err = UnknownFeed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (magnitude, period) = lower
            .rsplit_once('_')
            .ok_or_else(|| UnknownFeed(s.to_string()))?;
        let magnitude = match magnitude {
            "significant" => "significant",
            "4.5" => "4.5",
            "2.5" => "2.5",
            "1.0" => "1.0",
            "all" => "all",
            _ => return Err(UnknownFeed(s.to_string())),
        };
        let period = match period {
            "hour" => "hour",
            "day" => "day",
            "week" => "week",
            "month" => "month",
            _ => return Err(UnknownFeed(s.to_string())),
        };
        Ok(Self { magnitude, period })
    }
}

/// Upper-cases a two-letter state code as the NWS `area` parameter takes it.
pub fn state_code(code: &str) -> Option<String> {
    let code = code.trim().to_ascii_uppercase();
    (code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())).then_some(code)
}

/// NWS alerts. Alerts with a polygon are placed at its centroid; the rest
/// are geocoded from `areaDesc`, falling back to the requested area.
pub fn alert_records(alerts: &AlertResponse, area: &str) -> Vec<PlacementRecord> {
    alerts
        .features
        .iter()
        .map(|feature| {
            let props = &feature.properties;
            let coordinates = feature
                .geometry
                .as_ref()
                .and_then(|g| g.outer_ring())
                .and_then(ring_centroid)
                .map(|c| RawCoordinates {
                    latitude: c.lat(),
                    longitude: c.lon(),
                });
            let severity = CategoricalSeverity::from_labels(&props.severity, props.urgency.as_deref());

            let mut fields = vec![
                ("Severity".to_string(), props.severity.clone()),
                ("Area".to_string(), props.area_desc.clone()),
            ];
            if let Some(urgency) = &props.urgency {
                fields.push(("Urgency".to_string(), urgency.clone()));
            }
            if let Some(headline) = &props.headline {
                fields.push(("Headline".to_string(), headline.clone()));
            }
            let attribution = match &props.sender_name {
                Some(sender) => format!("Source: NWS ({})", sender),
                None => "Source: NWS".to_string(),
            };

            PlacementRecord {
                id: feature.id.clone(),
                location: Some(props.area_desc.clone()),
                fallback_region: Some(area.to_string()),
                coordinates,
                severity: SeverityInput::Categorical(severity),
                popup: Popup {
                    title: props.event.clone(),
                    fields,
                    attribution,
                    link: feature.id.clone(),
                },
            }
        })
        .collect()
}

/// Severity for an earthquake: the PAGER level when USGS issued one,
/// otherwise a magnitude bucket.
pub fn earthquake_severity(feature: &EarthquakeFeature) -> CategoricalSeverity {
    let props = &feature.properties;
    let severity = match props.alert.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("red") => AlertSeverity::Extreme,
        Some("orange") => AlertSeverity::Severe,
        Some("yellow") => AlertSeverity::Moderate,
        Some("green") => AlertSeverity::Minor,
        _ => match props.mag {
            Some(m) if m >= 7.0 => AlertSeverity::Extreme,
            Some(m) if m >= 6.0 => AlertSeverity::Severe,
            Some(m) if m >= 4.5 => AlertSeverity::Moderate,
            Some(_) => AlertSeverity::Minor,
            None => AlertSeverity::Unknown,
        },
    };
    CategoricalSeverity {
        severity,
        urgency: if props.tsunami != 0 {
            Urgency::Immediate
        } else {
            Urgency::Past
        },
    }
}

/// USGS earthquakes, placed at their reported epicenters.
pub fn earthquake_records(quakes: &EarthquakeResponse) -> Vec<PlacementRecord> {
    quakes
        .features
        .iter()
        .map(|feature| {
            let props = &feature.properties;
            let point = feature.geometry.as_ref().map(|g| g.coordinates.as_slice());
            let coordinates = match point {
                Some([lon, lat, ..]) => Some(RawCoordinates {
                    latitude: *lat,
                    longitude: *lon,
                }),
                _ => None,
            };

            let mut fields = Vec::new();
            if let Some(mag) = props.mag {
                fields.push(("Magnitude".to_string(), format!("{:.1}", mag)));
            }
            if let Some([_, _, depth, ..]) = point {
                fields.push(("Depth".to_string(), format!("{:.1} km", depth)));
            }
            if let Some(alert) = &props.alert {
                fields.push(("PAGER alert".to_string(), alert.clone()));
            }
            if props.tsunami != 0 {
                fields.push(("Tsunami".to_string(), "Possible".to_string()));
            }

            let title = props
                .title
                .clone()
                .or_else(|| props.place.clone())
                .unwrap_or_else(|| feature.id.clone());

            PlacementRecord {
                id: Some(feature.id.clone()),
                location: props.place.clone(),
                fallback_region: None,
                coordinates,
                severity: SeverityInput::Categorical(earthquake_severity(feature)),
                popup: Popup {
                    title,
                    fields,
                    attribution: "Source: USGS".to_string(),
                    link: props.url.clone(),
                },
            }
        })
        .collect()
}

/// Storm events. The most specific available text is geocoded: the
/// location, else the county, else the title, with the state as fallback.
pub fn storm_event_records(events: &[StormEventInput]) -> Vec<PlacementRecord> {
    events
        .iter()
        .map(|event| {
            let damage = DamageSeverity {
                deaths: event.deaths.unwrap_or_default(),
                injuries: event.injuries.unwrap_or_default(),
                property_damage_usd: event.damage_property.unwrap_or_default(),
                crop_damage_usd: event.damage_crops.unwrap_or_default(),
            };
            let location = event
                .location
                .clone()
                .or_else(|| event.county.clone())
                .or_else(|| event.title.clone());

            let mut fields = Vec::new();
            if let Some(kind) = &event.event_type {
                fields.push(("Type".to_string(), kind.clone()));
            }
            if let Some(date) = &event.begin_date {
                fields.push(("Date".to_string(), date.clone()));
            }
            fields.push((
                "Casualties".to_string(),
                format_casualties(damage.deaths, damage.injuries),
            ));
            fields.push((
                "Property damage".to_string(),
                format_currency(damage.property_damage_usd),
            ));
            fields.push((
                "Crop damage".to_string(),
                format_currency(damage.crop_damage_usd),
            ));

            let title = event
                .title
                .clone()
                .or_else(|| event.event_type.clone())
                .or_else(|| location.clone())
                .unwrap_or_else(|| "Storm event".to_string());

            PlacementRecord {
                id: event.id.clone(),
                location,
                fallback_region: event.state.clone(),
                coordinates: event.coordinates,
                severity: SeverityInput::Damage(damage),
                popup: Popup {
                    title,
                    fields,
                    attribution: "Source: NOAA Storm Events".to_string(),
                    link: event.source_url.clone(),
                },
            }
        })
        .collect()
}
