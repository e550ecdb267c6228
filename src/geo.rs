use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `(longitude, latitude)` pair in decimal degrees.
///
/// Construction through [`Coordinate::new`] guarantees the value is finite
/// and within `-180..=180` / `-90..=90`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lon: f64,
    lat: f64,
}

/// Rejected coordinate values.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
}

impl Coordinate {
    /// Validates and builds a coordinate.
    pub fn new(lon: f64, lat: f64) -> Result<Self, CoordinateError> {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        Ok(Self { lon, lat })
    }

    /// Builds a coordinate from table data known to be in range.
    pub(crate) const fn fixed(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Moves the coordinate by the given offsets, clamping into bounds.
    pub fn offset(&self, dlon: f64, dlat: f64) -> Self {
        Self {
            lon: (self.lon + dlon).clamp(-180.0, 180.0),
            lat: (self.lat + dlat).clamp(-90.0, 90.0),
        }
    }
}

/// Coordinates as upstream feeds carry them, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct RawCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl RawCoordinates {
    pub fn validate(&self) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(self.longitude, self.latitude)
    }
}

/// Averages the vertices of a polygon ring, ignoring the closing vertex.
///
/// Longitudes are unwrapped around the first vertex, so rings crossing the
/// antimeridian average near 180 rather than near 0. Returns `None` for an
/// empty ring or when the average is out of bounds.
pub fn ring_centroid(ring: &[[f64; 2]]) -> Option<Coordinate> {
    let open = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    let origin = open.first()?[0];
    let n = open.len() as f64;
    let (sum_lon, sum_lat) = open.iter().fold((0.0, 0.0), |(x, y), p| {
        let mut delta = p[0] - origin;
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta < -180.0 {
            delta += 360.0;
        }
        (x + origin + delta, y + p[1])
    });
    let lon = (sum_lon / n + 180.0).rem_euclid(360.0) - 180.0;
    Coordinate::new(lon, sum_lat / n).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            Coordinate::new(181.0, 0.0),
            Err(CoordinateError::Longitude(181.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -90.5),
            Err(CoordinateError::Latitude(-90.5))
        );
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(180.0, 90.0).is_ok());
    }

    #[test]
    fn offset_stays_in_bounds() {
        let edge = Coordinate::new(179.9, 89.9).unwrap();
        let moved = edge.offset(1.5, 1.5);
        assert_eq!(moved.lon(), 180.0);
        assert_eq!(moved.lat(), 90.0);
    }

    #[test]
    fn centroid_of_closed_square() {
        let ring = [
            [-76.0, 35.0],
            [-75.0, 35.0],
            [-75.0, 36.0],
            [-76.0, 36.0],
            [-76.0, 35.0],
        ];
        let c = ring_centroid(&ring).unwrap();
        assert!((c.lon() + 75.5).abs() < 1e-9);
        assert!((c.lat() - 35.5).abs() < 1e-9);
        assert!(ring_centroid(&[]).is_none());
    }

    #[test]
    fn centroid_across_the_antimeridian() {
        // western Aleutians straddle 180
        let ring = [
            [172.0, 52.0],
            [-178.0, 52.0],
            [-178.0, 53.0],
            [172.0, 53.0],
            [172.0, 52.0],
        ];
        let c = ring_centroid(&ring).unwrap();
        assert!((c.lon() - 177.0).abs() < 1e-9, "{}", c.lon());
        assert!((c.lat() - 52.5).abs() < 1e-9);

        let ring = [[179.0, 51.0], [-179.0, 51.0], [-179.0, 52.0], [179.0, 52.0]];
        let c = ring_centroid(&ring).unwrap();
        assert!((c.lon().abs() - 180.0).abs() < 1e-9, "{}", c.lon());
    }
}
