use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure parsing or range-checking a coordinate pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("expected \"lon,lat\" with exactly two components, got {0}")]
    SegmentCount(usize),

    #[error("coordinate component '{0}' is not a number")]
    NotANumber(String),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("bottomLeft must be south-west of topRight")]
    InvertedBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    Point,
}

/// GeoJSON point. `coordinates` is always `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, CoordinateError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        Ok(Self {
            kind: PointKind::Point,
            coordinates: [longitude, latitude],
        })
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Parse comma separated `"lon,lat"` text, as sent in query strings and upload headers.
    pub fn parse_pair(text: &str) -> Result<Self, CoordinateError> {
        let segments: Vec<&str> = text.split(',').map(str::trim).collect();
        if segments.len() != 2 {
            return Err(CoordinateError::SegmentCount(segments.len()));
        }

        let mut values = [0.0_f64; 2];
        for (slot, segment) in values.iter_mut().zip(&segments) {
            *slot = segment
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CoordinateError::NotANumber(segment.to_string()))?;
        }

        Self::new(values[0], values[1])
    }

    /// Range-check a point that arrived already structured (e.g. a JSON body).
    pub fn validated(self) -> Result<Self, CoordinateError> {
        Self::new(self.longitude(), self.latitude())
    }
}

/// Axis-aligned rectangle in (longitude, latitude) space. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub bottom_left: GeoPoint,
    pub top_right: GeoPoint,
}

impl BoundingBox {
    pub fn new(bottom_left: GeoPoint, top_right: GeoPoint) -> Result<Self, CoordinateError> {
        if bottom_left.longitude() > top_right.longitude()
            || bottom_left.latitude() > top_right.latitude()
        {
            return Err(CoordinateError::InvertedBox);
        }
        Ok(Self { bottom_left, top_right })
    }

    pub fn parse(bottom_left: &str, top_right: &str) -> Result<Self, CoordinateError> {
        Self::new(GeoPoint::parse_pair(bottom_left)?, GeoPoint::parse_pair(top_right)?)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.bottom_left.longitude()..=self.top_right.longitude()).contains(&point.longitude())
            && (self.bottom_left.latitude()..=self.top_right.latitude()).contains(&point.latitude())
    }
}
