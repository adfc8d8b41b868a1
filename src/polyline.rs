//! Polyline representation for route geometries.
//!
//! Geometries are stored as decoded coordinate sequences. The compact
//! encoded polyline format some providers return is decoded here, at the
//! boundary, and never travels further into the resolver.

use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::model::Coordinate;

/// Precision of the Google encoded polyline format (1e5).
pub const ENCODED_PRECISION: u32 = 5;

/// A route geometry as an ordered list of coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Coordinate> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.points.last()
    }

    /// Forces the geometry to start at `origin` and end at `destination`.
    ///
    /// Road providers snap the requested endpoints onto the network, so the
    /// requested positions are added when they differ from the snapped ones.
    pub fn anchored(mut self, origin: Coordinate, destination: Coordinate) -> Self {
        if !self.first().is_some_and(|p| p.same_position(&origin)) {
            self.points.insert(0, origin);
        }
        if self.points.len() < 2 || !self.last().is_some_and(|p| p.same_position(&destination)) {
            self.points.push(destination);
        }
        self
    }

    /// Decodes a Google encoded polyline string.
    ///
    /// `precision` is the number of decimal places the encoder used
    /// (5 for Google/GraphHopper, 6 for Valhalla).
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, PolylineError> {
        let factor = 10f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut index = 0;
        let mut lat: i64 = 0;
        let mut lng: i64 = 0;
        let mut points = Vec::new();

        while index < bytes.len() {
            lat += decode_value(bytes, &mut index)?;
            lng += decode_value(bytes, &mut index)?;
            let point = Coordinate::new(lat as f64 / factor, lng as f64 / factor)?;
            points.push(point);
        }

        Ok(Self { points })
    }
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let byte = *bytes.get(*index).ok_or(PolylineError::Truncated)?;
        *index += 1;
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter(byte as char));
        }
        if shift > 60 {
            return Err(PolylineError::Overflow);
        }
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }
    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolylineError {
    #[error("encoded polyline ends mid-value")]
    Truncated,
    #[error("invalid character {0:?} in encoded polyline")]
    InvalidCharacter(char),
    #[error("encoded polyline value overflows")]
    Overflow,
    #[error(transparent)]
    Coordinate(#[from] GeoError),
}
