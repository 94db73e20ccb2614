// src/geo/codec.rs
//! Parser/formatter pair for the stored job location encoding `"[<lat>° N, <lng>° E]"`

use super::Coordinates;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationParseError {
    #[error("location must be wrapped in square brackets")]
    MissingBrackets,

    #[error("location must contain exactly one comma between latitude and longitude")]
    MissingSeparator,

    #[error("missing hemisphere letter in '{0}'")]
    MissingHemisphere(String),

    #[error("unexpected hemisphere '{found}' for {axis}")]
    InvalidHemisphere { axis: &'static str, found: char },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("negative value combined with hemisphere '{0}'")]
    ConflictingSign(char),

    #[error("coordinates out of range: lat={lat}, lng={lng}")]
    OutOfRange { lat: f64, lng: f64 },
}

#[derive(Clone, Copy)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }

    /// Sign multiplier for a hemisphere letter, None when the letter belongs to the other axis
    fn sign_for(self, hemisphere: char) -> Option<f64> {
        match (self, hemisphere) {
            (Axis::Latitude, 'N') | (Axis::Longitude, 'E') => Some(1.0),
            (Axis::Latitude, 'S') | (Axis::Longitude, 'W') => Some(-1.0),
            _ => None,
        }
    }
}

/// Parse an encoded location string into coordinates.
///
/// Whitespace around every token and the degree sign are optional.
/// `S` and `W` hemispheres produce negative values; a bare signed number with
/// `N`/`E` is also accepted since older records were written that way.
pub fn parse_location(input: &str) -> Result<Coordinates, LocationParseError> {
    let inner = input
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or(LocationParseError::MissingBrackets)?;

    let mut parts = inner.split(',');
    let (lat_part, lng_part) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(lng), None) => (lat, lng),
        _ => return Err(LocationParseError::MissingSeparator),
    };

    let lat = parse_component(lat_part, Axis::Latitude)?;
    let lng = parse_component(lng_part, Axis::Longitude)?;

    let coords = Coordinates { lat, lng };
    if !coords.is_valid() {
        return Err(LocationParseError::OutOfRange { lat, lng });
    }
    Ok(coords)
}

/// Lenient variant used by distance features: malformed input yields `None`.
pub fn try_parse_location(input: &str) -> Option<Coordinates> {
    parse_location(input).ok()
}

/// Canonical encoding with six decimal places.
pub fn format_location(coords: Coordinates) -> String {
    let lat_hemisphere = if coords.lat < 0.0 { 'S' } else { 'N' };
    let lng_hemisphere = if coords.lng < 0.0 { 'W' } else { 'E' };
    format!(
        "[{:.6}° {}, {:.6}° {}]",
        coords.lat.abs(),
        lat_hemisphere,
        coords.lng.abs(),
        lng_hemisphere
    )
}

fn parse_component(raw: &str, axis: Axis) -> Result<f64, LocationParseError> {
    let token = raw.trim();
    let hemisphere = token
        .chars()
        .last()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .ok_or_else(|| LocationParseError::MissingHemisphere(token.to_string()))?;

    let sign = axis
        .sign_for(hemisphere)
        .ok_or(LocationParseError::InvalidHemisphere {
            axis: axis.name(),
            found: hemisphere,
        })?;

    // Hemisphere letters are ASCII, so slicing off one byte is safe
    let number = token[..token.len() - 1].trim_end();
    let number = number.strip_suffix('°').unwrap_or(number).trim();

    let value: f64 = number
        .parse()
        .map_err(|_| LocationParseError::InvalidNumber(number.to_string()))?;
    if !value.is_finite() {
        return Err(LocationParseError::InvalidNumber(number.to_string()));
    }
    if value < 0.0 && sign < 0.0 {
        return Err(LocationParseError::ConflictingSign(hemisphere));
    }

    Ok(value * sign)
}
