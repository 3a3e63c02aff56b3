//! Captured field values.

use std::fmt;

/// A latitude/longitude pair, always captured together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// The value stored for one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Location(Coordinates),
    /// Public URI of the uploaded photo.
    Photo(String),
    /// Normalized option tag.
    Choice(String),
}

impl Value {
    /// Text form used in row cells and echoes. Photos yield their URI.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Photo(s) | Self::Choice(s) => Some(s),
            Self::Location(_) => None,
        }
    }
}
