//! The visual state shown by the indicator.

use std::fmt;

use serde::Serialize;

use crate::catalog::IconColor;

/// What the indicator should currently display.
///
/// Exactly one of these exists per process, owned by the
/// [`IconStore`](crate::store::IconStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum VisualState {
    /// A colored dot or glyph.
    Color(IconColor),
    /// An image from the catalog, by index.
    Image(usize),
    /// Nothing displayed.
    None,
}

/// The idle indicator shown at startup.
impl Default for VisualState {
    fn default() -> Self {
        VisualState::Color(IconColor::White)
    }
}

impl fmt::Display for VisualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualState::Color(color) => write!(f, "color:{color}"),
            VisualState::Image(index) => write!(f, "image:{index}"),
            VisualState::None => f.write_str("none"),
        }
    }
}
