//! Icon catalog — the static table of color tokens and indexed images.
//!
//! Built once at startup from [`IconConfig`] and shared read-only through an
//! `Arc`. Nothing mutates a catalog after construction.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use udpbar_config::IconConfig;

/// The color tokens the indicator understands.
///
/// `question` and `exclamation` are glyph icons rather than colors but share
/// the same token namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconColor {
    White,
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Black,
    Question,
    Exclamation,
}

impl IconColor {
    /// Every color, in display order.
    pub const ALL: [IconColor; 11] = [
        IconColor::White,
        IconColor::Red,
        IconColor::Orange,
        IconColor::Yellow,
        IconColor::Green,
        IconColor::Cyan,
        IconColor::Blue,
        IconColor::Purple,
        IconColor::Black,
        IconColor::Question,
        IconColor::Exclamation,
    ];

    /// Canonical lowercase token.
    pub fn as_str(self) -> &'static str {
        match self {
            IconColor::White => "white",
            IconColor::Red => "red",
            IconColor::Orange => "orange",
            IconColor::Yellow => "yellow",
            IconColor::Green => "green",
            IconColor::Cyan => "cyan",
            IconColor::Blue => "blue",
            IconColor::Purple => "purple",
            IconColor::Black => "black",
            IconColor::Question => "question",
            IconColor::Exclamation => "exclamation",
        }
    }

    /// Case-insensitive token lookup.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for IconColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only mapping from color tokens and image indices to renderable
/// identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCatalog {
    colors: Vec<IconColor>,
    images: Vec<String>,
}

impl IconCatalog {
    /// Create a catalog with every color and the given ordered image set.
    pub fn new(images: Vec<String>) -> Self {
        Self {
            colors: IconColor::ALL.to_vec(),
            images,
        }
    }

    /// Create a catalog whose image set is `images` followed by the `*.png`
    /// files found in `dir`, sorted by file name.
    ///
    /// The scan is best effort: an unreadable directory keeps `images` as-is.
    /// Files whose stem already appears in `images` are skipped.
    pub fn with_image_dir(mut images: Vec<String>, dir: &Path) -> Self {
        match scan_image_dir(dir) {
            Ok(found) => {
                for name in found {
                    if !images.contains(&name) {
                        images.push(name);
                    }
                }
                debug!(dir = %dir.display(), count = images.len(), "Loaded image directory");
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot read image directory, using bundled images only");
            }
        }
        Self::new(images)
    }

    /// Build the catalog described by the `[icon]` config section.
    pub fn from_config(config: &IconConfig) -> Self {
        match &config.image_dir {
            Some(dir) => Self::with_image_dir(config.images.clone(), dir),
            None => Self::new(config.images.clone()),
        }
    }

    /// Resolve a color token, case-insensitively.
    pub fn color(&self, token: &str) -> Option<IconColor> {
        self.colors
            .iter()
            .copied()
            .find(|color| color.as_str().eq_ignore_ascii_case(token))
    }

    /// Identifier of the image at `index`, if in range.
    pub fn image(&self, index: usize) -> Option<&str> {
        self.images.get(index).map(String::as_str)
    }

    /// Number of indexed images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn colors(&self) -> &[IconColor] {
        &self.colors
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }
}

impl Default for IconCatalog {
    fn default() -> Self {
        Self::new(udpbar_config::default_images())
    }
}

fn scan_image_dir(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_color_tokens_are_case_insensitive() {
        assert_eq!(IconColor::from_token("red"), Some(IconColor::Red));
        assert_eq!(IconColor::from_token("RED"), Some(IconColor::Red));
        assert_eq!(IconColor::from_token("Exclamation"), Some(IconColor::Exclamation));
        assert_eq!(IconColor::from_token("magenta"), None);
        assert_eq!(IconColor::from_token(""), None);
    }

    #[test]
    fn test_every_color_round_trips_through_its_token() {
        for color in IconColor::ALL {
            assert_eq!(IconColor::from_token(color.as_str()), Some(color));
            assert_eq!(color.to_string(), color.as_str());
        }
    }

    #[test]
    fn test_default_catalog() {
        let catalog = IconCatalog::default();
        assert_eq!(catalog.colors().len(), IconColor::ALL.len());
        assert_eq!(catalog.image_count(), 6);
        assert_eq!(catalog.image(0), Some("hollow"));
        assert_eq!(catalog.image(6), None);
        assert_eq!(catalog.color("Green"), Some(IconColor::Green));
    }

    #[test]
    fn test_image_dir_appends_sorted_pngs() {
        let dir = TempDir::new().unwrap();
        for name in ["zeta.png", "alpha.PNG", "notes.txt", "hollow.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let catalog = IconCatalog::with_image_dir(vec!["hollow".to_string()], dir.path());
        assert_eq!(
            catalog.images(),
            &["hollow".to_string(), "alpha".to_string(), "zeta".to_string()]
        );
    }

    #[test]
    fn test_missing_image_dir_keeps_bundled_images() {
        let dir = TempDir::new().unwrap();
        let catalog =
            IconCatalog::with_image_dir(vec!["a".to_string()], &dir.path().join("missing"));
        assert_eq!(catalog.images(), &["a".to_string()]);
    }

    #[test]
    fn test_from_config_without_dir() {
        let config = IconConfig {
            images: vec!["one".to_string(), "two".to_string()],
            ..IconConfig::default()
        };
        let catalog = IconCatalog::from_config(&config);
        assert_eq!(catalog.image_count(), 2);
        assert_eq!(catalog.image(1), Some("two"));
    }
}
