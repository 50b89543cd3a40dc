//! State resolution — maps a [`Command`] to the [`VisualState`] it asks for.
//!
//! Resolution is pure with respect to the catalog. Unknown tokens and
//! out-of-range indices resolve to [`Resolution::NoChange`] rather than an
//! error so that a buggy or version-mismatched sender cannot take the
//! indicator down.

use tracing::warn;

use crate::catalog::IconCatalog;
use crate::command::{Command, Decoder};
use crate::state::VisualState;

/// Outcome of resolving one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Replace the current state.
    Change(VisualState),
    /// Leave the current state alone.
    NoChange,
    /// Stop the listener.
    Quit,
}

/// Resolve `command` against `catalog`.
pub fn resolve(command: &Command, catalog: &IconCatalog) -> Resolution {
    match command {
        Command::NamedColor(token) => catalog
            .color(token)
            .map(|color| Resolution::Change(VisualState::Color(color)))
            .unwrap_or(Resolution::NoChange),
        Command::IndexedImage(index) if *index < catalog.image_count() => {
            Resolution::Change(VisualState::Image(*index))
        }
        Command::IndexedImage(_) => Resolution::NoChange,
        Command::QuitRequest => Resolution::Quit,
        Command::Unknown => Resolution::NoChange,
    }
}

/// Resolve the configured startup token, falling back to the default idle
/// state when it does not name a displayable state.
pub fn resolve_initial(token: &str, decoder: &Decoder, catalog: &IconCatalog) -> VisualState {
    match resolve(&decoder.decode(token.as_bytes()), catalog) {
        Resolution::Change(state) => state,
        Resolution::NoChange | Resolution::Quit => {
            let fallback = VisualState::default();
            warn!(token, fallback = %fallback, "Initial icon does not resolve, using fallback");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IconColor;
    use crate::command::decode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_color_token_resolves_case_insensitively() {
        let catalog = IconCatalog::default();
        for color in IconColor::ALL {
            for token in [
                color.as_str().to_string(),
                color.as_str().to_uppercase(),
                format!(" {} \n", color.as_str()),
            ] {
                assert_eq!(
                    resolve(&decode(token.as_bytes()), &catalog),
                    Resolution::Change(VisualState::Color(color)),
                    "token {token:?}"
                );
            }
        }
    }

    #[test]
    fn test_unrecognized_color_is_no_change() {
        let catalog = IconCatalog::default();
        let command = Command::NamedColor("magenta".to_string());
        assert_eq!(resolve(&command, &catalog), Resolution::NoChange);
    }

    #[test]
    fn test_image_indices_in_range_resolve() {
        let catalog = IconCatalog::default();
        for i in 0..catalog.image_count() {
            assert_eq!(
                resolve(&Command::IndexedImage(i), &catalog),
                Resolution::Change(VisualState::Image(i))
            );
        }
    }

    #[test]
    fn test_image_indices_out_of_range_are_no_change() {
        let catalog = IconCatalog::default();
        let count = catalog.image_count();
        for i in [count, count + 1, usize::MAX] {
            assert_eq!(resolve(&Command::IndexedImage(i), &catalog), Resolution::NoChange);
        }
    }

    #[test]
    fn test_empty_catalog_rejects_every_index() {
        let catalog = IconCatalog::new(Vec::new());
        assert_eq!(resolve(&Command::IndexedImage(0), &catalog), Resolution::NoChange);
    }

    #[test]
    fn test_quit_and_unknown() {
        let catalog = IconCatalog::default();
        assert_eq!(resolve(&Command::QuitRequest, &catalog), Resolution::Quit);
        assert_eq!(resolve(&Command::Unknown, &catalog), Resolution::NoChange);
    }

    #[test]
    fn test_resolve_initial() {
        let catalog = IconCatalog::default();
        let decoder = Decoder::default();
        assert_eq!(
            resolve_initial("Green", &decoder, &catalog),
            VisualState::Color(IconColor::Green)
        );
        assert_eq!(resolve_initial("2", &decoder, &catalog), VisualState::Image(2));
    }

    #[test_log::test]
    fn test_resolve_initial_falls_back_to_white() {
        let catalog = IconCatalog::default();
        let decoder = Decoder::default();
        for token in ["nonsense", "quit", "999"] {
            assert_eq!(
                resolve_initial(token, &decoder, &catalog),
                VisualState::Color(IconColor::White)
            );
        }
    }
}
