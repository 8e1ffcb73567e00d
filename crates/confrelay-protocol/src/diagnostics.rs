//! Non-fatal findings collected while transcoding.
//!
//! Nothing in this crate prints. Conversions that degrade instead of failing
//! push a [`Diagnostic`] into a caller-owned [`Diagnostics`] list, which is
//! also mirrored to `tracing` so a running CLI can show them with `--debug`.

use std::fmt;

use tracing::{debug, warn};

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A value cannot be carried faithfully by the wire representation.
    UnsupportedValue { location: String, detail: String },

    /// A path spec addressed a location that does not exist (lenient mode).
    PathNoMatch { spec: String, at: String },

    /// A wire value carried a `kind` this crate does not know.
    UnknownKind { location: String, kind: String },

    /// A wire value's payload is missing or does not match its `kind`.
    MalformedWireValue { location: String, kind: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedValue { location, detail } => {
                write!(f, "unsupported value at {}: {}", display_location(location), detail)
            }
            Self::PathNoMatch { spec, at } => {
                write!(f, "path spec {} has no match at {}", spec, display_location(at))
            }
            Self::UnknownKind { location, kind } => {
                write!(f, "unknown wire kind {:?} at {}", kind, display_location(location))
            }
            Self::MalformedWireValue { location, kind } => write!(
                f,
                "wire value of kind {:?} has no matching payload at {}",
                kind,
                display_location(location)
            ),
        }
    }
}

fn display_location(location: &str) -> &str {
    if location.is_empty() { "<root>" } else { location }
}

/// Ordered collection of diagnostics for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    ///
    /// Path misses are expected on sparse payloads and only logged at debug.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::PathNoMatch { .. } => debug!(%diagnostic, "transcode"),
            _ => warn!(%diagnostic, "transcode"),
        }
        self.entries.push(diagnostic);
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the recorded diagnostics in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Returns true if any diagnostic other than a path miss was recorded.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|d| !matches!(d, Diagnostic::PathNoMatch { .. }))
    }

    /// Moves all diagnostics from `other` into this collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Consumes the collection, returning the recorded diagnostics.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Appends `key` to a dotted location string.
pub(crate) fn child_location(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_misses_are_not_warnings() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::PathNoMatch {
            spec: "a.b".into(),
            at: "a".into(),
        });
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics.has_warnings());

        diagnostics.push(Diagnostic::UnknownKind {
            location: "x".into(),
            kind: "bytesValue".into(),
        });
        assert!(diagnostics.has_warnings());
    }

    #[test]
    fn display_uses_root_for_empty_location() {
        let d = Diagnostic::MalformedWireValue {
            location: String::new(),
            kind: "listValue".into(),
        };
        assert_eq!(
            d.to_string(),
            "wire value of kind \"listValue\" has no matching payload at <root>"
        );
    }

    #[test]
    fn child_location_joins_with_dots() {
        assert_eq!(child_location("", "a"), "a");
        assert_eq!(child_location("a", "0"), "a.0");
    }
}
